//! Collaborator traits

use std::path::PathBuf;

use clipscout_core::{CandidateMoment, TranscriptFragment};

use crate::error::SourceError;

/// Transcript provider trait
#[trait_variant::make(TranscriptProvider: Send)]
pub trait LocalTranscriptProvider {
    /// Fetch the ordered transcript of a video
    ///
    /// Fails with `SourceError::NoTranscriptAvailable` when none exists.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptFragment>, SourceError>;

    /// Get provider name
    fn name(&self) -> &'static str;
}

/// Clip renderer trait
#[trait_variant::make(ClipRenderer: Send)]
pub trait LocalClipRenderer {
    /// Render `[start_time, end_time)` of a video, optionally burning in a caption
    async fn render_clip(
        &self,
        video_id: &str,
        start_time: f64,
        end_time: f64,
        caption: Option<&str>,
    ) -> Result<PathBuf, SourceError>;

    /// Get renderer name
    fn name(&self) -> &'static str;
}

/// Caption generator trait
pub trait CaptionGenerator: Send + Sync {
    /// Produce a short caption for a moment
    fn caption(&self, moment: &CandidateMoment) -> String;

    /// Maximum caption length in characters
    fn max_chars(&self) -> usize {
        60
    }
}
