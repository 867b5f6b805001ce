//! JSON transcript files on disk

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

use clipscout_core::TranscriptFragment;

use crate::error::SourceError;
use crate::provider::TranscriptProvider;

/// One row of a transcript file
///
/// Accepts either `end` or `duration`, the latter being what most caption APIs return.
#[derive(Debug, Deserialize)]
struct TranscriptRow {
    #[serde(default)]
    text: String,
    #[serde(alias = "start_time")]
    start: f64,
    #[serde(default, alias = "end_time")]
    end: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
}

impl TranscriptRow {
    fn into_fragment(self, index: usize) -> Result<TranscriptFragment, SourceError> {
        let end = match (self.end, self.duration) {
            (Some(end), _) => end,
            (None, Some(duration)) => self.start + duration,
            (None, None) => {
                return Err(SourceError::InvalidTranscript(format!(
                    "row {} has neither end nor duration",
                    index
                )))
            }
        };

        Ok(TranscriptFragment::new(self.text, self.start, end))
    }
}

/// Parse transcript JSON (an array of rows)
pub fn parse_transcript(data: &str) -> Result<Vec<TranscriptFragment>, SourceError> {
    let rows: Vec<TranscriptRow> = serde_json::from_str(data)
        .map_err(|e| SourceError::InvalidTranscript(e.to_string()))?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| row.into_fragment(index))
        .collect()
}

/// Load a transcript file directly
pub async fn load_transcript_file<P: AsRef<Path>>(path: P) -> Result<Vec<TranscriptFragment>, SourceError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).await?;
    let fragments = parse_transcript(&data)?;
    debug!("Loaded {} fragments from {}", fragments.len(), path.display());
    Ok(fragments)
}

/// Transcript provider reading `<dir>/<video_id>.json`
pub struct JsonTranscriptProvider {
    dir: PathBuf,
}

impl JsonTranscriptProvider {
    /// Create a provider over a transcript directory
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the transcript directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path a video's transcript would be stored at
    pub fn transcript_path(&self, video_id: &str) -> Result<PathBuf, SourceError> {
        check_video_id(video_id)?;
        Ok(self.dir.join(format!("{}.json", video_id)))
    }
}

/// Video ids become file names, so only `[A-Za-z0-9_-]` is accepted
pub(crate) fn check_video_id(video_id: &str) -> Result<(), SourceError> {
    let valid = !video_id.is_empty()
        && video_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidVideoId(video_id.to_string()))
    }
}

impl TranscriptProvider for JsonTranscriptProvider {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptFragment>, SourceError> {
        let path = self.transcript_path(video_id)?;

        if !fs::try_exists(&path).await? {
            return Err(SourceError::NoTranscriptAvailable(video_id.to_string()));
        }

        let fragments = load_transcript_file(&path).await?;
        if fragments.is_empty() {
            return Err(SourceError::NoTranscriptAvailable(video_id.to_string()));
        }

        info!("Fetched transcript for {}: {} fragments", video_id, fragments.len());
        Ok(fragments)
    }

    fn name(&self) -> &'static str {
        "JSON files"
    }
}
