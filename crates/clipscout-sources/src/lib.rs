//! External collaborators for clipscout
//!
//! Transcript fetching, clip rendering and caption generation live outside the
//! detection engine. This crate defines their interfaces and ships one
//! implementation of each.

pub mod caption;
pub mod error;
pub mod file;
pub mod provider;
pub mod render;

pub use caption::ReasonCaptionGenerator;
pub use error::SourceError;
pub use file::{load_transcript_file, JsonTranscriptProvider};
pub use provider::{CaptionGenerator, ClipRenderer, TranscriptProvider};
pub use render::{render_moments, FfmpegClipRenderer, RenderFailure, RenderSummary, RenderedClip};

// Re-export types from clipscout-core
pub use clipscout_core::{CandidateMoment, TranscriptFragment};
