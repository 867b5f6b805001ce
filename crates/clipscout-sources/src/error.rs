//! Source error types

use thiserror::Error;

/// Errors raised by transcript providers and clip renderers
#[derive(Error, Debug)]
pub enum SourceError {
    /// No transcript exists for the video
    #[error("No transcript available for video: {0}")]
    NoTranscriptAvailable(String),

    /// Transcript data could not be interpreted
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    /// Video id is not usable as a lookup key
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    /// Source video could not be obtained
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Clip encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
