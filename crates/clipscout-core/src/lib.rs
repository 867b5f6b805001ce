//! clipscout-core - 精彩片段偵測核心庫
//!
//! 從含時間戳的逐字稿找出高互動潛力的片段，並提供報告與匯出功能。

pub mod aggregator;
pub mod config;
pub mod detector;
pub mod error;
pub mod exporter;
pub mod lexicon;
pub mod merger;
pub mod ranker;
pub mod report;
pub mod scorer;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

pub use aggregator::WindowAggregator;
pub use config::{AnalysisConfig, DetectorConfig};
pub use detector::{detect_viral_moments, validate_transcript, ViralMomentDetector};
pub use error::DetectError;
pub use exporter::{ExportError, Exporter, MarkerFormat};
pub use lexicon::{CategoryLexicon, CategoryOverride, EmphasisRule, Lexicon, LexiconOverrides, Saturation};
pub use merger::MomentMerger;
pub use ranker::rank;
pub use report::{format_timestamp, generate_report};
pub use scorer::SegmentScorer;
pub use types::*;
