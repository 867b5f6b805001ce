//! 精彩片段偵測器
//!
//! 串接評分、聚合、合併與排名：
//! 逐字稿 → `SegmentScorer` → `WindowAggregator` → `MomentMerger` → `rank`。
//!
//! 合併後的片段可能超過 `max_clip_length`（相鄰視窗合併的結果），
//! 其餘輸出片段的時長皆介於 `min_clip_length` 與 `max_clip_length` 之間。

use std::sync::Arc;

use tracing::{debug, info};

use crate::aggregator::WindowAggregator;
use crate::config::{AnalysisConfig, DetectorConfig};
use crate::error::DetectError;
use crate::lexicon::Lexicon;
use crate::merger::MomentMerger;
use crate::ranker::rank;
use crate::scorer::SegmentScorer;
use crate::types::{CandidateMoment, TranscriptFragment};

/// 精彩片段偵測器
#[derive(Debug, Clone)]
pub struct ViralMomentDetector {
    config: DetectorConfig,
    scorer: SegmentScorer,
    aggregator: WindowAggregator,
    merger: MomentMerger,
}

impl ViralMomentDetector {
    /// 以指定詞庫與設定建立偵測器
    pub fn new(lexicon: Arc<Lexicon>, config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate()?;
        lexicon.validate()?;

        Ok(Self {
            scorer: SegmentScorer::new(lexicon),
            aggregator: WindowAggregator::new(config.clone()),
            merger: MomentMerger::new(config.merge_gap),
            config,
        })
    }

    /// 以預設詞庫加上覆寫設定建立偵測器
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, DetectError> {
        let lexicon = Lexicon::default().with_overrides(&config.lexicon_overrides)?;
        Self::new(Arc::new(lexicon), config.detector.clone())
    }

    /// 取得設定
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 取得詞庫
    pub fn lexicon(&self) -> &Lexicon {
        self.scorer.lexicon()
    }

    /// 偵測精彩片段，回傳依分數排序的結果
    pub fn detect(&self, transcript: &[TranscriptFragment]) -> Result<Vec<CandidateMoment>, DetectError> {
        let merged = self.candidates(transcript)?;
        let ranked = rank(&merged, self.config.min_score, self.config.max_results);

        info!(
            "Detected {} viral moments ({} candidates, {} fragments)",
            ranked.len(),
            merged.len(),
            transcript.len()
        );

        Ok(ranked)
    }

    /// 產生合併後、尚未排名的候選片段（依開始時間排序）
    pub fn candidates(
        &self,
        transcript: &[TranscriptFragment],
    ) -> Result<Vec<CandidateMoment>, DetectError> {
        if transcript.is_empty() {
            return Ok(Vec::new());
        }

        validate_transcript(transcript)?;

        let scored = self.scorer.score_all(transcript);
        debug!(
            "Scored {} fragments, {} above floor",
            scored.len(),
            scored
                .iter()
                .filter(|s| s.raw_score > self.config.activity_floor)
                .count()
        );

        let windows = self.aggregator.aggregate(transcript, &scored);
        self.merger.merge(&windows)
    }
}

impl Default for ViralMomentDetector {
    fn default() -> Self {
        let config = DetectorConfig::default();
        Self {
            scorer: SegmentScorer::default(),
            aggregator: WindowAggregator::new(config.clone()),
            merger: MomentMerger::new(config.merge_gap),
            config,
        }
    }
}

/// 以預設詞庫偵測精彩片段
pub fn detect_viral_moments(
    transcript: &[TranscriptFragment],
    config: &DetectorConfig,
) -> Result<Vec<CandidateMoment>, DetectError> {
    ViralMomentDetector::new(Arc::new(Lexicon::default()), config.clone())?.detect(transcript)
}

/// 檢查逐字稿片段：時間有效且開始時間不遞減
pub fn validate_transcript(transcript: &[TranscriptFragment]) -> Result<(), DetectError> {
    let mut previous_start = f64::NEG_INFINITY;

    for (index, fragment) in transcript.iter().enumerate() {
        let invalid = |reason: String| DetectError::InvalidFragment { index, reason };

        if !fragment.start_time.is_finite() || !fragment.end_time.is_finite() {
            return Err(invalid("時間必須為有限數值".to_string()));
        }
        if fragment.start_time < 0.0 {
            return Err(invalid(format!("開始時間為負數: {}", fragment.start_time)));
        }
        if fragment.end_time <= fragment.start_time {
            return Err(invalid(format!(
                "結束時間 ({}) 必須大於開始時間 ({})",
                fragment.end_time, fragment.start_time
            )));
        }
        if fragment.start_time < previous_start {
            return Err(invalid(format!(
                "開始時間 ({}) 早於前一片段 ({})",
                fragment.start_time, previous_start
            )));
        }

        previous_start = fragment.start_time;
    }

    Ok(())
}
