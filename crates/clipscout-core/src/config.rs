//! 偵測設定

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::lexicon::LexiconOverrides;

/// 偵測器設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// 最低分數門檻 (0.0 - 1.0)
    pub min_score: f64,
    /// 最多回傳幾個片段
    pub max_results: usize,
    /// 片段最長時長（秒）
    pub max_clip_length: f64,
    /// 片段最短時長（秒）
    pub min_clip_length: f64,
    /// 相鄰有效片段間允許的最大間隔（秒）
    pub max_gap: f64,
    /// 片段分數需超過此值才會納入視窗
    pub activity_floor: f64,
    /// 候選片段間隔小於此值即合併（秒）
    pub merge_gap: f64,
    /// 類別貢獻超過此值才列入理由
    pub reason_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_score: 0.3,
            max_results: 10,
            max_clip_length: 60.0,
            min_clip_length: 3.0,
            max_gap: 3.0,
            activity_floor: 0.05,
            merge_gap: 2.0,
            reason_threshold: 0.02,
        }
    }
}

impl DetectorConfig {
    /// 檢查設定值範圍
    pub fn validate(&self) -> Result<(), DetectError> {
        let unit = 0.0..=1.0;

        if !unit.contains(&self.min_score) {
            return Err(DetectError::InvalidConfig(format!(
                "min_score 必須介於 [0, 1]: {}",
                self.min_score
            )));
        }
        if !(self.min_clip_length > 0.0 && self.min_clip_length.is_finite()) {
            return Err(DetectError::InvalidConfig(format!(
                "min_clip_length 必須大於 0: {}",
                self.min_clip_length
            )));
        }
        if !(self.max_clip_length >= self.min_clip_length && self.max_clip_length.is_finite()) {
            return Err(DetectError::InvalidConfig(format!(
                "max_clip_length ({}) 不可小於 min_clip_length ({})",
                self.max_clip_length, self.min_clip_length
            )));
        }
        if !(self.max_gap >= 0.0 && self.merge_gap >= 0.0) {
            return Err(DetectError::InvalidConfig(format!(
                "max_gap ({}) 與 merge_gap ({}) 不可為負數",
                self.max_gap, self.merge_gap
            )));
        }
        if !unit.contains(&self.activity_floor) || !unit.contains(&self.reason_threshold) {
            return Err(DetectError::InvalidConfig(format!(
                "activity_floor ({}) 與 reason_threshold ({}) 必須介於 [0, 1]",
                self.activity_floor, self.reason_threshold
            )));
        }

        Ok(())
    }
}

/// 分析設定檔內容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 偵測器設定
    pub detector: DetectorConfig,
    /// 詞庫覆寫
    pub lexicon_overrides: LexiconOverrides,
}

impl AnalysisConfig {
    /// 從 JSON 檔載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let data = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&data)?;
        config.detector.validate()?;
        Ok(config)
    }
}
