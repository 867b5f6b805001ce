//! 共用類型定義

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// 語言訊號類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 高能量詞彙
    Energy,
    /// 吸睛開場語
    Hook,
    /// 情緒字眼
    Emotion,
    /// 引發好奇的問句
    Question,
    /// 衝突、戲劇性
    Conflict,
    /// 強調（全大寫、驚嘆號）
    Emphasis,
}

impl Category {
    /// 全部類別，依固定順序
    pub const ALL: [Category; 6] = [
        Category::Energy,
        Category::Hook,
        Category::Emotion,
        Category::Question,
        Category::Conflict,
        Category::Emphasis,
    ];

    /// 以關鍵字計分的五個類別（強調另以倍率計算）
    pub const LEXICAL: [Category; 5] = [
        Category::Energy,
        Category::Hook,
        Category::Emotion,
        Category::Question,
        Category::Conflict,
    ];

    /// 取得設定檔使用的名稱
    pub fn name(&self) -> &'static str {
        match self {
            Category::Energy => "energy",
            Category::Hook => "hook",
            Category::Emotion => "emotion",
            Category::Question => "question",
            Category::Conflict => "conflict",
            Category::Emphasis => "emphasis",
        }
    }

    /// 取得理由範本
    pub fn reason(&self) -> &'static str {
        match self {
            Category::Energy => "High-energy language detected",
            Category::Hook => "Contains attention-grabbing hook",
            Category::Emotion => "Strong emotional content",
            Category::Question => "Creates curiosity with questions",
            Category::Conflict => "Drama or conflict",
            Category::Emphasis => "Emphatic delivery (caps or exclamations)",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| DetectError::UnknownCategory(s.to_string()))
    }
}

/// 無理由可套用時的預設理由
pub const FALLBACK_REASON: &str = "High engagement potential";

/// 逐字稿片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// 文字內容
    pub text: String,
    /// 開始時間（秒）
    pub start_time: f64,
    /// 結束時間（秒）
    pub end_time: f64,
}

impl TranscriptFragment {
    /// 建立新的片段
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }

    /// 計算片段時長（秒）
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// 單一片段的評分結果
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSegment {
    /// 對應逐字稿的索引
    pub fragment_ref: usize,
    /// 各類別命中次數
    pub category_hits: BTreeMap<Category, u32>,
    /// 各類別對分數的貢獻（含強調加成）
    pub contributions: BTreeMap<Category, f64>,
    /// 分數 (0.0 - 1.0)
    pub raw_score: f64,
}

impl ScoredSegment {
    /// 零分片段
    pub fn empty(fragment_ref: usize) -> Self {
        Self {
            fragment_ref,
            category_hits: BTreeMap::new(),
            contributions: BTreeMap::new(),
            raw_score: 0.0,
        }
    }
}

/// 候選精彩片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMoment {
    /// 開始時間（秒）
    pub start_time: f64,
    /// 結束時間（秒）
    pub end_time: f64,
    /// 分數 (0.0 - 1.0)
    pub score: f64,
    /// 入選理由（已去重、保持順序）
    pub reasons: Vec<String>,
    /// 各類別貢獻
    pub category_breakdown: BTreeMap<Category, f64>,
    /// 區間內的逐字稿文字
    pub text: String,
}

impl CandidateMoment {
    /// 計算時長（秒）
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}
