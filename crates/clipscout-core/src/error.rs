//! 偵測錯誤類型

use thiserror::Error;

/// 精彩片段偵測錯誤
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("無效的逐字稿片段 #{index}: {reason}")]
    InvalidFragment { index: usize, reason: String },

    #[error("未知的類別: {0}")]
    UnknownCategory(String),

    #[error("無效的設定: {0}")]
    InvalidConfig(String),

    #[error("候選片段未依開始時間排序 (#{index})")]
    MomentsOutOfOrder { index: usize },

    #[error("無效的候選片段 #{index}: 結束時間必須大於開始時間")]
    InvalidMoment { index: usize },

    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析錯誤: {0}")]
    Json(#[from] serde_json::Error),
}
