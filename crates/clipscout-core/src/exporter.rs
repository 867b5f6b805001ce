//! 結果匯出模組

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;

use crate::types::{CandidateMoment, Category};

/// 匯出錯誤
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化錯誤: {0}")]
    Json(#[from] serde_json::Error),

    #[error("未知的標記格式: {0}")]
    UnknownFormat(String),
}

/// 結果匯出器
pub struct Exporter;

impl Exporter {
    /// 產生 JSON 報告字串
    pub fn json_report(
        moments: &[CandidateMoment],
        source: &str,
        pretty: bool,
    ) -> Result<String, ExportError> {
        let data = JsonReport::from_moments(moments, source);

        let json = if pretty {
            serde_json::to_string_pretty(&data)?
        } else {
            serde_json::to_string(&data)?
        };

        Ok(json)
    }

    /// 匯出 JSON 報告
    pub fn to_json<P: AsRef<Path>>(
        moments: &[CandidateMoment],
        source: &str,
        output_path: P,
        pretty: bool,
    ) -> Result<(), ExportError> {
        let json = Self::json_report(moments, source, pretty)?;
        write_file(output_path.as_ref(), &json)
    }

    /// 產生 EDL 內容，每個片段為一個事件
    pub fn edl(moments: &[CandidateMoment], source: &str, fps: f64, title: Option<&str>) -> String {
        let edl_title = title.unwrap_or(source);

        let mut content = String::new();
        content.push_str(&format!("TITLE: {}\n", edl_title));
        content.push_str("FCM: NON-DROP FRAME\n\n");

        let mut rec_offset = 0.0;
        for (i, moment) in moments.iter().enumerate() {
            let event_num = format!("{:03}", i + 1);
            let reel = "AX";

            let src_in = seconds_to_timecode(moment.start_time, fps);
            let src_out = seconds_to_timecode(moment.end_time, fps);

            let duration = moment.duration();
            let rec_in = seconds_to_timecode(rec_offset, fps);
            let rec_out = seconds_to_timecode(rec_offset + duration, fps);

            content.push_str(&format!(
                "{}  {}       AA/V  C        {} {} {} {}\n",
                event_num, reel, src_in, src_out, rec_in, rec_out
            ));
            content.push_str(&format!("* FROM CLIP NAME: {}\n", source));
            content.push_str(&format!("* COMMENT: score {:.2} - {}\n\n", moment.score, moment.reasons.join("; ")));

            rec_offset += duration;
        }

        content
    }

    /// 匯出 EDL 檔案
    pub fn to_edl<P: AsRef<Path>>(
        moments: &[CandidateMoment],
        source: &str,
        output_path: P,
        fps: f64,
        title: Option<&str>,
    ) -> Result<(), ExportError> {
        write_file(output_path.as_ref(), &Self::edl(moments, source, fps, title))
    }

    /// 產生標記內容
    pub fn markers(moments: &[CandidateMoment], format: MarkerFormat) -> String {
        match format {
            MarkerFormat::Csv => format_markers_csv(moments),
            MarkerFormat::Audacity => format_markers_audacity(moments),
        }
    }

    /// 匯出標記檔案
    pub fn to_markers<P: AsRef<Path>>(
        moments: &[CandidateMoment],
        output_path: P,
        format: MarkerFormat,
    ) -> Result<(), ExportError> {
        write_file(output_path.as_ref(), &Self::markers(moments, format))
    }
}

/// 標記格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerFormat {
    /// CSV 格式
    Csv,
    /// Audacity 標籤格式
    Audacity,
}

impl std::str::FromStr for MarkerFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(MarkerFormat::Csv),
            "audacity" | "txt" => Ok(MarkerFormat::Audacity),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// 寫入檔案，必要時建立目錄
fn write_file(output_path: &Path, content: &str) -> Result<(), ExportError> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(output_path, content)?;
    Ok(())
}

/// 將秒數轉換為時間碼
fn seconds_to_timecode(seconds: f64, fps: f64) -> String {
    let fps = fps.round().max(1.0) as u64;
    let total_frames = (seconds.max(0.0) * fps as f64).round() as u64;
    let frames = total_frames % fps;
    let total_seconds = total_frames / fps;
    let secs = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let mins = total_minutes % 60;
    let hours = total_minutes / 60;

    format!("{:02}:{:02}:{:02}:{:02}", hours, mins, secs, frames)
}

/// 格式化為 CSV 標記
fn format_markers_csv(moments: &[CandidateMoment]) -> String {
    let mut lines = vec!["start,end,score,reasons,text".to_string()];

    for moment in moments {
        lines.push(format!(
            "{:.3},{:.3},{:.3},{},{}",
            moment.start_time,
            moment.end_time,
            moment.score,
            csv_field(&moment.reasons.join("; ")),
            csv_field(&moment.text)
        ));
    }

    lines.join("\n")
}

/// 以雙引號包住欄位，內部引號加倍 (RFC 4180)；換行改為空白以維持一列一筆
fn csv_field(value: &str) -> String {
    let flattened = value.replace("\r\n", " ").replace(|c: char| c == '\r' || c == '\n', " ");
    format!("\"{}\"", flattened.replace('"', "\"\""))
}

/// 格式化為 Audacity 標記
fn format_markers_audacity(moments: &[CandidateMoment]) -> String {
    let mut lines = Vec::new();

    for moment in moments {
        let reasons = moment.reasons.join(", ").replace('\t', " ");
        lines.push(format!(
            "{:.6}\t{:.6}\t[{:.2}] {}",
            moment.start_time, moment.end_time, moment.score, reasons
        ));
    }

    lines.join("\n")
}

/// JSON 報告結構
#[derive(Serialize)]
struct JsonReport {
    version: String,
    generated_at: String,
    source: String,
    moment_count: usize,
    total_duration: f64,
    moments: Vec<JsonMoment>,
    statistics: Statistics,
}

#[derive(Serialize)]
struct JsonMoment {
    rank: usize,
    start_time: f64,
    end_time: f64,
    duration: f64,
    score: f64,
    reasons: Vec<String>,
    category_breakdown: BTreeMap<Category, f64>,
    text: String,
}

#[derive(Serialize)]
struct Statistics {
    by_reason: HashMap<String, ReasonStats>,
    average_score: f64,
}

#[derive(Serialize)]
struct ReasonStats {
    count: u32,
    duration: f64,
}

impl JsonReport {
    fn from_moments(moments: &[CandidateMoment], source: &str) -> Self {
        let mut by_reason: HashMap<String, ReasonStats> = HashMap::new();
        let mut total_duration = 0.0;
        let mut total_score = 0.0;

        for moment in moments {
            let duration = moment.duration();
            total_duration += duration;
            total_score += moment.score;

            for reason in &moment.reasons {
                let stats = by_reason.entry(reason.clone()).or_insert(ReasonStats {
                    count: 0,
                    duration: 0.0,
                });
                stats.count += 1;
                stats.duration += duration;
            }
        }

        let average_score = if moments.is_empty() {
            0.0
        } else {
            total_score / moments.len() as f64
        };

        Self {
            version: "1.0".to_string(),
            generated_at: Local::now().to_rfc3339(),
            source: source.to_string(),
            moment_count: moments.len(),
            total_duration,
            moments: moments
                .iter()
                .enumerate()
                .map(|(i, m)| JsonMoment {
                    rank: i + 1,
                    start_time: m.start_time,
                    end_time: m.end_time,
                    duration: m.duration(),
                    score: m.score,
                    reasons: m.reasons.clone(),
                    category_breakdown: m.category_breakdown.clone(),
                    text: m.text.clone(),
                })
                .collect(),
            statistics: Statistics {
                by_reason,
                average_score,
            },
        }
    }
}
