//! 文字報告

use crate::types::CandidateMoment;

/// 報告中顯示的文字長度上限（字元）
const PREVIEW_CHARS: usize = 100;

/// 將秒數轉為 `M:SS`
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// 產生人類可讀的精彩片段報告
pub fn generate_report(moments: &[CandidateMoment]) -> String {
    if moments.is_empty() {
        return "No high-potential viral moments detected.".to_string();
    }

    let mut report = format!("Found {} viral-worthy moments:\n\n", moments.len());

    for (i, moment) in moments.iter().enumerate() {
        report.push_str(&format!(
            "#{} - {} to {}\n",
            i + 1,
            format_timestamp(moment.start_time),
            format_timestamp(moment.end_time)
        ));
        report.push_str(&format!(
            "   Score: {:.2} | Duration: {:.0}s\n",
            moment.score,
            moment.duration()
        ));
        report.push_str(&format!("   Reasons: {}\n", moment.reasons.join(", ")));

        if !moment.text.is_empty() {
            let preview: String = moment.text.chars().take(PREVIEW_CHARS).collect();
            let ellipsis = if moment.text.chars().count() > PREVIEW_CHARS { "..." } else { "" };
            report.push_str(&format!("   Text: {}{}\n", preview, ellipsis));
        }

        report.push('\n');
    }

    report
}
