//! 片段合併模組
//!
//! 以單次掃描合併重疊或間隔過小的候選片段。輸入必須依開始時間排序
//! （聚合器的輸出即符合），否則回傳錯誤而非產生錯誤的合併結果。

use tracing::debug;

use crate::error::DetectError;
use crate::types::CandidateMoment;

/// 片段合併器
#[derive(Debug, Clone)]
pub struct MomentMerger {
    /// 合併相鄰片段的間隔閾值（秒）
    merge_gap: f64,
}

impl MomentMerger {
    /// 建立新的合併器
    pub fn new(merge_gap: f64) -> Self {
        Self { merge_gap }
    }

    /// 合併候選片段
    ///
    /// 合併後的範圍取聯集，分數取最大值，理由取保持順序的聯集，
    /// 類別貢獻逐項取最大值。
    pub fn merge(&self, moments: &[CandidateMoment]) -> Result<Vec<CandidateMoment>, DetectError> {
        self.check_sorted(moments)?;

        let mut merged: Vec<CandidateMoment> = Vec::with_capacity(moments.len());

        for moment in moments {
            if let Some(last) = merged.last_mut() {
                let gap = moment.start_time - last.end_time;

                if gap < self.merge_gap {
                    debug!(
                        "Merging {:.2}-{:.2}s into {:.2}-{:.2}s",
                        moment.start_time, moment.end_time, last.start_time, last.end_time
                    );
                    absorb(last, moment);
                    continue;
                }
            }
            merged.push(moment.clone());
        }

        Ok(merged)
    }

    /// 檢查輸入是否已排序且時長為正
    fn check_sorted(&self, moments: &[CandidateMoment]) -> Result<(), DetectError> {
        for (index, moment) in moments.iter().enumerate() {
            if !(moment.end_time > moment.start_time) {
                return Err(DetectError::InvalidMoment { index });
            }
        }

        match moments
            .windows(2)
            .position(|pair| pair[1].start_time < pair[0].start_time)
        {
            Some(position) => Err(DetectError::MomentsOutOfOrder { index: position + 1 }),
            None => Ok(()),
        }
    }
}

impl Default for MomentMerger {
    fn default() -> Self {
        Self::new(2.0)
    }
}

/// 將 `other` 併入 `target`
fn absorb(target: &mut CandidateMoment, other: &CandidateMoment) {
    target.start_time = target.start_time.min(other.start_time);
    target.end_time = target.end_time.max(other.end_time);
    target.score = target.score.max(other.score);

    for reason in &other.reasons {
        if !target.reasons.contains(reason) {
            target.reasons.push(reason.clone());
        }
    }

    for (category, value) in &other.category_breakdown {
        let entry = target.category_breakdown.entry(*category).or_insert(0.0);
        *entry = entry.max(*value);
    }

    if !other.text.is_empty() {
        if target.text.is_empty() {
            target.text = other.text.clone();
        } else {
            target.text = format!("{} {}", target.text, other.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::types::Category;

    fn create_test_moment(start: f64, end: f64, score: f64, reasons: &[&str]) -> CandidateMoment {
        CandidateMoment {
            start_time: start,
            end_time: end,
            score,
            reasons: reasons.iter().map(|r| r.to_string()).collect(),
            category_breakdown: BTreeMap::new(),
            text: String::new(),
        }
    }

    #[test]
    fn test_overlapping_moments_merge() {
        let mut first = create_test_moment(0.0, 5.0, 0.6, &["hook", "energy"]);
        first.category_breakdown.insert(Category::Energy, 0.2);
        let mut second = create_test_moment(4.0, 9.0, 0.4, &["energy", "conflict"]);
        second.category_breakdown.insert(Category::Energy, 0.3);
        second.category_breakdown.insert(Category::Conflict, 0.1);

        let merged = MomentMerger::default().merge(&[first, second]).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_time, 0.0);
        assert_eq!(merged[0].end_time, 9.0);
        assert!((merged[0].score - 0.6).abs() < 1e-9);
        assert_eq!(merged[0].reasons, vec!["hook", "energy", "conflict"]);
        assert!((merged[0].category_breakdown[&Category::Energy] - 0.3).abs() < 1e-9);
        assert!((merged[0].category_breakdown[&Category::Conflict] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_small_gap_merges_large_gap_does_not() {
        let moments = vec![
            create_test_moment(0.0, 5.0, 0.5, &["a"]),
            create_test_moment(6.5, 10.0, 0.5, &["b"]),
            create_test_moment(20.0, 25.0, 0.5, &["c"]),
        ];

        let merged = MomentMerger::default().merge(&moments).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].end_time, 10.0);
        assert_eq!(merged[1].start_time, 20.0);
    }

    #[test]
    fn test_transitive_chain() {
        let moments = vec![
            create_test_moment(0.0, 4.0, 0.3, &["a"]),
            create_test_moment(5.0, 9.0, 0.4, &["b"]),
            create_test_moment(10.0, 14.0, 0.9, &["c"]),
        ];

        let merged = MomentMerger::default().merge(&moments).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end_time, 14.0);
        assert!((merged[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let moments = vec![
            create_test_moment(0.0, 5.0, 0.6, &["a"]),
            create_test_moment(4.0, 9.0, 0.4, &["b"]),
            create_test_moment(15.0, 20.0, 0.5, &["c"]),
            create_test_moment(21.0, 30.0, 0.7, &["a"]),
            create_test_moment(40.0, 44.0, 0.2, &[]),
        ];

        let merger = MomentMerger::default();
        let once = merger.merge(&moments).unwrap();
        let twice = merger.merge(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merged_never_shorter_than_inputs() {
        let moments = vec![
            create_test_moment(0.0, 20.0, 0.5, &[]),
            create_test_moment(2.0, 5.0, 0.5, &[]),
        ];

        let merged = MomentMerger::default().merge(&moments).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end_time, 20.0);
    }

    #[test]
    fn test_unsorted_input_rejected() {
        let moments = vec![
            create_test_moment(10.0, 15.0, 0.5, &[]),
            create_test_moment(0.0, 5.0, 0.5, &[]),
        ];

        let result = MomentMerger::default().merge(&moments);
        assert!(matches!(result, Err(DetectError::MomentsOutOfOrder { index: 1 })));
    }

    #[test]
    fn test_invalid_moment_rejected() {
        let moments = vec![create_test_moment(5.0, 5.0, 0.5, &[])];
        let result = MomentMerger::default().merge(&moments);
        assert!(matches!(result, Err(DetectError::InvalidMoment { index: 0 })));
    }

    #[test]
    fn test_empty_input() {
        assert!(MomentMerger::default().merge(&[]).unwrap().is_empty());
    }
}
