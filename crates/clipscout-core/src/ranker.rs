//! 排名與篩選

use std::cmp::Ordering;

use crate::types::CandidateMoment;

/// 依分數篩選並排序，最多保留 `max_results` 筆
///
/// 分數低於 `min_score` 的片段被捨棄；同分時開始時間較早者優先。
pub fn rank(moments: &[CandidateMoment], min_score: f64, max_results: usize) -> Vec<CandidateMoment> {
    let mut ranked: Vec<CandidateMoment> = moments
        .iter()
        .filter(|m| m.score >= min_score)
        .cloned()
        .collect();

    ranked.sort_by(compare_moments);
    ranked.truncate(max_results);
    ranked
}

/// 分數遞減，再依開始時間遞增
fn compare_moments(a: &CandidateMoment, b: &CandidateMoment) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.start_time.total_cmp(&b.start_time))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn moment(start: f64, score: f64) -> CandidateMoment {
        CandidateMoment {
            start_time: start,
            end_time: start + 5.0,
            score,
            reasons: vec!["reason".to_string()],
            category_breakdown: BTreeMap::new(),
            text: String::new(),
        }
    }

    #[test]
    fn test_threshold_drops_low_scores() {
        let moments = vec![moment(0.0, 0.5), moment(10.0, 0.8), moment(20.0, 0.6)];
        assert!(rank(&moments, 0.9, 10).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let moments = vec![moment(0.0, 0.3), moment(10.0, 0.29)];
        let ranked = rank(&moments, 0.3, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].start_time, 0.0);
    }

    #[test]
    fn test_top_results_with_tie_break() {
        let moments = vec![
            moment(0.0, 0.4),
            moment(10.0, 0.9),
            moment(20.0, 0.5),
            moment(30.0, 0.9),
            moment(5.0, 0.9),
        ];

        let ranked = rank(&moments, 0.3, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].start_time, 5.0);
        assert_eq!(ranked[1].start_time, 10.0);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let moments = vec![
            moment(40.0, 0.7),
            moment(0.0, 0.7),
            moment(20.0, 0.95),
            moment(30.0, 0.31),
        ];

        let first = rank(&moments, 0.3, 10);
        let second = rank(&moments, 0.3, 10);
        assert_eq!(first, second);
        let starts: Vec<f64> = first.iter().map(|m| m.start_time).collect();
        assert_eq!(starts, vec![20.0, 0.0, 40.0, 30.0]);
    }

    #[test]
    fn test_survivors_unchanged() {
        let moments = vec![moment(3.0, 0.6)];
        let ranked = rank(&moments, 0.3, 10);
        assert_eq!(ranked[0], moments[0]);
    }
}
