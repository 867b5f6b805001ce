//! 視窗聚合模組
//!
//! 將連續的有效片段累積成候選時間視窗。遇到低分片段、間隔過大或
//! 視窗超過最長時長時關閉目前視窗並開啟新視窗。

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DetectorConfig;
use crate::types::{CandidateMoment, Category, ScoredSegment, TranscriptFragment, FALLBACK_REASON};

/// 累積中的視窗
struct OpenWindow<'a> {
    start_time: f64,
    end_time: f64,
    /// 各片段時長總和（不含間隔）
    spoken: f64,
    /// 分數 × 時長
    weighted_score: f64,
    /// 類別貢獻 × 時長
    weighted_breakdown: BTreeMap<Category, f64>,
    texts: Vec<&'a str>,
}

impl<'a> OpenWindow<'a> {
    fn open(fragment: &'a TranscriptFragment, segment: &ScoredSegment) -> Self {
        let mut window = Self {
            start_time: fragment.start_time,
            end_time: fragment.end_time,
            spoken: 0.0,
            weighted_score: 0.0,
            weighted_breakdown: BTreeMap::new(),
            texts: Vec::new(),
        };
        window.push(fragment, segment);
        window
    }

    fn push(&mut self, fragment: &'a TranscriptFragment, segment: &ScoredSegment) {
        let duration = fragment.duration();
        self.end_time = self.end_time.max(fragment.end_time);
        self.spoken += duration;
        self.weighted_score += segment.raw_score * duration;
        for (category, contribution) in &segment.contributions {
            *self.weighted_breakdown.entry(*category).or_insert(0.0) += contribution * duration;
        }

        let text = fragment.text.trim();
        if !text.is_empty() {
            self.texts.push(text);
        }
    }

    fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// 視窗聚合器
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    config: DetectorConfig,
}

impl WindowAggregator {
    /// 建立新的聚合器
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// 將評分結果聚合為候選片段，輸出依開始時間排序
    pub fn aggregate(
        &self,
        transcript: &[TranscriptFragment],
        scored: &[ScoredSegment],
    ) -> Vec<CandidateMoment> {
        let mut moments = Vec::new();
        let mut current: Option<OpenWindow> = None;

        for segment in scored {
            let Some(fragment) = transcript.get(segment.fragment_ref) else {
                debug!("Skipping scored segment with unknown fragment #{}", segment.fragment_ref);
                continue;
            };

            if segment.raw_score <= self.config.activity_floor {
                if let Some(window) = current.take() {
                    self.close(window, &mut moments);
                }
                continue;
            }

            if let Some(window) = current.as_mut() {
                let gap = fragment.start_time - window.end_time;
                let span = fragment.end_time - window.start_time;

                if gap <= self.config.max_gap && span <= self.config.max_clip_length {
                    window.push(fragment, segment);
                    continue;
                }

                debug!(
                    "Closing window at {:.2}s (gap {:.2}s, span {:.2}s)",
                    window.end_time, gap, span
                );
                if let Some(window) = current.take() {
                    self.close(window, &mut moments);
                }
            }

            current = Some(OpenWindow::open(fragment, segment));
        }

        if let Some(window) = current.take() {
            self.close(window, &mut moments);
        }

        debug!("Aggregated {} candidate windows", moments.len());
        moments
    }

    /// 結束視窗並轉為候選片段
    fn close(&self, window: OpenWindow<'_>, moments: &mut Vec<CandidateMoment>) {
        let duration = window.duration();

        if duration < self.config.min_clip_length {
            debug!(
                "Discarding window {:.2}-{:.2}s: shorter than {:.2}s",
                window.start_time, window.end_time, self.config.min_clip_length
            );
            return;
        }

        // 單一片段本身超過最長時長
        if duration > self.config.max_clip_length {
            debug!(
                "Discarding window {:.2}-{:.2}s: longer than {:.2}s",
                window.start_time, window.end_time, self.config.max_clip_length
            );
            return;
        }

        let score = if window.spoken > 0.0 {
            (window.weighted_score / window.spoken).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let category_breakdown: BTreeMap<Category, f64> = window
            .weighted_breakdown
            .iter()
            .map(|(category, total)| (*category, total / window.spoken))
            .collect();

        let mut reasons: Vec<String> = Category::ALL
            .iter()
            .filter(|category| {
                category_breakdown
                    .get(*category)
                    .is_some_and(|value| *value >= self.config.reason_threshold)
            })
            .map(|category| category.reason().to_string())
            .collect();

        if reasons.is_empty() && score > 0.0 {
            reasons.push(FALLBACK_REASON.to_string());
        }

        moments.push(CandidateMoment {
            start_time: window.start_time,
            end_time: window.end_time,
            score,
            reasons,
            category_breakdown,
            text: window.texts.join(" "),
        });
    }
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
