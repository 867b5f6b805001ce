//! 片段評分模組

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::lexicon::{tokenize, Lexicon};
use crate::types::{Category, ScoredSegment, TranscriptFragment};

/// 片段評分器
#[derive(Debug, Clone)]
pub struct SegmentScorer {
    lexicon: Arc<Lexicon>,
}

impl SegmentScorer {
    /// 建立新的評分器
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// 取得詞庫
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// 為單一片段評分
    ///
    /// 各類別分數為 `weight * saturation(hits)`，加總後乘上 `1 + 強調加成`，
    /// 最後限制在 [0, 1]。
    pub fn score(&self, fragment_ref: usize, fragment: &TranscriptFragment) -> ScoredSegment {
        let text = fragment.text.trim();
        if text.is_empty() {
            return ScoredSegment::empty(fragment_ref);
        }

        let lexicon = &self.lexicon;
        let tokens = tokenize(text);

        let mut category_hits = BTreeMap::new();
        let mut contributions = BTreeMap::new();
        let mut base = 0.0;

        for category in Category::LEXICAL {
            let hits = lexicon.matches_in_tokens(category, &tokens, text);
            if hits == 0 {
                continue;
            }

            let contribution = lexicon.weight_for(category) * lexicon.saturation.apply(hits);
            category_hits.insert(category, hits);
            contributions.insert(category, contribution);
            base += contribution;
        }

        let bonus = lexicon.emphasis_bonus(text);
        if bonus > 0.0 {
            category_hits.insert(Category::Emphasis, lexicon.matches_for(Category::Emphasis, text));
            if base > 0.0 {
                contributions.insert(Category::Emphasis, base * bonus);
            }
        }

        let raw_score = (base * (1.0 + bonus)).clamp(0.0, 1.0);

        ScoredSegment {
            fragment_ref,
            category_hits,
            contributions,
            raw_score,
        }
    }

    /// 依序為整份逐字稿評分
    pub fn score_all(&self, transcript: &[TranscriptFragment]) -> Vec<ScoredSegment> {
        transcript
            .iter()
            .enumerate()
            .map(|(idx, fragment)| self.score(idx, fragment))
            .collect()
    }
}

impl Default for SegmentScorer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str) -> TranscriptFragment {
        TranscriptFragment::new(text, 0.0, 4.0)
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let scorer = SegmentScorer::default();
        for text in ["", "   ", "\n\t"] {
            let scored = scorer.score(0, &fragment(text));
            assert_eq!(scored.raw_score, 0.0);
            assert!(scored.category_hits.is_empty());
        }
    }

    #[test]
    fn test_high_energy_fragment() {
        let scorer = SegmentScorer::default();
        let scored = scorer.score(0, &fragment("this is INSANE you won't believe it!!"));

        assert_eq!(scored.category_hits.get(&Category::Energy), Some(&1));
        assert_eq!(scored.category_hits.get(&Category::Hook), Some(&1));
        assert!(scored.category_hits.contains_key(&Category::Emphasis));
        assert!(scored.raw_score > 0.3);
    }

    #[test]
    fn test_plain_fragment_near_zero() {
        let scorer = SegmentScorer::default();
        let scored = scorer.score(1, &fragment("okay moving on to the next topic"));
        assert!(scored.raw_score < 0.05);
        assert_eq!(scored.fragment_ref, 1);
    }

    #[test]
    fn test_repetition_saturates() {
        let scorer = SegmentScorer::default();
        let three = scorer.score(0, &fragment("crazy crazy crazy"));
        let ten = scorer.score(0, &fragment(&"crazy ".repeat(10)));
        assert!((three.raw_score - ten.raw_score).abs() < 1e-9);
        assert!(three.raw_score <= 0.30 + 1e-9);
    }

    #[test]
    fn test_emphasis_only_does_not_score() {
        let scorer = SegmentScorer::default();
        let scored = scorer.score(0, &fragment("OKAY THEN!!"));
        assert_eq!(scored.raw_score, 0.0);
        assert!(scored.category_hits.contains_key(&Category::Emphasis));
    }

    #[test]
    fn test_score_always_in_range() {
        let scorer = SegmentScorer::default();
        let loud = "WOW INSANE CRAZY!!! you won't believe this, why? I LOVE it, total WAR, \
                    no way, what a disaster!!!! HOLY OMG";
        let scored = scorer.score(0, &fragment(loud));
        assert!(scored.raw_score >= 0.0 && scored.raw_score <= 1.0);

        let texts = ["a", "?", "!!!", "what?", "hate hate", "Fight versus battle"];
        for text in texts {
            let s = scorer.score(0, &fragment(text)).raw_score;
            assert!((0.0..=1.0).contains(&s), "{} scored {}", text, s);
        }
    }
}
