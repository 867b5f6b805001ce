//! Caption generation from moment content

use clipscout_core::{CandidateMoment, Category};

use crate::provider::CaptionGenerator;

/// Shortest sentence worth using as a caption
const MIN_SENTENCE_CHARS: usize = 10;

/// Caption generator using the moment's own words or its strongest category
#[derive(Debug, Clone)]
pub struct ReasonCaptionGenerator {
    max_chars: usize,
}

impl ReasonCaptionGenerator {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(4),
        }
    }

    fn headline(category: Category) -> &'static str {
        match category {
            Category::Energy => "This got intense",
            Category::Hook => "Wait for it...",
            Category::Emotion => "This hit hard",
            Category::Question => "Would you have guessed?",
            Category::Conflict => "Things got heated",
            Category::Emphasis => "They did NOT hold back",
        }
    }

    /// First sentence of the moment text, if it has a usable length
    fn first_sentence(&self, text: &str) -> Option<String> {
        let sentence = text
            .split_inclusive(|c: char| matches!(c, '.' | '!' | '?'))
            .next()
            .unwrap_or("")
            .trim();

        let len = sentence.chars().count();
        (MIN_SENTENCE_CHARS..=self.max_chars)
            .contains(&len)
            .then(|| sentence.to_string())
    }

    /// Strongest category of a moment; ties go to the earlier category
    fn strongest_category(moment: &CandidateMoment) -> Option<Category> {
        moment
            .category_breakdown
            .iter()
            .filter(|(_, value)| **value > 0.0)
            .fold(None, |best: Option<(Category, f64)>, (category, value)| match best {
                Some((_, best_value)) if best_value >= *value => best,
                _ => Some((*category, *value)),
            })
            .map(|(category, _)| category)
    }

    fn truncate(&self, caption: &str) -> String {
        if caption.chars().count() <= self.max_chars {
            return caption.to_string();
        }

        let kept: String = caption.chars().take(self.max_chars - 3).collect();
        format!("{}...", kept.trim_end())
    }
}

impl Default for ReasonCaptionGenerator {
    fn default() -> Self {
        Self::new(60)
    }
}

impl CaptionGenerator for ReasonCaptionGenerator {
    fn caption(&self, moment: &CandidateMoment) -> String {
        if let Some(sentence) = self.first_sentence(&moment.text) {
            return sentence;
        }

        let caption = match Self::strongest_category(moment) {
            Some(category) => Self::headline(category),
            None => moment
                .reasons
                .first()
                .map(String::as_str)
                .unwrap_or("You have to see this"),
        };

        self.truncate(caption)
    }

    fn max_chars(&self) -> usize {
        self.max_chars
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn moment(text: &str, breakdown: &[(Category, f64)]) -> CandidateMoment {
        CandidateMoment {
            start_time: 0.0,
            end_time: 5.0,
            score: 0.5,
            reasons: vec!["Strong emotional content".to_string()],
            category_breakdown: breakdown.iter().cloned().collect::<BTreeMap<_, _>>(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_uses_first_sentence() {
        let generator = ReasonCaptionGenerator::default();
        let m = moment("You won't believe this! Then it got worse.", &[]);
        assert_eq!(generator.caption(&m), "You won't believe this!");
    }

    #[test]
    fn test_falls_back_to_strongest_category() {
        let generator = ReasonCaptionGenerator::default();
        let long = "a ".repeat(80);
        let m = moment(&long, &[(Category::Energy, 0.1), (Category::Hook, 0.2)]);
        assert_eq!(generator.caption(&m), "Wait for it...");

        let tie = moment("ok", &[(Category::Energy, 0.2), (Category::Hook, 0.2)]);
        assert_eq!(generator.caption(&tie), "This got intense");
    }

    #[test]
    fn test_falls_back_to_reason() {
        let generator = ReasonCaptionGenerator::default();
        assert_eq!(generator.caption(&moment("", &[])), "Strong emotional content");
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let generator = ReasonCaptionGenerator::new(12);
        let caption = generator.caption(&moment("", &[(Category::Question, 0.3)]));
        assert_eq!(caption, "Would you...");
        assert!(caption.chars().count() <= generator.max_chars());
    }
}
