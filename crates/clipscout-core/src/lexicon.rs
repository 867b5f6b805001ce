//! 詞庫模組
//!
//! 保存各類別的關鍵字、片語與權重，以及強調加成與飽和曲線參數。
//! 詞庫建立後不可變，以 `Arc<Lexicon>` 在多個偵測呼叫間共用。

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::types::Category;

/// 單一類別的詞表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLexicon {
    /// 權重 (0.0, 1.0]
    pub weight: f64,
    /// 單字關鍵字（不分大小寫，以字詞邊界比對）
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    /// 多字片語（依序比對字詞序列）
    #[serde(default)]
    pub phrases: BTreeSet<String>,
    /// 每出現一次即計一次命中的符號，例如問號
    #[serde(default)]
    pub marks: String,
}

impl CategoryLexicon {
    fn new(weight: f64, keywords: &[&str], phrases: &[&str], marks: &str) -> Self {
        Self {
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            marks: marks.to_string(),
        }
    }
}

/// 強調加成規則
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmphasisRule {
    /// 加成上限
    pub max_bonus: f64,
    /// 全大寫字詞比例的係數
    pub caps_factor: f64,
    /// 每個驚嘆號的加成
    pub exclamation_step: f64,
    /// 計入的驚嘆號上限
    pub max_exclamations: usize,
}

impl Default for EmphasisRule {
    fn default() -> Self {
        Self {
            max_bonus: 0.25,
            caps_factor: 0.5,
            exclamation_step: 0.05,
            max_exclamations: 5,
        }
    }
}

/// 命中次數的飽和曲線
///
/// `f(n) = (1 - (1 - gain)^min(n, max_hits)) / (1 - (1 - gain)^max_hits)`，
/// 一次命中即有明顯分數，達到 `max_hits` 後不再增加。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saturation {
    /// 計入的命中次數上限
    pub max_hits: u32,
    /// 每次命中的遞增率 (0.0, 1.0]
    pub gain: f64,
}

impl Default for Saturation {
    fn default() -> Self {
        Self {
            max_hits: 3,
            gain: 0.6,
        }
    }
}

impl Saturation {
    /// 將命中次數轉為 0.0 - 1.0 的比例
    pub fn apply(&self, hits: u32) -> f64 {
        if hits == 0 || self.max_hits == 0 {
            return 0.0;
        }

        let keep = 1.0 - self.gain;
        let counted = hits.min(self.max_hits) as i32;
        let full = 1.0 - keep.powi(self.max_hits as i32);
        if full <= 0.0 {
            return 0.0;
        }

        ((1.0 - keep.powi(counted)) / full).clamp(0.0, 1.0)
    }
}

/// 詞庫
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LexiconFile")]
pub struct Lexicon {
    /// 各類別詞表（不含強調）
    pub categories: BTreeMap<Category, CategoryLexicon>,
    /// 強調加成
    #[serde(default)]
    pub emphasis: EmphasisRule,
    /// 飽和曲線
    #[serde(default)]
    pub saturation: Saturation,
}

/// 詞庫檔案格式，類別以名稱表示
#[derive(Debug, Deserialize)]
struct LexiconFile {
    categories: BTreeMap<String, CategoryLexicon>,
    #[serde(default)]
    emphasis: EmphasisRule,
    #[serde(default)]
    saturation: Saturation,
}

impl TryFrom<LexiconFile> for Lexicon {
    type Error = DetectError;

    fn try_from(file: LexiconFile) -> Result<Self, Self::Error> {
        let categories = file
            .categories
            .into_iter()
            .map(|(name, entry)| Ok((name.parse::<Category>()?, entry)))
            .collect::<Result<BTreeMap<_, _>, DetectError>>()?;

        Ok(Self {
            categories,
            emphasis: file.emphasis,
            saturation: file.saturation,
        })
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        let mut categories = BTreeMap::new();

        categories.insert(
            Category::Energy,
            CategoryLexicon::new(
                0.30,
                &[
                    "insane", "crazy", "amazing", "wow", "incredible", "unbelievable",
                    "shocking", "mind-blowing", "epic", "huge", "massive", "legendary",
                    "perfect", "brilliant", "genius", "absolutely", "literally",
                    "explosion", "explode", "destroyed", "killed", "crushed", "dominated",
                    "best", "worst", "never", "always", "everyone", "nobody", "holy",
                    "omg", "wtf", "damn", "hell", "god",
                ],
                &[],
                "",
            ),
        );

        categories.insert(
            Category::Hook,
            CategoryLexicon::new(
                0.25,
                &[
                    "wait", "stop", "listen", "secret", "hidden", "truth", "finally",
                    "revealed",
                ],
                &[
                    "you won't believe", "wait for it", "watch this", "check this out",
                    "no way", "are you kidding", "i can't believe", "this is crazy",
                    "hold on", "look at this", "pay attention", "nobody tells you",
                    "they don't want", "at last", "here it is", "the moment",
                ],
                "",
            ),
        );

        categories.insert(
            Category::Emotion,
            CategoryLexicon::new(
                0.20,
                &[
                    "love", "hate", "angry", "happy", "sad", "scared", "excited",
                    "frustrated", "amazing", "terrible", "awesome", "horrible",
                    "beautiful", "ugly", "perfect", "disaster", "nightmare", "dream",
                ],
                &["broke my heart", "can't stop crying"],
                "",
            ),
        );

        categories.insert(
            Category::Question,
            CategoryLexicon::new(
                0.15,
                &["what", "why", "how", "when", "where", "who", "which"],
                &["what if", "guess what", "have you ever"],
                "?",
            ),
        );

        categories.insert(
            Category::Conflict,
            CategoryLexicon::new(
                0.10,
                &[
                    "fight", "argue", "debate", "versus", "against", "battle", "war",
                    "conflict", "problem", "issue", "challenge", "struggle", "failed",
                    "mistake", "wrong", "disaster", "catastrophe",
                ],
                &["called out", "fell apart"],
                "",
            ),
        );

        Self {
            categories,
            emphasis: EmphasisRule::default(),
            saturation: Saturation::default(),
        }
    }
}

impl Lexicon {
    /// 從 JSON 檔載入詞庫
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let data = std::fs::read_to_string(path)?;
        let file: LexiconFile = serde_json::from_str(&data)?;
        let lexicon = Lexicon::try_from(file)?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// 檢查權重與參數範圍
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.categories.contains_key(&Category::Emphasis) {
            return Err(DetectError::InvalidConfig(
                "emphasis 不使用詞表，請改用 emphasis 規則".to_string(),
            ));
        }

        for (category, entry) in &self.categories {
            if !(entry.weight > 0.0 && entry.weight <= 1.0) {
                return Err(DetectError::InvalidConfig(format!(
                    "{} 的權重必須介於 (0, 1]: {}",
                    category, entry.weight
                )));
            }
        }

        let emphasis = &self.emphasis;
        if !(0.0..=1.0).contains(&emphasis.max_bonus)
            || emphasis.caps_factor < 0.0
            || emphasis.exclamation_step < 0.0
        {
            return Err(DetectError::InvalidConfig(format!(
                "無效的強調規則: {:?}",
                emphasis
            )));
        }

        let saturation = &self.saturation;
        if saturation.max_hits == 0 || !(saturation.gain > 0.0 && saturation.gain <= 1.0) {
            return Err(DetectError::InvalidConfig(format!(
                "無效的飽和曲線: {:?}",
                saturation
            )));
        }

        Ok(())
    }

    /// 套用覆寫設定，回傳新的詞庫
    pub fn with_overrides(&self, overrides: &LexiconOverrides) -> Result<Self, DetectError> {
        let mut lexicon = self.clone();

        for (name, entry) in &overrides.categories {
            let category: Category = name.parse()?;

            if category == Category::Emphasis {
                if entry.keywords.is_some() || entry.phrases.is_some() {
                    return Err(DetectError::InvalidConfig(
                        "emphasis 只能覆寫 weight".to_string(),
                    ));
                }
                if let Some(weight) = entry.weight {
                    lexicon.emphasis.max_bonus = weight;
                }
                continue;
            }

            let target = lexicon
                .categories
                .entry(category)
                .or_insert_with(|| CategoryLexicon::new(entry.weight.unwrap_or(0.1), &[], &[], ""));

            if let Some(weight) = entry.weight {
                target.weight = weight;
            }
            if let Some(keywords) = &entry.keywords {
                target.keywords = keywords.iter().cloned().collect();
            }
            if let Some(phrases) = &entry.phrases {
                target.phrases = phrases.iter().cloned().collect();
            }
        }

        lexicon.validate()?;
        Ok(lexicon)
    }

    /// 取得類別權重；強調回傳加成上限
    pub fn weight_for(&self, category: Category) -> f64 {
        match category {
            Category::Emphasis => self.emphasis.max_bonus,
            _ => self.categories.get(&category).map_or(0.0, |c| c.weight),
        }
    }

    /// 計算文字中某類別的命中次數
    pub fn matches_for(&self, category: Category, text: &str) -> u32 {
        match category {
            Category::Emphasis => {
                let shouted = text.split_whitespace().filter(|w| is_shouted(w)).count();
                (shouted + text.matches('!').count()) as u32
            }
            _ => self.matches_in_tokens(category, &tokenize(text), text),
        }
    }

    /// 以已切好的字詞計算命中次數
    pub(crate) fn matches_in_tokens(&self, category: Category, tokens: &[String], text: &str) -> u32 {
        let Some(entry) = self.categories.get(&category) else {
            return 0;
        };

        // 長片語優先，已被片語使用的字詞不再計入關鍵字
        let mut patterns: Vec<Vec<String>> = entry
            .phrases
            .iter()
            .chain(entry.keywords.iter())
            .map(|pattern| tokenize(pattern))
            .filter(|pattern| !pattern.is_empty())
            .collect();
        patterns.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut consumed = vec![false; tokens.len()];
        let mut hits = 0;
        for pattern in &patterns {
            hits += claim_sequence(tokens, pattern, &mut consumed);
        }
        for mark in entry.marks.chars() {
            hits += text.matches(mark).count();
        }

        hits as u32
    }

    /// 計算強調加成 (0.0 - max_bonus)
    pub fn emphasis_bonus(&self, text: &str) -> f64 {
        let rule = &self.emphasis;
        let words: Vec<&str> = text.split_whitespace().collect();

        let lettered = words
            .iter()
            .filter(|w| w.chars().any(char::is_alphabetic))
            .count();
        let caps_ratio = if lettered == 0 {
            0.0
        } else {
            words.iter().filter(|w| is_shouted(w)).count() as f64 / lettered as f64
        };

        let exclamations = text.matches('!').count().min(rule.max_exclamations);

        let bonus = caps_ratio * rule.caps_factor + exclamations as f64 * rule.exclamation_step;
        bonus.clamp(0.0, rule.max_bonus)
    }
}

/// 類別覆寫
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryOverride {
    pub weight: Option<f64>,
    pub keywords: Option<Vec<String>>,
    pub phrases: Option<Vec<String>>,
}

/// 詞庫覆寫設定，鍵為類別名稱
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LexiconOverrides {
    pub categories: BTreeMap<String, CategoryOverride>,
}

/// 切分字詞：轉小寫、去除前後標點
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            let word = word.replace('\u{2019}', "'");
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// 計算字詞序列出現次數，跳過已使用的字詞並標記新的命中
fn claim_sequence(tokens: &[String], pattern: &[String], consumed: &mut [bool]) -> usize {
    let len = pattern.len();
    if len == 0 || len > tokens.len() {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + len <= tokens.len() {
        if tokens[i..i + len] == *pattern && !consumed[i..i + len].iter().any(|used| *used) {
            consumed[i..i + len].iter_mut().for_each(|used| *used = true);
            count += 1;
            i += len;
        } else {
            i += 1;
        }
    }

    count
}

/// 是否為全大寫字詞（至少兩個字母）
fn is_shouted(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}
