//! Weighted bilingual language detection.
//!
//! Tokens are scored against four hand-curated lexicons (high tier weighs 3,
//! medium tier weighs 1) and a handful of orthographic patterns add flat
//! bonuses. Ties and empty evidence resolve to English.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::Language;

pub const GERMAN_HIGH: &[&str] = &[
    "der",
    "die",
    "das",
    "und",
    "ich",
    "ist",
    "mit",
    "für",
    "haben",
    "öffnungszeiten",
    "spielplatz",
    "barrierefreiheit",
    "rollstuhl",
    "geöffnet",
    "sicherheit",
];

pub const GERMAN_MEDIUM: &[&str] = &[
    "zu",
    "auf",
    "von",
    "eine",
    "ein",
    "kann",
    "wird",
    "kaffee",
    "vegetarisch",
    "einrichtungen",
    "geschäft",
];

pub const ENGLISH_HIGH: &[&str] = &[
    "the",
    "and",
    "are",
    "you",
    "what",
    "how",
    "opening",
    "hours",
    "playground",
    "accessibility",
    "wheelchair",
    "facilities",
    "safety",
];

pub const ENGLISH_MEDIUM: &[&str] = &[
    "is",
    "have",
    "with",
    "that",
    "this",
    "can",
    "will",
    "coffee",
    "vegetarian",
    "business",
    "equipment",
];

const HIGH_WEIGHT: u32 = 3;
const MEDIUM_WEIGHT: u32 = 1;
const CONFIDENT_THRESHOLD: f64 = 0.7;

static GERMAN_DIACRITIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[üöäß]").expect("valid diacritic regex"));
static GERMAN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:heit|keit|ung)\b").expect("valid suffix regex"));
static GERMAN_SCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bsch\w+").expect("valid sch regex"));
static ENGLISH_ING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+ing\b").expect("valid ing regex"));
static ENGLISH_TION_LY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w+(?:tion|ly)\b").expect("valid tion/ly regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub language: Language,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub language: Language,
    pub confidence: f64,
    pub is_confident: bool,
    pub text_length: usize,
    pub word_count: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Scores {
    german: u32,
    english: u32,
}

pub fn detect(text: &str) -> Language {
    detect_with_confidence(text).language
}

pub fn detect_with_confidence(text: &str) -> Detection {
    let trimmed = text.trim();
    if trimmed.chars().count() < 2 {
        return Detection {
            language: Language::En,
            confidence: 1.0,
        };
    }

    let lower = trimmed.to_lowercase();
    let scores = score(&lower);

    if scores.german == 0 && scores.english == 0 {
        let language = if GERMAN_DIACRITIC.is_match(&lower) {
            Language::De
        } else {
            Language::En
        };
        return Detection {
            language,
            confidence: 0.5,
        };
    }

    let language = if scores.german > scores.english {
        Language::De
    } else {
        Language::En
    };
    let total = f64::from(scores.german + scores.english);
    let confidence = f64::from(scores.german.max(scores.english)) / total;

    Detection {
        language,
        confidence,
    }
}

pub fn language_info(text: &str) -> LanguageInfo {
    let detection = detect_with_confidence(text);
    LanguageInfo {
        language: detection.language,
        confidence: detection.confidence,
        is_confident: detection.confidence > CONFIDENT_THRESHOLD,
        text_length: text.trim().chars().count(),
        word_count: text.unicode_words().count(),
    }
}

pub fn detect_batch<'a, I>(texts: I) -> HashMap<String, Language>
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .map(|text| (text.to_string(), detect(text)))
        .collect()
}

fn score(lower: &str) -> Scores {
    let mut scores = Scores::default();

    for word in lower.unicode_words() {
        if GERMAN_HIGH.contains(&word) {
            scores.german += HIGH_WEIGHT;
        } else if GERMAN_MEDIUM.contains(&word) {
            scores.german += MEDIUM_WEIGHT;
        } else if ENGLISH_HIGH.contains(&word) {
            scores.english += HIGH_WEIGHT;
        } else if ENGLISH_MEDIUM.contains(&word) {
            scores.english += MEDIUM_WEIGHT;
        }
    }

    if GERMAN_DIACRITIC.is_match(lower) {
        scores.german += 2;
    }
    if GERMAN_SUFFIX.is_match(lower) {
        scores.german += 1;
    }
    if GERMAN_SCH.is_match(lower) {
        scores.german += 1;
    }
    if ENGLISH_ING.is_match(lower) {
        scores.english += 1;
    }
    if ENGLISH_TION_LY.is_match(lower) {
        scores.english += 1;
    }

    scores
}
