//! Local word-count heuristics used when the gender model call fails or its reply is not JSON.
//!
//! Case-insensitive whole-word matches only; no provider involved. Word boundaries are
//! ASCII, so a non-ASCII letter next to a marker still counts as a boundary.

use crate::types::{CommunicationStyle, EmotionalLevel};
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECT_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?-u:\b)(need|want|should|must|do|don't)(?-u:\b)")
        .expect("direct-word pattern")
});

static REFLECTIVE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?-u:\b)(feel|think|believe|wonder|maybe)(?-u:\b)")
        .expect("reflective-word pattern")
});

static EMOTION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?-u:\b)(happy|sad|angry|excited|worried|concerned|love|hate)(?-u:\b)")
        .expect("emotion-word pattern")
});

/// Above this many emotion words the level is high.
const HIGH_EMOTION_THRESHOLD: usize = 5;
/// Above this many (and not above the high threshold) the level is moderate.
const MODERATE_EMOTION_THRESHOLD: usize = 2;

/// More directive words than reflective ones => direct; the reverse => emotional; a tie => factual.
pub fn communication_style(message: &str) -> CommunicationStyle {
    let direct = DIRECT_WORDS.find_iter(message).count();
    let reflective = REFLECTIVE_WORDS.find_iter(message).count();
    match direct.cmp(&reflective) {
        std::cmp::Ordering::Greater => CommunicationStyle::Direct,
        std::cmp::Ordering::Less => CommunicationStyle::Emotional,
        std::cmp::Ordering::Equal => CommunicationStyle::Factual,
    }
}

pub fn emotional_level(message: &str) -> EmotionalLevel {
    let count = EMOTION_WORDS.find_iter(message).count();
    if count > HIGH_EMOTION_THRESHOLD {
        EmotionalLevel::High
    } else if count > MODERATE_EMOTION_THRESHOLD {
        EmotionalLevel::Moderate
    } else {
        EmotionalLevel::Low
    }
}
