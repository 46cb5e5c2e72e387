//! Quality Assessor: cheap OCR-garbage heuristics over recognized text.
//!
//! Knows nothing about providers or pages. Starts at 100 and applies fixed
//! deductions; always returns a report.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters outside word characters, whitespace and common punctuation.
static DISALLOWED_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^A-Za-z0-9_\s.,!?;:\-()"]"#).unwrap());

/// Score deductions.
pub mod deductions {
    pub const SHORT_TEXT: i32 = 30;
    pub const SHORT_WORDS: i32 = 20;
    pub const DISALLOWED_CHARS: i32 = 15;
    pub const REPEATED_RUN: i32 = 25;
    pub const NO_VALID_WORD: i32 = 40;
}

const MIN_TEXT_LENGTH: usize = 50;
const MIN_AVG_WORD_LENGTH: f32 = 3.0;
const REPEATED_RUN_LENGTH: usize = 4;
const MIN_VALID_WORD_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Length in characters.
    pub text_length: usize,
    pub word_count: usize,
    /// Characters per word, one decimal.
    pub avg_word_length: f32,
    pub has_special_chars: bool,
    pub has_repeated_chars: bool,
    pub has_valid_words: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0-100.
    pub score: u8,
    pub metrics: QualityMetrics,
}

impl QualityReport {
    /// Score on the 0.0-1.0 scale the parser takes.
    pub fn fraction(&self) -> f32 {
        f32::from(self.score) / 100.0
    }
}

pub fn assess_text_quality(text: &str) -> QualityReport {
    let text_length = text.chars().count();
    let word_count = text.split_whitespace().count();
    let avg_word_length = if word_count > 0 {
        text_length as f32 / word_count as f32
    } else {
        0.0
    };

    let has_special_chars = DISALLOWED_CHAR.is_match(text);
    let has_repeated_chars = has_repeated_run(text, REPEATED_RUN_LENGTH);
    let has_valid_words = has_alphabetic_word(text, MIN_VALID_WORD_LENGTH);

    let mut score: i32 = 100;
    // Repeated runs are already penalized and never make text long enough.
    if length_outside_runs(text, REPEATED_RUN_LENGTH) < MIN_TEXT_LENGTH {
        score -= deductions::SHORT_TEXT;
    }
    if avg_word_length < MIN_AVG_WORD_LENGTH {
        score -= deductions::SHORT_WORDS;
    }
    if has_special_chars {
        score -= deductions::DISALLOWED_CHARS;
    }
    if has_repeated_chars {
        score -= deductions::REPEATED_RUN;
    }
    if !has_valid_words {
        score -= deductions::NO_VALID_WORD;
    }

    QualityReport {
        score: score.clamp(0, 100) as u8,
        metrics: QualityMetrics {
            text_length,
            word_count,
            avg_word_length: (avg_word_length * 10.0).round() / 10.0,
            has_special_chars,
            has_repeated_chars,
            has_valid_words,
        },
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// `run` or more consecutive identical characters. Line terminators never count.
fn has_repeated_run(text: &str, run: usize) -> bool {
    let mut previous: Option<char> = None;
    let mut length = 0;
    for c in text.chars() {
        if is_line_terminator(c) {
            previous = None;
            length = 0;
            continue;
        }
        if previous == Some(c) {
            length += 1;
        } else {
            previous = Some(c);
            length = 1;
        }
        if length >= run {
            return true;
        }
    }
    false
}

/// Characters not belonging to a run of `run` or more identical characters.
fn length_outside_runs(text: &str, run: usize) -> usize {
    let mut total = 0;
    let mut previous: Option<char> = None;
    let mut length = 0;
    for c in text.chars() {
        if previous == Some(c) && !is_line_terminator(c) {
            length += 1;
            continue;
        }
        if length < run {
            total += length;
        }
        previous = Some(c);
        length = 1;
    }
    if length < run {
        total += length;
    }
    total
}

/// Some ASCII word (`[A-Za-z0-9_]` run) made only of letters, at least `min` long.
fn has_alphabetic_word(text: &str, min: usize) -> bool {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word.len() >= min && word.bytes().all(|b| b.is_ascii_alphabetic()))
}
