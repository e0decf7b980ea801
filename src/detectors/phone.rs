//! Phone number detection: North American Numbering Plan plus E.164.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::constants::CONFIDENCE_PHONE;
use crate::span::{DetectorKind, Label, Span};

lazy_static! {
    static ref NANP_PATTERN: Regex =
        Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b")
            .expect("CRITICAL: Phone regex pattern is invalid - this should never fail");
    static ref E164_PATTERN: Regex = Regex::new(r"\+[1-9]\d{1,2}[-.\s]?\d{2,4}[-.\s]?\d{3,4}[-.\s]?\d{2,4}\b")
        .expect("CRITICAL: E.164 regex pattern is invalid - this should never fail");
}

fn digits_of(s: &str) -> Vec<char> {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn all_digits_identical(s: &str) -> bool {
    let digits = digits_of(s);
    match digits.first() {
        Some(first) => digits.iter().all(|d| d == first),
        None => true,
    }
}

pub fn detect(text: &str, _cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans = Vec::new();
    for pattern in [&*E164_PATTERN, &*NANP_PATTERN] {
        for m in pattern.find_iter(text) {
            let candidate = m.as_str();
            // Do not bite the tail off a longer digit run.
            if text[..m.start()]
                .chars()
                .next_back()
                .map(|c| c.is_ascii_digit())
                .unwrap_or(false)
            {
                continue;
            }
            let digit_count = digits_of(candidate).len();
            if !(7..=15).contains(&digit_count) {
                continue;
            }
            if all_digits_identical(candidate) {
                continue;
            }
            // A leading '(' needs its ')' inside the match.
            if candidate.contains('(') != candidate.contains(')') {
                continue;
            }
            let span = Span::new(
                m.start(),
                m.end(),
                Label::Phone,
                CONFIDENCE_PHONE,
                DetectorKind::Phone,
            );
            if spans.iter().any(|s: &Span| s.overlaps(&span)) {
                continue;
            }
            spans.push(span);
        }
    }
    spans
}
