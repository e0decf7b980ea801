//! Email address detection (RFC-5322-compatible local and domain parts).

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::span::{DetectorKind, Label, Span};

lazy_static! {
    // Requires a dot in the domain; the trailing TLD run keeps terminal
    // punctuation out of the match.
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}\b")
            .expect("CRITICAL: Email regex pattern is invalid - this should never fail");
}

pub fn detect(text: &str, _cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans = Vec::new();
    for m in EMAIL_PATTERN.find_iter(text) {
        let mut candidate = m.as_str();
        let mut end = m.end();
        // A local part cannot start with a dot; trim a leading one that the
        // word boundary let through.
        while candidate.starts_with('.') {
            candidate = &candidate[1..];
        }
        // Trailing dots are sentence punctuation, not part of the address.
        while candidate.ends_with('.') {
            candidate = &candidate[..candidate.len() - 1];
            end -= 1;
        }
        let start = end - candidate.len();
        spans.push(Span::new(start, end, Label::Email, 1.0, DetectorKind::Email));
    }
    spans
}
