//! Organization and bank detection: lexicon-driven proper-noun matcher.
//!
//! Proper-noun runs ending in a legal suffix become `GENERIC_ORG`;
//! bank-indicative keywords promote the span to `BANK_ORG`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::constants::CONFIDENCE_ORG;
use crate::span::{DetectorKind, Label, Span};

lazy_static! {
    // Longer alternatives first so e.g. "Incorporated" is not split at "Inc".
    static ref ORG_SUFFIX_PATTERN: Regex = Regex::new(
        r"(?:[A-Z][A-Za-z&'-]*,? +){1,5}(?:Corporation|Incorporated|Associates|Partners|Holdings|Company|Limited|GmbH|Inc|LLC|LLP|Ltd|Corp|PLC|Co|N\.A\.|S\.A\.)\.?"
    )
    .expect("CRITICAL: Org suffix regex pattern is invalid - this should never fail");
    static ref BANK_KEYWORD_PATTERN: Regex = Regex::new(
        r"(?:[A-Z][A-Za-z&'-]* +){1,5}(?:Credit Union|Bancorp|Bank|Trust|Savings)(?: +(?:of|for) +[A-Z][A-Za-z'-]*(?: +[A-Z][A-Za-z'-]*){0,3})?"
    )
    .expect("CRITICAL: Bank keyword regex pattern is invalid - this should never fail");
    static ref BANK_INDICATOR: Regex = Regex::new(r"\b(?:Bank|Trust|Savings|Bancorp|Credit Union)\b")
        .expect("CRITICAL: Bank indicator regex pattern is invalid - this should never fail");
}

/// Common legal-domain phrases that look like organizations but are not.
const FALSE_POSITIVES: &[&str] = &[
    "Supreme Court",
    "District Court",
    "Circuit Court",
    "Federal Court",
    "Court of Appeals",
    "United States",
    "State of New York",
];

fn is_excluded(candidate: &str, cfg: &RedactionConfig) -> bool {
    FALSE_POSITIVES
        .iter()
        .any(|fp| candidate.eq_ignore_ascii_case(fp))
        || cfg
            .detectors
            .exclusions
            .iter()
            .any(|t| candidate.eq_ignore_ascii_case(t))
}

/// Reject matches the regex engine could not bound itself (a trailing
/// optional dot with an alphanumeric right after means we cut a word).
fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || !text[..start]
            .chars()
            .next_back()
            .map(|c| c.is_alphanumeric())
            .unwrap_or(false);
    let after_ok = end >= text.len()
        || !text[end..]
            .chars()
            .next()
            .map(|c| c.is_alphanumeric())
            .unwrap_or(false);
    before_ok && after_ok
}

pub fn detect(text: &str, cfg: &RedactionConfig) -> Vec<Span> {
    let mut raw: Vec<(usize, usize)> = Vec::new();
    for pattern in [&*ORG_SUFFIX_PATTERN, &*BANK_KEYWORD_PATTERN] {
        for m in pattern.find_iter(text) {
            let (start, end) = (m.start(), m.end());
            if !word_bounded(text, start, end) {
                continue;
            }
            // "Chase Bank, N.A." matches both patterns; keep the union.
            if let Some(existing) = raw.iter_mut().find(|(s, e)| start < *e && *s < end) {
                existing.0 = existing.0.min(start);
                existing.1 = existing.1.max(end);
            } else {
                raw.push((start, end));
            }
        }
    }
    raw.sort_unstable();

    let mut spans = Vec::new();
    for (start, end) in raw {
        let candidate = &text[start..end];
        if is_excluded(candidate.trim_end_matches('.'), cfg) || is_excluded(candidate, cfg) {
            continue;
        }
        let label = if BANK_INDICATOR.is_match(candidate) {
            Label::BankOrg
        } else {
            Label::GenericOrg
        };
        spans.push(Span::new(start, end, label, CONFIDENCE_ORG, DetectorKind::Org));
    }
    spans
}
