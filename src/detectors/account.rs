//! Account identifier detection: credit cards, ABA routing numbers, IBANs,
//! SSNs, EINs, and BICs, each validated against its own checksum or format
//! rules before a span is emitted.

use lazy_static::lazy_static;
use regex::Regex;

use crate::checksum;
use crate::config::RedactionConfig;
use crate::constants::{CONFIDENCE_CHECKSUMMED, CONFIDENCE_FORMAT_ONLY};
use crate::span::{AccountSubtype, DetectorKind, Label, Span};

lazy_static! {
    static ref CC_PATTERN: Regex = Regex::new(r"\b\d(?:[ -]?\d){12,18}\b")
        .expect("CRITICAL: Credit card regex pattern is invalid - this should never fail");
    static ref ABA_PATTERN: Regex = Regex::new(r"\b\d{9}\b")
        .expect("CRITICAL: ABA regex pattern is invalid - this should never fail");
    static ref IBAN_PATTERN: Regex = Regex::new(r"\b[A-Z]{2}\d{2}[A-Za-z0-9]{11,30}\b")
        .expect("CRITICAL: IBAN regex pattern is invalid - this should never fail");
    static ref SSN_PATTERN: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b")
        .expect("CRITICAL: SSN regex pattern is invalid - this should never fail");
    static ref EIN_PATTERN: Regex = Regex::new(r"\b\d{2}-\d{7}\b")
        .expect("CRITICAL: EIN regex pattern is invalid - this should never fail");
    static ref BIC_PATTERN: Regex = Regex::new(r"\b[A-Z]{6}[A-Z0-9]{2}(?:[A-Z0-9]{3})?\b")
        .expect("CRITICAL: BIC regex pattern is invalid - this should never fail");
}

/// ISO 3166-1 alpha-2 codes accepted in IBAN and BIC country positions.
pub(crate) const COUNTRY_CODES: &[&str] = &[
    "AD", "AE", "AL", "AT", "AU", "AZ", "BA", "BE", "BG", "BH", "BR", "BY", "CA", "CH", "CN",
    "CR", "CY", "CZ", "DE", "DK", "DO", "EE", "EG", "ES", "FI", "FO", "FR", "GB", "GE", "GI",
    "GL", "GR", "GT", "HK", "HR", "HU", "IE", "IL", "IN", "IQ", "IS", "IT", "JO", "JP", "KW",
    "KZ", "LB", "LC", "LI", "LT", "LU", "LV", "MC", "MD", "ME", "MK", "MR", "MT", "MU", "MX",
    "NL", "NO", "NZ", "PK", "PL", "PS", "PT", "QA", "RO", "RS", "SA", "SC", "SE", "SG", "SI",
    "SK", "SM", "TL", "TN", "TR", "UA", "US", "VA", "VG", "XK",
];

fn country_code_valid(code: &str) -> bool {
    COUNTRY_CODES.contains(&code)
}

/// SSN area prefixes that are never issued.
fn ssn_forbidden(area: &str) -> bool {
    area == "000" || area == "666" || area.starts_with('9')
}

/// An all-letter 8-char word with a plausible country code is usually just a
/// word. Accept it only with a digit inside or a SWIFT/BIC cue nearby.
fn bic_in_context(text: &str, start: usize, candidate: &str) -> bool {
    if candidate.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    let window_start = crate::utils::floor_char_boundary(text, start.saturating_sub(24));
    let before = text[window_start..start].to_ascii_uppercase();
    before.contains("BIC") || before.contains("SWIFT")
}

fn push_unless_overlapping(spans: &mut Vec<Span>, span: Span) {
    if spans.iter().any(|s| s.overlaps(&span)) {
        return;
    }
    spans.push(span);
}

fn account_span(
    start: usize,
    end: usize,
    subtype: AccountSubtype,
    confidence: f32,
) -> Span {
    let mut span = Span::new(start, end, Label::AccountId, confidence, DetectorKind::Account);
    span.attrs.account_subtype = Some(subtype);
    span
}

pub fn detect(text: &str, _cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans = Vec::new();

    // IBAN first: it is the most specific shape and its tail could otherwise
    // be claimed as a bare digit run.
    for m in IBAN_PATTERN.find_iter(text) {
        let candidate = m.as_str();
        if country_code_valid(&candidate[..2]) && checksum::iban_valid(candidate) {
            push_unless_overlapping(
                &mut spans,
                account_span(m.start(), m.end(), AccountSubtype::Iban, CONFIDENCE_CHECKSUMMED),
            );
        }
    }

    for m in CC_PATTERN.find_iter(text) {
        if checksum::luhn_valid(m.as_str()) {
            push_unless_overlapping(
                &mut spans,
                account_span(m.start(), m.end(), AccountSubtype::Cc, CONFIDENCE_CHECKSUMMED),
            );
        }
    }

    for m in SSN_PATTERN.find_iter(text) {
        if !ssn_forbidden(&m.as_str()[..3]) {
            push_unless_overlapping(
                &mut spans,
                account_span(m.start(), m.end(), AccountSubtype::Ssn, CONFIDENCE_CHECKSUMMED),
            );
        }
    }

    for m in EIN_PATTERN.find_iter(text) {
        push_unless_overlapping(
            &mut spans,
            account_span(m.start(), m.end(), AccountSubtype::Ein, CONFIDENCE_FORMAT_ONLY),
        );
    }

    for m in ABA_PATTERN.find_iter(text) {
        if checksum::aba_valid(m.as_str()) {
            push_unless_overlapping(
                &mut spans,
                account_span(m.start(), m.end(), AccountSubtype::Aba, CONFIDENCE_CHECKSUMMED),
            );
        }
    }

    for m in BIC_PATTERN.find_iter(text) {
        let candidate = m.as_str();
        if country_code_valid(&candidate[4..6]) && bic_in_context(text, m.start(), candidate) {
            push_unless_overlapping(
                &mut spans,
                account_span(m.start(), m.end(), AccountSubtype::Bic, CONFIDENCE_FORMAT_ONLY),
            );
        }
    }

    spans
}
