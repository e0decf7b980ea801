//! Person name detection: capitalization grammar with honorific anchors and
//! a false-positive suppression list.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::constants::{CONFIDENCE_PERSON_BARE, CONFIDENCE_PERSON_TITLED};
use crate::span::{DetectorKind, Label, Span};

lazy_static! {
    // Two name tokens with an optional middle initial. Tokens allow interior
    // apostrophes and hyphens (O'Brien, Smith-Jones) and all-caps forms.
    static ref NAME_PATTERN: Regex = Regex::new(
        r"\b[A-Z][A-Za-z]*(?:['-][A-Z][A-Za-z]*)* (?:[A-Z]\. )?[A-Z][A-Za-z]*(?:['-][A-Z][A-Za-z]*)*\b"
    )
    .expect("CRITICAL: Name regex pattern is invalid - this should never fail");
    static ref TITLE_NAME_PATTERN: Regex = Regex::new(
        r"\b(?:Mr\.|Mrs\.|Ms\.|Dr\.|Prof\.|Judge|Justice|Attorney|Counselor)\s+([A-Z][A-Za-z]*(?:['-][A-Z][A-Za-z]*)*(?: (?:[A-Z]\. )?[A-Z][A-Za-z]*(?:['-][A-Z][A-Za-z]*)*)?)"
    )
    .expect("CRITICAL: Title name regex pattern is invalid - this should never fail");
}

/// Legal/geographic phrases that match the name grammar but are not people.
const FALSE_POSITIVES: &[&str] = &[
    "United States",
    "New York",
    "Los Angeles",
    "San Francisco",
    "First Amendment",
    "Second Circuit",
    "Third Party",
    "Fourth Quarter",
    "Fifth Avenue",
    "Sixth Street",
    "Federal Court",
    "Supreme Court",
    "District Court",
    "Circuit Court",
    "Credit Union",
    "Due Diligence",
    "Purchase Agreement",
];

/// A second token from this set means the "name" is an organization head.
const ORG_TAIL_WORDS: &[&str] = &[
    "Inc", "LLC", "LLP", "Ltd", "Corp", "Corporation", "Incorporated", "Company", "Bank",
    "Trust", "Savings", "Bancorp", "Group", "Partners", "Associates", "Holdings", "Limited",
    "GmbH", "PLC",
];

/// A final token from this set means the "name" is a street ("Main St").
const STREET_TAIL_WORDS: &[&str] = &[
    "Street", "St", "Avenue", "Ave", "Road", "Rd", "Boulevard", "Blvd", "Lane", "Ln",
    "Drive", "Dr", "Court", "Ct", "Circle", "Cir", "Place", "Pl", "Plaza", "Way",
    "Parkway", "Pkwy", "Terrace", "Ter", "Highway", "Hwy",
];

/// Capitalized sentence-position words that glue themselves onto a
/// following name ("Witness John Doe", "Whereas Jane Roe ...").
const STOP_FIRST_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Whereas", "Witness", "Dear", "From", "Subject", "Re",
    "To", "By", "On", "In", "At", "For", "And", "But", "Signed", "Exhibit", "Section",
    "Article", "Between", "Among", "Later", "Then", "Now", "Today", "Meanwhile", "However",
    "Moreover", "Further", "Furthermore", "Finally", "Next", "Soon", "Yesterday", "Tomorrow",
    "Herein", "Hereby", "Thereafter", "Accordingly", "Maybe", "Perhaps", "Defendant",
    "Plaintiff", "Appellant", "Respondent", "Petitioner", "Intervenor", "Movant", "Debtor",
    "Creditor", "Guarantor", "Borrower", "Lender", "Trustee", "Executor", "Contact",
    "Attn", "Attention", "Sincerely", "Regards",
];

fn is_false_positive(candidate: &str, cfg: &RedactionConfig) -> bool {
    if FALSE_POSITIVES
        .iter()
        .any(|fp| candidate.eq_ignore_ascii_case(fp))
    {
        return true;
    }
    if cfg
        .detectors
        .exclusions
        .iter()
        .any(|t| candidate.eq_ignore_ascii_case(t))
    {
        return true;
    }
    if candidate
        .split_whitespace()
        .any(|tok| ORG_TAIL_WORDS.iter().any(|w| tok.trim_end_matches('.') == *w))
    {
        return true;
    }
    candidate
        .split_whitespace()
        .last()
        .map(|tok| STREET_TAIL_WORDS.iter().any(|w| tok.trim_end_matches('.') == *w))
        .unwrap_or(false)
}

/// The token right after a candidate decides org-ness too: "Acme Widget
/// Company" must not yield the person "Acme Widget".
fn followed_by_org_word(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start_matches([' ', ',']);
    let next: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '.')
        .collect();
    ORG_TAIL_WORDS
        .iter()
        .any(|w| next.trim_end_matches('.') == *w)
}

pub fn detect(text: &str, cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();

    for cap in TITLE_NAME_PATTERN.captures_iter(text) {
        if let Some(name) = cap.get(1) {
            if is_false_positive(name.as_str(), cfg) || followed_by_org_word(text, name.end()) {
                continue;
            }
            spans.push(Span::new(
                name.start(),
                name.end(),
                Label::Person,
                CONFIDENCE_PERSON_TITLED,
                DetectorKind::Person,
            ));
        }
    }

    for m in NAME_PATTERN.find_iter(text) {
        let mut start = m.start();
        let mut end = m.end();
        let mut candidate = m.as_str();
        // Shed leading sentence-position words and re-anchor the match, so
        // "Witness John Q. Public" yields "John Q. Public".
        loop {
            let first = candidate.split(' ').next().unwrap_or("");
            if !STOP_FIRST_WORDS.contains(&first) {
                break;
            }
            let adjusted = start + first.len() + 1;
            match NAME_PATTERN.find_at(text, adjusted) {
                Some(nm) if nm.start() == adjusted => {
                    start = nm.start();
                    end = nm.end();
                    candidate = nm.as_str();
                }
                _ => {
                    candidate = "";
                    break;
                }
            }
        }
        if candidate.is_empty() {
            continue;
        }
        if is_false_positive(candidate, cfg) || followed_by_org_word(text, end) {
            continue;
        }
        // Single-letter tokens without a dot read as initials of something
        // else; require real word tokens at both ends.
        let tokens: Vec<&str> = candidate.split(' ').collect();
        if tokens.first().map_or(true, |t| t.len() < 2)
            || tokens.last().map_or(true, |t| t.len() < 2)
        {
            continue;
        }
        let span = Span::new(
            start,
            end,
            Label::Person,
            CONFIDENCE_PERSON_BARE,
            DetectorKind::Person,
        );
        if spans.iter().any(|s| s.overlaps(&span)) {
            continue;
        }
        spans.push(span);
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_all(text: &str) -> Vec<Span> {
        detect(text, &RedactionConfig::default())
    }

    #[test]
    fn detects_two_token_names() {
        let text = "John Doe signed the agreement.";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text(text), "John Doe");
        assert_eq!(spans[0].confidence, CONFIDENCE_PERSON_BARE);
    }

    #[test]
    fn detects_middle_initial_and_punctuated_names() {
        let text = "Among them, John Q. Public and Mary O'Brien-Smith attended.";
        let spans = detect_all(text);
        let texts: Vec<&str> = spans.iter().map(|s| s.text(text)).collect();
        assert!(texts.contains(&"John Q. Public"));
        assert!(texts.contains(&"Mary O'Brien-Smith"));
    }

    #[test]
    fn title_anchored_names_score_higher() {
        let text = "Judge Amy Berman presided.";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].confidence, CONFIDENCE_PERSON_TITLED);
    }

    #[test]
    fn suppresses_legal_phrases() {
        assert!(detect_all("The Supreme Court and the United States agree.").is_empty());
    }

    #[test]
    fn rejects_org_shaped_candidates() {
        assert!(detect_all("Acme Corporation filed suit.").is_empty());
        assert!(detect_all("Acme Widget Company filed suit.").is_empty());
    }

    #[test]
    fn all_caps_names_detected() {
        let text = "Signed: JOHN DOE";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text(text), "JOHN DOE");
    }

    #[test]
    fn config_exclusions_apply() {
        let mut cfg = RedactionConfig::default();
        cfg.detectors.exclusions.push("Jane Roe".into());
        assert!(detect("Jane Roe appeared.", &cfg).is_empty());
    }
}
