//! Legal alias definitions: `hereinafter`, `a/k/a`, `f/k/a`, `d/b/a`,
//! `also known as`. Only the alias term itself is captured; the preceding
//! subject name, when present, is recorded as an attribute for the linker.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::constants::{ALIAS_SUBJECT_WINDOW, CONFIDENCE_ALIAS};
use crate::span::{DetectorKind, Label, Span};
use crate::utils::floor_char_boundary;

lazy_static! {
    // Quoted alias: hereinafter "Buyer" / (the "Buyer") / a/k/a "Morgan".
    static ref QUOTED_ALIAS: Regex = Regex::new(
        r#"\b(?i:hereinafter|a/k/a|f/k/a|d/b/a|also known as)\b[^"\n]{0,30}?"([^"\n]{1,60})""#
    )
    .expect("CRITICAL: Quoted alias regex pattern is invalid - this should never fail");
    // Bare alias: a/k/a Morgan (title-cased run, no quotes). The
    // case-insensitivity is scoped to the marker so the captured term
    // stays a proper-noun run.
    static ref BARE_ALIAS: Regex = Regex::new(
        r"\b(?i:a/k/a|f/k/a|d/b/a|also known as)\b[ \t]+([A-Z][A-Za-z'-]*(?:[ \t]+[A-Z][A-Za-z'-]*){0,3})"
    )
    .expect("CRITICAL: Bare alias regex pattern is invalid - this should never fail");
    // Defined-term parenthetical: John Doe ("Morgan") / (the "Buyer").
    static ref PAREN_ALIAS: Regex = Regex::new(r#"\((?:the[ \t]+)?"([^"\n]{1,60})"\)"#)
        .expect("CRITICAL: Paren alias regex pattern is invalid - this should never fail");
    // Nearest name-shaped run before the alias construct.
    static ref PRECEDING_SUBJECT: Regex = Regex::new(
        r"[A-Z][A-Za-z'-]*(?:[ \t]+(?:[A-Z]\.[ \t]+)?[A-Z][A-Za-z'-]*){1,3}"
    )
    .expect("CRITICAL: Alias subject regex pattern is invalid - this should never fail");
}

/// Last name-shaped run in the window before `alias_start`, with the gap
/// separating it from the alias construct.
fn preceding_subject_with_gap(text: &str, alias_start: usize) -> Option<(String, String)> {
    let lo = floor_char_boundary(text, alias_start.saturating_sub(ALIAS_SUBJECT_WINDOW));
    let window = &text[lo..alias_start];
    PRECEDING_SUBJECT.find_iter(window).last().map(|m| {
        (
            m.as_str().trim().to_string(),
            window[m.end()..].to_string(),
        )
    })
}

/// Last name-shaped run in the window before `alias_start`.
fn preceding_subject(text: &str, alias_start: usize) -> Option<String> {
    preceding_subject_with_gap(text, alias_start).map(|(subject, _)| subject)
}

pub fn detect(text: &str, _cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();

    for cap in QUOTED_ALIAS.captures_iter(text) {
        let whole = cap.get(0).expect("capture 0 always present");
        if let Some(term) = cap.get(1) {
            let mut span = Span::new(
                term.start(),
                term.end(),
                Label::AliasLabel,
                CONFIDENCE_ALIAS,
                DetectorKind::Alias,
            );
            span.attrs.alias_subject = preceding_subject(text, whole.start());
            spans.push(span);
        }
    }

    // Parenthetical defined terms count only when a name-shaped subject
    // immediately precedes them; bare quoted parentheticals in running
    // prose ("Agreement") are definitions of things, not aliases.
    for cap in PAREN_ALIAS.captures_iter(text) {
        let whole = cap.get(0).expect("capture 0 always present");
        let Some((subject, gap)) = preceding_subject_with_gap(text, whole.start()) else {
            continue;
        };
        if !gap.trim().is_empty() {
            continue;
        }
        if let Some(term) = cap.get(1) {
            if spans.iter().any(|s| s.start < term.end() && term.start() < s.end) {
                continue;
            }
            let mut span = Span::new(
                term.start(),
                term.end(),
                Label::AliasLabel,
                CONFIDENCE_ALIAS,
                DetectorKind::Alias,
            );
            span.attrs.alias_subject = Some(subject);
            spans.push(span);
        }
    }

    for cap in BARE_ALIAS.captures_iter(text) {
        let whole = cap.get(0).expect("capture 0 always present");
        if let Some(term) = cap.get(1) {
            let span_range = (term.start(), term.end());
            if spans
                .iter()
                .any(|s| s.start < span_range.1 && span_range.0 < s.end)
            {
                continue;
            }
            let mut span = Span::new(
                term.start(),
                term.end(),
                Label::AliasLabel,
                CONFIDENCE_ALIAS,
                DetectorKind::Alias,
            );
            span.attrs.alias_subject = preceding_subject(text, whole.start());
            spans.push(span);
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}
