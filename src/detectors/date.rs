//! Date detection and DOB promotion.
//!
//! Recognized forms: `M/D/YYYY`, `YYYY-MM-DD`, `Month D, YYYY`, and
//! `D Month YYYY`. Each span records the strftime string needed to
//! re-render a shifted date in the original's format.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::constants::{CONFIDENCE_DATE, DOB_TRIGGER_WINDOW};
use crate::span::{DetectorKind, Label, Span};
use crate::utils::floor_char_boundary;

const MONTH_NAMES: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

lazy_static! {
    static ref SLASH_DATE: Regex = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b")
        .expect("CRITICAL: Slash date regex pattern is invalid - this should never fail");
    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b")
        .expect("CRITICAL: ISO date regex pattern is invalid - this should never fail");
    static ref MONTH_DAY_YEAR: Regex = Regex::new(&format!(
        r"\b({MONTH_NAMES}) (\d{{1,2}}), (\d{{4}})\b"
    ))
    .expect("CRITICAL: Month-day-year regex pattern is invalid - this should never fail");
    static ref DAY_MONTH_YEAR: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}}) ({MONTH_NAMES}) (\d{{4}})\b"
    ))
    .expect("CRITICAL: Day-month-year regex pattern is invalid - this should never fail");
    static ref DOB_TRIGGER: Regex =
        Regex::new(r"(?i)\bD\.\s?O\.\s?B\.?|\bDOB\b|\bdate of birth\b|\bborn on\b|\bborn:")
            .expect("CRITICAL: DOB trigger regex pattern is invalid - this should never fail");
}

fn month_number(name: &str) -> Option<u32> {
    let months = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    months
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

fn plausible_date(year: i32, month: u32, day: u32) -> bool {
    (1000..=2999).contains(&year)
        && (1..=12).contains(&month)
        && chrono::NaiveDate::from_ymd_opt(year, month, day).is_some()
}

fn date_span(start: usize, end: usize, format: &str) -> Span {
    let mut span = Span::new(start, end, Label::DateGeneric, CONFIDENCE_DATE, DetectorKind::Date);
    span.attrs.date_format = Some(format.to_string());
    span
}

pub fn detect(text: &str, _cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let push = |span: Span, spans: &mut Vec<Span>| {
        if !spans.iter().any(|s| s.overlaps(&span)) {
            spans.push(span);
        }
    };

    for cap in MONTH_DAY_YEAR.captures_iter(text) {
        let m = cap.get(0).expect("capture 0 always present");
        let month = month_number(&cap[1]).unwrap_or(0);
        let (day, year) = (cap[2].parse().unwrap_or(0), cap[3].parse().unwrap_or(0));
        if plausible_date(year, month, day) {
            push(date_span(m.start(), m.end(), "%B %-d, %Y"), &mut spans);
        }
    }

    for cap in DAY_MONTH_YEAR.captures_iter(text) {
        let m = cap.get(0).expect("capture 0 always present");
        let month = month_number(&cap[2]).unwrap_or(0);
        let (day, year) = (cap[1].parse().unwrap_or(0), cap[3].parse().unwrap_or(0));
        if plausible_date(year, month, day) {
            push(date_span(m.start(), m.end(), "%-d %B %Y"), &mut spans);
        }
    }

    for cap in ISO_DATE.captures_iter(text) {
        let m = cap.get(0).expect("capture 0 always present");
        let (year, month, day) = (
            cap[1].parse().unwrap_or(0),
            cap[2].parse().unwrap_or(0),
            cap[3].parse().unwrap_or(0),
        );
        if plausible_date(year, month, day) {
            push(date_span(m.start(), m.end(), "%Y-%m-%d"), &mut spans);
        }
    }

    for cap in SLASH_DATE.captures_iter(text) {
        let m = cap.get(0).expect("capture 0 always present");
        let (month, day, year) = (
            cap[1].parse().unwrap_or(0),
            cap[2].parse().unwrap_or(0),
            cap[3].parse().unwrap_or(0),
        );
        if plausible_date(year, month, day) {
            let format = if cap[1].len() == 2 && cap[2].len() == 2 {
                "%m/%d/%Y"
            } else {
                "%-m/%-d/%Y"
            };
            push(date_span(m.start(), m.end(), format), &mut spans);
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// Promote `DATE_GENERIC` spans to `DOB` when a birth trigger appears
/// within the configured window before or after the date.
pub fn upgrade_dob(text: &str, spans: &mut [Span]) {
    for span in spans.iter_mut() {
        if span.label != Label::DateGeneric {
            continue;
        }
        let lo = floor_char_boundary(text, span.start.saturating_sub(DOB_TRIGGER_WINDOW));
        let hi = crate::utils::ceil_char_boundary(text, (span.end + DOB_TRIGGER_WINDOW).min(text.len()));
        if DOB_TRIGGER.is_match(&text[lo..hi]) {
            span.label = Label::Dob;
        }
    }
}
