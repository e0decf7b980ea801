//! Postal address detection: line-level grammar (US conventions) plus the
//! merger that promotes adjacent lines into `ADDRESS_BLOCK` spans.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::RedactionConfig;
use crate::constants::CONFIDENCE_ADDRESS_LINE;
use crate::span::{AddressLineKind, DetectorKind, Label, Span};

lazy_static! {
    static ref STREET_LINE: Regex = Regex::new(
        r"(?m)^[ \t]*\d{1,6}[ \t]+(?:[A-Z][A-Za-z'.-]*[ \t]+){0,4}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Circle|Cir|Place|Pl|Plaza|Way|Parkway|Pkwy|Terrace|Ter|Highway|Hwy)\.?(?:[ \t]+(?:N|S|E|W|NE|NW|SE|SW))?\.?[ \t]*\r?$"
    )
    .expect("CRITICAL: Street line regex pattern is invalid - this should never fail");
    static ref UNIT_LINE: Regex = Regex::new(
        r"(?m)^[ \t]*(?:Apt|Apartment|Suite|Ste|Unit|Floor|Fl|Room|Rm|#)\.?[ \t]*[A-Za-z0-9-]+[ \t]*\r?$"
    )
    .expect("CRITICAL: Unit line regex pattern is invalid - this should never fail");
    static ref CITY_STATE_ZIP_LINE: Regex = Regex::new(
        r"(?m)^[ \t]*[A-Z][A-Za-z .'-]*,[ \t]*[A-Z]{2}[ \t]+\d{5}(?:-\d{4})?[ \t]*\r?$"
    )
    .expect("CRITICAL: City/state/ZIP regex pattern is invalid - this should never fail");
    static ref PO_BOX_LINE: Regex = Regex::new(r"(?mi)^[ \t]*P\.?[ \t]*O\.?[ \t]*Box[ \t]+\d+[ \t]*\r?$")
        .expect("CRITICAL: PO box regex pattern is invalid - this should never fail");
}

fn line_span(start: usize, end: usize, kind: AddressLineKind) -> Span {
    let mut span = Span::new(
        start,
        end,
        Label::AddressLine,
        CONFIDENCE_ADDRESS_LINE,
        DetectorKind::Address,
    );
    span.attrs.line_kind = Some(kind);
    span
}

/// Trim trailing `\r` and surrounding blanks from a line-anchored match.
fn trim_match(text: &str, start: usize, end: usize) -> (usize, usize) {
    let mut s = start;
    let mut e = end;
    while e > s && matches!(&text[e - 1..e], "\r" | " " | "\t") {
        e -= 1;
    }
    while s < e && matches!(&text[s..s + 1], " " | "\t") {
        s += 1;
    }
    (s, e)
}

pub fn detect(text: &str, _cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let kinds = [
        (&*PO_BOX_LINE, AddressLineKind::PoBox),
        (&*STREET_LINE, AddressLineKind::Street),
        (&*CITY_STATE_ZIP_LINE, AddressLineKind::CityStateZip),
        (&*UNIT_LINE, AddressLineKind::Unit),
    ];
    for (pattern, kind) in kinds {
        for m in pattern.find_iter(text) {
            let (start, end) = trim_match(text, m.start(), m.end());
            if start >= end {
                continue;
            }
            let span = line_span(start, end, kind);
            if spans.iter().any(|s| s.overlaps(&span)) {
                continue;
            }
            spans.push(span);
        }
    }
    spans.sort_by_key(|s| s.start);
    spans
}

/// Index of the line (0-based) each byte offset falls on.
fn line_of(line_starts: &[usize], offset: usize) -> usize {
    match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i - 1,
    }
}

fn is_blank_line(text: &str, line_starts: &[usize], line: usize) -> bool {
    let start = line_starts[line];
    let end = line_starts
        .get(line + 1)
        .map(|s| s - 1)
        .unwrap_or(text.len());
    text[start..end.min(text.len())].trim().is_empty()
}

/// Merge runs of address lines (tolerating one blank line between them)
/// into `ADDRESS_BLOCK` spans. A block needs street + city/state/ZIP, or a
/// PO box. Constituent lines are left in place for the global merger to
/// drop once a block absorbs them.
pub fn merge_blocks(text: &str, spans: &[Span]) -> Vec<Span> {
    let mut line_starts = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }

    let mut lines: Vec<&Span> = spans
        .iter()
        .filter(|s| s.label == Label::AddressLine)
        .collect();
    lines.sort_by_key(|s| s.start);

    let mut blocks = Vec::new();
    let mut run: Vec<&Span> = Vec::new();

    let flush = |run: &mut Vec<&Span>, blocks: &mut Vec<Span>| {
        if run.is_empty() {
            return;
        }
        let has_street = run
            .iter()
            .any(|s| s.attrs.line_kind == Some(AddressLineKind::Street));
        let has_csz = run
            .iter()
            .any(|s| s.attrs.line_kind == Some(AddressLineKind::CityStateZip));
        let has_pobox = run
            .iter()
            .any(|s| s.attrs.line_kind == Some(AddressLineKind::PoBox));
        if (has_street && has_csz) || (has_pobox && (has_csz || run.len() == 1)) {
            let start = run.first().map(|s| s.start).unwrap_or(0);
            let end = run.last().map(|s| s.end).unwrap_or(0);
            blocks.push(Span::new(
                start,
                end,
                Label::AddressBlock,
                CONFIDENCE_ADDRESS_LINE,
                DetectorKind::Address,
            ));
        }
        run.clear();
    };

    for span in lines {
        if let Some(last) = run.last() {
            let prev_line = line_of(&line_starts, last.start);
            let this_line = line_of(&line_starts, span.start);
            let gap = this_line.saturating_sub(prev_line);
            let adjacent = gap == 1
                || (gap == 2 && is_blank_line(text, &line_starts, prev_line + 1));
            if !adjacent {
                flush(&mut run, &mut blocks);
            }
        }
        run.push(span);
    }
    flush(&mut run, &mut blocks);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_all(text: &str) -> Vec<Span> {
        detect(text, &RedactionConfig::default())
    }

    #[test]
    fn detects_street_line() {
        let text = "Ship to:\n1600 Pennsylvania Ave NW\nthanks";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].attrs.line_kind, Some(AddressLineKind::Street));
        assert_eq!(spans[0].text(text), "1600 Pennsylvania Ave NW");
    }

    #[test]
    fn detects_city_state_zip_line() {
        let text = "Washington, DC 20500\n";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].attrs.line_kind, Some(AddressLineKind::CityStateZip));
    }

    #[test]
    fn detects_po_box_and_unit() {
        let text = "P.O. Box 1234\nSuite 500\n";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].attrs.line_kind, Some(AddressLineKind::PoBox));
        assert_eq!(spans[1].attrs.line_kind, Some(AddressLineKind::Unit));
    }

    #[test]
    fn merges_street_and_csz_into_block() {
        let text = "1600 Pennsylvania Ave NW\nWashington, DC 20500\n";
        let spans = detect_all(text);
        let blocks = merge_blocks(text, &spans);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].text(text),
            "1600 Pennsylvania Ave NW\nWashington, DC 20500"
        );
    }

    #[test]
    fn tolerates_one_blank_line() {
        let text = "1600 Pennsylvania Ave NW\n\nWashington, DC 20500\n";
        let spans = detect_all(text);
        let blocks = merge_blocks(text, &spans);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn two_blank_lines_break_the_block() {
        let text = "1600 Pennsylvania Ave NW\n\n\nWashington, DC 20500\n";
        let spans = detect_all(text);
        let blocks = merge_blocks(text, &spans);
        assert!(blocks.is_empty());
    }

    #[test]
    fn street_alone_is_not_a_block() {
        let text = "1600 Pennsylvania Ave NW\n";
        let spans = detect_all(text);
        assert!(merge_blocks(text, &spans).is_empty());
    }

    #[test]
    fn po_box_alone_is_a_block() {
        let text = "P.O. Box 987\n";
        let spans = detect_all(text);
        let blocks = merge_blocks(text, &spans);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn three_line_block_with_unit() {
        let text = "400 Main St\nSuite 210\nSpringfield, IL 62701\n";
        let spans = detect_all(text);
        assert_eq!(spans.len(), 3);
        let blocks = merge_blocks(text, &spans);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start, 0);
        assert_eq!(blocks[0].end, text.len() - 1);
    }
}
