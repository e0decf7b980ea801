//! Global span merger: resolves all remaining overlaps by label precedence
//! and deterministic tie-breaks, producing a disjoint span set.

use tracing::debug;

use crate::config::RedactionConfig;
use crate::span::{Label, Span};

/// FNV-1a over the detector/label names; final tie-break only.
fn tie_hash(span: &Span) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in span
        .source
        .as_str()
        .bytes()
        .chain([b'|'])
        .chain(span.label.as_str().bytes())
    {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Does a truncated remnant still parse as its label? Labels without a
/// meaningful sub-syntax simply refuse truncation.
fn revalidates(slice: &str, label: Label, cfg: &RedactionConfig) -> bool {
    if slice.trim().is_empty() {
        return false;
    }
    let spans = match label {
        Label::Email => crate::detectors::email::detect(slice, cfg),
        Label::Phone => crate::detectors::phone::detect(slice, cfg),
        Label::AccountId => crate::detectors::account::detect(slice, cfg),
        Label::Person => crate::detectors::person::detect(slice, cfg),
        Label::BankOrg | Label::GenericOrg => crate::detectors::org::detect(slice, cfg),
        Label::DateGeneric => crate::detectors::date::detect(slice, cfg),
        Label::AddressLine => crate::detectors::address::detect(slice, cfg),
        // Blocks, DOBs, aliases, and model spans do not survive cutting.
        Label::AddressBlock | Label::Dob | Label::AliasLabel | Label::Location => return false,
    };
    spans.iter().any(|s| s.start == 0 && s.end == slice.len() && s.label == label)
}

/// Merge all detector and linker spans into a disjoint set.
///
/// Precedence tiers come from [`Label::precedence`]; within a tier the
/// longer span wins, then higher confidence, then earlier start, then a
/// deterministic hash of source and label. A partially-overlapped loser is
/// truncated when the remnant still validates for its label, otherwise
/// dropped. Pure function of its input.
pub fn merge_spans(text: &str, mut spans: Vec<Span>, cfg: &RedactionConfig) -> Vec<Span> {
    spans.sort_by(|a, b| {
        b.label
            .precedence()
            .cmp(&a.label.precedence())
            .then(b.len().cmp(&a.len()))
            .then(
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.start.cmp(&b.start))
            .then(tie_hash(a).cmp(&tie_hash(b)))
    });

    let mut accepted: Vec<Span> = Vec::new();
    'candidates: for span in spans {
        let mut start = span.start;
        let mut end = span.end;

        for winner in &accepted {
            if start >= end {
                continue 'candidates;
            }
            if winner.start < end && start < winner.end {
                // Identical or contained range: one entry survives.
                if winner.start <= start && end <= winner.end {
                    continue 'candidates;
                }
                // Partial overlap: the winner keeps its range, we shrink.
                if winner.start <= start {
                    start = winner.end;
                } else if winner.end >= end {
                    end = winner.start;
                } else {
                    // Winner sits strictly inside: keep the longer side.
                    let left = winner.start - start;
                    let right = end - winner.end;
                    if left >= right {
                        end = winner.start;
                    } else {
                        start = winner.end;
                    }
                }
            }
        }

        if start >= end {
            continue;
        }
        if start == span.start && end == span.end {
            accepted.push(span);
            continue;
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        // Shed the separator debris a cut leaves behind before judging the
        // remnant.
        while start < end {
            let Some(ch) = text[start..end].chars().next() else { break };
            if ch.is_whitespace() || matches!(ch, ',' | ';' | ':' | '(' | ')') {
                start += ch.len_utf8();
            } else {
                break;
            }
        }
        while start < end {
            let Some(ch) = text[start..end].chars().next_back() else { break };
            if ch.is_whitespace() || matches!(ch, ',' | ';' | ':' | '(' | ')') {
                end -= ch.len_utf8();
            } else {
                break;
            }
        }
        if start >= end {
            continue;
        }
        if revalidates(&text[start..end], span.label, cfg) {
            let mut truncated = span.clone();
            truncated.start = start;
            truncated.end = end;
            accepted.push(truncated);
        } else {
            debug!(
                label = span.label.as_str(),
                start = span.start,
                end = span.end,
                "span dropped after truncation failed revalidation"
            );
        }
    }

    accepted.sort_by_key(|s| s.start);
    accepted
}
