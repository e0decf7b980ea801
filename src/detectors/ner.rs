//! Optional ML provider seams.
//!
//! NER and coreference models are external capabilities injected by the
//! caller. The pipeline probes them and degrades to rule-only detection
//! when they are absent or failing; `detectors.ner.require` escalates a
//! failure instead.

use anyhow::Result;

use crate::span::{DetectorKind, Label, Span};

/// Entity categories an NER provider may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerCategory {
    Person,
    Org,
    Loc,
}

/// A raw model prediction over the normalized text.
#[derive(Debug, Clone)]
pub struct NerSpan {
    pub start: usize,
    pub end: usize,
    pub category: NerCategory,
    pub confidence: f32,
}

/// Capability-bearing named-entity provider.
pub trait NerProvider {
    /// Cheap availability check, called once per run.
    fn probe(&self) -> bool;
    fn extract(&self, text: &str) -> Result<Vec<NerSpan>>;
}

/// Capability-bearing coreference provider. Each chain is a set of
/// `[start, end)` mention ranges referring to one entity.
pub trait CorefProvider {
    fn probe(&self) -> bool;
    fn chains(&self, text: &str) -> Result<Vec<Vec<(usize, usize)>>>;
}

/// Convert provider output into pipeline spans, dropping anything that is
/// out of bounds or not on a char boundary.
pub fn ingest(text: &str, raw: Vec<NerSpan>, threshold: f32) -> Vec<Span> {
    let mut spans = Vec::new();
    for ner in raw {
        if ner.start >= ner.end || ner.end > text.len() {
            continue;
        }
        if !text.is_char_boundary(ner.start) || !text.is_char_boundary(ner.end) {
            continue;
        }
        if ner.confidence < threshold {
            continue;
        }
        let label = match ner.category {
            NerCategory::Person => Label::Person,
            NerCategory::Org => Label::GenericOrg,
            NerCategory::Loc => Label::Location,
        };
        spans.push(Span::new(
            ner.start,
            ner.end,
            label,
            ner.confidence,
            DetectorKind::Ner,
        ));
    }
    spans
}
