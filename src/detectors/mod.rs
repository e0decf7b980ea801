//! The detector family: independent scanners over the normalized text.
//!
//! Every detector is a pure function of `(text, config)` emitting zero or
//! more spans; overlaps across detectors are expected and resolved later by
//! the global merger. New detectors extend the closed [`RuleDetector`]
//! variant set.

pub mod account;
pub mod address;
pub mod alias;
pub mod date;
pub mod email;
pub mod ner;
pub mod org;
pub mod person;
pub mod phone;

use tracing::debug;

use crate::config::RedactionConfig;
use crate::span::{sort_spans, Span};

/// Closed set of rule-based detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDetector {
    Email,
    Phone,
    Account,
    Org,
    Person,
    Address,
    Date,
    Alias,
}

impl RuleDetector {
    pub const ALL: [RuleDetector; 8] = [
        RuleDetector::Email,
        RuleDetector::Phone,
        RuleDetector::Account,
        RuleDetector::Org,
        RuleDetector::Person,
        RuleDetector::Address,
        RuleDetector::Date,
        RuleDetector::Alias,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleDetector::Email => "email",
            RuleDetector::Phone => "phone",
            RuleDetector::Account => "account",
            RuleDetector::Org => "org",
            RuleDetector::Person => "person",
            RuleDetector::Address => "address",
            RuleDetector::Date => "date",
            RuleDetector::Alias => "alias",
        }
    }

    pub fn detect(&self, text: &str, cfg: &RedactionConfig) -> Vec<Span> {
        match self {
            RuleDetector::Email => email::detect(text, cfg),
            RuleDetector::Phone => phone::detect(text, cfg),
            RuleDetector::Account => account::detect(text, cfg),
            RuleDetector::Org => org::detect(text, cfg),
            RuleDetector::Person => person::detect(text, cfg),
            RuleDetector::Address => address::detect(text, cfg),
            RuleDetector::Date => date::detect(text, cfg),
            RuleDetector::Alias => alias::detect(text, cfg),
        }
    }
}

/// Run every rule detector, promote DOBs, and merge address lines into
/// blocks. Output is sorted by `(start, end, label)` so execution order
/// (or future chunk-parallelism) cannot change downstream results.
pub fn run_rule_detectors(text: &str, cfg: &RedactionConfig) -> Vec<Span> {
    let mut spans = Vec::new();
    for detector in RuleDetector::ALL {
        let found = detector.detect(text, cfg);
        debug!(detector = detector.name(), count = found.len(), "detector pass complete");
        spans.extend(found);
    }

    date::upgrade_dob(text, &mut spans);

    let blocks = address::merge_blocks(text, &spans);
    spans.extend(blocks);

    sort_spans(&mut spans);
    spans
}
