// Optional ML provider integration: NER ingestion, coref merging, probe
// failures, and the require escalation path.

use anyhow::anyhow;
use sanitext::{
    sanitize_document_with_providers, CorefProvider, Label, NerCategory, NerProvider, NerSpan,
    Providers, RedactionConfig,
};

const SECRET: &[u8] = b"provider-test-secret";

/// Scripted NER provider returning canned spans.
struct ScriptedNer {
    available: bool,
    fail: bool,
    spans: Vec<(usize, usize, NerCategory, f32)>,
}

impl NerProvider for ScriptedNer {
    fn probe(&self) -> bool {
        self.available
    }

    fn extract(&self, _text: &str) -> anyhow::Result<Vec<NerSpan>> {
        if self.fail {
            return Err(anyhow!("model backend unavailable"));
        }
        Ok(self
            .spans
            .iter()
            .map(|&(start, end, category, confidence)| NerSpan {
                start,
                end,
                category,
                confidence,
            })
            .collect())
    }
}

/// Scripted coref provider with fixed chains.
struct ScriptedCoref {
    chains: Vec<Vec<(usize, usize)>>,
}

impl CorefProvider for ScriptedCoref {
    fn probe(&self) -> bool {
        true
    }

    fn chains(&self, _text: &str) -> anyhow::Result<Vec<Vec<(usize, usize)>>> {
        Ok(self.chains.clone())
    }
}

#[test]
fn ner_spans_are_ingested_and_replaced() {
    // "Zydrunas" is not caught by the rule grammar (single token), but the
    // model knows better.
    let text = "Defendant Zydrunas retained counsel.";
    let ner = ScriptedNer {
        available: true,
        fail: false,
        spans: vec![(10, 18, NerCategory::Person, 0.97)],
    };
    let mut cfg = RedactionConfig::default();
    cfg.detectors.ner.enable = true;
    let providers = Providers {
        ner: Some(&ner),
        coref: None,
    };
    let outcome = sanitize_document_with_providers(text, &cfg, Some(SECRET), &providers).unwrap();
    assert!(!outcome.sanitized_text.contains("Zydrunas"));
    let entry = outcome
        .plan
        .entries
        .iter()
        .find(|e| e.original_text == "Zydrunas")
        .expect("ner entry");
    assert_eq!(entry.label, Label::Person);
    assert_eq!(entry.detector, "ner");
}

#[test]
fn low_confidence_ner_spans_are_dropped() {
    let text = "Maybe Widget is a name.";
    let ner = ScriptedNer {
        available: true,
        fail: false,
        spans: vec![(6, 12, NerCategory::Person, 0.2)],
    };
    let mut cfg = RedactionConfig::default();
    cfg.detectors.ner.enable = true;
    let providers = Providers {
        ner: Some(&ner),
        coref: None,
    };
    let outcome = sanitize_document_with_providers(text, &cfg, Some(SECRET), &providers).unwrap();
    assert!(outcome.sanitized_text.contains("Widget"));
}

#[test]
fn failing_optional_ner_is_skipped_with_warning() {
    let text = "John Doe appeared.";
    let ner = ScriptedNer {
        available: true,
        fail: true,
        spans: vec![],
    };
    let mut cfg = RedactionConfig::default();
    cfg.detectors.ner.enable = true;
    let providers = Providers {
        ner: Some(&ner),
        coref: None,
    };
    let outcome = sanitize_document_with_providers(text, &cfg, Some(SECRET), &providers).unwrap();
    // Rule detection still redacted the name.
    assert!(!outcome.sanitized_text.contains("John Doe"));
    assert!(outcome
        .audit
        .warnings
        .iter()
        .any(|w| w.contains("ner provider failed")));
}

#[test]
fn failing_required_ner_is_fatal() {
    let ner = ScriptedNer {
        available: true,
        fail: true,
        spans: vec![],
    };
    let mut cfg = RedactionConfig::default();
    cfg.detectors.ner.enable = true;
    cfg.detectors.ner.require = true;
    let providers = Providers {
        ner: Some(&ner),
        coref: None,
    };
    let err =
        sanitize_document_with_providers("text", &cfg, Some(SECRET), &providers).unwrap_err();
    assert_eq!(err.exit_code(), sanitext::EXIT_PIPELINE);
}

#[test]
fn unavailable_probe_falls_back_to_rules() {
    let text = "Jane Roe signed.";
    let ner = ScriptedNer {
        available: false,
        fail: false,
        spans: vec![(0, 8, NerCategory::Person, 0.99)],
    };
    let mut cfg = RedactionConfig::default();
    cfg.detectors.ner.enable = true;
    let providers = Providers {
        ner: Some(&ner),
        coref: None,
    };
    let outcome = sanitize_document_with_providers(text, &cfg, Some(SECRET), &providers).unwrap();
    assert!(!outcome.sanitized_text.contains("Jane Roe"));
}

#[test]
fn coref_chains_merge_clusters() {
    //                    0         1         2         3
    //                    0123456789012345678901234567890123456789
    let text = "John Doe sued. Jane Archer countersued.";
    // A (contrived) chain asserting the two names corefer.
    let coref = ScriptedCoref {
        chains: vec![vec![(0, 8), (15, 26)]],
    };
    let mut cfg = RedactionConfig::default();
    cfg.detectors.coref.enable = true;
    let providers = Providers {
        ner: None,
        coref: Some(&coref),
    };
    let outcome = sanitize_document_with_providers(text, &cfg, Some(SECRET), &providers).unwrap();
    let doe = outcome
        .plan
        .entries
        .iter()
        .find(|e| e.original_text == "John Doe")
        .unwrap();
    let archer = outcome
        .plan
        .entries
        .iter()
        .find(|e| e.original_text == "Jane Archer")
        .unwrap();
    assert_eq!(doe.cluster_id, archer.cluster_id);
}

#[test]
fn coref_disabled_ignores_provider() {
    let text = "John Doe sued. Jane Archer countersued.";
    let coref = ScriptedCoref {
        chains: vec![vec![(0, 8), (15, 26)]],
    };
    let providers = Providers {
        ner: None,
        coref: Some(&coref),
    };
    let cfg = RedactionConfig::default();
    let outcome = sanitize_document_with_providers(text, &cfg, Some(SECRET), &providers).unwrap();
    let doe = outcome
        .plan
        .entries
        .iter()
        .find(|e| e.original_text == "John Doe")
        .unwrap();
    let archer = outcome
        .plan
        .entries
        .iter()
        .find(|e| e.original_text == "Jane Archer")
        .unwrap();
    assert_ne!(doe.cluster_id, archer.cluster_id);
}
