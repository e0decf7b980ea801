//! Output verification: re-detect on the sanitized text and score whatever
//! survived.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RedactionConfig;
use crate::constants::{
    LEAKAGE_WEIGHT_BASE, LEAKAGE_WEIGHT_CRITICAL, LEAKAGE_WEIGHT_HIGH, RESIDUAL_CONTEXT_WINDOW,
};
use crate::detectors::run_rule_detectors;
use crate::plan::Plan;
use crate::span::Label;
use crate::utils::context_window;

/// A detector hit in the sanitized output that is not one of our own
/// generated pseudonyms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Residual {
    pub label: Label,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerificationReport {
    pub counts_by_label: BTreeMap<String, usize>,
    pub leakage_score: u32,
    pub residuals: Vec<Residual>,
    pub seed_present: bool,
}

fn label_weight(label: Label) -> u32 {
    match label {
        Label::Email | Label::Phone | Label::AccountId | Label::Dob => LEAKAGE_WEIGHT_CRITICAL,
        Label::Person | Label::AddressBlock => LEAKAGE_WEIGHT_HIGH,
        _ => LEAKAGE_WEIGHT_BASE,
    }
}

/// Re-run the rule detectors over `sanitized_text`, filter out spans whose
/// exact text is a pseudonym this run generated, and score the rest.
pub fn verify(
    sanitized_text: &str,
    plan: &Plan,
    cfg: &RedactionConfig,
    seed_present: bool,
) -> VerificationReport {
    let generated: HashSet<&str> = plan.generated_texts().into_iter().collect();
    // Placeholders and partial hits inside generated text are ours too.
    let spans = run_rule_detectors(sanitized_text, cfg);

    let mut residuals = Vec::new();
    let mut counts_by_label: BTreeMap<String, usize> = BTreeMap::new();
    let mut leakage_score = 0u32;

    let keep_roles = cfg.redact.alias_labels == crate::config::AliasMode::KeepRoles;
    for span in spans {
        let text = span.text(sanitized_text);
        if generated.contains(text) {
            continue;
        }
        // Role terms deliberately retained under keep_roles are not leaks.
        if keep_roles
            && crate::linker::ROLE_TERMS
                .iter()
                .any(|r| text.eq_ignore_ascii_case(r))
        {
            continue;
        }
        // A hit nested inside one of our replacements (a street inside a
        // generated address block) is still generated output.
        if generated
            .iter()
            .any(|g| g.len() > text.len() && g.contains(text))
        {
            continue;
        }
        *counts_by_label
            .entry(span.label.as_str().to_string())
            .or_insert(0) += 1;
        leakage_score += label_weight(span.label);
        residuals.push(Residual {
            label: span.label,
            text: text.to_string(),
            start: span.start,
            end: span.end,
            context: context_window(
                sanitized_text,
                span.start,
                span.end,
                RESIDUAL_CONTEXT_WINDOW,
                RESIDUAL_CONTEXT_WINDOW,
            )
            .to_string(),
        });
    }

    info!(
        residuals = residuals.len(),
        leakage_score, "verification pass complete"
    );
    VerificationReport {
        counts_by_label,
        leakage_score,
        residuals,
        seed_present,
    }
}
