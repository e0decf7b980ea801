//! Replacement planning and application.
//!
//! The planner walks the merged spans cluster by cluster, generates
//! candidate replacements, runs them through the safety guard (bumping the
//! cluster's retry salt on failure so regenerated clusters stay internally
//! consistent), and produces a sorted, disjoint plan. The applier is a
//! single forward pass and is idempotent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AliasMode, RedactionConfig};
use crate::constants::SAFETY_MAX_RETRIES;
use crate::error::{RedactError, Result};
use crate::linker::{ClusterKind, EntityCluster, Linked};
use crate::pseudonym::Generator;
use crate::safety::{fallback_placeholder, SafetyGuard};
use crate::span::{Label, Span};

/// One planned replacement. Never mutated after safety acceptance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanEntry {
    pub start: usize,
    pub end: usize,
    pub original_text: String,
    pub replacement_text: String,
    pub cluster_id: String,
    pub label: Label,
    pub confidence: f32,
    pub detector: String,
    pub retries: u8,
    pub reason_trail: Vec<String>,
}

/// The full replacement plan over the normalized text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    /// Every generated replacement text, for the verifier's filter.
    pub fn generated_texts(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.replacement_text.as_str())
            .collect()
    }
}

pub struct Planner<'a> {
    cfg: &'a RedactionConfig,
    generator: &'a Generator<'a>,
    guard: SafetyGuard<'a>,
}

impl<'a> Planner<'a> {
    pub fn new(cfg: &'a RedactionConfig, generator: &'a Generator<'a>) -> Self {
        Self {
            cfg,
            generator,
            guard: SafetyGuard::new(cfg),
        }
    }

    /// Should this span be replaced at all under the current config?
    ///
    /// `keep_roles` retains the role-term mentions themselves ("Buyer");
    /// the subject of the role cluster is still replaced.
    fn replaceable(&self, text: &str, span: &Span, cluster: &EntityCluster) -> bool {
        if span.label == Label::DateGeneric && !self.cfg.redact.generic_dates {
            return false;
        }
        if cluster.is_role
            && self.cfg.redact.alias_labels == AliasMode::KeepRoles
            && (span.label == Label::AliasLabel
                || crate::linker::ROLE_TERMS
                    .iter()
                    .any(|r| span.text(text).eq_ignore_ascii_case(r)))
        {
            return false;
        }
        true
    }

    /// Build the plan from merged (disjoint) spans.
    ///
    /// Returns the plan plus warnings for the audit bundle.
    pub fn build(
        &self,
        text: &str,
        spans: &[Span],
        linked: &Linked,
    ) -> Result<(Plan, Vec<String>)> {
        let mut warnings = Vec::new();

        // Assign singleton clusters to spans the linker did not claim, so
        // repeated literals share one pseudonym. Singleton cluster ids
        // continue the linker's numbering in first-occurrence order.
        let mut clusters: Vec<EntityCluster> = linked.clusters.clone();
        let mut singleton_ids: HashMap<(Label, String), usize> = HashMap::new();
        let mut membership: Vec<usize> = Vec::with_capacity(spans.len());
        for span in spans {
            let key = (span.start, span.end, span.label);
            let cluster_idx = match linked.assignments.get(&key) {
                Some(&idx) => idx,
                None => {
                    let singleton_key = (span.label, span.text(text).to_string());
                    match singleton_ids.get(&singleton_key) {
                        Some(&idx) => idx,
                        None => {
                            let idx = clusters.len();
                            clusters.push(EntityCluster {
                                cluster_id: format!("C{idx:03}"),
                                kind: match span.label {
                                    Label::AddressBlock | Label::AddressLine => ClusterKind::Address,
                                    Label::Person => ClusterKind::Person,
                                    Label::BankOrg => ClusterKind::Bank,
                                    Label::GenericOrg => ClusterKind::Org,
                                    _ => ClusterKind::Other,
                                },
                                canonical_form: span.text(text).to_string(),
                                is_role: false,
                            });
                            singleton_ids.insert(singleton_key, idx);
                            idx
                        }
                    }
                }
            };
            membership.push(cluster_idx);
        }

        // Group span indices per cluster, preserving text order.
        let mut by_cluster: Vec<Vec<usize>> = vec![Vec::new(); clusters.len()];
        for (i, &c) in membership.iter().enumerate() {
            by_cluster[c].push(i);
        }

        let mut entries: Vec<PlanEntry> = Vec::new();
        for (cluster_idx, span_indices) in by_cluster.iter().enumerate() {
            if span_indices.is_empty() {
                continue;
            }
            let cluster = &clusters[cluster_idx];
            let members: Vec<&Span> = span_indices.iter().map(|&i| &spans[i]).collect();
            let replace: Vec<&Span> = members
                .iter()
                .copied()
                .filter(|s| self.replaceable(text, s, cluster))
                .collect();
            if replace.is_empty() {
                continue;
            }
            entries.extend(self.plan_cluster(text, cluster, &replace, &mut warnings)?);
        }

        entries.sort_by_key(|e| e.start);
        for pair in entries.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(RedactError::Plan(format!(
                    "overlapping plan entries at {}..{} and {}..{}",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                )));
            }
        }
        for entry in &entries {
            if text
                .get(entry.start..entry.end)
                .map_or(true, |s| s != entry.original_text)
            {
                return Err(RedactError::Plan(format!(
                    "plan entry at {}..{} does not match the normalized text",
                    entry.start, entry.end
                )));
            }
        }

        debug!(entries = entries.len(), "plan built");
        Ok((Plan { entries }, warnings))
    }

    /// Generate all replacements for one cluster at a shared retry level.
    /// A safety failure on any mention bumps the whole cluster so that its
    /// mentions never mix identities.
    fn plan_cluster(
        &self,
        text: &str,
        cluster: &EntityCluster,
        members: &[&Span],
        warnings: &mut Vec<String>,
    ) -> Result<Vec<PlanEntry>> {
        let mut rejections: Vec<String> = Vec::new();

        for retry in 0..=SAFETY_MAX_RETRIES {
            let mut batch: Vec<PlanEntry> = Vec::with_capacity(members.len());
            let mut all_safe = true;

            for span in members {
                let original = span.text(text);
                let candidate = self.generator.replacement(
                    cluster,
                    span.label,
                    original,
                    &span.attrs,
                    retry,
                );
                match self.guard.check(span.label, &span.attrs, original, &candidate) {
                    Ok(()) => {
                        batch.push(PlanEntry {
                            start: span.start,
                            end: span.end,
                            original_text: original.to_string(),
                            replacement_text: candidate,
                            cluster_id: cluster.cluster_id.clone(),
                            label: span.label,
                            confidence: span.confidence,
                            detector: span.source.as_str().to_string(),
                            retries: retry,
                            reason_trail: rejections.clone(),
                        });
                    }
                    Err(rejection) => {
                        rejections.push(format!(
                            "retry {retry}: {} rejected ({})",
                            span.label.as_str(),
                            rejection.as_str()
                        ));
                        all_safe = false;
                        break;
                    }
                }
            }

            if all_safe {
                return Ok(batch);
            }
        }

        // Retries exhausted.
        if self.cfg.verification.fail_on_residual {
            let label = members.first().map(|s| s.label).unwrap_or(Label::Person);
            return Err(RedactError::Pseudonym {
                label,
                attempts: SAFETY_MAX_RETRIES + 1,
            });
        }
        warn!(
            cluster = cluster.cluster_id.as_str(),
            "no safe replacement after retries; using opaque placeholders"
        );
        warnings.push(format!(
            "cluster {}: no safe replacement after {} attempts, fell back to placeholder",
            cluster.cluster_id,
            SAFETY_MAX_RETRIES + 1
        ));
        Ok(members
            .iter()
            .map(|span| PlanEntry {
                start: span.start,
                end: span.end,
                original_text: span.text(text).to_string(),
                replacement_text: fallback_placeholder(span.label),
                cluster_id: cluster.cluster_id.clone(),
                label: span.label,
                confidence: span.confidence,
                detector: span.source.as_str().to_string(),
                retries: SAFETY_MAX_RETRIES + 1,
                reason_trail: rejections.clone(),
            })
            .collect())
    }
}

/// Apply a plan to `text` in one forward pass.
///
/// Idempotent: an entry whose range already holds its replacement text is
/// passed through unchanged; a range matching neither side is a
/// [`RedactError::Plan`].
pub fn apply_plan(text: &str, plan: &Plan) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut prev_end = 0usize;
    for entry in &plan.entries {
        if entry.start < prev_end {
            return Err(RedactError::Plan(format!(
                "entries overlap at {}..{}",
                entry.start, entry.end
            )));
        }
        prev_end = entry.end;
        let current = text.get(entry.start..entry.end).ok_or_else(|| {
            RedactError::Plan(format!(
                "entry range {}..{} is out of bounds",
                entry.start, entry.end
            ))
        })?;
        out.push_str(&text[cursor..entry.start]);
        if current == entry.original_text {
            out.push_str(&entry.replacement_text);
        } else if current == entry.replacement_text {
            // Already applied.
            out.push_str(current);
        } else {
            return Err(RedactError::Plan(format!(
                "text at {}..{} matches neither original nor replacement",
                entry.start, entry.end
            )));
        }
        cursor = entry.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::DetectorKind;

    fn entry(start: usize, end: usize, original: &str, replacement: &str) -> PlanEntry {
        PlanEntry {
            start,
            end,
            original_text: original.into(),
            replacement_text: replacement.into(),
            cluster_id: "C000".into(),
            label: Label::Person,
            confidence: 1.0,
            detector: DetectorKind::Person.as_str().into(),
            retries: 0,
            reason_trail: Vec::new(),
        }
    }

    #[test]
    fn applies_in_order_with_offset_shifts() {
        let text = "John met Jane.";
        let plan = Plan {
            entries: vec![entry(0, 4, "John", "Evan"), entry(9, 13, "Jane", "Nora")],
        };
        assert_eq!(apply_plan(text, &plan).unwrap(), "Evan met Nora.");
    }

    #[test]
    fn replacement_lengths_may_differ() {
        let text = "Call Bob now";
        let plan = Plan {
            entries: vec![entry(5, 8, "Bob", "Bartholomew")],
        };
        assert_eq!(apply_plan(text, &plan).unwrap(), "Call Bartholomew now");
    }

    #[test]
    fn empty_plan_is_identity() {
        let text = "nothing to do";
        assert_eq!(apply_plan(text, &Plan::default()).unwrap(), text);
    }

    #[test]
    fn idempotent_when_spans_match_replacements() {
        let text = "Evan met Nora.";
        let plan = Plan {
            entries: vec![entry(0, 4, "John", "Evan"), entry(9, 13, "Jane", "Nora")],
        };
        assert_eq!(apply_plan(text, &plan).unwrap(), text);
    }

    #[test]
    fn mismatched_text_is_a_plan_error() {
        let text = "Carl met Nora.";
        let plan = Plan {
            entries: vec![entry(0, 4, "John", "Evan")],
        };
        let err = apply_plan(text, &plan).unwrap_err();
        assert!(matches!(err, RedactError::Plan(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_PIPELINE);
    }

    #[test]
    fn overlapping_entries_are_a_plan_error() {
        let text = "John Doe";
        let plan = Plan {
            entries: vec![entry(0, 6, "John D", "x"), entry(4, 8, "n Doe", "y")],
        };
        assert!(matches!(
            apply_plan(text, &plan).unwrap_err(),
            RedactError::Plan(_)
        ));
    }
}
