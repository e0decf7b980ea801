//! Audit bundle: the per-entry change record and run-level summary.
//!
//! Audit output contains original PII by design; callers must treat the
//! serialized bundle as sensitive material.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::plan::Plan;
use crate::preprocess::CharMap;
use crate::span::Label;

/// One audited replacement, reported in both normalized and original
/// offsets (original offsets come from the char-map).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub label: Label,
    pub original: String,
    pub replacement: String,
    pub start_orig: usize,
    pub end_orig: usize,
    pub start_norm: usize,
    pub end_norm: usize,
    pub cluster_id: String,
    pub confidence: f32,
    pub detector: String,
    pub retries: u8,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reason: Vec<String>,
}

/// Run-level audit summary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditBundle {
    /// SHA-256 of the normalized document, hex-encoded.
    pub document_sha256: String,
    pub seed_present: bool,
    pub entries: Vec<AuditEntry>,
    /// Replacement counts per label, deterministic order.
    pub counts_by_label: BTreeMap<String, usize>,
    /// Recoverable oddities: skipped providers, placeholder fallbacks.
    pub warnings: Vec<String>,
}

impl AuditBundle {
    pub fn from_plan(
        normalized_text: &str,
        plan: &Plan,
        char_map: &CharMap,
        seed_present: bool,
        warnings: Vec<String>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalized_text.as_bytes());
        let document_sha256 = hex::encode(hasher.finalize());

        let mut counts_by_label: BTreeMap<String, usize> = BTreeMap::new();
        let mut entries = Vec::with_capacity(plan.entries.len());
        for e in &plan.entries {
            *counts_by_label.entry(e.label.as_str().to_string()).or_insert(0) += 1;
            entries.push(AuditEntry {
                label: e.label,
                original: e.original_text.clone(),
                replacement: e.replacement_text.clone(),
                start_orig: char_map.map_start(e.start),
                end_orig: char_map.map_end(e.end),
                start_norm: e.start,
                end_norm: e.end,
                cluster_id: e.cluster_id.clone(),
                confidence: e.confidence,
                detector: e.detector.clone(),
                retries: e.retries,
                reason: e.reason_trail.clone(),
            });
        }

        Self {
            document_sha256,
            seed_present,
            entries,
            counts_by_label,
            warnings,
        }
    }
}
