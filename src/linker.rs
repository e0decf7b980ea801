//! Entity linking: alias resolution, mention clustering, role handling,
//! and optional coreference ingestion.
//!
//! Clusters are built with union-find over mention indices, so cyclic
//! alias graphs (A a/k/a B, B a/k/a A) collapse into a single cluster per
//! connected component. Clusters are immutable once built.

use std::collections::HashMap;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RedactionConfig;
use crate::constants::CONFIDENCE_LINKED_MENTION;
use crate::detectors::ner::CorefProvider;
use crate::span::{DetectorKind, Label, Span};

/// Alias terms that denote contractual roles rather than identities.
pub const ROLE_TERMS: &[&str] = &[
    "Buyer", "Seller", "Lessee", "Lessor", "Landlord", "Tenant", "Employer", "Employee",
    "Party",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    Person,
    Org,
    Bank,
    Address,
    Other,
}

/// A set of spans referring to the same real-world subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCluster {
    pub cluster_id: String,
    pub kind: ClusterKind,
    /// Longest / most specific mention text.
    pub canonical_form: String,
    /// Role-only aliases (e.g. "Buyer") may be preserved by the planner.
    pub is_role: bool,
}

/// Linker output: the (possibly extended) span set, the clusters, and the
/// span-to-cluster assignment keyed by `(start, end, label)`.
#[derive(Debug, Clone, Default)]
pub struct Linked {
    pub clusters: Vec<EntityCluster>,
    pub assignments: HashMap<(usize, usize, Label), usize>,
}

/// Union-find with path compression.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lower index wins so roots are stable across input orderings.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

fn is_linkable(label: Label) -> bool {
    matches!(
        label,
        Label::Person | Label::GenericOrg | Label::BankOrg | Label::AliasLabel
    )
}

fn is_role_term(term: &str) -> bool {
    ROLE_TERMS.iter().any(|r| term.eq_ignore_ascii_case(r))
}

/// Case-folded final token of a person mention.
fn surname_key(mention: &str) -> Option<String> {
    mention
        .split_whitespace()
        .last()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| t.len() > 1)
}

/// Case-folded head token of an org mention.
fn org_head_key(mention: &str) -> Option<String> {
    mention
        .split_whitespace()
        .next()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
}

/// Gendered honorific right before a mention, if any. Used to keep
/// "Mr. Doe" and "Mrs. Doe" in separate clusters.
fn gendered_title(text: &str, start: usize) -> Option<&'static str> {
    let lo = crate::utils::floor_char_boundary(text, start.saturating_sub(8));
    let before = &text[lo..start];
    if before.trim_end().ends_with("Mr.") {
        Some("m")
    } else if before.trim_end().ends_with("Mrs.") || before.trim_end().ends_with("Ms.") {
        Some("f")
    } else {
        None
    }
}

/// Whole-word, case-insensitive occurrences of `term` in `text`.
fn term_occurrences(text: &str, term: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    if term.is_empty() {
        return out;
    }
    let lower_text = text.to_lowercase();
    let lower_term = term.to_lowercase();
    // Only safe when lowercasing did not change byte lengths.
    if lower_text.len() != text.len() {
        return out;
    }
    let mut from = 0;
    while let Some(rel) = lower_text[from..].find(&lower_term) {
        let start = from + rel;
        let end = start + lower_term.len();
        let before_ok = start == 0
            || !lower_text[..start]
                .chars()
                .next_back()
                .map(|c| c.is_alphanumeric())
                .unwrap_or(false);
        let after_ok = end >= lower_text.len()
            || !lower_text[end..]
                .chars()
                .next()
                .map(|c| c.is_alphanumeric())
                .unwrap_or(false);
        if before_ok && after_ok {
            out.push((start, end));
        }
        from = end;
    }
    out
}

pub struct Linker<'a> {
    pub coref: Option<&'a dyn CorefProvider>,
}

impl<'a> Linker<'a> {
    pub fn new() -> Self {
        Self { coref: None }
    }

    pub fn with_coref(coref: &'a dyn CorefProvider) -> Self {
        Self { coref: Some(coref) }
    }

    /// Cluster mentions in `spans`, appending synthesized mention spans for
    /// alias-term occurrences the detectors did not emit.
    pub fn link(
        &self,
        text: &str,
        spans: &mut Vec<Span>,
        cfg: &RedactionConfig,
    ) -> Result<Linked, crate::error::RedactError> {
        // 1. Synthesize mentions for later occurrences of alias terms.
        self.synthesize_alias_mentions(text, spans);

        let mention_idx: Vec<usize> = (0..spans.len())
            .filter(|&i| is_linkable(spans[i].label))
            .collect();
        let mut uf = UnionFind::new(spans.len());

        // 2. Alias resolution: tie each alias label to its subject mention.
        for &ai in &mention_idx {
            if spans[ai].label != Label::AliasLabel {
                continue;
            }
            if let Some(subject) = self.subject_of(text, spans, ai) {
                uf.union(ai, subject);
            }
            // Tie the alias to every occurrence of its term.
            let term = spans[ai].text(text).to_string();
            for &mi in &mention_idx {
                if mi != ai && spans[mi].text(text).eq_ignore_ascii_case(&term) {
                    uf.union(ai, mi);
                }
            }
        }

        // 3. Person clustering by shared surname, unless titles disambiguate.
        let mut by_surname: HashMap<String, Vec<usize>> = HashMap::new();
        for &mi in &mention_idx {
            if spans[mi].label == Label::Person {
                if let Some(key) = surname_key(spans[mi].text(text)) {
                    by_surname.entry(key).or_default().push(mi);
                }
            }
        }
        for group in by_surname.values() {
            for pair in group.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let ta = gendered_title(text, spans[a].start);
                let tb = gendered_title(text, spans[b].start);
                if let (Some(x), Some(y)) = (ta, tb) {
                    if x != y {
                        continue;
                    }
                }
                uf.union(a, b);
            }
        }

        // 4. Org clustering by case-folded head token.
        let mut by_head: HashMap<String, Vec<usize>> = HashMap::new();
        for &mi in &mention_idx {
            if matches!(spans[mi].label, Label::GenericOrg | Label::BankOrg) {
                if let Some(key) = org_head_key(spans[mi].text(text)) {
                    by_head.entry(key).or_default().push(mi);
                }
            }
        }
        for group in by_head.values() {
            for pair in group.windows(2) {
                uf.union(pair[0], pair[1]);
            }
        }

        // 5. Optional coref chains, merged by majority overlap.
        if cfg.detectors.coref.enable {
            if let Some(provider) = self.coref {
                if provider.probe() {
                    match provider.chains(text) {
                        Ok(chains) => self.merge_coref(text, spans, &mention_idx, &mut uf, chains),
                        Err(e) => {
                            warn!("coref provider failed, skipping: {e}");
                        }
                    }
                } else {
                    debug!("coref provider probe negative, skipping");
                }
            }
        }

        // 6. Materialize clusters in order of first mention start.
        Ok(self.build_clusters(text, spans, &mention_idx, &mut uf))
    }

    /// Append PERSON/ORG mentions for every whole-word occurrence of each
    /// alias term beyond its definition site.
    fn synthesize_alias_mentions(&self, text: &str, spans: &mut Vec<Span>) {
        let alias_terms: Vec<(String, usize, usize)> = spans
            .iter()
            .filter(|s| s.label == Label::AliasLabel)
            .map(|s| (s.text(text).to_string(), s.start, s.end))
            .collect();
        for (term, def_start, def_end) in alias_terms {
            for (start, end) in term_occurrences(text, &term) {
                if start >= def_start && end <= def_end {
                    continue;
                }
                let covered = spans
                    .iter()
                    .any(|s| s.start < end && start < s.end);
                if covered {
                    continue;
                }
                let mut span = Span::new(
                    start,
                    end,
                    Label::Person,
                    CONFIDENCE_LINKED_MENTION,
                    DetectorKind::Linker,
                );
                span.attrs.alias_subject = None;
                spans.push(span);
            }
        }
        crate::span::sort_spans(spans);
    }

    /// Index of the subject mention for an alias span: the mention named by
    /// the captured subject text, else the nearest preceding person/org.
    fn subject_of(&self, text: &str, spans: &[Span], alias_idx: usize) -> Option<usize> {
        let alias = &spans[alias_idx];
        let subject_text = alias.attrs.alias_subject.as_deref();

        let mut exact: Option<usize> = None;
        let mut nearest: Option<usize> = None;
        for (i, span) in spans.iter().enumerate() {
            if i == alias_idx
                || !matches!(
                    span.label,
                    Label::Person | Label::GenericOrg | Label::BankOrg
                )
            {
                continue;
            }
            if span.start >= alias.start {
                continue;
            }
            if nearest.map_or(true, |n: usize| spans[n].start < span.start) {
                nearest = Some(i);
            }
            if let Some(subject) = subject_text {
                if span.text(text).eq_ignore_ascii_case(subject) {
                    exact = Some(i);
                }
            }
        }
        exact.or(nearest)
    }

    fn merge_coref(
        &self,
        _text: &str,
        spans: &[Span],
        mention_idx: &[usize],
        uf: &mut UnionFind,
        chains: Vec<Vec<(usize, usize)>>,
    ) {
        for chain in chains {
            let mut linked: Vec<usize> = Vec::new();
            for (start, end) in chain {
                // Majority overlap: pick the mention sharing the most bytes.
                let mut best: Option<(usize, usize)> = None;
                for &mi in mention_idx {
                    let s = &spans[mi];
                    let overlap = s.end.min(end).saturating_sub(s.start.max(start));
                    if overlap * 2 > (end - start).max(1) {
                        match best {
                            Some((_, prev)) if prev >= overlap => {}
                            _ => best = Some((mi, overlap)),
                        }
                    }
                }
                if let Some((mi, _)) = best {
                    linked.push(mi);
                }
            }
            for pair in linked.windows(2) {
                uf.union(pair[0], pair[1]);
            }
        }
    }

    fn build_clusters(
        &self,
        text: &str,
        spans: &[Span],
        mention_idx: &[usize],
        uf: &mut UnionFind,
    ) -> Linked {
        // Group members per root, ordered by first mention start.
        let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut root_pos: HashMap<usize, usize> = HashMap::new();
        let mut ordered: Vec<usize> = mention_idx.to_vec();
        ordered.sort_by_key(|&i| spans[i].start);
        for &mi in &ordered {
            let root = uf.find(mi);
            match root_pos.get(&root) {
                Some(&pos) => groups[pos].1.push(mi),
                None => {
                    root_pos.insert(root, groups.len());
                    groups.push((root, vec![mi]));
                }
            }
        }

        let mut linked = Linked::default();
        for (cluster_no, (_, members)) in groups.iter().enumerate() {
            let cluster_id = format!("C{cluster_no:03}");

            let mut kind = ClusterKind::Other;
            let mut canonical = "";
            let mut is_role = false;
            for &mi in members {
                let span = &spans[mi];
                let mention = span.text(text);
                if mention.len() > canonical.len() && span.label != Label::AliasLabel {
                    canonical = mention;
                }
                kind = match (kind, span.label) {
                    (_, Label::BankOrg) => ClusterKind::Bank,
                    (ClusterKind::Bank, _) => ClusterKind::Bank,
                    (_, Label::GenericOrg) => ClusterKind::Org,
                    (ClusterKind::Org, _) => ClusterKind::Org,
                    (_, Label::Person) => ClusterKind::Person,
                    (k, _) => k,
                };
                if span.label == Label::AliasLabel && is_role_term(mention) {
                    is_role = true;
                }
            }
            if canonical.is_empty() {
                // Alias-only cluster (no resolvable subject).
                canonical = members
                    .first()
                    .map(|&mi| spans[mi].text(text))
                    .unwrap_or_default();
            }

            for &mi in members {
                let span = &spans[mi];
                linked
                    .assignments
                    .insert((span.start, span.end, span.label), cluster_no);
            }
            linked.clusters.push(EntityCluster {
                cluster_id,
                kind,
                canonical_form: canonical.to_string(),
                is_role,
            });
        }

        debug!(clusters = linked.clusters.len(), "linker built clusters");
        linked
    }
}

impl<'a> Default for Linker<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Escalate a provider error into a pipeline error (used when a provider
/// is configured as required).
pub fn provider_failure(name: &str, message: impl std::fmt::Display) -> crate::error::RedactError {
    crate::error::RedactError::Detector {
        name: name.to_string(),
        source: anyhow!("{message}"),
    }
}
