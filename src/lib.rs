//! sanitext: deterministic, shape-preserving PII pseudonymization for
//! legal documents and correspondence.
//!
//! The pipeline normalizes a document, runs a family of rule detectors
//! (optionally joined by injected NER/coref providers), links mentions of
//! the same real-world subject into clusters, resolves overlaps by
//! precedence, generates seeded shape-preserving pseudonyms, validates
//! them against a safety guard, applies the replacement plan, and then
//! re-detects on the output to score residual leakage.
//!
//! Entirely offline: no network access, no persistence, no I/O. Callers
//! provide the text, the config, and (optionally) the seed secret; the
//! [`sanitize_document`] entry point returns the sanitized text together
//! with an audit bundle and a verification report.

pub mod audit;
pub mod checksum;
pub mod config;
pub mod constants;
pub mod detectors;
pub mod error;
pub mod linker;
pub mod merge;
pub mod pipeline;
pub mod plan;
pub mod preprocess;
pub mod pseudonym;
pub mod safety;
pub mod span;
pub mod utils;
pub mod verify;

// Re-export commonly used types
pub use audit::{AuditBundle, AuditEntry};
pub use config::{AliasMode, RedactionConfig, resolve_secret_from_env};
pub use detectors::ner::{CorefProvider, NerCategory, NerProvider, NerSpan};
pub use error::{RedactError, Result, EXIT_CONFIG, EXIT_IO, EXIT_PIPELINE, EXIT_SUCCESS, EXIT_VERIFICATION};
pub use linker::{ClusterKind, EntityCluster};
pub use pipeline::{sanitize_document, sanitize_document_with_providers, Providers, SanitizeOutcome};
pub use plan::{Plan, PlanEntry};
pub use span::{AccountSubtype, DetectorKind, Label, Span};
pub use verify::{Residual, VerificationReport};
