//! Typed error surface for the sanitization pipeline.

use crate::span::Label;
use crate::verify::VerificationReport;

/// Process exit code for a clean run, exported for CLI collaborators.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code reserved for boundary I/O failures (file read/write).
pub const EXIT_IO: i32 = 3;
pub const EXIT_CONFIG: i32 = 4;
pub const EXIT_PIPELINE: i32 = 5;
pub const EXIT_VERIFICATION: i32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum RedactError {
    /// Missing secret when required, unknown option, or invalid value.
    /// Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// An optional provider (NER, coref) failed. Recovered locally by
    /// skipping the detector unless it is marked `require`.
    #[error("detector '{name}' failed: {source}")]
    Detector {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// No safe replacement could be generated after retries.
    #[error("could not generate a safe {label} replacement after {attempts} attempts")]
    Pseudonym { label: Label, attempts: u8 },

    /// Overlapping or stale plan entries after merge. Indicates a bug;
    /// always fatal, no output is produced.
    #[error("replacement plan invariant violated: {0}")]
    Plan(String),

    /// Residual PII detected in the sanitized output under strict mode.
    #[error("verification failed: {} residual(s), leakage score {}",
            report.residuals.len(), report.leakage_score)]
    Verification { report: Box<VerificationReport> },
}

impl RedactError {
    /// Exit code for CLI collaborators driving the pipeline.
    pub fn exit_code(&self) -> i32 {
        match self {
            RedactError::Config(_) => EXIT_CONFIG,
            RedactError::Detector { .. } => EXIT_PIPELINE,
            RedactError::Pseudonym { .. } => EXIT_PIPELINE,
            RedactError::Plan(_) => EXIT_PIPELINE,
            RedactError::Verification { .. } => EXIT_VERIFICATION,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedactError>;
