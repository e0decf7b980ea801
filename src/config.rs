//! Redaction configuration.
//!
//! The core never reads the environment or the filesystem on its own: the
//! boundary resolves the secret (see [`resolve_secret_from_env`]) and hands
//! the parsed config in. Unknown options are rejected at parse time.

use serde::{Deserialize, Serialize};

use crate::error::{RedactError, Result};

/// How alias labels are redacted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AliasMode {
    /// Replace alias terms like any other mention.
    #[default]
    Replace,
    /// Keep role-word aliases (Buyer, Seller, ...) in place.
    KeepRoles,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct SeedConfig {
    /// Name of the environment variable holding the seed secret. Resolved
    /// by the boundary, never by the core.
    pub secret_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PseudonymConfig {
    /// Key pseudonyms per document (false) or across documents (true).
    pub cross_doc_consistency: bool,
    /// Fail with a config error when no secret is supplied.
    pub require_secret: bool,
    pub seed: SeedConfig,
}

impl Default for PseudonymConfig {
    fn default() -> Self {
        Self {
            cross_doc_consistency: false,
            require_secret: false,
            seed: SeedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct NerConfig {
    pub enable: bool,
    /// Escalate a missing or failing NER provider to a fatal error.
    pub require: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct CorefConfig {
    pub enable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct DetectorsConfig {
    pub ner: NerConfig,
    pub coref: CorefConfig,
    /// Literal terms that detectors must never flag (false-positive
    /// allowlist, matched case-insensitively).
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct RedactConfig {
    pub alias_labels: AliasMode,
    /// Replace DATE_GENERIC spans too (DOBs are always replaced).
    pub generic_dates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct VerificationConfig {
    /// Strict mode: any residual fails the run.
    pub fail_on_residual: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct SafetyConfig {
    /// Values that must never appear in sanitized output (known real
    /// emails, banks, people). Matched case-insensitively.
    pub sensitive_values: Vec<String>,
    /// Issuer prefixes a generated card/routing number must avoid.
    pub issuer_prefixes: Vec<String>,
}

/// Top-level redaction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct RedactionConfig {
    pub pseudonyms: PseudonymConfig,
    pub detectors: DetectorsConfig,
    pub redact: RedactConfig,
    pub verification: VerificationConfig,
    pub safety: SafetyConfig,
}

impl RedactionConfig {
    /// Parse and validate a TOML config document. Unknown keys are a
    /// [`RedactError::Config`].
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: RedactionConfig =
            toml::from_str(raw).map_err(|e| RedactError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pseudonyms.require_secret
            && self
                .pseudonyms
                .seed
                .secret_env
                .as_deref()
                .map_or(true, |v| v.trim().is_empty())
        {
            return Err(RedactError::Config(
                "pseudonyms.require_secret is set but pseudonyms.seed.secret_env is empty".into(),
            ));
        }
        for value in &self.safety.sensitive_values {
            if value.trim().is_empty() {
                return Err(RedactError::Config(
                    "safety.sensitive_values entries must be non-empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Boundary helper: look up the configured seed secret in the process
/// environment. The core pipeline itself never touches the environment;
/// callers invoke this once at startup and pass the bytes in.
pub fn resolve_secret_from_env(config: &RedactionConfig) -> Result<Option<Vec<u8>>> {
    let Some(var) = config.pseudonyms.seed.secret_env.as_deref() else {
        if config.pseudonyms.require_secret {
            return Err(RedactError::Config(
                "pseudonyms.require_secret is set but no secret_env is configured".into(),
            ));
        }
        return Ok(None);
    };
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(Some(value.into_bytes())),
        _ if config.pseudonyms.require_secret => Err(RedactError::Config(format!(
            "required seed secret not present in environment variable '{var}'"
        ))),
        _ => Ok(None),
    }
}
