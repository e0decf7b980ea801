//! Safety guard: every candidate replacement is validated before it may
//! enter the plan, and rejected candidates force a regeneration with a new
//! retry salt.

use crate::checksum;
use crate::config::RedactionConfig;
use crate::constants::{SAFE_EMAIL_DOMAINS, SAFE_PHONE_AREA_CODE};
use crate::span::{AccountSubtype, Label, SpanAttrs};

/// Why a candidate was rejected. Reasons land in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EqualsOriginal,
    SensitiveValue,
    BadEmailDomain,
    BadPhoneArea,
    ChecksumInvalid,
    IssuerPrefix,
    FirstHalfUnchanged,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::EqualsOriginal => "equals_original",
            Rejection::SensitiveValue => "sensitive_value",
            Rejection::BadEmailDomain => "bad_email_domain",
            Rejection::BadPhoneArea => "bad_phone_area",
            Rejection::ChecksumInvalid => "checksum_invalid",
            Rejection::IssuerPrefix => "issuer_prefix",
            Rejection::FirstHalfUnchanged => "first_half_unchanged",
        }
    }
}

/// Placeholder used when no safe candidate could be generated and the run
/// is not strict.
pub fn fallback_placeholder(label: Label) -> String {
    format!("[REDACTED_{}]", label.as_str())
}

/// Card/routing prefixes that correspond to real issuers; candidates must
/// not begin with any of these. Callers may extend the list via
/// `safety.issuer_prefixes`.
const DEFAULT_ISSUER_PREFIXES: &[&str] = &["3", "4", "5", "6"];

pub struct SafetyGuard<'a> {
    cfg: &'a RedactionConfig,
}

impl<'a> SafetyGuard<'a> {
    pub fn new(cfg: &'a RedactionConfig) -> Self {
        Self { cfg }
    }

    /// Validate one candidate replacement. `Ok(())` admits the candidate
    /// into the plan.
    pub fn check(
        &self,
        label: Label,
        attrs: &SpanAttrs,
        original: &str,
        candidate: &str,
    ) -> Result<(), Rejection> {
        if candidate.eq_ignore_ascii_case(original) {
            return Err(Rejection::EqualsOriginal);
        }
        if self.is_sensitive(candidate) {
            return Err(Rejection::SensitiveValue);
        }
        match label {
            Label::Email => self.check_email(candidate),
            Label::Phone => self.check_phone(candidate),
            Label::AccountId => {
                let subtype = attrs.account_subtype.unwrap_or(AccountSubtype::Cc);
                self.check_account(subtype, original, candidate)
            }
            _ => Ok(()),
        }
    }

    fn is_sensitive(&self, candidate: &str) -> bool {
        self.cfg
            .safety
            .sensitive_values
            .iter()
            .any(|v| candidate.eq_ignore_ascii_case(v) || contains_fold(candidate, v))
    }

    fn check_email(&self, candidate: &str) -> Result<(), Rejection> {
        let domain = candidate.rsplit_once('@').map(|(_, d)| d).unwrap_or("");
        if SAFE_EMAIL_DOMAINS.contains(&domain) {
            Ok(())
        } else {
            Err(Rejection::BadEmailDomain)
        }
    }

    fn check_phone(&self, candidate: &str) -> Result<(), Rejection> {
        let digits: Vec<char> = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
        // Skip the country prefix if present.
        let national_start = if candidate.trim_start().starts_with('+') {
            digits.len().saturating_sub(10).clamp(1, 3)
        } else if digits.len() == 11 && digits.first() == Some(&'1') {
            1
        } else {
            0
        };
        let national: String = digits[national_start..].iter().collect();
        if national.starts_with(SAFE_PHONE_AREA_CODE) {
            Ok(())
        } else {
            Err(Rejection::BadPhoneArea)
        }
    }

    fn check_account(
        &self,
        subtype: AccountSubtype,
        original: &str,
        candidate: &str,
    ) -> Result<(), Rejection> {
        let checksum_ok = match subtype {
            AccountSubtype::Cc => checksum::luhn_valid(candidate),
            AccountSubtype::Aba => checksum::aba_valid(candidate),
            AccountSubtype::Iban => checksum::iban_valid(candidate),
            // Format-only subtypes have no checksum to verify.
            AccountSubtype::Ssn | AccountSubtype::Ein | AccountSubtype::Bic => true,
        };
        if !checksum_ok {
            return Err(Rejection::ChecksumInvalid);
        }

        if matches!(subtype, AccountSubtype::Cc | AccountSubtype::Aba) {
            let lead: String = candidate
                .chars()
                .filter(|c| c.is_ascii_digit())
                .take(6)
                .collect();
            let configured = &self.cfg.safety.issuer_prefixes;
            let issuer_hit = DEFAULT_ISSUER_PREFIXES
                .iter()
                .copied()
                .chain(configured.iter().map(String::as_str))
                .any(|p| !p.is_empty() && lead.starts_with(p));
            if issuer_hit {
                return Err(Rejection::IssuerPrefix);
            }
        }

        // Numeric IDs must differ from the original early, not only in the
        // tail digits.
        let orig_digits: Vec<char> = original.chars().filter(|c| c.is_ascii_digit()).collect();
        let cand_digits: Vec<char> = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
        if !orig_digits.is_empty() && orig_digits.len() == cand_digits.len() {
            let half = orig_digits.len().div_ceil(2);
            if orig_digits[..half] == cand_digits[..half] {
                return Err(Rejection::FirstHalfUnchanged);
            }
        }
        Ok(())
    }
}

/// Case-insensitive containment for sensitive-value matching.
fn contains_fold(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
