//! Pipeline-wide constants
//!
//! This module centralizes thresholds, score weights, and retry limits so
//! tuning stays in one place.

// ============================================================================
// Detection thresholds
// ============================================================================

/// Minimum score for a person-name heuristic hit to survive filtering.
pub const PERSON_SCORE_THRESHOLD: f32 = 0.60;

/// Confidence for checksummed account matches (Luhn/ABA/IBAN/SSN).
pub const CONFIDENCE_CHECKSUMMED: f32 = 1.0;

/// Confidence for format-only account matches (EIN, BIC).
pub const CONFIDENCE_FORMAT_ONLY: f32 = 0.9;

/// Confidence for phone matches.
pub const CONFIDENCE_PHONE: f32 = 0.95;

/// Confidence for title-anchored person matches.
pub const CONFIDENCE_PERSON_TITLED: f32 = 0.9;

/// Confidence for bare capitalization-pattern person matches.
pub const CONFIDENCE_PERSON_BARE: f32 = 0.75;

/// Confidence for lexicon-driven organization matches.
pub const CONFIDENCE_ORG: f32 = 0.85;

/// Confidence for address-line grammar matches.
pub const CONFIDENCE_ADDRESS_LINE: f32 = 0.9;

/// Confidence for date grammar matches.
pub const CONFIDENCE_DATE: f32 = 0.95;

/// Confidence for alias-label captures.
pub const CONFIDENCE_ALIAS: f32 = 0.95;

/// Confidence for mentions synthesized by the linker from alias terms.
pub const CONFIDENCE_LINKED_MENTION: f32 = 0.9;

// ============================================================================
// Context windows
// ============================================================================

/// Distance (bytes) a DOB trigger may sit from a date to promote it.
pub const DOB_TRIGGER_WINDOW: usize = 40;

/// Bytes of context captured around a verification residual.
pub const RESIDUAL_CONTEXT_WINDOW: usize = 30;

/// How far back (bytes) the alias detector scans for a subject name.
pub const ALIAS_SUBJECT_WINDOW: usize = 80;

// ============================================================================
// Pseudonym generation
// ============================================================================

/// Regeneration attempts after the initial candidate (3 attempts total).
pub const SAFETY_MAX_RETRIES: u8 = 2;

/// Token length tolerance when picking dictionary replacements.
pub const TOKEN_LENGTH_TOLERANCE: usize = 2;

/// DOB shift bound, in days, on either side of the original date.
pub const DOB_SHIFT_RANGE_DAYS: i64 = 3650;

/// Email domains a generated address may use.
pub const SAFE_EMAIL_DOMAINS: [&str; 3] = ["example.org", "example.com", "example.net"];

/// Area code family reserved for generated phone numbers.
pub const SAFE_PHONE_AREA_CODE: &str = "555";

// ============================================================================
// Verification score weights
// ============================================================================

/// Weight for EMAIL/PHONE/ACCOUNT_ID/DOB residuals.
pub const LEAKAGE_WEIGHT_CRITICAL: u32 = 3;

/// Weight for PERSON/ADDRESS_BLOCK residuals.
pub const LEAKAGE_WEIGHT_HIGH: u32 = 2;

/// Weight for all other residual labels.
pub const LEAKAGE_WEIGHT_BASE: u32 = 1;
