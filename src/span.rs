//! Span data model: labeled half-open ranges over the normalized text.

use serde::{Deserialize, Serialize};

/// Closed label taxonomy for detected PII.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Email,
    Phone,
    AccountId,
    BankOrg,
    GenericOrg,
    Person,
    AddressLine,
    AddressBlock,
    DateGeneric,
    Dob,
    AliasLabel,
    Location,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Email => "EMAIL",
            Label::Phone => "PHONE",
            Label::AccountId => "ACCOUNT_ID",
            Label::BankOrg => "BANK_ORG",
            Label::GenericOrg => "GENERIC_ORG",
            Label::Person => "PERSON",
            Label::AddressLine => "ADDRESS_LINE",
            Label::AddressBlock => "ADDRESS_BLOCK",
            Label::DateGeneric => "DATE_GENERIC",
            Label::Dob => "DOB",
            Label::AliasLabel => "ALIAS_LABEL",
            Label::Location => "LOCATION",
        }
    }

    /// Merge precedence tier. Higher wins when spans overlap.
    pub fn precedence(&self) -> u8 {
        match self {
            Label::AddressBlock => 120,
            Label::AccountId => 110,
            Label::Email => 100,
            Label::Phone => 90,
            Label::Dob => 80,
            Label::AliasLabel => 70,
            Label::BankOrg => 60,
            Label::Person => 50,
            Label::GenericOrg => 40,
            Label::Location => 30,
            Label::AddressLine => 20,
            Label::DateGeneric => 10,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account number subtypes, each with its own checksum/format rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountSubtype {
    Iban,
    Cc,
    Aba,
    Ssn,
    Ein,
    Bic,
}

impl AccountSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSubtype::Iban => "iban",
            AccountSubtype::Cc => "cc",
            AccountSubtype::Aba => "aba",
            AccountSubtype::Ssn => "ssn",
            AccountSubtype::Ein => "ein",
            AccountSubtype::Bic => "bic",
        }
    }
}

/// Which kind of postal line an ADDRESS_LINE span matched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AddressLineKind {
    Street,
    Unit,
    CityStateZip,
    PoBox,
}

/// Which detector produced a span.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Email,
    Phone,
    Account,
    Org,
    Person,
    Address,
    Date,
    Alias,
    Ner,
    Linker,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Email => "email",
            DetectorKind::Phone => "phone",
            DetectorKind::Account => "account",
            DetectorKind::Org => "org",
            DetectorKind::Person => "person",
            DetectorKind::Address => "address",
            DetectorKind::Date => "date",
            DetectorKind::Alias => "alias",
            DetectorKind::Ner => "ner",
            DetectorKind::Linker => "linker",
        }
    }
}

/// Label-specific span attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpanAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_subtype: Option<AccountSubtype>,
    /// strftime format string used to re-render shifted dates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    /// Subject name captured immediately before an alias definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_kind: Option<AddressLineKind>,
}

/// A labeled half-open byte range `[start, end)` over the normalized text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: Label,
    pub confidence: f32,
    pub source: DetectorKind,
    #[serde(default)]
    pub attrs: SpanAttrs,
}

impl Span {
    pub fn new(start: usize, end: usize, label: Label, confidence: f32, source: DetectorKind) -> Self {
        Self {
            start,
            end,
            label,
            confidence,
            source,
            attrs: SpanAttrs::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when the two ranges share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `self` fully contains `other`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Canonical ordering used wherever detector output is collected, so that
/// chunked or reordered execution cannot change downstream results.
pub fn sort_spans(spans: &mut [Span]) {
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then(a.label.cmp(&b.label))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_matches_taxonomy_order() {
        assert!(Label::AddressBlock.precedence() > Label::AccountId.precedence());
        assert!(Label::AccountId.precedence() > Label::Email.precedence());
        assert!(Label::AliasLabel.precedence() > Label::BankOrg.precedence());
        assert!(Label::Person.precedence() > Label::GenericOrg.precedence());
        assert!(Label::AddressLine.precedence() > Label::DateGeneric.precedence());
    }

    #[test]
    fn overlap_and_containment() {
        let a = Span::new(0, 10, Label::Person, 1.0, DetectorKind::Person);
        let b = Span::new(5, 15, Label::Person, 1.0, DetectorKind::Person);
        let c = Span::new(10, 20, Label::Person, 1.0, DetectorKind::Person);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let inner = Span::new(2, 8, Label::Person, 1.0, DetectorKind::Person);
        assert!(a.contains(&inner));
        assert!(!inner.contains(&a));
    }

    #[test]
    fn sort_is_stable_by_start_end_label() {
        let mut spans = vec![
            Span::new(5, 9, Label::Phone, 1.0, DetectorKind::Phone),
            Span::new(0, 4, Label::Email, 1.0, DetectorKind::Email),
            Span::new(5, 9, Label::Email, 1.0, DetectorKind::Email),
        ];
        sort_spans(&mut spans);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[1].label, Label::Email);
        assert_eq!(spans[2].label, Label::Phone);
    }

    #[test]
    fn label_serializes_screaming_snake() {
        let json = serde_json::to_string(&Label::AddressBlock).unwrap();
        assert_eq!(json, "\"ADDRESS_BLOCK\"");
        let json = serde_json::to_string(&Label::AccountId).unwrap();
        assert_eq!(json, "\"ACCOUNT_ID\"");
    }
}
