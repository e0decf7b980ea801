//! Shape signatures: compact descriptions of casing, token count, and
//! punctuation used to make pseudonyms resemble the originals.

use crate::utils::{case_class, CaseClass};

/// Shape of a single whitespace-separated token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenShape {
    /// Single-letter initial, with or without the dot ("J.", "J").
    Initial { dotted: bool },
    /// A word token: casing class, character length, interior separator
    /// positions (apostrophes/hyphens), and trailing punctuation.
    Word {
        case: CaseClass,
        len: usize,
        /// Interior separators as (char index within the bare word, char).
        separators: Vec<(usize, char)>,
        /// Trailing non-word punctuation carried by the token (",", ".").
        trailing: String,
    },
}

/// Shape of a whole mention.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionShape {
    pub tokens: Vec<TokenShape>,
}

fn strip_trailing(token: &str) -> (&str, &str) {
    let trimmed = token.trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | ':'));
    // An initial like "J." keeps its dot; only strip when a word remains.
    if trimmed.len() == 1 && token.len() == 2 && token.ends_with('.') {
        return (token, "");
    }
    (trimmed, &token[trimmed.len()..])
}

pub fn token_shape(token: &str) -> TokenShape {
    let (bare, trailing) = strip_trailing(token);
    let chars: Vec<char> = bare.chars().collect();
    if chars.len() == 1 && chars[0].is_alphabetic() && chars[0].is_uppercase() {
        return TokenShape::Initial { dotted: false };
    }
    if chars.len() == 2 && chars[0].is_alphabetic() && chars[0].is_uppercase() && chars[1] == '.' {
        return TokenShape::Initial { dotted: true };
    }
    let mut separators = Vec::new();
    let mut word_len = 0usize;
    for ch in &chars {
        if matches!(ch, '\'' | '-') {
            separators.push((word_len, *ch));
        } else {
            word_len += 1;
        }
    }
    TokenShape::Word {
        case: case_class(bare),
        len: word_len,
        separators,
        trailing: trailing.to_string(),
    }
}

pub fn mention_shape(mention: &str) -> MentionShape {
    MentionShape {
        tokens: mention.split_whitespace().map(token_shape).collect(),
    }
}

impl MentionShape {
    /// Stable string form used when keying mention streams.
    pub fn signature(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push('-');
            }
            match token {
                TokenShape::Initial { dotted } => {
                    out.push(if *dotted { 'I' } else { 'i' });
                }
                TokenShape::Word {
                    case,
                    len,
                    separators,
                    trailing,
                } => {
                    out.push(match case {
                        CaseClass::Upper => 'U',
                        CaseClass::Title => 'T',
                        CaseClass::Lower => 'L',
                        CaseClass::Mixed => 'M',
                    });
                    out.push_str(&len.to_string());
                    for (pos, ch) in separators {
                        out.push(*ch);
                        out.push_str(&pos.to_string());
                    }
                    out.push_str(trailing);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_initials() {
        assert_eq!(token_shape("J."), TokenShape::Initial { dotted: true });
        assert_eq!(token_shape("J"), TokenShape::Initial { dotted: false });
    }

    #[test]
    fn classifies_words_with_separators() {
        match token_shape("O'Brien") {
            TokenShape::Word { case, len, separators, .. } => {
                assert_eq!(case, CaseClass::Mixed);
                assert_eq!(len, 6);
                assert_eq!(separators, vec![(1, '\'')]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn keeps_trailing_punctuation() {
        match token_shape("Bank,") {
            TokenShape::Word { trailing, .. } => assert_eq!(trailing, ","),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn signatures_distinguish_shapes() {
        assert_ne!(
            mention_shape("John Doe").signature(),
            mention_shape("JOHN DOE").signature()
        );
        assert_ne!(
            mention_shape("John Doe").signature(),
            mention_shape("J. Doe").signature()
        );
        assert_eq!(
            mention_shape("John Doe").signature(),
            mention_shape("Jane Roe").signature()
        );
    }
}
