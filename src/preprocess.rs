//! Unicode normalization with an exact byte map back to the original text.
//!
//! The rest of the pipeline operates on the normalized text only; audit
//! entries are reported in original offsets through the [`CharMap`].

use unicode_normalization::char::{compose, is_combining_mark};

/// Byte-indexed map from normalized text positions to original offsets.
///
/// `map[i]` is the offset in the original document of the first byte that
/// produced normalized byte `i`. The map is non-decreasing and has exactly
/// one entry per byte of the normalized text.
#[derive(Debug, Clone)]
pub struct CharMap {
    map: Vec<usize>,
    original_len: usize,
}

impl CharMap {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Original offset of the normalized start position `i`.
    pub fn map_start(&self, i: usize) -> usize {
        self.map[i]
    }

    /// Original offset for an exclusive end position.
    pub fn map_end(&self, end: usize) -> usize {
        if end >= self.map.len() {
            self.original_len
        } else {
            self.map[end]
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }
}

/// Characters erased outright during normalization.
fn is_zero_width(ch: char) -> bool {
    matches!(ch, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

/// Single-character folds: Unicode spaces to ASCII space, smart quotes and
/// hyphen variants to their ASCII equivalents. Line breaks are preserved.
fn fold_char(ch: char) -> char {
    match ch {
        '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}'
        | '\u{3000}' => ' ',
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
        '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
        _ => ch,
    }
}

/// Normalized text plus the byte map back into the original document.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    pub char_map: CharMap,
}

/// Normalize a raw document: NFC composition, zero-width removal,
/// space/quote/hyphen folding. Produces `(normalized_text, char_map)` with
/// `char_map.len() == normalized_text.len()`.
pub fn normalize(raw: &str) -> Normalized {
    let mut text = String::with_capacity(raw.len());
    let mut map: Vec<usize> = Vec::with_capacity(raw.len());

    // Pending base character awaiting a possible combining mark. NFC over a
    // char stream reduces to pairwise composition against the running base;
    // that keeps the offset of each emitted character exact.
    let mut pending: Option<(char, usize)> = None;

    let flush = |pending: &mut Option<(char, usize)>, text: &mut String, map: &mut Vec<usize>| {
        if let Some((ch, offset)) = pending.take() {
            let folded = fold_char(ch);
            let start = text.len();
            text.push(folded);
            for _ in start..text.len() {
                map.push(offset);
            }
        }
    };

    for (offset, ch) in raw.char_indices() {
        if is_zero_width(ch) {
            continue;
        }
        if is_combining_mark(ch) {
            if let Some((base, base_offset)) = pending {
                if let Some(composed) = compose(base, ch) {
                    pending = Some((composed, base_offset));
                    continue;
                }
            }
            // No base to compose with: emit the mark as-is.
            flush(&mut pending, &mut text, &mut map);
            pending = Some((ch, offset));
            continue;
        }
        flush(&mut pending, &mut text, &mut map);
        pending = Some((ch, offset));
    }
    flush(&mut pending, &mut text, &mut map);

    debug_assert_eq!(text.len(), map.len());
    debug_assert!(map.windows(2).all(|w| w[0] <= w[1]));

    Normalized {
        text,
        char_map: CharMap {
            map,
            original_len: raw.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_is_identity() {
        let n = normalize("John Doe was here.");
        assert_eq!(n.text, "John Doe was here.");
        assert_eq!(n.char_map.len(), n.text.len());
        for (i, &orig) in n.char_map.as_slice().iter().enumerate() {
            assert_eq!(i, orig);
        }
    }

    #[test]
    fn zero_width_characters_removed() {
        let n = normalize("Jo\u{200B}hn\u{FEFF} Doe");
        assert_eq!(n.text, "John Doe");
        // The 'h' after the zero-width space still maps to its original offset.
        let h_pos = n.text.find('h').unwrap();
        assert_eq!(n.char_map.map_start(h_pos), "Jo\u{200B}".len());
    }

    #[test]
    fn unicode_spaces_fold_to_ascii() {
        let n = normalize("John\u{00A0}Doe\u{2003}here");
        assert_eq!(n.text, "John Doe here");
    }

    #[test]
    fn smart_quotes_and_hyphens_fold() {
        let n = normalize("\u{201C}Buyer\u{201D} and O\u{2019}Brien \u{2014} co\u{2010}op");
        assert_eq!(n.text, "\"Buyer\" and O'Brien - co-op");
    }

    #[test]
    fn nfc_composition_preserves_offsets() {
        // 'e' + combining acute accent composes to U+00E9.
        let raw = "Re\u{0301}sume\u{0301} of Jane";
        let n = normalize(raw);
        assert_eq!(n.text, "R\u{00E9}sum\u{00E9} of Jane");
        assert_eq!(n.char_map.len(), n.text.len());
        // The composed character maps back to the base 'e' offset.
        let e_acute_pos = n.text.find('\u{00E9}').unwrap();
        assert_eq!(n.char_map.map_start(e_acute_pos), 1);
        // Map stays non-decreasing.
        let m = n.char_map.as_slice();
        assert!(m.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn line_breaks_preserved() {
        let n = normalize("line one\nline two\r\nline three");
        assert_eq!(n.text, "line one\nline two\r\nline three");
    }

    #[test]
    fn map_end_at_text_end() {
        let raw = "abc\u{200B}";
        let n = normalize(raw);
        assert_eq!(n.text, "abc");
        assert_eq!(n.char_map.map_end(3), raw.len());
    }

    #[test]
    fn empty_input() {
        let n = normalize("");
        assert!(n.text.is_empty());
        assert!(n.char_map.is_empty());
    }
}
