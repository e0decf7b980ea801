//! Checksum math shared by the account detector and the pseudonym
//! generator: Luhn, ABA routing, and IBAN mod-97.

/// Luhn checksum over the digits of `s` (non-digits ignored).
pub fn luhn_valid(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    luhn_sum(&digits) % 10 == 0
}

fn luhn_sum(digits: &[u32]) -> u32 {
    let mut sum = 0;
    let mut alternate = false;
    for digit in digits.iter().rev() {
        let mut d = *digit;
        if alternate {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        alternate = !alternate;
    }
    sum
}

/// Check digit that makes `digits` followed by it Luhn-valid.
pub fn luhn_check_digit(digits: &[u32]) -> u32 {
    // Append a zero, sum, then pick the digit closing the sum to 0 mod 10.
    let mut with_zero = digits.to_vec();
    with_zero.push(0);
    (10 - luhn_sum(&with_zero) % 10) % 10
}

/// ABA routing checksum: 3*d1 + 7*d2 + 1*d3 + ... over 9 digits, mod 10 == 0.
pub fn aba_valid(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 9 {
        return false;
    }
    aba_weighted_sum(&digits) % 10 == 0
}

fn aba_weighted_sum(digits: &[u32]) -> u32 {
    const WEIGHTS: [u32; 9] = [3, 7, 1, 3, 7, 1, 3, 7, 1];
    digits
        .iter()
        .zip(WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum()
}

/// Ninth digit completing the first eight to a valid routing number.
pub fn aba_check_digit(first_eight: &[u32]) -> u32 {
    debug_assert_eq!(first_eight.len(), 8);
    let partial = aba_weighted_sum(first_eight);
    // The ninth position carries weight 1.
    (10 - partial % 10) % 10
}

/// IBAN mod-97 validation per ISO 13616: move the first four characters to
/// the end, map letters to 10..35, and require the remainder to be 1.
pub fn iban_valid(s: &str) -> bool {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 15 || compact.len() > 34 {
        return false;
    }
    let bytes = compact.as_bytes();
    if !bytes[0].is_ascii_uppercase() || !bytes[1].is_ascii_uppercase() {
        return false;
    }
    if !bytes[2].is_ascii_digit() || !bytes[3].is_ascii_digit() {
        return false;
    }
    if !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    iban_mod97(&compact) == Some(1)
}

/// Remainder of the rearranged IBAN interpreted as a decimal number, mod 97.
fn iban_mod97(compact: &str) -> Option<u32> {
    let rearranged = format!("{}{}", &compact[4..], &compact[..4]);
    let mut rem: u32 = 0;
    for ch in rearranged.chars() {
        let value = match ch {
            '0'..='9' => ch as u32 - '0' as u32,
            'A'..='Z' => ch as u32 - 'A' as u32 + 10,
            'a'..='z' => ch as u32 - 'a' as u32 + 10,
            _ => return None,
        };
        if value >= 10 {
            rem = (rem * 100 + value) % 97;
        } else {
            rem = (rem * 10 + value) % 97;
        }
    }
    Some(rem)
}

/// Check digits ("## " in positions 3-4) that make `cc` + digits + `bban`
/// a valid IBAN.
pub fn iban_check_digits(country: &str, bban: &str) -> u32 {
    // With check digits "00" the required pair is 98 minus the remainder.
    let candidate = format!("{country}00{bban}");
    let rem = iban_mod97(&candidate).unwrap_or(0);
    98 - rem
}
