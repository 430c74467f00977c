//! Luhn mod-10 checksum
//!
//! Order numbers are accepted only when their last digit is the Luhn check
//! digit of the preceding ones. Inputs are decimal strings so numbers longer
//! than `u64` can be checked without loss.

/// Sum of the Luhn-weighted digits, walking from the rightmost digit.
/// `double_first` selects whether the rightmost digit is doubled.
fn weighted_sum(digits: &[u8], double_first: bool) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &b)| {
            let d = u32::from(b - b'0');
            if (i % 2 == 0) == double_first {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `true` when `number` is a non-empty run of ASCII digits with a valid check digit.
pub fn is_valid(number: &str) -> bool {
    all_digits(number) && weighted_sum(number.as_bytes(), false) % 10 == 0
}

/// Check digit that makes `base` followed by it a valid Luhn number.
pub fn check_digit(base: &str) -> Option<u8> {
    if !all_digits(base) {
        return None;
    }
    // once the check digit is appended every digit of `base` shifts one
    // position left, so the rightmost digit of `base` is the first doubled
    let sum = weighted_sum(base.as_bytes(), true);
    Some(((10 - sum % 10) % 10) as u8)
}
