//! Generation of fresh part IDs.
//!
//! IDs are derived from the registry on every call: the smallest non-negative integer whose
//! base-36 form `"<value>.<ext>"` is not registered yet.

use crate::Document;

const RADIX: u32 = 36;

/// Return the first unused ID of the form `"<base36>.<extension>"`.
pub fn next_part_id(document: &Document, extension: &str) -> String {
    (0u64..)
        .map(|value| format!("{}.{}", to_base36(value), extension))
        .find(|id| !document.contains_part(id))
        .unwrap_or_default()
}

/// Lowercase base-36 encoding of `value`.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = (value % RADIX as u64) as u32;
        digits.push(char::from_digit(digit, RADIX).unwrap_or('0'));
        value /= RADIX as u64;
    }
    digits.iter().rev().collect()
}
