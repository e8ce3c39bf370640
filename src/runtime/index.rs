//! Array index canonicalization
//!
//! A property key is an array index when it is the canonical decimal form of
//! an integer in `[0, 2^32 - 2]`. Every entry point classifies its key here
//! before deciding between indexed and named storage.

use crate::value::Value;

/// Largest valid array index (2^32 - 2)
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Parse a property name as an array index
///
/// Rejects the empty string, leading zeros (except `"0"` itself), signs,
/// non-digits and values above [`MAX_ARRAY_INDEX`].
pub fn str_to_index(name: &str) -> Option<u32> {
    match name.as_bytes() {
        [] => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        digits => {
            let mut n: u64 = 0;
            for &b in digits {
                if !b.is_ascii_digit() {
                    return None;
                }
                n = n * 10 + u64::from(b - b'0');
                if n > u64::from(MAX_ARRAY_INDEX) {
                    return None;
                }
            }
            Some(n as u32)
        }
    }
}

/// Classify a value-typed key as an array index
///
/// Numbers take a fast path; strings go through [`str_to_index`]. Other
/// primitives never name an index, and objects are expected to have been
/// converted to a primitive key by the caller.
pub fn to_index(key: &Value) -> Option<u32> {
    match key {
        Value::Number(n) => {
            let n = *n;
            // -0 is index 0, its string form is "0"
            if n >= 0.0 && n <= f64::from(MAX_ARRAY_INDEX) && n.fract() == 0.0 {
                Some(n as u32)
            } else {
                None
            }
        }
        Value::String(s) => str_to_index(s),
        _ => None,
    }
}
