//! Predicates over submitted form values. Every check looks at the trimmed
//! string.

use std::num::ParseIntError;

/// Returns whether `s` parses as a base-10 integer.
///
/// ```
/// use otr_catalog::validation::is_integer;
/// assert!(is_integer(" 1935 "));
/// assert!(!is_integer("1935a"));
/// ```
pub fn is_integer(s: &str) -> bool {
    parse(s).is_ok()
}

/// Returns whether the character length of `s` lies in `[min, max]`.
pub fn length_in_range(s: &str, min: usize, max: usize) -> bool {
    let length = s.trim().chars().count();

    min <= length && length <= max
}

/// Returns whether the integer value of `s` lies in `[min, max]`. Fails when
/// `s` is not an integer; check with [`is_integer`] first.
pub fn integer_in_range(s: &str, min: i64, max: i64) -> Result<bool, ParseIntError> {
    let value = parse(s)?;

    Ok(min <= value && value <= max)
}

fn parse(s: &str) -> Result<i64, ParseIntError> {
    s.trim().parse::<i64>()
}
