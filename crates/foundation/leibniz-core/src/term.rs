//! Gregory-Leibniz series terms.

use std::fmt;
use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Zero-based position of a term in the series.
pub type TermIndex = u64;

/// One computed element of the series. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub index: TermIndex,
    pub value: f64,
}

impl Term {
    /// Compute the term at `index` from the closed form `4 * (-1)^n / (2n + 1)`.
    ///
    /// The sign comes from the parity of `index` rather than from raising a
    /// negative base to a power, which loses precision for large `n`.
    pub fn compute(index: TermIndex) -> Self {
        let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
        let denominator = 2.0 * index as f64 + 1.0;
        Self {
            index,
            value: 4.0 * sign / denominator,
        }
    }
}

/// Check an index coming from a caller. Negative values are rejected.
pub fn validate_index<I>(index: I) -> Result<TermIndex>
where
    I: TryInto<TermIndex> + fmt::Display + Copy,
{
    index
        .try_into()
        .map_err(|_| Error::InvalidIndex(index.to_string()))
}

/// Parse a raw path segment into a term index.
///
/// Accepts a base-10 non-negative integer. Integers too large for a
/// [`TermIndex`] are `IndexOutOfRange`; anything else (a sign, fractions,
/// trailing garbage, empty input) is `InvalidIndex`.
pub fn parse_index(raw: &str) -> Result<TermIndex> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidIndex(raw.to_string()));
    }
    digits.parse::<TermIndex>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => Error::IndexOutOfRange(raw.to_string()),
        _ => Error::InvalidIndex(raw.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_form_values() {
        assert_eq!(Term::compute(0).value, 4.0);
        assert_eq!(Term::compute(1).value, -4.0 / 3.0);
        assert_eq!(Term::compute(10).value, 4.0 / 21.0);
        assert_eq!(Term::compute(25).value, -4.0 / 51.0);
        assert_eq!(Term::compute(50).value, 4.0 / 101.0);
    }

    #[test]
    fn test_sign_alternates() {
        for n in 0..100u64 {
            let term = Term::compute(n);
            assert_eq!(term.index, n);
            assert_eq!(term.value > 0.0, n % 2 == 0, "wrong sign at {n}");
        }
    }

    #[test]
    fn test_large_index_keeps_sign() {
        let odd = Term::compute(u32::MAX as u64);
        let even = Term::compute(u32::MAX as u64 + 1);
        assert!(odd.value < 0.0);
        assert!(even.value > 0.0);
    }

    #[test]
    fn test_validate_index() {
        assert_eq!(validate_index(0).unwrap(), 0);
        assert_eq!(validate_index(42).unwrap(), 42);
        assert_eq!(validate_index(u64::MAX).unwrap(), u64::MAX);
        assert!(validate_index(-1).unwrap_err().is_invalid_index());
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("10").unwrap(), 10);
        assert_eq!(parse_index("18446744073709551615").unwrap(), u64::MAX);
        assert!(parse_index("-1").unwrap_err().is_invalid_index());
        assert!(parse_index("+1").unwrap_err().is_invalid_index());
        assert!(parse_index("abc").is_err());
        assert!(parse_index("1.5").is_err());
        assert!(parse_index("12abc").is_err());
        assert!(parse_index("").is_err());
    }

    #[test]
    fn test_parse_index_past_u64_is_out_of_range() {
        let err = parse_index("99999999999999999999").unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange(ref raw) if raw == "99999999999999999999"));
        assert!(!err.is_invalid_index());
    }
}
