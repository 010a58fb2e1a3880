use serde::Deserialize;
use std::fmt;

use crate::error::ThrottleError;

const KILO: u64 = 1024;
const MEGA: u64 = KILO * 1024;
const GIGA: u64 = MEGA * 1024;

/// Parse a size such as `"512"`, `"64k"`, `"10M"` or `"1g"` into bytes.
///
/// Units are binary (`k` = 1024). Only a single trailing unit letter is accepted.
pub fn parse_size(value: &str) -> Result<u64, ThrottleError> {
    let trimmed = value.trim();
    let invalid = || ThrottleError::InvalidSize(value.to_string());

    let (digits, scale) = match trimmed.as_bytes().last() {
        Some(b'k' | b'K') => (&trimmed[..trimmed.len() - 1], KILO),
        Some(b'm' | b'M') => (&trimmed[..trimmed.len() - 1], MEGA),
        Some(b'g' | b'G') => (&trimmed[..trimmed.len() - 1], GIGA),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let base: u64 = digits.parse().map_err(|_| invalid())?;
    base.checked_mul(scale).ok_or_else(invalid)
}

/// A byte count written either as a plain integer or a size string in TOML.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "SizeRepr")]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Text(String),
}

impl TryFrom<SizeRepr> for ByteSize {
    type Error = ThrottleError;

    fn try_from(repr: SizeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRepr::Bytes(n) => Ok(ByteSize(n)),
            SizeRepr::Text(s) => parse_size(&s).map(ByteSize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_sizes() {
        assert_eq!(parse_size("0"), Ok(0));
        assert_eq!(parse_size("1500"), Ok(1500));
        assert_eq!(parse_size("8k"), Ok(8192));
        assert_eq!(parse_size("8K"), Ok(8192));
        assert_eq!(parse_size("2m"), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size(" 1G "), Ok(1024 * 1024 * 1024));
    }

    #[test]
    fn rejects_malformed_sizes() {
        for bad in ["", "k", "-1", "+5", "1.5k", "10kb", "ten", "12 k"] {
            assert!(
                matches!(parse_size(bad), Err(ThrottleError::InvalidSize(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_size("18446744073709551615").is_ok());
        assert!(parse_size("18446744073709551616").is_err());
        assert!(parse_size("17179869184g").is_err());
    }
}
