//! Instrument Symbol
//!
//! The normalized ticker identifier that flows through every layer of the
//! pipeline. A `Symbol` can only be built through [`Symbol::parse`], so any
//! value of this type is already trimmed, uppercased and validated. Two inputs
//! that differ only in case or surrounding whitespace produce equal symbols.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum accepted symbol length after normalization.
pub const MAX_SYMBOL_LEN: usize = 32;

/// A normalized instrument ticker (e.g. `AAPL`, `BRK.B`, `^GSPC`, `EURUSD=X`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize and validate raw input.
    ///
    /// Surrounding whitespace is trimmed and ASCII letters are uppercased.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError`] if the input is empty after trimming, longer
    /// than [`MAX_SYMBOL_LEN`], or contains characters outside the ticker
    /// alphabet.
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let normalized = normalize(raw);

        if normalized.is_empty() {
            return Err(SymbolError::Empty);
        }

        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong {
                len: normalized.len(),
            });
        }

        if let Some(c) = normalized.chars().find(|&c| !is_ticker_char(c)) {
            return Err(SymbolError::InvalidCharacter(c));
        }

        Ok(Self(normalized))
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trim surrounding whitespace and uppercase ASCII letters.
///
/// This is the normalization used for equality; it does not validate.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

const fn is_ticker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Symbol validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// Nothing left after trimming.
    #[error("symbol is required")]
    Empty,

    /// Longer than [`MAX_SYMBOL_LEN`].
    #[error("symbol is too long ({len} characters, max {MAX_SYMBOL_LEN})")]
    TooLong {
        /// Normalized length.
        len: usize,
    },

    /// Character outside the ticker alphabet.
    #[error("symbol contains invalid character {0:?}")]
    InvalidCharacter(char),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("aapl", "AAPL" ; "lowercase")]
    #[test_case(" AAPL ", "AAPL" ; "padded")]
    #[test_case("Aapl", "AAPL" ; "mixed case")]
    #[test_case("\ttsla\n", "TSLA" ; "tabs and newlines")]
    #[test_case("brk.b", "BRK.B" ; "class share")]
    #[test_case("^gspc", "^GSPC" ; "index")]
    #[test_case("eurusd=x", "EURUSD=X" ; "currency pair")]
    fn parse_normalizes(raw: &str, expected: &str) {
        assert_eq!(Symbol::parse(raw).unwrap().as_str(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace only")]
    fn parse_rejects_empty(raw: &str) {
        assert_eq!(Symbol::parse(raw), Err(SymbolError::Empty));
    }

    #[test]
    fn parse_rejects_interior_whitespace() {
        assert_eq!(
            Symbol::parse("AA PL"),
            Err(SymbolError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn parse_rejects_non_ascii() {
        assert!(matches!(
            Symbol::parse("ÄAPL"),
            Err(SymbolError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn parse_rejects_overlong() {
        let raw = "A".repeat(MAX_SYMBOL_LEN + 1);
        assert_eq!(
            Symbol::parse(&raw),
            Err(SymbolError::TooLong {
                len: MAX_SYMBOL_LEN + 1
            })
        );
    }

    #[test]
    fn deserialize_normalizes() {
        let symbol: Symbol = serde_json::from_str("\" msft \"").unwrap();
        assert_eq!(symbol.as_str(), "MSFT");
    }

    #[test]
    fn deserialize_rejects_empty() {
        assert!(serde_json::from_str::<Symbol>("\"  \"").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let symbol = Symbol::parse("nvda").unwrap();
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"NVDA\"");
    }

    proptest! {
        #[test]
        fn case_and_padding_do_not_change_identity(
            ticker in "[A-Z]{1,5}",
            left in "[ \t]{0,3}",
            right in "[ \t]{0,3}",
        ) {
            let padded = format!("{left}{}{right}", ticker.to_lowercase());
            prop_assert_eq!(Symbol::parse(&padded).unwrap(), Symbol::parse(&ticker).unwrap());
        }
    }
}
