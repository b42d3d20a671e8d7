//! SKU number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`SkuNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuNumberError {
    /// The input string is empty (or only whitespace).
    #[error("SKU number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("SKU number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9_-]`.
    #[error("SKU number contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A stock keeping unit identifier such as `SKU-001`.
///
/// Parsing trims surrounding whitespace and upper-cases ASCII letters, so
/// `" sku-001 "` and `"SKU-001"` name the same SKU.
///
/// ## Constraints
///
/// - Length: 1-64 characters after trimming
/// - Characters: ASCII letters, digits, `-` and `_`
///
/// ## Examples
///
/// ```
/// use merchant_assistant_core::SkuNumber;
///
/// assert_eq!(SkuNumber::parse("sku-001").unwrap().as_str(), "SKU-001");
/// assert!(SkuNumber::parse("").is_err());
/// assert!(SkuNumber::parse("SKU 001").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct SkuNumber(String);

impl SkuNumber {
    /// Maximum length of a SKU number.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `SkuNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains characters other than ASCII
    /// alphanumerics, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SkuNumberError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SkuNumberError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(SkuNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(SkuNumberError::InvalidCharacter(bad));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the SKU number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `SkuNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SkuNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SkuNumber {
    type Err = SkuNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SkuNumber {
    type Error = SkuNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SkuNumber> for String {
    fn from(value: SkuNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for SkuNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for SkuNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SkuNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for SkuNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(SkuNumber::parse("SKU-001").unwrap().as_str(), "SKU-001");
        assert_eq!(SkuNumber::parse("widget_9").unwrap().as_str(), "WIDGET_9");
    }

    #[test]
    fn test_parse_trims_and_uppercases() {
        assert_eq!(SkuNumber::parse("  sku-004 ").unwrap().as_str(), "SKU-004");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(SkuNumber::parse("   "), Err(SkuNumberError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "A".repeat(SkuNumber::MAX_LENGTH + 1);
        assert!(matches!(
            SkuNumber::parse(&long),
            Err(SkuNumberError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(
            SkuNumber::parse("SKU 001"),
            Err(SkuNumberError::InvalidCharacter(' '))
        );
        assert_eq!(
            SkuNumber::parse("SKU;DROP"),
            Err(SkuNumberError::InvalidCharacter(';'))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SkuNumber = serde_json::from_str("\"sku-002\"").unwrap();
        assert_eq!(ok.as_str(), "SKU-002");

        let bad: Result<SkuNumber, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
