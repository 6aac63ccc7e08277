//! Product code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProductCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductCodeError {
    /// The code is empty or only whitespace.
    #[error("product code cannot be empty")]
    Empty,
    /// The code is too long.
    #[error("product code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Catalog code identifying a product (e.g. `JM001`).
///
/// The code is the cart's line key: a cart never holds two lines with the
/// same code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

impl ProductCode {
    /// Maximum length of a product code.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `ProductCode`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed code is empty or longer than
    /// [`Self::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, ProductCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProductCodeError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ProductCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProductCode {
    type Err = ProductCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductCode {
    type Error = ProductCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductCode> for String {
    fn from(code: ProductCode) -> Self {
        code.0
    }
}

impl AsRef<str> for ProductCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ProductCode::parse(" JM001 ").unwrap().as_str(), "JM001");
        assert_eq!(ProductCode::parse(""), Err(ProductCodeError::Empty));
        assert!(matches!(
            ProductCode::parse(&"X".repeat(65)),
            Err(ProductCodeError::TooLong { max: 64 })
        ));
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<ProductCode>("\"  \"").is_err());
        let code: ProductCode = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(code.to_string(), "A");
    }
}
