//! Display-language code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`LanguageCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum LanguageCodeError {
    /// The input string is empty.
    #[error("language code cannot be empty")]
    Empty,
    /// The input contains characters outside `a-z`, `A-Z` and `-`.
    #[error("language code contains invalid characters: {0}")]
    InvalidCharacters(String),
    /// The primary subtag is not 2-3 letters.
    #[error("language code primary subtag must be 2-3 letters: {0}")]
    InvalidPrimarySubtag(String),
}

/// A BCP 47-style display-language code, e.g. `en`, `it` or `en-US`.
///
/// Orders carry the language the checkout should be displayed in. The code
/// is normalized on parse: the primary subtag is lowercased, a region
/// subtag (if present) is uppercased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse a `LanguageCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other
    /// than ASCII letters and `-`, or has a primary subtag that is not
    /// 2-3 letters.
    pub fn parse(s: &str) -> Result<Self, LanguageCodeError> {
        if s.is_empty() {
            return Err(LanguageCodeError::Empty);
        }

        if !s.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return Err(LanguageCodeError::InvalidCharacters(s.to_owned()));
        }

        let mut subtags = s.split('-');
        let primary = subtags.next().unwrap_or("");
        if primary.len() < 2 || primary.len() > 3 {
            return Err(LanguageCodeError::InvalidPrimarySubtag(s.to_owned()));
        }

        let mut normalized = primary.to_ascii_lowercase();
        if let Some(region) = subtags.next() {
            normalized.push('-');
            normalized.push_str(&region.to_ascii_uppercase());
        }

        Ok(Self(normalized))
    }

    /// Returns the language code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the primary language subtag, e.g. `en` for `en-US`.
    #[must_use]
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or("")
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
