//! Account identity used for proposers, voters, beneficiaries and custody.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque account identity (e.g. a hex address or a wallet name).
///
/// The engine only compares identities for equality; it never interprets them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account id from a raw string.
    ///
    /// # Panics
    /// Panics if the string is empty or contains whitespace. Use
    /// [`AccountId::parse`] for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(Self::is_well_formed(&s), "account id must be non-empty without whitespace");
        Self(s)
    }

    /// Parse an account id, rejecting empty or whitespace-containing input.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        if Self::is_well_formed(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(TypesError::InvalidAccount(raw.to_string()))
        }
    }

    /// Return the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(s: &str) -> bool {
        !s.is_empty() && !s.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = TypesError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let id = AccountId::parse("  0xabc ").unwrap();
        assert_eq!(id.as_str(), "0xabc");
    }

    #[test]
    fn parse_rejects_empty_and_inner_whitespace() {
        assert!(matches!(AccountId::parse(""), Err(TypesError::InvalidAccount(_))));
        assert!(matches!(AccountId::parse("a b"), Err(TypesError::InvalidAccount(_))));
    }

    #[test]
    fn try_from_rejects_instead_of_panicking() {
        assert_eq!(AccountId::try_from("alice").unwrap().as_str(), "alice");
        assert!(matches!(AccountId::try_from("   "), Err(TypesError::InvalidAccount(_))));
    }

    #[test]
    #[should_panic]
    fn new_panics_on_empty() {
        let _ = AccountId::new("");
    }
}
