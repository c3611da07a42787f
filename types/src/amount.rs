//! Bond-token amounts.
//!
//! Amounts are fixed-point integers (u128) in raw units, like an ERC-20 balance.
//! One whole token is `10^18` raw units.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Raw units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// An amount of the bond token, stored as raw units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// An amount of whole tokens (`tokens × 10^18` raw units), saturating on overflow.
    pub fn from_tokens(tokens: u128) -> Self {
        Self(tokens.saturating_mul(TOKEN_UNIT))
    }

    /// Parse a raw-unit decimal string (underscores allowed as separators).
    pub fn parse_raw(s: &str) -> Result<Self, TypesError> {
        let digits: String = s.trim().chars().filter(|c| *c != '_').collect();
        digits
            .parse::<u128>()
            .map(Self)
            .map_err(|e| TypesError::InvalidAmount(format!("{s:?}: {e}")))
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for TokenAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TokenAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / TOKEN_UNIT;
        let frac = self.0 % TOKEN_UNIT;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let frac = format!("{frac:018}");
            write!(f, "{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}
