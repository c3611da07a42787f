//! Opaque 32-byte reference to off-chain application data.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte reference (e.g. a content hash or packed CID) to a
/// beneficiary application stored off-chain. The engine never dereferences it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef([u8; 32]);

impl ContentRef {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Pack a short UTF-8 label into the reference, right-padded with zeros.
    pub fn from_label(label: &str) -> Result<Self, TypesError> {
        let raw = label.as_bytes();
        if raw.len() > 32 {
            return Err(TypesError::InvalidContentRef(format!(
                "label is {} bytes, max 32",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 32];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    /// Parse 64 hex digits, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let decoded =
            hex::decode(digits).map_err(|e| TypesError::InvalidContentRef(e.to_string()))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
            TypesError::InvalidContentRef(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentRef({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for ContentRef {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_zero_padded() {
        let r = ContentRef::from_label("testCid").unwrap();
        assert_eq!(&r.as_bytes()[..7], b"testCid");
        assert!(r.as_bytes()[7..].iter().all(|b| *b == 0));
    }

    #[test]
    fn label_longer_than_32_bytes_is_rejected() {
        let long = "x".repeat(33);
        assert!(ContentRef::from_label(&long).is_err());
    }

    #[test]
    fn display_parses_back() {
        let r = ContentRef::from_label("QmHash").unwrap();
        let parsed: ContentRef = r.to_string().parse().unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn short_hex_is_rejected() {
        assert!(matches!(
            ContentRef::from_hex("0xdeadbeef"),
            Err(TypesError::InvalidContentRef(_))
        ));
    }
}
