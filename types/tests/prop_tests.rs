use proptest::prelude::*;

use grantgov_types::{AccountId, ContentRef, Timestamp, TokenAmount};

proptest! {
    /// ContentRef survives a trip through its hex display form.
    #[test]
    fn content_ref_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let r = ContentRef::new(bytes);
        let parsed = ContentRef::from_hex(&r.to_string()).unwrap();
        prop_assert_eq!(parsed.as_bytes(), &bytes);
    }

    /// ContentRef::is_zero is true only for all-zero bytes.
    #[test]
    fn content_ref_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        prop_assert_eq!(ContentRef::new(bytes).is_zero(), bytes == [0u8; 32]);
    }

    /// checked_add agrees with u128 arithmetic.
    #[test]
    fn token_amount_checked_add_matches_u128(a in any::<u128>(), b in any::<u128>()) {
        let sum = TokenAmount::new(a).checked_add(TokenAmount::new(b));
        prop_assert_eq!(sum.map(|s| s.raw()), a.checked_add(b));
    }

    /// has_expired flips exactly at start + duration.
    #[test]
    fn timestamp_expiry_boundary(start in 0u64..1_000_000_000, dur in 0u64..1_000_000) {
        let ts = Timestamp::new(start);
        prop_assert!(ts.has_expired(dur, Timestamp::new(start + dur)));
        if dur > 0 {
            prop_assert!(!ts.has_expired(dur, Timestamp::new(start + dur - 1)));
        }
    }

    /// Any non-empty, whitespace-free string is a valid account id.
    #[test]
    fn account_id_accepts_plain_identifiers(s in "[a-zA-Z0-9_]{1,42}") {
        let id = AccountId::parse(&s).unwrap();
        prop_assert_eq!(id.as_str(), s.as_str());
    }

    /// TokenAmount bincode serialization roundtrip.
    #[test]
    fn token_amount_bincode_roundtrip(raw in any::<u128>()) {
        let amount = TokenAmount::new(raw);
        let encoded = bincode::serialize(&amount).unwrap();
        let decoded: TokenAmount = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, amount);
    }
}
