//! Property tests for the snapshot filename codec

use proptest::prelude::*;
use sqlsnap_core::naming::{decode, encode, SnapshotInstant, SnapshotName};

fn arb_instant() -> impl Strategy<Value = SnapshotInstant> {
    (0u32..=9999, 1u32..=12, 1u32..=28, 0u32..=23, 0u32..=59, 0u32..=59).prop_map(
        |(y, mo, d, h, mi, s)| {
            SnapshotInstant::from_ymd_hms(y, mo, d, h, mi, s).expect("day <= 28 is always valid")
        },
    )
}

proptest! {
    #[test]
    fn decode_inverts_encode(instant in arb_instant()) {
        let name = encode(instant);
        prop_assert_eq!(decode(name.as_str()).unwrap(), instant);
    }

    #[test]
    fn encoded_names_have_fixed_shape(instant in arb_instant()) {
        let name = encode(instant);
        prop_assert_eq!(name.as_str().len(), "YYYY-MM-DD-HH-MM-SS.sql".len());
        prop_assert!(name.as_str().ends_with(".sql"));
    }

    #[test]
    fn string_order_equals_time_order(a in arb_instant(), b in arb_instant()) {
        let (na, nb) = (encode(a), encode(b));
        prop_assert_eq!(na.as_str().cmp(nb.as_str()), a.cmp(&b));
        prop_assert_eq!(na.cmp(&nb), a.cmp(&b));
    }

    #[test]
    fn parse_accepts_every_encoded_name(instant in arb_instant()) {
        let name = encode(instant);
        let parsed = SnapshotName::parse(name.as_str()).unwrap();
        prop_assert_eq!(parsed, name);
    }

    #[test]
    fn decode_never_panics(s in "\\PC{0,40}") {
        let _ = decode(&s);
    }
}
