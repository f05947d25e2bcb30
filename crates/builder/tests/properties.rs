//! Property-based tests for CE encoding and builder round trips.

use proptest::prelude::*;

use kollate_builder::{Ce, Ce32, CollationDataBuilder};
use kollate_core::encode_one_ce_as_ce32;

/// CEs biased towards the shapes that fit a CE32.
fn ce_strategy() -> impl Strategy<Value = Ce> {
    prop_oneof![
        (0u32..=0x00FF_FFFF).prop_map(Ce::from_primary),
        (0u32..=0xFFFF, 0u16..=0xFF, 0u16..0xC0).prop_map(|(p, s, t)| Ce::new(p, s, t)),
        (any::<u16>(), 0u16..=0xFF).prop_map(|(s, t)| Ce::new(0, s, t)),
        (any::<u32>(), any::<u16>(), any::<u16>()).prop_map(|(p, s, t)| Ce::new(p, s, t)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn inline_ce32_round_trip(ce in ce_strategy()) {
        if let Some(ce32) = encode_one_ce_as_ce32(ce) {
            prop_assert_eq!(ce32.inline_ce(), Some(ce));
            prop_assert_eq!(Ce32::from_bits(ce32.to_bits()), ce32);
        }
    }

    #[test]
    fn common_weights_always_fit_below_24_bits(p in 0u32..=0x00FF_FFFF) {
        prop_assert_eq!(
            encode_one_ce_as_ce32(Ce::from_primary(p)),
            Some(Ce32::LongPrimary(p))
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn expansion_is_reproduced(ces in prop::collection::vec(ce_strategy(), 1..40)) {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "a", &ces).unwrap();
        let before = builder.lookup("", "a").unwrap();
        prop_assert_eq!(&before.ces, &ces);

        let data = builder.build().unwrap();
        let after = data.lookup("", "a").unwrap();
        prop_assert_eq!(after.ces, ces);
        prop_assert_eq!(after.consumed, 1);
    }

    #[test]
    fn primary_range_arithmetic(
        start in 0u32..0x1_0000,
        len in 1u32..2000,
        step in 1u32..=0xFF,
        primary in 0x0100_0000u32..0xF000_0000,
    ) {
        let end = start + len - 1;
        let mut builder = CollationDataBuilder::new();
        let next = builder
            .set_primary_range_and_return_next(start, end, primary, step)
            .unwrap();
        prop_assert_eq!(next, primary + len * step);

        for c in [start, start + len / 2, end] {
            let ce = builder.get_single_ce(c).unwrap();
            prop_assert_eq!(ce, Ce::from_primary(primary + (c - start) * step));
        }
        prop_assert!(builder.has_mappings());
    }

    #[test]
    fn longest_contraction_wins(
        suffix in "[b-y]{1,6}",
        extra in "[b-z]{0,3}",
    ) {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "a", &[Ce::from_primary(0x1000)]).unwrap();
        let chars: Vec<char> = suffix.chars().collect();
        for k in 1..=chars.len() {
            let s: String = std::iter::once('a').chain(chars[..k].iter().copied()).collect();
            builder.add("", &s, &[Ce::from_primary(0x1000 + k as u32)]).unwrap();
        }

        let text = format!("a{suffix}z{extra}");
        let expected = Ce::from_primary(0x1000 + chars.len() as u32);
        let m = builder.lookup("", &text).unwrap();
        prop_assert_eq!(&m.ces, &vec![expected]);
        prop_assert_eq!(m.consumed, 1 + chars.len());

        let data = builder.build().unwrap();
        prop_assert_eq!(data.lookup("", &text), Some(m));
    }

    #[test]
    fn contextual_adds_grow_unsafe_set(
        prefix in "[p-r]{0,3}",
        s in "[a-e]{2,4}",
    ) {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "z", &[Ce::from_primary(0x0100)]).unwrap();
        prop_assert!(builder.has_mappings());

        builder.add(&prefix, &s, &[Ce::from_primary(0x2000)]).unwrap();
        prop_assert!(builder.has_mappings());
        for ch in prefix.chars().chain(s.chars()) {
            prop_assert!(builder.is_unsafe_backward(ch as u32));
        }
        prop_assert!(!builder.is_unsafe_backward('z' as u32));
    }
}
