//! End-to-end builder scenarios.

use std::sync::Arc;

use kollate_builder::{
    BuilderConfig, Ce, Ce32, CollationDataBuilder, CollationError, IdentityModifier,
};
use kollate_core::{CodePointSet, CodePointTrie};

#[test]
fn single_ce_for_latin_capital_a() {
    let mut builder = CollationDataBuilder::new();
    builder
        .add("", "\u{0041}", &[Ce::new(0x26A0, 0x0020, 0x0002)])
        .unwrap();

    assert_eq!(builder.get_long_primary_if_single_ce(0x41), 0x26A0);
    assert_eq!(
        builder.get_single_ce(0x41).unwrap(),
        Ce::new(0x26A0, 0x0020, 0x0002)
    );
    // No expansion storage is needed.
    assert_eq!(builder.length_of_ces(), 0);
    assert_eq!(builder.length_of_ce32s(), 1);
}

#[test]
fn cjk_range_is_compressed() {
    let mut builder = CollationDataBuilder::new();
    let start = 0x4E00;
    let end = start + 999;
    assert!(builder
        .maybe_set_primary_range(start, end, 0x4000_0000, 0x80)
        .unwrap());

    let mut other = CollationDataBuilder::new();
    let next = other
        .set_primary_range_and_return_next(start, end, 0x4000_0000, 0x80)
        .unwrap();
    assert_eq!(next, 0x4000_0000 + 1000 * 0x80);

    let data = builder.build().unwrap();
    for c in [start, start + 1, start + 500, end] {
        assert_eq!(
            data.single_ce(c).unwrap(),
            Ce::from_primary(0x4000_0000 + (c - start) * 0x80)
        );
    }
    assert_eq!(data.ce32(end + 1), Ce32::Fallback);
}

#[test]
fn longest_context_wins() {
    let mut builder = CollationDataBuilder::new();
    let ces1 = [Ce::from_primary(0x3000)];
    let ces2 = [Ce::from_primary(0x3100), Ce::new(0, 0x8A00, 0x05)];
    builder.add("", "ab", &ces1).unwrap();
    builder.add("", "abc", &ces2).unwrap();

    let m = builder.lookup("", "abcd").unwrap();
    assert_eq!(m.ces, ces2.to_vec());
    assert_eq!(m.consumed, 3);

    let data = builder.build().unwrap();
    let m = data.lookup("", "abcd").unwrap();
    assert_eq!(m.ces, ces2.to_vec());
    assert_eq!(m.consumed, 3);
    let m = data.lookup("", "abx").unwrap();
    assert_eq!(m.ces, ces1.to_vec());

    // "a" alone has no mapping and no base data.
    assert!(data.lookup("", "ax").is_none());
    assert!(builder.is_unsafe_backward('a' as u32));
    assert!(builder.is_unsafe_backward('b' as u32));
    assert!(builder.is_unsafe_backward('c' as u32));
}

#[test]
fn prefix_mapping_with_base_fallback() {
    let mut base_builder = CollationDataBuilder::new();
    base_builder
        .add("", "\u{30FC}", &[Ce::from_primary(0x0500)])
        .unwrap();
    let base = Arc::new(base_builder.build().unwrap());

    let config = BuilderConfig::new().with_base(base);
    let mut builder = CollationDataBuilder::with_config(config);
    builder
        .add("\u{30A2}", "\u{30FC}", &[Ce::from_primary(0x0A00)])
        .unwrap();
    let data = builder.build().unwrap();

    let m = data.lookup("\u{30A2}", "\u{30FC}").unwrap();
    assert_eq!(m.ces, vec![Ce::from_primary(0x0A00)]);
    // Without the prefix the base mapping applies.
    let m = data.lookup("\u{30AB}", "\u{30FC}").unwrap();
    assert_eq!(m.ces, vec![Ce::from_primary(0x0500)]);
    assert!(data.is_unsafe_backward(0x30A2));
}

#[test]
fn copy_from_identity_preserves_lookups() {
    let mut src = CollationDataBuilder::new();
    src.add("", "a", &[Ce::from_primary(0x1000)]).unwrap();
    src.add("", "ae", &[Ce::from_primary(0x1000), Ce::from_primary(0x1200)])
        .unwrap();
    src.add("l", "\u{00B7}", &[Ce::new(0, 0x0500, 0x05)]).unwrap();
    src.maybe_set_primary_range(0x3400, 0x4DBF, 0x7000_0000, 2)
        .unwrap();

    let mut dest = CollationDataBuilder::new();
    dest.copy_from(&src, &IdentityModifier).unwrap();
    assert_eq!(dest.has_mappings(), src.has_mappings());

    let cases = [
        ("", "ae"),
        ("", "af"),
        ("l", "\u{00B7}"),
        ("", "\u{3500}"),
        ("", "q"),
    ];
    for (prefix, text) in cases {
        assert_eq!(dest.lookup(prefix, text), src.lookup(prefix, text));
    }

    let src_data = src.build().unwrap();
    let dest_data = dest.build().unwrap();
    for (prefix, text) in cases {
        assert_eq!(dest_data.lookup(prefix, text), src_data.lookup(prefix, text));
    }
    assert_eq!(dest_data.unsafe_backward(), src_data.unsafe_backward());
}

#[test]
fn has_mappings_is_monotonic() {
    let mut builder = CollationDataBuilder::new();
    assert!(!builder.has_mappings());
    builder.add("", "a", &[Ce::from_primary(0x1000)]).unwrap();
    assert!(builder.has_mappings());
    assert!(builder.add("", "a", &[Ce::from_primary(0x1000)]).is_err());
    assert!(builder.has_mappings());
    assert!(builder.build().is_err());
    assert!(builder.has_mappings());
}

#[test]
fn sticky_error_blocks_build() {
    let mut builder = CollationDataBuilder::new();
    let err = builder
        .add("", "", &[Ce::from_primary(0x1000)])
        .unwrap_err();
    assert!(matches!(err, CollationError::IllegalArgument(_)));
    assert_eq!(builder.build().unwrap_err(), err);
    assert_eq!(
        builder.maybe_set_primary_range(0x4E00, 0x9FFF, 0x4000_0000, 1),
        Err(err)
    );
}

#[test]
fn serialize_measure_then_fill() {
    let mut builder = CollationDataBuilder::new();
    builder.add("", "ab", &[Ce::from_primary(0x1000)]).unwrap();
    builder.add("", "\u{1D400}\u{1D401}", &[Ce::from_primary(0x1100)]).unwrap();

    // The trie is only available after building.
    assert!(matches!(
        builder.serialize_trie(&mut []),
        Err(CollationError::InvalidState(_))
    ));
    let data = builder.build().unwrap();

    let required = match builder.serialize_trie(&mut []) {
        Err(CollationError::BufferOverflow { required, .. }) => required,
        other => panic!("unexpected {other:?}"),
    };
    let mut bytes = vec![0u8; required];
    assert_eq!(builder.serialize_trie(&mut bytes), Ok(required));
    let trie = CodePointTrie::from_bytes(&bytes).unwrap();
    assert_eq!(&trie, &**data.trie());

    let mut small = [0u16; 2];
    let required = match builder.serialize_unsafe_backward_set(&mut small) {
        Err(CollationError::BufferOverflow { required, capacity }) => {
            assert_eq!(capacity, 2);
            required
        }
        other => panic!("unexpected {other:?}"),
    };
    let mut units = vec![0u16; required];
    assert_eq!(builder.serialize_unsafe_backward_set(&mut units), Ok(required));
    let set = CodePointSet::from_units(&units).unwrap();
    for c in ['a' as u32, 'b' as u32, 0x1D400, 0x1D401, 0xD835] {
        assert!(set.contains(c), "U+{c:04X}");
    }
    assert_eq!(&set, data.unsafe_backward());

    // Serializing does not disturb the builder.
    assert!(builder.status().is_ok());
}

#[test]
fn copy_keeps_contexts_inside_ranges() {
    let mut src = CollationDataBuilder::new();
    src.maybe_set_primary_range(0x4E00, 0x4E00 + 999, 0x5000_0000, 0x80)
        .unwrap();
    src.add("", "c", &[Ce::new(0x4000_0000, 0x21, 0x02)]).unwrap();
    src.add("", "\u{4E05}x", &[Ce::from_primary(0x2000)]).unwrap();

    let mut dest = CollationDataBuilder::new();
    dest.copy_from(&src, &IdentityModifier).unwrap();
    let cases = ["\u{4E05}", "\u{4E05}x", "\u{4E04}", "\u{4E06}", "c"];
    for text in cases {
        assert_eq!(dest.lookup("", text), src.lookup("", text), "{text:?}");
    }

    let src_data = src.build().unwrap();
    let dest_data = dest.build().unwrap();
    for text in cases {
        assert_eq!(dest_data.lookup("", text), src_data.lookup("", text), "{text:?}");
    }
    assert_eq!(
        dest_data.lookup("", "\u{4E05}").unwrap().ces,
        vec![Ce::from_primary(0x5000_0280)]
    );
}

#[test]
fn surrogate_range_survives_build() {
    let mut builder = CollationDataBuilder::new();
    builder
        .set_primary_range_and_return_next(0xD800, 0xDFFF, 0x7000_0000, 1)
        .unwrap();
    builder.add("", "\u{10400}", &[Ce::from_primary(0x3000)]).unwrap();
    let data = builder.build().unwrap();

    for c in [0xD800, 0xD801, 0xD900, 0xDBFF, 0xDFFF] {
        assert_eq!(
            data.single_ce(c).unwrap(),
            Ce::from_primary(0x7000_0000 + (c - 0xD800))
        );
    }
    // U+10400 is encoded with lead surrogate U+D801.
    assert_eq!(
        data.lead_surrogate(0xD801),
        Some(kollate_core::LeadSurrogateKind::Mixed)
    );
}
