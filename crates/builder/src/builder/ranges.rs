//! Primary weight ranges.
//!
//! A run of code points whose primaries grow by a fixed step can be stored
//! as one offset-data element plus an `Offset` value over the whole run,
//! instead of one CE32 per code point.

use super::{check_code_point, CollationDataBuilder};
use kollate_core::core::ce32::{offset_data, MAX_OFFSET_STEP};
use kollate_core::trie::DATA_BLOCK_LENGTH;
use kollate_core::{Ce, Ce32, CollationError, Result};
use tracing::trace;

const BLOCK_MASK: u32 = DATA_BLOCK_LENGTH as u32 - 1;

impl CollationDataBuilder {
    /// Store `start..=end` as an offset range if that is worthwhile.
    ///
    /// Code point `c` gets primary `primary + (c - start) * step` with common
    /// secondary and tertiary weights. Returns `false`, without changes, if
    /// the range is not compressed.
    pub fn maybe_set_primary_range(
        &mut self,
        start: u32,
        end: u32,
        primary: u32,
        step: u32,
    ) -> Result<bool> {
        self.guarded(|builder| builder.maybe_set_primary_range_inner(start, end, primary, step))
    }

    /// Map `start..=end` to increasing primaries and return the primary
    /// that follows the range.
    pub fn set_primary_range_and_return_next(
        &mut self,
        start: u32,
        end: u32,
        primary: u32,
        step: u32,
    ) -> Result<u32> {
        self.guarded(|builder| {
            builder.validate_range(start, end)?;
            let total = (end - start + 1) as u64 * step as u64;
            let next = u32::try_from(primary as u64 + total).map_err(|_| {
                CollationError::PrimaryOverflow {
                    primary,
                    offset: total,
                }
            })?;
            if !builder.maybe_set_primary_range_inner(start, end, primary, step)? {
                let mut p = primary;
                for c in start..=end {
                    let ce32 = builder.encode_one_ce_inner(Ce::from_primary(p))?;
                    builder.trie.set(c, ce32.to_bits())?;
                    p = p.wrapping_add(step);
                }
                builder.modified = true;
            }
            Ok(next)
        })
    }

    fn validate_range(&self, start: u32, end: u32) -> Result<()> {
        self.check_building()?;
        check_code_point(start)?;
        check_code_point(end)?;
        if start > end {
            return Err(CollationError::IllegalArgument(format!(
                "empty range U+{start:04X}..U+{end:04X}"
            )));
        }
        if self
            .trie
            .any_in_range(start, end, |v| Ce32::from_bits(v).is_complex())
        {
            return Err(CollationError::IllegalArgument(format!(
                "range U+{start:04X}..U+{end:04X} overlaps a complex mapping"
            )));
        }
        Ok(())
    }

    fn maybe_set_primary_range_inner(
        &mut self,
        start: u32,
        end: u32,
        primary: u32,
        step: u32,
    ) -> Result<bool> {
        self.validate_range(start, end)?;
        let offset = (end - start) as u64 * step as u64;
        if primary as u64 + offset > u32::MAX as u64 {
            return Err(CollationError::PrimaryOverflow { primary, offset });
        }
        if !self.config.compress_ranges || step == 0 || step > MAX_OFFSET_STEP {
            trace!(start, end, step, "range not compressible");
            return Ok(false);
        }

        // Worth it only if the range covers whole data blocks.
        let block_delta = (end >> 5) - (start >> 5);
        let compress = block_delta > 2
            || (block_delta > 0 && (start & BLOCK_MASK) <= 0x1C && (end & BLOCK_MASK) >= 3);
        if !compress {
            trace!(start, end, "range too short to compress");
            return Ok(false);
        }

        let index = self
            .store
            .add_offset_data(offset_data(primary, start, step))?;
        self.trie
            .set_range(start, end, Ce32::Offset { index }.to_bits())?;
        self.modified = true;
        trace!(start, end, primary, step, index, "compressed primary range");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuilderConfig;

    #[test]
    fn test_compressed_range() {
        let mut builder = CollationDataBuilder::new();
        let start = 0x4E00;
        let end = start + 999;
        assert!(builder
            .maybe_set_primary_range(start, end, 0x4000_0000, 0x80)
            .unwrap());
        assert_eq!(builder.length_of_ces(), 1);
        assert_eq!(
            builder.get_single_ce(start + 10).unwrap(),
            Ce::from_primary(0x4000_0000 + 10 * 0x80)
        );
        assert_eq!(
            builder.get_long_primary_if_single_ce(end),
            0x4000_0000 + 999 * 0x80
        );
        assert!(builder.has_mappings());
    }

    #[test]
    fn test_return_next() {
        let mut builder = CollationDataBuilder::new();
        let next = builder
            .set_primary_range_and_return_next(0x4E00, 0x4E00 + 999, 0x4000_0000, 0x80)
            .unwrap();
        assert_eq!(next, 0x4000_0000 + 1000 * 0x80);
    }

    #[test]
    fn test_short_range_is_literal() {
        let mut builder = CollationDataBuilder::new();
        assert!(!builder
            .maybe_set_primary_range(0x100, 0x104, 0x0100_0000, 2)
            .unwrap());
        assert!(!builder.has_mappings());

        let next = builder
            .set_primary_range_and_return_next(0x100, 0x104, 0x0100_0000, 2)
            .unwrap();
        assert_eq!(next, 0x0100_000A);
        for (i, c) in (0x100..=0x104).enumerate() {
            assert_eq!(
                builder.get_single_ce(c).unwrap(),
                Ce::from_primary(0x0100_0000 + 2 * i as u32)
            );
        }
    }

    #[test]
    fn test_disabled_compression() {
        let config = BuilderConfig::new().with_compress_ranges(false);
        let mut builder = CollationDataBuilder::with_config(config);
        let next = builder
            .set_primary_range_and_return_next(0x4E00, 0x4EFF, 0x4000_0000, 1)
            .unwrap();
        assert_eq!(next, 0x4000_0100);
        assert_eq!(
            builder.get_single_ce(0x4E80).unwrap(),
            Ce::from_primary(0x4000_0080)
        );
        assert!(!matches!(builder.get_ce32(0x4E80), Ce32::Offset { .. }));
    }

    #[test]
    fn test_primary_overflow() {
        let mut builder = CollationDataBuilder::new();
        let err = builder
            .set_primary_range_and_return_next(0x4E00, 0x4E00 + 999, 0xFFFF_0000, 0x80)
            .unwrap_err();
        assert!(matches!(err, CollationError::PrimaryOverflow { .. }));
        assert_eq!(builder.status(), Err(err));
    }

    #[test]
    fn test_range_over_contraction_rejected() {
        let mut builder = CollationDataBuilder::new();
        builder
            .add("", "\u{4E10}\u{4E11}", &[Ce::from_primary(0x1000)])
            .unwrap();
        assert!(matches!(
            builder.maybe_set_primary_range(0x4E00, 0x4EFF, 0x4000_0000, 1),
            Err(CollationError::IllegalArgument(_))
        ));
    }
}
