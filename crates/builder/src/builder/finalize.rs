//! Turning a builder into collation data.

use super::digits::decimal_digits;
use super::CollationDataBuilder;
use kollate_core::core::ce32::{FALLBACK_CE32, UNASSIGNED_CE32};
use kollate_core::{
    hangul, Ce, Ce32, CollationData, CollationError, LeadSurrogateKind, Result,
    LEAD_SURROGATE_BASE, LEAD_SURROGATE_COUNT,
};
use std::sync::Arc;
use tracing::{debug, trace};

const LEAD_SURROGATES: std::ops::Range<u32> =
    LEAD_SURROGATE_BASE..LEAD_SURROGATE_BASE + LEAD_SURROGATE_COUNT as u32;

/// Supplementary code points encoded with a lead surrogate.
fn supplementary_range(lead: u32) -> (u32, u32) {
    let start = 0x1_0000 + ((lead - LEAD_SURROGATE_BASE) << 10);
    (start, start + 0x3FF)
}

impl CollationDataBuilder {
    /// Compile all mappings into collation data.
    ///
    /// Contexts are compiled, special values for digits and U+0000 are
    /// set, lead surrogates are summarized, and the trie is frozen. A builder can be built
    /// once; afterwards it only answers queries.
    pub fn build(&mut self) -> Result<CollationData> {
        self.guarded(|builder| {
            builder.check_building()?;
            builder.build_contexts()?;
            let jamo_ces = builder.set_jamo_ces()?;
            builder.set_digit_tags()?;
            let lead_surrogates = builder.lead_surrogate_kinds();
            builder.set_u0000()?;

            let trie = Arc::new(builder.trie.freeze());
            builder.mark_unsafe_lead_surrogates();

            let data = CollationData::new(
                trie,
                builder.store.ce32s().to_vec(),
                builder.store.ces().to_vec(),
                builder.contexts.units().to_vec(),
                builder.unsafe_backward.clone(),
                jamo_ces,
            )
            .with_lead_surrogates(lead_surrogates)
            .with_base(builder.config.base.clone());
            debug!(
                ce32s = data.ce32s().len(),
                ces = data.ces().len(),
                contexts = data.contexts().len(),
                trie_bytes = data.trie().serialized_len(),
                has_jamo = data.jamo_ces().is_some(),
                "built collation data"
            );
            builder.built = Some(data.clone());
            Ok(data)
        })
    }

    /// Collect the Jamo CE table if this builder maps any Jamo.
    ///
    /// Jamo without a mapping here take their CE from the base data.
    fn set_jamo_ces(&self) -> Result<Option<Vec<Ce>>> {
        if !hangul::jamo().any(|jamo| self.is_assigned(jamo)) {
            return Ok(None);
        }
        let base = self.config.base.as_deref();
        let table = hangul::jamo()
            .map(|jamo| match self.get_ce32(jamo) {
                Ce32::Fallback => base.and_then(|base| base.jamo_ce(jamo)).ok_or_else(|| {
                    CollationError::IllegalArgument(format!(
                        "Jamo U+{jamo:04X} has no CE here or in the base data"
                    ))
                }),
                Ce32::Unassigned => Err(CollationError::IllegalArgument(format!(
                    "Jamo U+{jamo:04X} is unassigned"
                ))),
                _ => self.get_single_ce(jamo),
            })
            .collect::<Result<Vec<Ce>>>()?;
        trace!(count = table.len(), "set Jamo CEs");
        Ok(Some(table))
    }

    /// Give every mapped decimal digit a `Digit` value.
    fn set_digit_tags(&mut self) -> Result<()> {
        for (c, value) in decimal_digits() {
            let ce32 = self.get_ce32(c);
            if ce32.is_assigned() {
                let index = self.store.add_ce32(ce32.to_bits())?;
                self.trie.set(c, Ce32::Digit { index, value }.to_bits())?;
            }
        }
        Ok(())
    }

    /// Summarize each lead surrogate's supplementary code points.
    ///
    /// Surrogate code points are ordinary trie entries, so the summaries
    /// are kept in a table of their own.
    fn lead_surrogate_kinds(&self) -> Vec<LeadSurrogateKind> {
        LEAD_SURROGATES
            .map(|lead| {
                let (start, end) = supplementary_range(lead);
                if !self.trie.any_in_range(start, end, |v| v != UNASSIGNED_CE32) {
                    LeadSurrogateKind::AllUnassigned
                } else if !self.trie.any_in_range(start, end, |v| v != FALLBACK_CE32) {
                    LeadSurrogateKind::AllFallback
                } else {
                    LeadSurrogateKind::Mixed
                }
            })
            .collect()
    }

    /// Move U+0000's value into slot 0 of the CE32 store.
    fn set_u0000(&mut self) -> Result<()> {
        let ce32 = self.trie.get(0);
        self.store.set_ce32(0, ce32);
        self.trie.set(0, Ce32::U0000.to_bits())
    }

    fn mark_unsafe_lead_surrogates(&mut self) {
        for lead in LEAD_SURROGATES {
            let (start, end) = supplementary_range(lead);
            if self.unsafe_backward.intersects_range(start, end) {
                self.unsafe_backward.add(lead);
            }
        }
    }
}
