//! Copying mappings from another builder.
//!
//! [`CollationDataBuilder::copy_from`] takes over every mapping of a source
//! builder, passing each CE through a [`CeModifier`] on the way. Values are
//! re-encoded into this builder's own stores.

use super::{CollationDataBuilder, ConditionalCe32};
use kollate_core::core::ce32::{offset_data_start, primary_from_offset_data};
use kollate_core::{Ce, Ce32, CodePointSet, CollationError, ExpansionView, Result};
use tracing::debug;

/// Rewrites CEs while mappings are copied.
///
/// Both methods return `None` to keep the CE unchanged.
pub trait CeModifier {
    /// Rewrite the CE encoded by an inline CE32.
    fn modify_ce32(&self, ce32: Ce32) -> Option<Ce>;

    /// Rewrite a full CE.
    fn modify_ce(&self, ce: Ce) -> Option<Ce>;
}

/// Modifier that keeps every CE.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityModifier;

impl CeModifier for IdentityModifier {
    fn modify_ce32(&self, _ce32: Ce32) -> Option<Ce> {
        None
    }

    fn modify_ce(&self, _ce: Ce) -> Option<Ce> {
        None
    }
}

impl<F> CeModifier for F
where
    F: Fn(Ce) -> Option<Ce>,
{
    fn modify_ce32(&self, ce32: Ce32) -> Option<Ce> {
        ce32.inline_ce().and_then(self)
    }

    fn modify_ce(&self, ce: Ce) -> Option<Ce> {
        self(ce)
    }
}

/// What copying needs to see of a source builder.
pub(crate) trait CopySource {
    /// Maximal runs `(start, end, ce32)` of the trie.
    fn value_runs(&self) -> Vec<(u32, u32, Ce32)>;

    fn expansions(&self) -> ExpansionView<'_>;

    /// The conditional chain starting at `head`, in chain order.
    fn conditional_chain(&self, head: u32) -> Vec<&ConditionalCe32>;

    fn unsafe_backward(&self) -> &CodePointSet;

    fn has_mappings(&self) -> bool;

    fn is_built(&self) -> bool;
}

impl CopySource for CollationDataBuilder {
    fn value_runs(&self) -> Vec<(u32, u32, Ce32)> {
        self.trie
            .ranges()
            .map(|(start, end, value)| (start, end, Ce32::from_bits(value)))
            .collect()
    }

    fn expansions(&self) -> ExpansionView<'_> {
        self.view()
    }

    fn conditional_chain(&self, head: u32) -> Vec<&ConditionalCe32> {
        self.chain(head).map(|(_, node)| node).collect()
    }

    fn unsafe_backward(&self) -> &CodePointSet {
        &self.unsafe_backward
    }

    fn has_mappings(&self) -> bool {
        self.modified
    }

    fn is_built(&self) -> bool {
        CollationDataBuilder::is_built(self)
    }
}

impl CollationDataBuilder {
    /// Copy all mappings of `src` into this builder.
    ///
    /// This builder must not have any mappings yet, and `src` must not
    /// have been built.
    pub fn copy_from(&mut self, src: &CollationDataBuilder, modifier: &impl CeModifier) -> Result<()> {
        self.guarded(|builder| builder.copy_from_source(src, modifier))
    }

    fn copy_from_source(&mut self, src: &impl CopySource, modifier: &impl CeModifier) -> Result<()> {
        self.check_building()?;
        if self.modified {
            return Err(CollationError::InvalidState(
                "copy_from needs a builder without mappings".into(),
            ));
        }
        if src.is_built() {
            return Err(CollationError::InvalidState(
                "cannot copy from a builder that has been built".into(),
            ));
        }

        let mut copied = 0usize;
        for (start, end, ce32) in src.value_runs() {
            match ce32 {
                Ce32::Fallback | Ce32::Hangul => {}
                Ce32::Offset { index } => {
                    self.copy_offset_range(src, start, end, index, modifier)?;
                    copied += 1;
                }
                Ce32::BuilderContext { index } => {
                    for c in start..=end {
                        let head = self.copy_chain(src, c, index, modifier)?;
                        self.trie.set(c, Ce32::BuilderContext { index: head }.to_bits())?;
                        self.context_chars.add(c);
                    }
                    copied += 1;
                }
                _ => {
                    let value = self.copy_ce32(src, start, ce32, modifier)?;
                    self.trie.set_range(start, end, value.to_bits())?;
                    copied += 1;
                }
            }
        }

        self.unsafe_backward.union(src.unsafe_backward());
        self.modified |= src.has_mappings();
        debug!(runs = copied, "copied mappings");
        Ok(())
    }

    /// Re-encode one non-contextual CE32 that the source stores for `c`.
    ///
    /// An `Offset` value is only seen here inside a conditional chain, and
    /// is resolved to the single CE of `c`.
    fn copy_ce32(
        &mut self,
        src: &impl CopySource,
        c: u32,
        ce32: Ce32,
        modifier: &impl CeModifier,
    ) -> Result<Ce32> {
        match ce32 {
            Ce32::Simple { .. } | Ce32::LongPrimary(_) | Ce32::LongSecondary { .. } => {
                match modifier.modify_ce32(ce32) {
                    Some(ce) => self.encode_one_ce_inner(ce),
                    None => Ok(ce32),
                }
            }
            Ce32::Expansion32 { index, length } => {
                let ces: Vec<Ce> = src
                    .expansions()
                    .ce32_slice(index, length)
                    .ok_or_else(|| missing("CE32 expansion", index))?
                    .iter()
                    .map(|&bits| {
                        let element = Ce32::from_bits(bits);
                        modifier
                            .modify_ce32(element)
                            .or_else(|| element.inline_ce())
                            .ok_or_else(|| missing("CE32 expansion element", index))
                    })
                    .collect::<Result<_>>()?;
                self.encode_ces_inner(&ces)
            }
            Ce32::Expansion { index, length } => {
                let ces: Vec<Ce> = src
                    .expansions()
                    .ce_slice(index, length)
                    .ok_or_else(|| missing("CE expansion", index))?
                    .iter()
                    .map(|&ce| modifier.modify_ce(ce).unwrap_or(ce))
                    .collect();
                self.encode_ces_inner(&ces)
            }
            Ce32::Offset { index } => {
                let data = *src
                    .expansions()
                    .ces_at(index)
                    .ok_or_else(|| missing("offset data", index))?;
                let primary = primary_from_offset_data(c, data)
                    .ok_or_else(|| missing("offset data", index))?;
                let ce = Ce::from_primary(primary);
                self.encode_one_ce_inner(modifier.modify_ce(ce).unwrap_or(ce))
            }
            other => Ok(other),
        }
    }

    fn copy_offset_range(
        &mut self,
        src: &impl CopySource,
        start: u32,
        end: u32,
        index: u32,
        modifier: &impl CeModifier,
    ) -> Result<()> {
        let data = *src
            .expansions()
            .ces_at(index)
            .ok_or_else(|| missing("offset data", index))?;
        let primary_at = |c: u32| {
            primary_from_offset_data(c, data).ok_or_else(|| missing("offset data", index))
        };
        let mut changes = Vec::new();
        for c in start..=end {
            if let Some(ce) = modifier.modify_ce(Ce::from_primary(primary_at(c)?)) {
                changes.push((c, ce));
            }
        }

        if changes.is_empty() && offset_data_start(data) <= start {
            let index = self.store.add_offset_data(data)?;
            self.trie.set_range(start, end, Ce32::Offset { index }.to_bits())?;
            return Ok(());
        }
        let mut changes = changes.into_iter().peekable();
        for c in start..=end {
            let ce = match changes.next_if(|&(changed, _)| changed == c) {
                Some((_, ce)) => ce,
                None => Ce::from_primary(primary_at(c)?),
            };
            let ce32 = self.encode_one_ce_inner(ce)?;
            self.trie.set(c, ce32.to_bits())?;
        }
        Ok(())
    }

    /// Copy the conditional chain of `c` and return the index of the new head.
    fn copy_chain(
        &mut self,
        src: &impl CopySource,
        c: u32,
        head: u32,
        modifier: &impl CeModifier,
    ) -> Result<u32> {
        let mut new_head = None;
        let mut last: Option<u32> = None;
        for node in src.conditional_chain(head) {
            let ce32 = self.copy_ce32(src, c, node.ce32, modifier)?;
            let index = self.add_conditional_ce32_inner(&node.prefix, &node.suffix, ce32)?;
            match last {
                Some(last) => self.conditionals[last as usize].next = Some(index),
                None => new_head = Some(index),
            }
            last = Some(index);
        }
        new_head.ok_or_else(|| missing("conditional chain", head))
    }
}

fn missing(what: &str, index: u32) -> CollationError {
    CollationError::IllegalArgument(format!("source {what} at index {index} is missing"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> CollationDataBuilder {
        let mut src = CollationDataBuilder::new();
        src.add("", "a", &[Ce::from_primary(0x1000)]).unwrap();
        src.add("", "b", &[Ce::from_primary(0x1100), Ce::new(0, 0x8A00, 0x05)])
            .unwrap();
        src.add("", "c", &[Ce::new(0x4000_0000, 0x21, 0x02)]).unwrap();
        src.add("x", "ch", &[Ce::from_primary(0x2000)]).unwrap();
        src.maybe_set_primary_range(0x4E00, 0x4E00 + 999, 0x5000_0000, 0x80)
            .unwrap();
        src
    }

    #[test]
    fn test_identity_copy() {
        let src = source();
        let mut dest = CollationDataBuilder::new();
        dest.copy_from(&src, &IdentityModifier).unwrap();
        assert!(dest.has_mappings());

        for c in ['a', 'b', 'c', '\u{4E00}', '\u{4E42}', 'z'] {
            let c = c as u32;
            assert_eq!(dest.is_assigned(c), src.is_assigned(c), "U+{c:04X}");
        }
        for (prefix, text) in [("", "a"), ("", "b"), ("", "c"), ("x", "ch"), ("", "ch"), ("", "\u{4E42}")] {
            assert_eq!(dest.lookup(prefix, text), src.lookup(prefix, text), "{prefix:?} {text:?}");
        }
        assert!(matches!(dest.get_ce32(0x4E00), Ce32::Offset { .. }));
        assert!(dest.is_unsafe_backward('x' as u32));
        assert!(dest.is_unsafe_backward('h' as u32));
    }

    #[test]
    fn test_closure_modifier() {
        let src = source();
        let mut dest = CollationDataBuilder::new();
        let bump = |ce: Ce| (ce.primary() == 0x1000).then(|| Ce::from_primary(0x1001));
        dest.copy_from(&src, &bump).unwrap();
        assert_eq!(dest.get_single_ce('a' as u32).unwrap(), Ce::from_primary(0x1001));
        assert_eq!(dest.get_single_ce('c' as u32), src.get_single_ce('c' as u32));
    }

    #[test]
    fn test_modified_offset_range_is_expanded() {
        let src = source();
        let mut dest = CollationDataBuilder::new();
        let target = 0x5000_0000 + 2 * 0x80;
        let modifier = |ce: Ce| (ce.primary() == target).then(|| Ce::from_primary(0x0300));
        dest.copy_from(&src, &modifier).unwrap();
        assert_eq!(dest.get_ce32(0x4E02), Ce32::LongPrimary(0x0300));
        assert_eq!(
            dest.get_single_ce(0x4E03).unwrap(),
            Ce::from_primary(0x5000_0000 + 3 * 0x80)
        );
    }

    #[test]
    fn test_context_inside_offset_range() {
        let mut src = CollationDataBuilder::new();
        src.maybe_set_primary_range(0x4E00, 0x4E00 + 999, 0x5000_0000, 0x80)
            .unwrap();
        src.add("", "c", &[Ce::new(0x4000_0000, 0x21, 0x02)]).unwrap();
        src.add("", "\u{4E05}x", &[Ce::from_primary(0x2000)]).unwrap();
        assert!(matches!(src.get_ce32(0x4E05), Ce32::BuilderContext { .. }));

        let mut dest = CollationDataBuilder::new();
        dest.copy_from(&src, &IdentityModifier).unwrap();
        for text in ["\u{4E05}", "\u{4E05}x", "\u{4E05}y", "\u{4E06}", "c"] {
            assert_eq!(dest.lookup("", text), src.lookup("", text), "{text:?}");
        }
        assert_eq!(
            dest.lookup("", "\u{4E05}").unwrap().ces,
            vec![Ce::from_primary(0x5000_0000 + 5 * 0x80)]
        );

        // The modifier also reaches the chain head.
        let target = 0x5000_0000 + 5 * 0x80;
        let modifier = |ce: Ce| (ce.primary() == target).then(|| Ce::from_primary(0x0300));
        let mut dest = CollationDataBuilder::new();
        dest.copy_from(&src, &modifier).unwrap();
        assert_eq!(
            dest.lookup("", "\u{4E05}y").unwrap().ces,
            vec![Ce::from_primary(0x0300)]
        );
        let data = dest.build().unwrap();
        assert_eq!(
            data.lookup("", "\u{4E05}y").unwrap().ces,
            vec![Ce::from_primary(0x0300)]
        );
    }

    #[test]
    fn test_copy_requires_empty_destination() {
        let src = source();
        let mut dest = CollationDataBuilder::new();
        dest.add("", "q", &[Ce::from_primary(0x0100)]).unwrap();
        assert!(matches!(
            dest.copy_from(&src, &IdentityModifier),
            Err(CollationError::InvalidState(_))
        ));

        let mut built = source();
        built.build().unwrap();
        let mut dest = CollationDataBuilder::new();
        assert!(matches!(
            dest.copy_from(&built, &IdentityModifier),
            Err(CollationError::InvalidState(_))
        ));
    }
}
