//! Collation data builder.
//!
//! This module provides [`CollationDataBuilder`], which collects mappings
//! from strings (with optional prefix context) to CE sequences and compiles
//! them into [`CollationData`].
//!
//! Every mutating method returns a `Result`. The first error is kept: once a
//! call has failed, every later mutating call returns the same error and
//! does nothing. Queries take `&self` and never change that state.

mod conditional;
mod config;
mod copy;
mod digits;
mod finalize;
mod ranges;

pub use conditional::ConditionalCe32;
pub use config::BuilderConfig;
pub use copy::{CeModifier, IdentityModifier};

use kollate_core::context::ContextBlob;
use kollate_core::core::ce32::{
    FALLBACK_CE32, MAX_INDEX, MAX_INLINE_LENGTH, MAX_LONG_PRIMARY, SPECIAL_LOW_BYTE,
    UNASSIGNED_CE32,
};
use kollate_core::core::expansion::length_field;
use kollate_core::trie::CODE_POINT_LIMIT;
use kollate_core::{
    encode_one_ce_as_ce32, hangul, Ce, Ce32, CodePointSet, CollationData, CollationError,
    ContextMatch, ExpansionStore, ExpansionView, Result, TrieBuilder,
};

/// Builds collation data from string-to-CE mappings.
#[derive(Debug)]
pub struct CollationDataBuilder {
    config: BuilderConfig,
    trie: TrieBuilder,
    store: ExpansionStore,
    /// Arena of conditional mapping chains
    conditionals: Vec<ConditionalCe32>,
    /// Code points whose trie value is a `BuilderContext`
    context_chars: CodePointSet,
    contexts: ContextBlob,
    unsafe_backward: CodePointSet,
    modified: bool,
    failure: Option<CollationError>,
    /// Result of a successful build
    built: Option<CollationData>,
}

impl Default for CollationDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CollationDataBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    /// Create a builder with the given configuration.
    pub fn with_config(config: BuilderConfig) -> Self {
        let mut trie = TrieBuilder::new(FALLBACK_CE32, UNASSIGNED_CE32);
        let mut store = ExpansionStore::new(config.deduplicate_expansions);
        let mut failure = None;

        // Slot 0 of the CE32 store is reserved for U+0000.
        if let Err(err) = store.add_ce32(0).and_then(|_| {
            trie.set_range(
                hangul::SYLLABLE_BASE,
                hangul::SYLLABLE_END,
                Ce32::Hangul.to_bits(),
            )
        }) {
            failure = Some(err);
        }

        Self {
            config,
            trie,
            store,
            conditionals: Vec::new(),
            context_chars: CodePointSet::new(),
            contexts: ContextBlob::new(),
            unsafe_backward: CodePointSet::new(),
            modified: false,
            failure,
            built: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The first error a mutating call ran into, if any.
    pub fn status(&self) -> Result<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Run a mutating operation under the sticky error discipline.
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let result = op(self);
        if let Err(err) = &result {
            self.failure = Some(err.clone());
        }
        result
    }

    fn check_building(&self) -> Result<()> {
        if self.is_built() {
            Err(CollationError::InvalidState(
                "the builder has already been built".into(),
            ))
        } else {
            Ok(())
        }
    }

    #[inline]
    pub(crate) fn view(&self) -> ExpansionView<'_> {
        self.store.view()
    }

    // ---- Adding mappings ----

    /// Map `s` to `ces`, when preceded by `prefix`.
    ///
    /// The first code point of `s` carries the mapping. A non-empty prefix
    /// or further code points in `s` make it a conditional mapping.
    pub fn add(&mut self, prefix: &str, s: &str, ces: &[Ce]) -> Result<()> {
        self.guarded(|builder| {
            builder.check_building()?;
            let ce32 = builder.encode_ces_inner(ces)?;
            builder.add_ce32_inner(prefix, s, ce32)
        })
    }

    /// Map `s` to an already encoded CE32.
    pub fn add_ce32(&mut self, prefix: &str, s: &str, ce32: Ce32) -> Result<()> {
        self.guarded(|builder| {
            builder.check_building()?;
            builder.add_ce32_inner(prefix, s, ce32)
        })
    }

    fn add_ce32_inner(&mut self, prefix: &str, s: &str, ce32: Ce32) -> Result<()> {
        let mut chars = s.chars();
        let first = chars
            .next()
            .ok_or_else(|| CollationError::IllegalArgument("empty mapping string".into()))?;
        let c = first as u32;
        let suffix = chars.as_str();
        self.check_mapping_ce32(ce32)?;
        let old = self.get_ce32(c);

        if prefix.is_empty() && suffix.is_empty() {
            match old {
                Ce32::BuilderContext { index } => {
                    let head = &mut self.conditionals[index as usize];
                    if head.ce32 != Ce32::Fallback {
                        return Err(duplicate(c, prefix, s));
                    }
                    head.ce32 = ce32;
                }
                Ce32::Fallback | Ce32::Hangul | Ce32::Unassigned => {
                    self.trie.set(c, ce32.to_bits())?;
                }
                _ => return Err(duplicate(c, prefix, s)),
            }
        } else {
            let head = match old {
                Ce32::BuilderContext { index } => index,
                _ => {
                    let index = self.add_conditional_ce32_inner("", "", old)?;
                    self.trie.set(c, Ce32::BuilderContext { index }.to_bits())?;
                    self.context_chars.add(c);
                    index
                }
            };
            let last = self
                .chain(head)
                .try_fold(head, |_, (index, node)| {
                    if node.prefix == prefix && node.suffix == suffix {
                        Err(duplicate(c, prefix, s))
                    } else {
                        Ok(index)
                    }
                })?;
            let index = self.add_conditional_ce32_inner(prefix, suffix, ce32)?;
            self.conditionals[last as usize].next = Some(index);
            self.unsafe_backward.add_str(prefix);
            self.unsafe_backward.add_str(s);
        }
        self.modified = true;
        Ok(())
    }

    /// Check that `ce32` can be the value of a mapping in this builder.
    ///
    /// Accepted are inline CEs within their field ranges and expansions
    /// that resolve in this builder's stores.
    pub(crate) fn check_mapping_ce32(&self, ce32: Ce32) -> Result<()> {
        let valid = match ce32 {
            Ce32::Simple { tertiary, .. } => (tertiary as u32) < SPECIAL_LOW_BYTE,
            Ce32::LongPrimary(p) => p <= MAX_LONG_PRIMARY,
            Ce32::LongSecondary { .. } => true,
            Ce32::Expansion32 { index, length } | Ce32::Expansion { index, length } => {
                index <= MAX_INDEX
                    && length as usize <= MAX_INLINE_LENGTH
                    && self.view().resolve(0, ce32).is_some()
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(CollationError::IllegalArgument(format!(
                "{ce32:?} is not a mapping value"
            )))
        }
    }

    // ---- Encoding ----

    /// Encode a CE sequence as one CE32, storing it if needed.
    pub fn encode_ces(&mut self, ces: &[Ce]) -> Result<Ce32> {
        self.guarded(|builder| builder.encode_ces_inner(ces))
    }

    /// Encode one CE, inline if its shape allows it.
    pub fn encode_one_ce(&mut self, ce: Ce) -> Result<Ce32> {
        self.guarded(|builder| builder.encode_one_ce_inner(ce))
    }

    /// Store a CE sequence in the 64-bit store.
    pub fn encode_expansion(&mut self, ces: &[Ce]) -> Result<Ce32> {
        self.guarded(|builder| builder.encode_expansion_inner(ces))
    }

    /// Store a CE32 sequence in the 32-bit store.
    pub fn encode_expansion32(&mut self, ce32s: &[Ce32]) -> Result<Ce32> {
        self.guarded(|builder| builder.encode_expansion32_inner(ce32s))
    }

    pub(crate) fn encode_ces_inner(&mut self, ces: &[Ce]) -> Result<Ce32> {
        match ces {
            [] => Err(CollationError::IllegalArgument(
                "a mapping needs at least one CE".into(),
            )),
            [ce] => self.encode_one_ce_inner(*ce),
            _ => {
                let inline: Option<Vec<Ce32>> =
                    ces.iter().map(|&ce| encode_one_ce_as_ce32(ce)).collect();
                match inline {
                    Some(ce32s) => self.encode_expansion32_inner(&ce32s),
                    None => self.encode_expansion_inner(ces),
                }
            }
        }
    }

    pub(crate) fn encode_one_ce_inner(&mut self, ce: Ce) -> Result<Ce32> {
        match encode_one_ce_as_ce32(ce) {
            Some(ce32) => Ok(ce32),
            None => {
                let index = self.store.add_ce(ce)?;
                Ok(Ce32::Expansion { index, length: 1 })
            }
        }
    }

    fn encode_expansion_inner(&mut self, ces: &[Ce]) -> Result<Ce32> {
        let index = self.store.add_ces(ces)?;
        Ok(Ce32::Expansion {
            index,
            length: length_field(ces.len()),
        })
    }

    fn encode_expansion32_inner(&mut self, ce32s: &[Ce32]) -> Result<Ce32> {
        let bits: Vec<u32> = ce32s.iter().map(|ce32| ce32.to_bits()).collect();
        let index = self.store.add_ce32s(&bits)?;
        Ok(Ce32::Expansion32 {
            index,
            length: length_field(bits.len()),
        })
    }

    // ---- Queries ----

    /// The CE32 currently stored for a code point.
    #[inline]
    pub fn get_ce32(&self, c: u32) -> Ce32 {
        Ce32::from_bits(self.trie.get(c))
    }

    /// True if this builder has a mapping for `c`.
    pub fn is_assigned(&self, c: u32) -> bool {
        self.get_ce32(c).is_assigned()
    }

    /// True once any mapping has been added or copied.
    #[inline]
    pub fn has_mappings(&self) -> bool {
        self.modified
    }

    /// The CE of a code point that maps to exactly one CE.
    ///
    /// Code points without a mapping here are looked up in the base data.
    pub fn get_single_ce(&self, c: u32) -> Result<Ce> {
        let ce32 = self.get_ce32(c);
        match ce32 {
            Ce32::Fallback => match &self.config.base {
                Some(base) => base.single_ce(c),
                None => Err(CollationError::Unsupported(format!(
                    "U+{c:04X} has no mapping and there is no base data"
                ))),
            },
            _ => match self.view().resolve(c, ce32).as_deref() {
                Some([ce]) => Ok(*ce),
                _ => Err(CollationError::Unsupported(format!(
                    "U+{c:04X} does not map to a single CE ({ce32:?})"
                ))),
            },
        }
    }

    /// The primary weight of a code point with a single long-primary CE, else 0.
    pub fn get_long_primary_if_single_ce(&self, c: u32) -> u32 {
        match self.get_ce32(c) {
            Ce32::LongPrimary(p) => p,
            Ce32::Offset { index } => self
                .store
                .ces()
                .get(index as usize)
                .and_then(|&data| kollate_core::core::ce32::primary_from_offset_data(c, data))
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// True if primaries with lead byte `b` may be compressed.
    ///
    /// Without a configured predicate no lead byte is compressible.
    pub fn is_compressible_lead_byte(&self, b: u8) -> bool {
        self.config
            .compressible_lead_byte
            .is_some_and(|predicate| predicate(b))
    }

    /// True if the lead byte of primary `p` is compressible.
    #[inline]
    pub fn is_compressible_primary(&self, p: u32) -> bool {
        self.is_compressible_lead_byte((p >> 24) as u8)
    }

    /// True if backward iteration must not stop right after `c`.
    #[inline]
    pub fn is_unsafe_backward(&self, c: u32) -> bool {
        self.unsafe_backward.contains(c)
    }

    #[inline]
    pub fn unsafe_backward_set(&self) -> &CodePointSet {
        &self.unsafe_backward
    }

    /// Map the start of `text` to CEs, resolving contexts like built data does.
    ///
    /// `prefix_text` is the text before the first character of `text`.
    pub fn lookup(&self, prefix_text: &str, text: &str) -> Option<ContextMatch> {
        if let Some(data) = &self.built {
            return data.lookup(prefix_text, text);
        }
        let first = text.chars().next()?;
        let c = first as u32;
        let (ce32, consumed) = match self.get_ce32(c) {
            Ce32::BuilderContext { index } => {
                let (ce32, suffix_chars) =
                    self.lookup_chain(index, prefix_text, &text[first.len_utf8()..]);
                (ce32, 1 + suffix_chars)
            }
            ce32 => (ce32, 1),
        };
        let ces = match ce32 {
            Ce32::Fallback => {
                let base = self.config.base.as_ref()?;
                return if consumed == 1 {
                    base.lookup(prefix_text, text)
                } else {
                    None
                };
            }
            Ce32::Hangul => {
                let (l, v, t) = hangul::decompose(c)?;
                let mut ces = vec![self.jamo_ce(l)?, self.jamo_ce(v)?];
                if let Some(t) = t {
                    ces.push(self.jamo_ce(t)?);
                }
                ces
            }
            other => self.view().resolve(c, other)?,
        };
        Some(ContextMatch { ces, consumed })
    }

    fn jamo_ce(&self, jamo: u32) -> Option<Ce> {
        if self.is_assigned(jamo) {
            self.get_single_ce(jamo).ok()
        } else {
            self.config.base.as_ref()?.jamo_ce(jamo)
        }
    }

    // ---- Output ----

    /// Number of elements in the CE32 store.
    #[inline]
    pub fn length_of_ce32s(&self) -> usize {
        self.store.ce32s().len()
    }

    /// Number of elements in the CE store.
    #[inline]
    pub fn length_of_ces(&self) -> usize {
        self.store.ces().len()
    }

    /// Number of units in the context blob.
    #[inline]
    pub fn length_of_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Write the frozen trie into `out`.
    ///
    /// Returns the number of bytes written, or `BufferOverflow` carrying the
    /// required size. Fails with `InvalidState` before [`build`](Self::build).
    pub fn serialize_trie(&self, out: &mut [u8]) -> Result<usize> {
        let data = self.built.as_ref().ok_or_else(|| {
            CollationError::InvalidState("the trie is only available after build".into())
        })?;
        data.trie().serialize(out)
    }

    /// Write the unsafe-backward set into `out` in its compact form.
    ///
    /// Returns the number of units written, or `BufferOverflow` carrying the
    /// required size.
    pub fn serialize_unsafe_backward_set(&self, out: &mut [u16]) -> Result<usize> {
        self.unsafe_backward.serialize(out)
    }
}

fn duplicate(c: u32, prefix: &str, s: &str) -> CollationError {
    CollationError::IllegalArgument(format!(
        "duplicate mapping for U+{c:04X} ({prefix:?}|{s:?})"
    ))
}

/// Check that `c` is a code point.
pub(crate) fn check_code_point(c: u32) -> Result<()> {
    if c < CODE_POINT_LIMIT {
        Ok(())
    } else {
        Err(CollationError::IllegalArgument(format!(
            "{c:#x} is not a code point"
        )))
    }
}
