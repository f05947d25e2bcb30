//! Built collation data.
//!
//! [`CollationData`] is the immutable result of a build: the frozen trie,
//! the expansion stores, the context blob, the unsafe-backward set and the
//! Jamo CE table. It can answer the same lookups as the builder it came from.

use crate::context::{context_entry, reversed_units};
use crate::core::ce::Ce;
use crate::core::ce32::{Ce32, LeadSurrogateKind};
use crate::core::expansion::ExpansionView;
use crate::error::{CollationError, Result};
use crate::hangul;
use crate::trie::CodePointTrie;
use crate::uset::CodePointSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// First lead surrogate code unit.
pub const LEAD_SURROGATE_BASE: u32 = 0xD800;

/// Number of lead surrogate code units.
pub const LEAD_SURROGATE_COUNT: usize = 0x400;

/// Result of a context-sensitive lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMatch {
    /// CEs of the matched mapping.
    pub ces: Vec<Ce>,
    /// Number of characters of the text consumed, including the first one.
    pub consumed: usize,
}

/// Immutable collation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationData {
    trie: Arc<CodePointTrie>,
    ce32s: Vec<u32>,
    ces: Vec<Ce>,
    contexts: Vec<u16>,
    unsafe_backward: CodePointSet,
    jamo_ces: Option<Vec<Ce>>,
    /// Per lead surrogate code unit, what its supplementary code points map
    /// to. Kept apart from the trie, which is indexed by code point.
    #[serde(default)]
    lead_surrogates: Vec<LeadSurrogateKind>,
    /// Data consulted for code points that fall back.
    #[serde(skip)]
    base: Option<Arc<CollationData>>,
}

impl CollationData {
    pub fn new(
        trie: Arc<CodePointTrie>,
        ce32s: Vec<u32>,
        ces: Vec<Ce>,
        contexts: Vec<u16>,
        unsafe_backward: CodePointSet,
        jamo_ces: Option<Vec<Ce>>,
    ) -> Self {
        Self {
            trie,
            ce32s,
            ces,
            contexts,
            unsafe_backward,
            jamo_ces,
            lead_surrogates: Vec::new(),
            base: None,
        }
    }

    /// Attach the lead surrogate summaries, one per code unit U+D800..U+DBFF.
    pub fn with_lead_surrogates(mut self, kinds: Vec<LeadSurrogateKind>) -> Self {
        self.lead_surrogates = kinds;
        self
    }

    /// Attach the data that `Fallback` values defer to.
    pub fn with_base(mut self, base: Option<Arc<CollationData>>) -> Self {
        self.base = base;
        self
    }

    #[inline]
    pub fn trie(&self) -> &Arc<CodePointTrie> {
        &self.trie
    }

    #[inline]
    pub fn ce32s(&self) -> &[u32] {
        &self.ce32s
    }

    #[inline]
    pub fn ces(&self) -> &[Ce] {
        &self.ces
    }

    #[inline]
    pub fn contexts(&self) -> &[u16] {
        &self.contexts
    }

    #[inline]
    pub fn unsafe_backward(&self) -> &CodePointSet {
        &self.unsafe_backward
    }

    /// This data's own Jamo CE table, if it has one.
    #[inline]
    pub fn jamo_ces(&self) -> Option<&[Ce]> {
        self.jamo_ces.as_deref()
    }

    #[inline]
    pub fn lead_surrogates(&self) -> &[LeadSurrogateKind] {
        &self.lead_surrogates
    }

    /// The summary for a lead surrogate code unit.
    pub fn lead_surrogate(&self, lead: u32) -> Option<LeadSurrogateKind> {
        let index = lead.checked_sub(LEAD_SURROGATE_BASE)? as usize;
        self.lead_surrogates.get(index).copied()
    }

    #[inline]
    pub fn base(&self) -> Option<&Arc<CollationData>> {
        self.base.as_ref()
    }

    #[inline]
    fn view(&self) -> ExpansionView<'_> {
        ExpansionView::new(&self.ce32s, &self.ces)
    }

    /// The CE32 stored for a code point.
    #[inline]
    pub fn ce32(&self, c: u32) -> Ce32 {
        Ce32::from_bits(self.trie.get(c))
    }

    /// The CE of a code point that maps to exactly one CE.
    pub fn single_ce(&self, c: u32) -> Result<Ce> {
        let ce32 = self.ce32(c);
        if ce32 == Ce32::Fallback {
            return match &self.base {
                Some(base) => base.single_ce(c),
                None => Err(CollationError::Unsupported(format!(
                    "U+{c:04X} has no mapping and there is no base data"
                ))),
            };
        }
        match self.view().resolve(c, ce32).as_deref() {
            Some([ce]) => Ok(*ce),
            _ => Err(CollationError::Unsupported(format!(
                "U+{c:04X} does not map to a single CE ({ce32:?})"
            ))),
        }
    }

    /// The CE of a conjoining Jamo, from this data or its base.
    pub fn jamo_ce(&self, jamo: u32) -> Option<Ce> {
        let index = hangul::jamo_index(jamo)?;
        match &self.jamo_ces {
            Some(table) => table.get(index).copied(),
            None => self.base.as_ref()?.jamo_ce(jamo),
        }
    }

    #[inline]
    pub fn is_unsafe_backward(&self, c: u32) -> bool {
        self.unsafe_backward.contains(c)
    }

    /// Map the start of `text` to CEs.
    ///
    /// `prefix_text` is the text before the first character of `text`.
    /// Prefix and contraction contexts are resolved with the longest match.
    pub fn lookup(&self, prefix_text: &str, text: &str) -> Option<ContextMatch> {
        let first = text.chars().next()?;
        let c = first as u32;
        let mut ce32 = self.ce32(c);
        let mut consumed = 1;

        match ce32 {
            Ce32::Digit { index, .. } => ce32 = Ce32::from_bits(*self.ce32s.get(index as usize)?),
            Ce32::U0000 => ce32 = Ce32::from_bits(*self.ce32s.first()?),
            _ => {}
        }
        if let Ce32::Prefix { index } = ce32 {
            let (default, trie) = context_entry(&self.contexts, index)?;
            let value = trie
                .longest_match(reversed_units(prefix_text))
                .map_or(default, |(value, _)| value);
            ce32 = Ce32::from_bits(value);
        }
        if let Ce32::Contraction { index, .. } = ce32 {
            let (default, trie) = context_entry(&self.contexts, index)?;
            let rest = &text[first.len_utf8()..];
            ce32 = match trie.longest_match(rest.encode_utf16()) {
                Some((value, units)) => {
                    consumed += chars_in_units(rest, units);
                    Ce32::from_bits(value)
                }
                None => Ce32::from_bits(default),
            };
        }

        let ces = match ce32 {
            Ce32::Fallback => {
                let base = self.base.as_ref()?;
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
}

/// Number of characters at the start of `s` that make up `units` UTF-16 units.
pub(crate) fn chars_in_units(s: &str, units: usize) -> usize {
    let mut seen = 0;
    s.chars()
        .take_while(|ch| {
            let keep = seen < units;
            seen += ch.len_utf16();
            keep
        })
        .count()
}
