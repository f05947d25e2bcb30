//! Expansion storage.
//!
//! CE sequences that do not fit into one CE32 live in two append-only
//! arrays, one of CE32s and one of full CEs. A stored sequence is identified
//! by its start index and length, which are never invalidated.

use crate::core::ce::Ce;
use crate::core::ce32::{self, Ce32, MAX_INDEX, MAX_INLINE_LENGTH};
use crate::error::{CollationError, Result};
use ahash::AHashMap;

/// Append-only CE32 and CE arrays with optional sequence sharing.
#[derive(Debug, Clone, Default)]
pub struct ExpansionStore {
    ce32s: Vec<u32>,
    ces: Vec<Ce>,
    /// Sequence -> start index in `ce32s`
    ce32_index: AHashMap<Vec<u32>, u32>,
    /// Sequence -> start index in `ces`
    ce_index: AHashMap<Vec<Ce>, u32>,
    deduplicate: bool,
}

impl ExpansionStore {
    /// Create a new empty store.
    pub fn new(deduplicate: bool) -> Self {
        Self {
            deduplicate,
            ..Self::default()
        }
    }

    /// Append a single CE32 and return its index.
    ///
    /// Single values are never shared: callers overwrite them in place.
    pub fn add_ce32(&mut self, ce32: u32) -> Result<u32> {
        let index = next_index(self.ce32s.len(), "CE32 store")?;
        self.ce32s.try_reserve(1)?;
        self.ce32s.push(ce32);
        Ok(index)
    }

    /// Append a single CE and return its index.
    pub fn add_ce(&mut self, ce: Ce) -> Result<u32> {
        self.add_ces(std::slice::from_ref(&ce))
    }

    /// Store a CE32 sequence and return its start index.
    pub fn add_ce32s(&mut self, values: &[u32]) -> Result<u32> {
        if self.deduplicate {
            if let Some(&index) = self.ce32_index.get(values) {
                return Ok(index);
            }
        }
        let header = values.len() > MAX_INLINE_LENGTH;
        let index = next_index(self.ce32s.len(), "CE32 store")?;
        self.ce32s.try_reserve(values.len() + header as usize)?;
        if header {
            self.ce32s.push(length_header(values.len())?);
        }
        self.ce32s.extend_from_slice(values);
        if self.deduplicate {
            self.ce32_index.insert(values.to_vec(), index);
        }
        Ok(index)
    }

    /// Store a CE sequence and return its start index.
    pub fn add_ces(&mut self, values: &[Ce]) -> Result<u32> {
        if self.deduplicate {
            if let Some(&index) = self.ce_index.get(values) {
                return Ok(index);
            }
        }
        let header = values.len() > MAX_INLINE_LENGTH;
        let index = next_index(self.ces.len(), "CE store")?;
        self.ces.try_reserve(values.len() + header as usize)?;
        if header {
            self.ces.push(Ce::from_bits(length_header(values.len())? as u64));
        }
        self.ces.extend_from_slice(values);
        if self.deduplicate {
            self.ce_index.insert(values.to_vec(), index);
        }
        Ok(index)
    }

    /// Store offset-range data. Never shared, since each range owns its entry.
    pub fn add_offset_data(&mut self, data: Ce) -> Result<u32> {
        let index = next_index(self.ces.len(), "CE store")?;
        self.ces.try_reserve(1)?;
        self.ces.push(data);
        Ok(index)
    }

    /// Overwrite a single CE32 slot.
    pub fn set_ce32(&mut self, index: u32, ce32: u32) {
        if let Some(slot) = self.ce32s.get_mut(index as usize) {
            *slot = ce32;
        }
    }

    #[inline]
    pub fn ce32s(&self) -> &[u32] {
        &self.ce32s
    }

    #[inline]
    pub fn ces(&self) -> &[Ce] {
        &self.ces
    }

    /// Read-only view over both arrays.
    #[inline]
    pub fn view(&self) -> ExpansionView<'_> {
        ExpansionView::new(&self.ce32s, &self.ces)
    }

    /// Give up ownership of the arrays.
    pub fn into_parts(self) -> (Vec<u32>, Vec<Ce>) {
        (self.ce32s, self.ces)
    }
}

fn next_index(len: usize, what: &'static str) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&index| index <= MAX_INDEX)
        .ok_or(CollationError::IndexOverflow {
            what,
            max: MAX_INDEX,
        })
}

fn length_header(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        CollationError::IllegalArgument(format!("expansion of {} CEs is too long", len))
    })
}

/// The length field to put into an expansion CE32 for `len` elements.
#[inline]
pub fn length_field(len: usize) -> u8 {
    if len <= MAX_INLINE_LENGTH {
        len as u8
    } else {
        0
    }
}

/// Borrowed CE32 and CE arrays, as stored by a builder or runtime data.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionView<'a> {
    ce32s: &'a [u32],
    ces: &'a [Ce],
}

impl<'a> ExpansionView<'a> {
    pub fn new(ce32s: &'a [u32], ces: &'a [Ce]) -> Self {
        Self { ce32s, ces }
    }

    /// One element of the CE store, such as offset data.
    #[inline]
    pub fn ces_at(&self, index: u32) -> Option<&'a Ce> {
        self.ces.get(index as usize)
    }

    /// The CE32 elements of an `Expansion32` value.
    pub fn ce32_slice(&self, index: u32, length: u8) -> Option<&'a [u32]> {
        let mut start = index as usize;
        let len = if length == 0 {
            let len = *self.ce32s.get(start)? as usize;
            start += 1;
            len
        } else {
            length as usize
        };
        self.ce32s.get(start..start + len)
    }

    /// The CE elements of an `Expansion` value.
    pub fn ce_slice(&self, index: u32, length: u8) -> Option<&'a [Ce]> {
        let mut start = index as usize;
        let len = if length == 0 {
            let len = self.ces.get(start)?.to_bits() as usize;
            start += 1;
            len
        } else {
            length as usize
        };
        self.ces.get(start..start + len)
    }

    /// Resolve a non-contextual CE32 of code point `c` to its CEs.
    ///
    /// Follows digit and U+0000 indirections. Returns `None` for values
    /// that need more than the stores (contexts, Hangul, fallback, unassigned).
    pub fn resolve(&self, c: u32, ce32: Ce32) -> Option<Vec<Ce>> {
        match ce32 {
            Ce32::Simple { .. } | Ce32::LongPrimary(_) | Ce32::LongSecondary { .. } => {
                ce32.inline_ce().map(|ce| vec![ce])
            }
            Ce32::Expansion32 { index, length } => self
                .ce32_slice(index, length)?
                .iter()
                .map(|&bits| Ce32::from_bits(bits).inline_ce())
                .collect(),
            Ce32::Expansion { index, length } => Some(self.ce_slice(index, length)?.to_vec()),
            Ce32::Offset { index } => {
                let data = *self.ces.get(index as usize)?;
                ce32::primary_from_offset_data(c, data).map(|p| vec![Ce::from_primary(p)])
            }
            Ce32::Digit { index, .. } => {
                let inner = Ce32::from_bits(*self.ce32s.get(index as usize)?);
                self.resolve(c, inner)
            }
            Ce32::U0000 => {
                let inner = Ce32::from_bits(*self.ce32s.first()?);
                self.resolve(c, inner)
            }
            _ => None,
        }
    }
}
