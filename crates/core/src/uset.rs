//! Code point sets.
//!
//! A [`CodePointSet`] is an inversion list: a sorted list of boundaries where
//! even positions start a range and odd positions end it (exclusive). Sets
//! only grow.

use crate::error::{CollationError, Result};
use crate::trie::CODE_POINT_LIMIT;
use serde::{Deserialize, Serialize};

const SUPPLEMENTARY_FLAG: u16 = 0x8000;
const MAX_SERIALIZED_LENGTH: usize = 0x7FFF;

/// Sorted set of code points stored as ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePointSet {
    list: Vec<u32>,
}

impl CodePointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one code point. Values past U+10FFFF are ignored.
    pub fn add(&mut self, c: u32) {
        self.add_range(c, c);
    }

    /// Add every code point in `start..=end`.
    pub fn add_range(&mut self, start: u32, end: u32) {
        if start > end || start >= CODE_POINT_LIMIT {
            return;
        }
        let limit = end.min(CODE_POINT_LIMIT - 1) + 1;
        let lo = self.list.partition_point(|&b| b < start);
        let hi = self.list.partition_point(|&b| b <= limit);
        let mut replacement = Vec::with_capacity(2);
        if lo % 2 == 0 {
            replacement.push(start);
        }
        if hi % 2 == 0 {
            replacement.push(limit);
        }
        self.list.splice(lo..hi, replacement);
    }

    /// Add every code point of `s`.
    pub fn add_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.add(ch as u32);
        }
    }

    /// Add every code point of `other`.
    pub fn union(&mut self, other: &CodePointSet) {
        for (start, end) in other.ranges() {
            self.add_range(start, end);
        }
    }

    pub fn contains(&self, c: u32) -> bool {
        self.list.partition_point(|&b| b <= c) % 2 == 1
    }

    /// True if any code point in `start..=end` is in the set.
    pub fn intersects_range(&self, start: u32, end: u32) -> bool {
        let i = self.list.partition_point(|&b| b <= start);
        i % 2 == 1 || self.list.get(i).is_some_and(|&b| b <= end)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Iterate over the ranges `(start, end)` with inclusive ends.
    pub fn ranges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.list.chunks(2).map(|pair| {
            let end = pair.get(1).copied().unwrap_or(CODE_POINT_LIMIT);
            (pair[0], end - 1)
        })
    }

    /// Range boundaries with a final limit of U+110000 left out.
    fn boundaries(&self) -> &[u32] {
        match self.list.last() {
            Some(&CODE_POINT_LIMIT) => &self.list[..self.list.len() - 1],
            _ => &self.list,
        }
    }

    /// Number of units written by [`serialize`](Self::serialize).
    pub fn serialized_len(&self) -> usize {
        let boundaries = self.boundaries();
        let bmp = boundaries.partition_point(|&b| b < 0x1_0000);
        let supplementary = boundaries.len() - bmp;
        if supplementary == 0 {
            1 + bmp
        } else {
            2 + bmp + 2 * supplementary
        }
    }

    /// Write the compact `u16` form into `out`.
    ///
    /// Without supplementary boundaries the form is `[length, bmp...]`;
    /// otherwise it is `[0x8000 | length, bmp_length, bmp..., (hi, lo)...]`.
    /// Returns the number of units written, or `BufferOverflow` with the
    /// required size. Pass an empty slice to measure.
    pub fn serialize(&self, out: &mut [u16]) -> Result<usize> {
        let boundaries = self.boundaries();
        let bmp = boundaries.partition_point(|&b| b < 0x1_0000);
        let supplementary = boundaries.len() - bmp;
        let length = bmp + 2 * supplementary;
        if length > MAX_SERIALIZED_LENGTH {
            return Err(CollationError::Unsupported(format!(
                "code point set with {} boundaries is too large to serialize",
                boundaries.len()
            )));
        }
        let required = self.serialized_len();
        if out.len() < required {
            return Err(CollationError::BufferOverflow {
                required,
                capacity: out.len(),
            });
        }

        let mut pos;
        if supplementary == 0 {
            out[0] = length as u16;
            pos = 1;
        } else {
            out[0] = SUPPLEMENTARY_FLAG | length as u16;
            out[1] = bmp as u16;
            pos = 2;
        }
        for &b in &boundaries[..bmp] {
            out[pos] = b as u16;
            pos += 1;
        }
        for &b in &boundaries[bmp..] {
            out[pos] = (b >> 16) as u16;
            out[pos + 1] = b as u16;
            pos += 2;
        }
        Ok(pos)
    }

    /// Serialize into a new vector.
    pub fn to_units(&self) -> Result<Vec<u16>> {
        let mut units = vec![0; self.serialized_len()];
        self.serialize(&mut units)?;
        Ok(units)
    }

    /// Parse the compact form written by [`serialize`](Self::serialize).
    pub fn from_units(units: &[u16]) -> Result<Self> {
        let truncated = || CollationError::Load("truncated code point set".into());
        let header = *units.first().ok_or_else(truncated)?;
        let length = (header & !SUPPLEMENTARY_FLAG) as usize;
        let (bmp, data) = if header & SUPPLEMENTARY_FLAG != 0 {
            (*units.get(1).ok_or_else(truncated)? as usize, units.get(2..2 + length))
        } else {
            (length, units.get(1..1 + length))
        };
        let data = data.ok_or_else(truncated)?;
        if bmp > length || (length - bmp) % 2 != 0 {
            return Err(CollationError::Load("corrupt code point set".into()));
        }

        let mut list: Vec<u32> = data[..bmp].iter().map(|&u| u as u32).collect();
        list.extend(
            data[bmp..]
                .chunks_exact(2)
                .map(|pair| ((pair[0] as u32) << 16) | pair[1] as u32),
        );
        if list.windows(2).any(|w| w[0] >= w[1])
            || list.last().is_some_and(|&b| b >= CODE_POINT_LIMIT)
        {
            return Err(CollationError::Load("corrupt code point set".into()));
        }
        if list.len() % 2 == 1 {
            list.push(CODE_POINT_LIMIT);
        }
        Ok(Self { list })
    }
}

impl FromIterator<u32> for CodePointSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = CodePointSet::new();
        for c in iter {
            set.add(c);
        }
        set
    }
}
