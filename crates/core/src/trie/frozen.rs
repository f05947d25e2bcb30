//! Read-only code point trie.
//!
//! Three lookups map a code point to its value:
//! `index1[c >> 11]` selects an index-2 block, `index2[.. + ((c >> 5) & 63)]`
//! selects a data block, and `data[.. + (c & 31)]` holds the value.
//! Identical data blocks and identical index-2 blocks are stored once.

use super::builder::Ranges;
use super::{
    CODE_POINT_LIMIT, DATA_BLOCK_LENGTH, DATA_MASK, INDEX_2_BLOCK_LENGTH, INDEX_2_MASK, SHIFT_1,
    SHIFT_2,
};
use crate::error::{CollationError, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Magic number at the start of a serialized trie ("ktri").
pub const TRIE_MAGIC: u32 = 0x6B74_7269;

const HEADER_LENGTH: usize = 6 * 4;

/// Frozen code point trie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePointTrie {
    index1: Vec<u16>,
    index2: Vec<u32>,
    data: Vec<u32>,
    initial_value: u32,
    error_value: u32,
}

impl CodePointTrie {
    /// Build from all data blocks in code point order.
    pub(crate) fn from_blocks(
        blocks: impl Iterator<Item = [u32; DATA_BLOCK_LENGTH]>,
        initial_value: u32,
        error_value: u32,
    ) -> Self {
        let mut data: Vec<u32> = Vec::new();
        let mut data_blocks: AHashMap<[u32; DATA_BLOCK_LENGTH], u32> = AHashMap::new();
        let block_offsets: Vec<u32> = blocks
            .map(|block| {
                *data_blocks.entry(block).or_insert_with(|| {
                    let offset = data.len() as u32;
                    data.extend_from_slice(&block);
                    offset
                })
            })
            .collect();

        let mut index2: Vec<u32> = Vec::new();
        let mut index2_blocks: AHashMap<&[u32], u16> = AHashMap::new();
        let index1 = block_offsets
            .chunks(INDEX_2_BLOCK_LENGTH)
            .map(|chunk| {
                *index2_blocks.entry(chunk).or_insert_with(|| {
                    let offset = index2.len() as u16;
                    index2.extend_from_slice(chunk);
                    offset
                })
            })
            .collect();

        Self {
            index1,
            index2,
            data,
            initial_value,
            error_value,
        }
    }

    /// Get the value for a code point.
    #[inline]
    pub fn get(&self, c: u32) -> u32 {
        if c >= CODE_POINT_LIMIT {
            return self.error_value;
        }
        self.lookup(c).unwrap_or(self.error_value)
    }

    #[inline]
    fn lookup(&self, c: u32) -> Option<u32> {
        let i2 = *self.index1.get((c >> SHIFT_1) as usize)? as usize;
        let block = *self.index2.get(i2 + ((c >> SHIFT_2) & INDEX_2_MASK) as usize)? as usize;
        self.data.get(block + (c & DATA_MASK) as usize).copied()
    }

    #[inline]
    pub fn initial_value(&self) -> u32 {
        self.initial_value
    }

    #[inline]
    pub fn error_value(&self) -> u32 {
        self.error_value
    }

    /// Iterate over maximal runs `(start, end, value)` of equal values.
    pub fn ranges(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        Ranges::new(move |c| self.get(c))
    }

    /// Number of bytes written by [`serialize`](Self::serialize).
    pub fn serialized_len(&self) -> usize {
        HEADER_LENGTH + self.index1.len() * 2 + (self.index2.len() + self.data.len()) * 4
    }

    /// Write the little-endian binary form into `out`.
    ///
    /// Returns the number of bytes written, or `BufferOverflow` with the
    /// required size if `out` is too small. Pass an empty slice to measure.
    pub fn serialize(&self, out: &mut [u8]) -> Result<usize> {
        let required = self.serialized_len();
        if out.len() < required {
            return Err(CollationError::BufferOverflow {
                required,
                capacity: out.len(),
            });
        }
        let mut pos = 0;
        self.write_to(|bytes| {
            out[pos..pos + bytes.len()].copy_from_slice(bytes);
            pos += bytes.len();
        });
        Ok(required)
    }

    /// Serialize into a new byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_len());
        self.write_to(|chunk| bytes.extend_from_slice(chunk));
        bytes
    }

    /// Feed the binary form to `put`, in order.
    fn write_to(&self, mut put: impl FnMut(&[u8])) {
        for word in [
            TRIE_MAGIC,
            self.initial_value,
            self.error_value,
            self.index1.len() as u32,
            self.index2.len() as u32,
            self.data.len() as u32,
        ] {
            put(&word.to_le_bytes());
        }
        for &unit in &self.index1 {
            put(&unit.to_le_bytes());
        }
        for &word in self.index2.iter().chain(&self.data) {
            put(&word.to_le_bytes());
        }
    }

    /// Parse the binary form written by [`serialize`](Self::serialize).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader { bytes, pos: 0 };
        if reader.u32()? != TRIE_MAGIC {
            return Err(CollationError::Load("not a serialized code point trie".into()));
        }
        let initial_value = reader.u32()?;
        let error_value = reader.u32()?;
        let index1_len = reader.u32()? as usize;
        let index2_len = reader.u32()? as usize;
        let data_len = reader.u32()? as usize;
        let index1 = (0..index1_len)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>>>()?;
        let index2 = (0..index2_len)
            .map(|_| reader.u32())
            .collect::<Result<Vec<_>>>()?;
        let data = (0..data_len)
            .map(|_| reader.u32())
            .collect::<Result<Vec<_>>>()?;

        if index1.len() != (CODE_POINT_LIMIT >> SHIFT_1) as usize
            || index1
                .iter()
                .any(|&i| i as usize + INDEX_2_BLOCK_LENGTH > index2.len())
            || index2
                .iter()
                .any(|&b| b as usize + DATA_BLOCK_LENGTH > data.len())
        {
            return Err(CollationError::Load("corrupt code point trie".into()));
        }
        Ok(Self {
            index1,
            index2,
            data,
            initial_value,
            error_value,
        })
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl ByteReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + N)
            .ok_or_else(|| CollationError::Load("truncated code point trie".into()))?;
        self.pos += N;
        let mut out = [0; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }
}
