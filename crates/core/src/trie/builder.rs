//! Mutable code point trie.
//!
//! The code point space is cut into 32-entry data blocks. A block whose
//! entries are all equal is kept as a single value; only blocks with mixed
//! values own an array. Setting a large range therefore costs one write per
//! block, not per code point.

use super::frozen::CodePointTrie;
use super::{CODE_POINT_LIMIT, DATA_BLOCK_LENGTH, DATA_MASK, SHIFT_2};
use crate::error::{CollationError, Result};

const BLOCK_COUNT: usize = (CODE_POINT_LIMIT >> SHIFT_2) as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Uniform(u32),
    Mixed(Box<[u32; DATA_BLOCK_LENGTH]>),
}

impl Block {
    #[inline]
    fn get(&self, offset: usize) -> u32 {
        match self {
            Block::Uniform(value) => *value,
            Block::Mixed(values) => values[offset],
        }
    }

    fn set(&mut self, offset: usize, value: u32) {
        match self {
            Block::Uniform(current) if *current == value => {}
            Block::Uniform(current) => {
                let mut values = Box::new([*current; DATA_BLOCK_LENGTH]);
                values[offset] = value;
                *self = Block::Mixed(values);
            }
            Block::Mixed(values) => values[offset] = value,
        }
    }
}

/// Incrementally built map from code point to 32-bit value.
#[derive(Debug, Clone)]
pub struct TrieBuilder {
    blocks: Vec<Block>,
    initial_value: u32,
    error_value: u32,
}

impl TrieBuilder {
    /// Create a trie where every code point maps to `initial_value`.
    ///
    /// `error_value` is returned for values outside the code point range.
    pub fn new(initial_value: u32, error_value: u32) -> Self {
        Self {
            blocks: vec![Block::Uniform(initial_value); BLOCK_COUNT],
            initial_value,
            error_value,
        }
    }

    #[inline]
    pub fn initial_value(&self) -> u32 {
        self.initial_value
    }

    #[inline]
    pub fn error_value(&self) -> u32 {
        self.error_value
    }

    /// Get the value for a code point.
    #[inline]
    pub fn get(&self, c: u32) -> u32 {
        if c >= CODE_POINT_LIMIT {
            return self.error_value;
        }
        self.blocks[(c >> SHIFT_2) as usize].get((c & DATA_MASK) as usize)
    }

    /// Set the value for one code point.
    pub fn set(&mut self, c: u32, value: u32) -> Result<()> {
        check_code_point(c)?;
        self.blocks[(c >> SHIFT_2) as usize].set((c & DATA_MASK) as usize, value);
        Ok(())
    }

    /// Set the value for every code point in `start..=end`.
    pub fn set_range(&mut self, start: u32, end: u32, value: u32) -> Result<()> {
        check_code_point(start)?;
        check_code_point(end)?;
        if start > end {
            return Err(CollationError::IllegalArgument(format!(
                "empty range U+{:04X}..U+{:04X}",
                start, end
            )));
        }
        let mut c = start;
        while c <= end {
            let block = (c >> SHIFT_2) as usize;
            let block_start = c & !DATA_MASK;
            let block_end = block_start + DATA_MASK;
            if c == block_start && block_end <= end {
                self.blocks[block] = Block::Uniform(value);
            } else {
                let last = block_end.min(end);
                for cp in c..=last {
                    self.blocks[block].set((cp & DATA_MASK) as usize, value);
                }
            }
            c = block_end + 1;
        }
        Ok(())
    }

    /// Iterate over maximal runs `(start, end, value)` of equal values.
    pub fn ranges(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        Ranges::new(move |c| self.get(c))
    }

    /// True if any code point in `start..=end` satisfies `pred`.
    pub fn any_in_range(&self, start: u32, end: u32, mut pred: impl FnMut(u32) -> bool) -> bool {
        let mut c = start;
        while c <= end && c < CODE_POINT_LIMIT {
            let block = &self.blocks[(c >> SHIFT_2) as usize];
            let block_end = (c | DATA_MASK).min(end);
            match block {
                Block::Uniform(value) => {
                    if pred(*value) {
                        return true;
                    }
                }
                Block::Mixed(values) => {
                    for cp in c..=block_end {
                        if pred(values[(cp & DATA_MASK) as usize]) {
                            return true;
                        }
                    }
                }
            }
            c = block_end + 1;
        }
        false
    }

    /// Compact the trie into its read-only form.
    pub fn freeze(&self) -> CodePointTrie {
        let blocks = self.blocks.iter().map(|block| match block {
            Block::Uniform(value) => [*value; DATA_BLOCK_LENGTH],
            Block::Mixed(values) => **values,
        });
        CodePointTrie::from_blocks(blocks, self.initial_value, self.error_value)
    }
}

fn check_code_point(c: u32) -> Result<()> {
    if c < CODE_POINT_LIMIT {
        Ok(())
    } else {
        Err(CollationError::IllegalArgument(format!(
            "code point {:#x} out of range",
            c
        )))
    }
}

/// Run-length iterator over a code point lookup function.
pub(crate) struct Ranges<F> {
    get: F,
    next: u32,
}

impl<F: Fn(u32) -> u32> Ranges<F> {
    pub(crate) fn new(get: F) -> Self {
        Self { get, next: 0 }
    }
}

impl<F: Fn(u32) -> u32> Iterator for Ranges<F> {
    type Item = (u32, u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= CODE_POINT_LIMIT {
            return None;
        }
        let start = self.next;
        let value = (self.get)(start);
        let mut end = start;
        while end + 1 < CODE_POINT_LIMIT && (self.get)(end + 1) == value {
            end += 1;
        }
        self.next = end + 1;
        Some((start, end, value))
    }
}
