//! Code point tries.
//!
//! [`TrieBuilder`] is the mutable form used while mappings are added;
//! [`CodePointTrie`] is the compact read-only form produced by
//! [`TrieBuilder::freeze`].

pub mod builder;
pub mod frozen;

pub use builder::TrieBuilder;
pub use frozen::CodePointTrie;

/// One past the largest code point.
pub const CODE_POINT_LIMIT: u32 = 0x11_0000;

pub(crate) const SHIFT_1: u32 = 11;
pub(crate) const SHIFT_2: u32 = 5;

/// Number of entries in a data block.
pub const DATA_BLOCK_LENGTH: usize = 1 << SHIFT_2;
pub(crate) const DATA_MASK: u32 = DATA_BLOCK_LENGTH as u32 - 1;

pub(crate) const INDEX_2_BLOCK_LENGTH: usize = 1 << (SHIFT_1 - SHIFT_2);
pub(crate) const INDEX_2_MASK: u32 = INDEX_2_BLOCK_LENGTH as u32 - 1;
