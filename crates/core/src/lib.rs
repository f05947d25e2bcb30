//! Kollate-core - Collation data model
//!
//! This crate provides the data structures shared by the collation data
//! builder and the code that reads built data.
//!
//! # Features
//!
//! - 64-bit collation elements and their compact 32-bit codes
//! - Append-only expansion stores with sequence sharing
//! - A mutable code point trie and its compact frozen form
//! - Serialized prefix and contraction tries
//! - Code point sets with a compact `u16` serialization
//!
//! # Example
//!
//! ```rust
//! use kollate_core::{encode_one_ce_as_ce32, Ce, Ce32};
//!
//! let ce = Ce::new(0x26A0, 0x0020, 0x0002);
//! let ce32 = encode_one_ce_as_ce32(ce).unwrap();
//! assert_eq!(ce32, Ce32::LongPrimary(0x26A0));
//! assert_eq!(ce32.inline_ce(), Some(ce));
//! ```

pub mod error;
pub use error::{CollationError, Result};

// CEs, CE32s and expansion storage
pub mod core;
pub use core::{
    encode_one_ce_as_ce32, Ce, Ce32, ContractionFlags, ExpansionStore, ExpansionView,
    LeadSurrogateKind, Tag, COMMON_SECONDARY, COMMON_TERTIARY,
};

// Lookup structures
pub mod context;
pub mod trie;
pub mod uset;
pub use context::{ContextBlob, ContextTrie, ContextTrieBuilder};
pub use trie::{CodePointTrie, TrieBuilder};
pub use uset::CodePointSet;

pub mod hangul;

// Built data
pub mod data;
pub use data::{CollationData, ContextMatch, LEAD_SURROGATE_BASE, LEAD_SURROGATE_COUNT};
