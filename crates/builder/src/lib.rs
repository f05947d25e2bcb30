//! Kollate-builder - Collation data builder
//!
//! This crate compiles mappings from strings to collation elements into
//! compact, immutable collation data. Mappings may depend on preceding
//! text (prefixes) or on following text (contractions), map to several CEs
//! (expansions), or assign whole code point ranges to increasing primary
//! weights.
//!
//! # Features
//!
//! - Inline encoding of the common one-CE case, shared expansion storage
//! - Prefix and contraction tries with longest-match semantics
//! - Offset ranges for large blocks of code points
//! - Copying mappings from another builder through a CE modifier
//! - Saving and loading built data as versioned JSON
//!
//! # Example
//!
//! ```rust
//! use kollate_builder::{Ce, CollationDataBuilder};
//!
//! let mut builder = CollationDataBuilder::new();
//! builder.add("", "a", &[Ce::from_primary(0x1000)])?;
//! builder.add("", "ch", &[Ce::from_primary(0x2000)])?;
//! builder.maybe_set_primary_range(0x4E00, 0x9FFF, 0x4000_0000, 1)?;
//!
//! let data = builder.build()?;
//! let m = data.lookup("", "cha").unwrap();
//! assert_eq!(m.ces, vec![Ce::from_primary(0x2000)]);
//! assert_eq!(m.consumed, 2);
//! # Ok::<(), kollate_builder::CollationError>(())
//! ```

// Re-export core types
pub use kollate_core::{
    Ce, Ce32, CodePointSet, CollationData, CollationError, ContextMatch, Result,
};

// Builder API
pub mod builder;
pub use builder::{BuilderConfig, CeModifier, CollationDataBuilder, ConditionalCe32, IdentityModifier};

// IO/Serialization
pub mod io;
pub use io::{DataLoader, DataSaver, SerializedData};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
