//! Saving and loading built collation data.
//!
//! Data is stored as a single versioned JSON document. The trie is kept in
//! its binary form and the unsafe-backward set in its compact `u16` form.

pub mod format;
pub mod load;
pub mod save;

pub use format::{SerializedData, FORMAT_VERSION};
pub use load::DataLoader;
pub use save::DataSaver;

/// File name used inside a data directory.
pub const DATA_FILE_NAME: &str = "collation.json";
