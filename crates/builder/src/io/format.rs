//! Format definitions for collation data serialization.

use serde::{Deserialize, Serialize};

/// Current format version.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Complete collation data serialization format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedData {
    /// Format version
    pub version: String,
    /// Frozen trie in its binary form
    pub trie: Vec<u8>,
    /// CE32 store
    pub ce32s: Vec<u32>,
    /// CE store as raw 64-bit values
    pub ces: Vec<u64>,
    /// Context blob
    pub contexts: Vec<u16>,
    /// Unsafe-backward set in compact form
    pub unsafe_backward: Vec<u16>,
    /// Jamo CE table as raw 64-bit values
    pub jamo_ces: Option<Vec<u64>>,
    /// Lead surrogate summaries, one byte per code unit
    #[serde(default)]
    pub lead_surrogates: Vec<u8>,
}
