//! Collation element representations.
//!
//! [`Ce`] is the full 64-bit weight triple, [`Ce32`] its compact 32-bit
//! code, and [`ExpansionStore`] holds the sequences that do not fit a CE32.

pub mod ce;
pub mod ce32;
pub mod expansion;

pub use ce::{Ce, COMMON_SECONDARY, COMMON_TERTIARY};
pub use ce32::{encode_one_ce_as_ce32, Ce32, ContractionFlags, LeadSurrogateKind, Tag};
pub use expansion::{ExpansionStore, ExpansionView};
