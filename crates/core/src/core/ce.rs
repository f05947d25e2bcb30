//! Collation elements.
//!
//! A CE packs a weight triple into 64 bits so that comparing two CEs as
//! integers compares primary, then secondary, then tertiary weights.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Secondary weight of an ordinary primary-only CE.
pub const COMMON_SECONDARY: u16 = 0x0020;

/// Tertiary weight of an ordinary primary-only CE.
pub const COMMON_TERTIARY: u16 = 0x0002;

/// Lower 32 bits of a CE with common secondary and tertiary weights.
pub const COMMON_SEC_AND_TER: u32 = ((COMMON_SECONDARY as u32) << 16) | COMMON_TERTIARY as u32;

/// A 64-bit collation element: `primary:32 | secondary:16 | tertiary:16`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ce(u64);

impl Ce {
    /// The completely ignorable CE.
    pub const IGNORABLE: Ce = Ce(0);

    /// Create a CE from its three weights.
    #[inline]
    pub const fn new(primary: u32, secondary: u16, tertiary: u16) -> Self {
        Ce(((primary as u64) << 32) | ((secondary as u64) << 16) | tertiary as u64)
    }

    /// Create a CE with common secondary and tertiary weights.
    #[inline]
    pub const fn from_primary(primary: u32) -> Self {
        Ce(((primary as u64) << 32) | COMMON_SEC_AND_TER as u64)
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Ce(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn primary(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub const fn secondary(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub const fn tertiary(self) -> u16 {
        self.0 as u16
    }

    /// Secondary and tertiary weights as one 32-bit value.
    #[inline]
    pub const fn lower32(self) -> u32 {
        self.0 as u32
    }

    /// True if secondary and tertiary weights are the common defaults.
    #[inline]
    pub const fn has_common_weights(self) -> bool {
        self.lower32() == COMMON_SEC_AND_TER
    }
}

impl fmt::Display for Ce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:04X}.{:04X}.{:04X}]",
            self.primary(),
            self.secondary(),
            self.tertiary()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights() {
        let ce = Ce::new(0x26A0, 0x0020, 0x0002);
        assert_eq!(ce.primary(), 0x26A0);
        assert_eq!(ce.secondary(), 0x0020);
        assert_eq!(ce.tertiary(), 0x0002);
        assert!(ce.has_common_weights());
        assert_eq!(ce, Ce::from_primary(0x26A0));
    }

    #[test]
    fn test_ordering() {
        let a = Ce::new(0x1000, 0x0020, 0x0002);
        let b = Ce::new(0x1000, 0x0021, 0x0001);
        let c = Ce::new(0x1001, 0x0005, 0x0001);
        assert!(a < b);
        assert!(b < c);
        assert!(Ce::IGNORABLE < a);
    }

    #[test]
    fn test_display() {
        assert_eq!(Ce::new(0x26A0, 0x20, 0x2).to_string(), "[26A0.0020.0002]");
    }
}
