//! Compact 32-bit collation element codes.
//!
//! Everything outside this module handles CE32 values as the [`Ce32`] enum;
//! this is the only place that knows the bit layout.
//!
//! Layout:
//! - low byte `< 0xC0`: a simple CE, `pppp_pppp_pppp_pppp ssss_ssss tttt_tttt`
//! - low byte `0xC0 | tag`: a special CE32. Indexed tags keep a 20-bit index
//!   in bits 31..12 and a 4-bit auxiliary field in bits 11..8.

use crate::core::ce::{Ce, COMMON_SECONDARY, COMMON_TERTIARY};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Low byte value from which on a CE32 is special.
pub const SPECIAL_LOW_BYTE: u32 = 0xC0;

/// Largest index that fits into an indexed CE32.
pub const MAX_INDEX: u32 = 0xF_FFFF;

/// Longest expansion whose length fits into the CE32 itself.
pub const MAX_INLINE_LENGTH: usize = 15;

/// Largest primary weight of a `LongPrimary` CE32.
pub const MAX_LONG_PRIMARY: u32 = 0x00FF_FFFF;

/// Largest per-code-point step of an offset range.
pub const MAX_OFFSET_STEP: u32 = 0xFF;

const INDEX_SHIFT: u32 = 12;
const AUX_SHIFT: u32 = 8;
const AUX_MASK: u32 = 0xF;

/// Raw value of [`Ce32::Fallback`], the initial value of every trie.
pub const FALLBACK_CE32: u32 = SPECIAL_LOW_BYTE | Tag::Fallback as u32;

/// Raw value of [`Ce32::Unassigned`].
pub const UNASSIGNED_CE32: u32 = 0xFFFF_FFFF;

/// Tag of a special CE32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Fallback = 0,
    LongPrimary = 1,
    LongSecondary = 2,
    Reserved3 = 3,
    Expansion32 = 4,
    Expansion = 5,
    BuilderContext = 6,
    Prefix = 7,
    Contraction = 8,
    Digit = 9,
    U0000 = 10,
    Hangul = 11,
    LeadSurrogate = 12,
    Offset = 13,
    Reserved14 = 14,
    Implicit = 15,
}

impl Tag {
    fn from_nibble(n: u32) -> Tag {
        match n & 0xF {
            0 => Tag::Fallback,
            1 => Tag::LongPrimary,
            2 => Tag::LongSecondary,
            3 => Tag::Reserved3,
            4 => Tag::Expansion32,
            5 => Tag::Expansion,
            6 => Tag::BuilderContext,
            7 => Tag::Prefix,
            8 => Tag::Contraction,
            9 => Tag::Digit,
            10 => Tag::U0000,
            11 => Tag::Hangul,
            12 => Tag::LeadSurrogate,
            13 => Tag::Offset,
            14 => Tag::Reserved14,
            _ => Tag::Implicit,
        }
    }
}

bitflags! {
    /// Flags stored in the auxiliary field of a contraction CE32.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContractionFlags: u8 {
        /// The code point alone has no mapping for this prefix; the
        /// default value comes from a shorter prefix.
        const SINGLE_CP_NO_MATCH = 0x1;
        /// Every suffix starts with a character whose lead combining class is not 0.
        const NEXT_CCC = 0x2;
        /// Some suffix ends with a character whose trail combining class is not 0.
        const TRAILING_CCC = 0x4;
    }
}

/// What the 1024 supplementary code points of a lead surrogate map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadSurrogateKind {
    AllUnassigned = 0,
    AllFallback = 1,
    Mixed = 2,
}

impl TryFrom<u8> for LeadSurrogateKind {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(LeadSurrogateKind::AllUnassigned),
            1 => Ok(LeadSurrogateKind::AllFallback),
            2 => Ok(LeadSurrogateKind::Mixed),
            other => Err(other),
        }
    }
}

/// A decoded CE32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ce32 {
    /// Inline CE with a 16-bit primary, 8-bit secondary and tertiary.
    Simple {
        primary: u16,
        secondary: u8,
        tertiary: u8,
    },
    /// Inline CE with a 24-bit primary and common secondary/tertiary.
    LongPrimary(u32),
    /// Inline CE with primary 0.
    LongSecondary { secondary: u16, tertiary: u8 },
    /// No mapping here; defer to the base data.
    Fallback,
    /// CE32 sequence in the 32-bit store. `length == 0` means the sequence is
    /// preceded by a length header element.
    Expansion32 { index: u32, length: u8 },
    /// CE sequence in the 64-bit store, same length convention.
    Expansion { index: u32, length: u8 },
    /// Builder-only: head of a conditional mapping chain.
    BuilderContext { index: u32 },
    /// Prefix trie at `index` in the context blob.
    Prefix { index: u32 },
    /// Contraction trie at `index` in the context blob.
    Contraction { index: u32, flags: ContractionFlags },
    /// Decimal digit; the regular CE32 is stored in the 32-bit store.
    Digit { index: u32, value: u8 },
    /// U+0000; the regular CE32 is stored at index 0 of the 32-bit store.
    U0000,
    /// Hangul syllable, computed from the Jamo CEs.
    Hangul,
    /// Summary of a lead surrogate's supplementary code points.
    LeadSurrogate(LeadSurrogateKind),
    /// Primary-weight range; offset data is stored in the 64-bit store.
    Offset { index: u32 },
    /// Explicitly unassigned code point.
    Unassigned,
    /// Reserved tag, never produced.
    Reserved(u32),
}

impl Ce32 {
    /// Decode a raw CE32.
    pub fn from_bits(bits: u32) -> Ce32 {
        let low = bits & 0xFF;
        if low < SPECIAL_LOW_BYTE {
            return Ce32::Simple {
                primary: (bits >> 16) as u16,
                secondary: (bits >> 8) as u8,
                tertiary: low as u8,
            };
        }
        let index = bits >> INDEX_SHIFT;
        let aux = (bits >> AUX_SHIFT) & AUX_MASK;
        match Tag::from_nibble(low) {
            Tag::Fallback => Ce32::Fallback,
            Tag::LongPrimary => Ce32::LongPrimary(bits >> 8),
            Tag::LongSecondary => Ce32::LongSecondary {
                secondary: (bits >> 16) as u16,
                tertiary: (bits >> 8) as u8,
            },
            Tag::Expansion32 => Ce32::Expansion32 {
                index,
                length: aux as u8,
            },
            Tag::Expansion => Ce32::Expansion {
                index,
                length: aux as u8,
            },
            Tag::BuilderContext => Ce32::BuilderContext { index },
            Tag::Prefix => Ce32::Prefix { index },
            Tag::Contraction => Ce32::Contraction {
                index,
                flags: ContractionFlags::from_bits_truncate(aux as u8),
            },
            Tag::Digit => Ce32::Digit {
                index,
                value: aux as u8,
            },
            Tag::U0000 => Ce32::U0000,
            Tag::Hangul => Ce32::Hangul,
            Tag::LeadSurrogate => Ce32::LeadSurrogate(match aux {
                0 => LeadSurrogateKind::AllUnassigned,
                1 => LeadSurrogateKind::AllFallback,
                _ => LeadSurrogateKind::Mixed,
            }),
            Tag::Offset => Ce32::Offset { index },
            Tag::Implicit => Ce32::Unassigned,
            Tag::Reserved3 | Tag::Reserved14 => Ce32::Reserved(bits),
        }
    }

    /// Encode into the raw 32-bit form.
    ///
    /// Indices above [`MAX_INDEX`] and lengths above [`MAX_INLINE_LENGTH`]
    /// are truncated; callers check them before constructing the value.
    pub fn to_bits(self) -> u32 {
        match self {
            Ce32::Simple {
                primary,
                secondary,
                tertiary,
            } => ((primary as u32) << 16) | ((secondary as u32) << 8) | tertiary as u32,
            Ce32::LongPrimary(p) => ((p & MAX_LONG_PRIMARY) << 8) | special(Tag::LongPrimary),
            Ce32::LongSecondary {
                secondary,
                tertiary,
            } => ((secondary as u32) << 16) | ((tertiary as u32) << 8) | special(Tag::LongSecondary),
            Ce32::Fallback => FALLBACK_CE32,
            Ce32::Expansion32 { index, length } => indexed(Tag::Expansion32, index, length as u32),
            Ce32::Expansion { index, length } => indexed(Tag::Expansion, index, length as u32),
            Ce32::BuilderContext { index } => indexed(Tag::BuilderContext, index, 0),
            Ce32::Prefix { index } => indexed(Tag::Prefix, index, 0),
            Ce32::Contraction { index, flags } => {
                indexed(Tag::Contraction, index, flags.bits() as u32)
            }
            Ce32::Digit { index, value } => indexed(Tag::Digit, index, value as u32),
            Ce32::U0000 => special(Tag::U0000),
            Ce32::Hangul => special(Tag::Hangul),
            Ce32::LeadSurrogate(kind) => indexed(Tag::LeadSurrogate, 0, kind as u32),
            Ce32::Offset { index } => indexed(Tag::Offset, index, 0),
            Ce32::Unassigned => UNASSIGNED_CE32,
            Ce32::Reserved(bits) => bits,
        }
    }

    /// The tag of a special CE32, or `None` for a simple one.
    pub fn tag(self) -> Option<Tag> {
        let low = self.to_bits() & 0xFF;
        (low >= SPECIAL_LOW_BYTE).then(|| Tag::from_nibble(low))
    }

    /// True for values that directly encode one CE.
    #[inline]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Ce32::Simple { .. } | Ce32::LongPrimary(_) | Ce32::LongSecondary { .. }
        )
    }

    /// True for values that are neither `Fallback` nor `Unassigned`.
    #[inline]
    pub fn is_assigned(self) -> bool {
        !matches!(self, Ce32::Fallback | Ce32::Unassigned)
    }

    /// True for values that depend on surrounding text.
    #[inline]
    pub fn has_context(self) -> bool {
        matches!(
            self,
            Ce32::BuilderContext { .. } | Ce32::Prefix { .. } | Ce32::Contraction { .. }
        )
    }

    /// True for expansions and context-dependent values.
    #[inline]
    pub fn is_complex(self) -> bool {
        self.has_context() || matches!(self, Ce32::Expansion32 { .. } | Ce32::Expansion { .. })
    }

    /// The CE encoded directly in an inline CE32.
    pub fn inline_ce(self) -> Option<Ce> {
        match self {
            Ce32::Simple {
                primary,
                secondary,
                tertiary,
            } => Some(Ce::new(primary as u32, secondary as u16, tertiary as u16)),
            Ce32::LongPrimary(p) => Some(Ce::from_primary(p)),
            Ce32::LongSecondary {
                secondary,
                tertiary,
            } => Some(Ce::new(0, secondary, tertiary as u16)),
            _ => None,
        }
    }
}

impl From<Ce32> for u32 {
    fn from(ce32: Ce32) -> u32 {
        ce32.to_bits()
    }
}

impl From<u32> for Ce32 {
    fn from(bits: u32) -> Ce32 {
        Ce32::from_bits(bits)
    }
}

#[inline]
const fn special(tag: Tag) -> u32 {
    SPECIAL_LOW_BYTE | tag as u32
}

#[inline]
fn indexed(tag: Tag, index: u32, aux: u32) -> u32 {
    ((index & MAX_INDEX) << INDEX_SHIFT) | ((aux & AUX_MASK) << AUX_SHIFT) | special(tag)
}

/// Encode one CE as an inline CE32 if its shape allows it.
///
/// Returns `None` if the CE does not fit any inline form.
pub fn encode_one_ce_as_ce32(ce: Ce) -> Option<Ce32> {
    let p = ce.primary();
    let s = ce.secondary();
    let t = ce.tertiary();
    if s == COMMON_SECONDARY && t == COMMON_TERTIARY && p <= MAX_LONG_PRIMARY {
        Some(Ce32::LongPrimary(p))
    } else if p <= 0xFFFF && s <= 0xFF && (t as u32) < SPECIAL_LOW_BYTE {
        Some(Ce32::Simple {
            primary: p as u16,
            secondary: s as u8,
            tertiary: t as u8,
        })
    } else if p == 0 && t <= 0xFF {
        Some(Ce32::LongSecondary {
            secondary: s,
            tertiary: t as u8,
        })
    } else {
        None
    }
}

/// Pack offset-range data into a CE-sized store element.
pub fn offset_data(primary: u32, start: u32, step: u32) -> Ce {
    Ce::from_bits(((primary as u64) << 32) | ((start as u64) << 8) | (step & MAX_OFFSET_STEP) as u64)
}

/// First code point of the range described by offset data.
#[inline]
pub fn offset_data_start(data: Ce) -> u32 {
    (data.lower32() >> 8) & 0x1F_FFFF
}

/// Primary weight of `c` inside the range described by offset data.
///
/// Returns `None` if `c` lies before the range start or the weight does
/// not fit 32 bits.
pub fn primary_from_offset_data(c: u32, data: Ce) -> Option<u32> {
    let start = offset_data_start(data);
    let step = data.lower32() & MAX_OFFSET_STEP;
    let delta = (c.checked_sub(start)? as u64) * step as u64;
    u32::try_from(data.primary() as u64 + delta).ok()
}
