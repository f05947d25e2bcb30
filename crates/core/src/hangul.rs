//! Hangul syllables and conjoining Jamo.

/// First precomposed Hangul syllable.
pub const SYLLABLE_BASE: u32 = 0xAC00;
/// Last precomposed Hangul syllable.
pub const SYLLABLE_END: u32 = 0xD7A3;

pub const L_BASE: u32 = 0x1100;
pub const L_COUNT: u32 = 19;
pub const V_BASE: u32 = 0x1161;
pub const V_COUNT: u32 = 21;
/// First trailing consonant. `T_BASE - 1` stands for "no trailing consonant".
pub const T_BASE: u32 = 0x11A8;
pub const T_COUNT: u32 = 27;

const T_BLOCK: u32 = T_COUNT + 1;
const N_COUNT: u32 = V_COUNT * T_BLOCK;

/// Number of entries in a Jamo CE table: all L, V and T Jamo.
pub const JAMO_CE_COUNT: usize = (L_COUNT + V_COUNT + T_COUNT) as usize;

#[inline]
pub fn is_syllable(c: u32) -> bool {
    (SYLLABLE_BASE..=SYLLABLE_END).contains(&c)
}

/// Position of a conjoining Jamo in a Jamo CE table.
pub fn jamo_index(c: u32) -> Option<usize> {
    if (L_BASE..L_BASE + L_COUNT).contains(&c) {
        Some((c - L_BASE) as usize)
    } else if (V_BASE..V_BASE + V_COUNT).contains(&c) {
        Some((L_COUNT + c - V_BASE) as usize)
    } else if (T_BASE..T_BASE + T_COUNT).contains(&c) {
        Some((L_COUNT + V_COUNT + c - T_BASE) as usize)
    } else {
        None
    }
}

/// All conjoining Jamo in table order.
pub fn jamo() -> impl Iterator<Item = u32> {
    (L_BASE..L_BASE + L_COUNT)
        .chain(V_BASE..V_BASE + V_COUNT)
        .chain(T_BASE..T_BASE + T_COUNT)
}

/// Split a syllable into its leading, vowel and optional trailing Jamo.
pub fn decompose(c: u32) -> Option<(u32, u32, Option<u32>)> {
    if !is_syllable(c) {
        return None;
    }
    let s = c - SYLLABLE_BASE;
    let l = L_BASE + s / N_COUNT;
    let v = V_BASE + (s % N_COUNT) / T_BLOCK;
    let t = s % T_BLOCK;
    Some((l, v, (t != 0).then(|| T_BASE + t - 1)))
}
