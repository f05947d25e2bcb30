//! Context tries and the context blob.
//!
//! Prefix and contraction mappings are compiled into small tries over UTF-16
//! code units. Each trie is stored in a shared `u16` blob behind a two-unit
//! default CE32:
//!
//! ```text
//! entry: [default hi, default lo][trie...]
//! node:  [(has_value << 15) | child_count][value hi, value lo]?
//!        [key, offset hi, offset lo] * child_count
//! ```
//!
//! Child offsets are relative to the start of the trie. Children are sorted
//! by key unit. A walk remembers the last value it passed, so the longest
//! stored key that matches the input wins.

use crate::core::ce32::MAX_INDEX;
use crate::error::{CollationError, Result};
use ahash::AHashMap;

const HAS_VALUE: u16 = 0x8000;
const CHILD_COUNT_MASK: u16 = 0x7FFF;

/// A node in the in-memory trie.
#[derive(Debug, Default)]
struct TrieNode {
    children: AHashMap<u16, TrieNode>,
    value: Option<u32>,
}

/// In-memory trie from UTF-16 key sequences to CE32 values.
#[derive(Debug, Default)]
pub struct ContextTrieBuilder {
    root: TrieNode,
    len: usize,
}

impl ContextTrieBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, replacing the value of an identical key.
    pub fn insert(&mut self, key: &[u16], value: u32) {
        let mut node = &mut self.root;
        for &unit in key {
            node = node.children.entry(unit).or_default();
        }
        if node.value.replace(value).is_none() {
            self.len += 1;
        }
    }

    /// Insert the UTF-16 form of `s`.
    pub fn insert_str(&mut self, s: &str, value: u32) {
        let key: Vec<u16> = s.encode_utf16().collect();
        self.insert(&key, value);
    }

    /// Insert `s` read backwards, as prefixes are matched.
    pub fn insert_reversed(&mut self, s: &str, value: u32) {
        self.insert(&reversed_units(s), value);
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Serialize into the pre-order node format.
    pub fn serialize(&self) -> Vec<u16> {
        let mut out = Vec::new();
        write_node(&self.root, &mut out);
        out
    }
}

fn write_node(node: &TrieNode, out: &mut Vec<u16>) {
    let mut keys: Vec<u16> = node.children.keys().copied().collect();
    keys.sort_unstable();

    let header = keys.len() as u16 & CHILD_COUNT_MASK;
    match node.value {
        Some(value) => {
            out.push(HAS_VALUE | header);
            out.extend_from_slice(&split(value));
        }
        None => out.push(header),
    }
    let table = out.len();
    out.resize(table + keys.len() * 3, 0);

    for (i, key) in keys.iter().enumerate() {
        // The trie always starts at index 0 of `out`.
        let [hi, lo] = split(out.len() as u32);
        out[table + i * 3] = *key;
        out[table + i * 3 + 1] = hi;
        out[table + i * 3 + 2] = lo;
        if let Some(child) = node.children.get(key) {
            write_node(child, out);
        }
    }
}

#[inline]
fn split(value: u32) -> [u16; 2] {
    [(value >> 16) as u16, value as u16]
}

#[inline]
fn join(hi: u16, lo: u16) -> u32 {
    ((hi as u32) << 16) | lo as u32
}

/// UTF-16 units of `s` with its characters in reverse order.
pub fn reversed_units(s: &str) -> Vec<u16> {
    let mut units = Vec::with_capacity(s.len());
    let mut buf = [0u16; 2];
    for ch in s.chars().rev() {
        units.extend_from_slice(ch.encode_utf16(&mut buf));
    }
    units
}

/// A serialized context trie.
#[derive(Debug, Clone, Copy)]
pub struct ContextTrie<'a> {
    units: &'a [u16],
}

struct Node {
    value: Option<u32>,
    table: usize,
    child_count: usize,
}

impl<'a> ContextTrie<'a> {
    pub fn new(units: &'a [u16]) -> Self {
        Self { units }
    }

    fn node(&self, pos: usize) -> Option<Node> {
        let header = *self.units.get(pos)?;
        let child_count = (header & CHILD_COUNT_MASK) as usize;
        if header & HAS_VALUE != 0 {
            let hi = *self.units.get(pos + 1)?;
            let lo = *self.units.get(pos + 2)?;
            Some(Node {
                value: Some(join(hi, lo)),
                table: pos + 3,
                child_count,
            })
        } else {
            Some(Node {
                value: None,
                table: pos + 1,
                child_count,
            })
        }
    }

    fn child(&self, node: &Node, unit: u16) -> Option<usize> {
        let table = self.units.get(node.table..node.table + node.child_count * 3)?;
        let (mut lo, mut hi) = (0, node.child_count);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let entry = &table[mid * 3..mid * 3 + 3];
            match entry[0].cmp(&unit) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Some(join(entry[1], entry[2]) as usize),
            }
        }
        None
    }

    /// Walk `keys` and return the value of the longest matching key with
    /// the number of units it spans.
    pub fn longest_match(&self, keys: impl IntoIterator<Item = u16>) -> Option<(u32, usize)> {
        let mut node = self.node(0)?;
        let mut best = node.value.map(|value| (value, 0));
        for (i, unit) in keys.into_iter().enumerate() {
            let Some(pos) = self.child(&node, unit) else {
                break;
            };
            let Some(next) = self.node(pos) else {
                break;
            };
            if let Some(value) = next.value {
                best = Some((value, i + 1));
            }
            node = next;
        }
        best
    }

    /// All `(key, value)` pairs in key order.
    pub fn entries(&self) -> Vec<(Vec<u16>, u32)> {
        let mut out = Vec::new();
        let mut key = Vec::new();
        self.collect(0, &mut key, &mut out);
        out
    }

    fn collect(&self, pos: usize, key: &mut Vec<u16>, out: &mut Vec<(Vec<u16>, u32)>) {
        let Some(node) = self.node(pos) else {
            return;
        };
        if let Some(value) = node.value {
            out.push((key.clone(), value));
        }
        for i in 0..node.child_count {
            let entry = node.table + i * 3;
            let (Some(&unit), Some(&hi), Some(&lo)) = (
                self.units.get(entry),
                self.units.get(entry + 1),
                self.units.get(entry + 2),
            ) else {
                return;
            };
            key.push(unit);
            self.collect(join(hi, lo) as usize, key, out);
            key.pop();
        }
    }
}

/// Read the entry at `index`: its default CE32 and its trie.
pub fn context_entry(blob: &[u16], index: u32) -> Option<(u32, ContextTrie<'_>)> {
    let index = index as usize;
    let default = join(*blob.get(index)?, *blob.get(index + 1)?);
    Some((default, ContextTrie::new(blob.get(index + 2..)?)))
}

/// Append-only context blob with sharing of identical entries.
#[derive(Debug, Clone, Default)]
pub struct ContextBlob {
    units: Vec<u16>,
    entries: AHashMap<Vec<u16>, u32>,
}

impl ContextBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry and return its index.
    pub fn add(&mut self, default_ce32: u32, trie: &[u16]) -> Result<u32> {
        let mut entry = Vec::with_capacity(trie.len() + 2);
        entry.extend_from_slice(&split(default_ce32));
        entry.extend_from_slice(trie);
        if let Some(&index) = self.entries.get(&entry) {
            return Ok(index);
        }
        let index = u32::try_from(self.units.len())
            .ok()
            .filter(|&index| index <= MAX_INDEX)
            .ok_or(CollationError::IndexOverflow {
                what: "context blob",
                max: MAX_INDEX,
            })?;
        self.units.try_reserve(entry.len())?;
        self.units.extend_from_slice(&entry);
        self.entries.insert(entry, index);
        Ok(index)
    }

    #[inline]
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_units(self) -> Vec<u16> {
        self.units
    }
}
