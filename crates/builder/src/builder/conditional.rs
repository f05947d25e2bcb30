//! Conditional mappings and their compilation into context tries.
//!
//! While building, a code point with contextual mappings stores a
//! `BuilderContext` value pointing at the head of a chain in an arena. The
//! head holds the mapping without context. At build time each chain is
//! compiled into a prefix trie over contraction tries in the context blob.

use super::CollationDataBuilder;
use compact_str::CompactString;
use kollate_core::core::ce32::MAX_INDEX;
use kollate_core::{Ce32, CollationError, ContextTrieBuilder, ContractionFlags, Result};
use tracing::trace;
use unicode_normalization::char::{canonical_combining_class, decompose_canonical};

/// One node of a conditional mapping chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalCe32 {
    /// Text that must precede the code point
    pub prefix: CompactString,
    /// Text that must follow the code point
    pub suffix: CompactString,
    pub ce32: Ce32,
    /// Arena index of the next node
    pub next: Option<u32>,
}

/// Nodes of one chain that share a prefix.
struct PrefixGroup<'a> {
    prefix: &'a str,
    /// `(suffix, ce32)` in suffix order; an empty suffix comes first.
    entries: Vec<(&'a str, Ce32)>,
}

impl CollationDataBuilder {
    /// Append a node to the conditional arena and return its index.
    ///
    /// `ce32` must be a mapping value, as for [`add_ce32`](Self::add_ce32).
    pub fn add_conditional_ce32(&mut self, prefix: &str, suffix: &str, ce32: Ce32) -> Result<u32> {
        self.guarded(|builder| {
            builder.check_building()?;
            builder.check_mapping_ce32(ce32)?;
            builder.add_conditional_ce32_inner(prefix, suffix, ce32)
        })
    }

    pub(crate) fn add_conditional_ce32_inner(
        &mut self,
        prefix: &str,
        suffix: &str,
        ce32: Ce32,
    ) -> Result<u32> {
        let index = u32::try_from(self.conditionals.len())
            .ok()
            .filter(|&index| index <= MAX_INDEX)
            .ok_or(CollationError::IndexOverflow {
                what: "conditional mappings",
                max: MAX_INDEX,
            })?;
        self.conditionals.try_reserve(1)?;
        self.conditionals.push(ConditionalCe32 {
            prefix: prefix.into(),
            suffix: suffix.into(),
            ce32,
            next: None,
        });
        Ok(index)
    }

    /// Iterate over a chain as `(index, node)`, starting at its head.
    pub(crate) fn chain(&self, head: u32) -> impl Iterator<Item = (u32, &ConditionalCe32)> + '_ {
        let mut next = Some(head);
        std::iter::from_fn(move || {
            let index = next?;
            let node = self.conditionals.get(index as usize)?;
            next = node.next;
            Some((index, node))
        })
    }

    /// The conditional node at `index`.
    pub fn conditional(&self, index: u32) -> Option<&ConditionalCe32> {
        self.conditionals.get(index as usize)
    }

    /// Chain nodes grouped by prefix, shortest prefix first.
    fn prefix_groups(&self, head: u32) -> Vec<PrefixGroup<'_>> {
        let mut nodes: Vec<&ConditionalCe32> = self.chain(head).map(|(_, node)| node).collect();
        nodes.sort_by(|a, b| {
            (a.prefix.chars().count(), &a.prefix, &a.suffix).cmp(&(
                b.prefix.chars().count(),
                &b.prefix,
                &b.suffix,
            ))
        });

        let mut groups: Vec<PrefixGroup<'_>> = Vec::new();
        for node in nodes {
            match groups.last_mut() {
                Some(group) if group.prefix == node.prefix.as_str() => {
                    group.entries.push((node.suffix.as_str(), node.ce32));
                }
                _ => groups.push(PrefixGroup {
                    prefix: node.prefix.as_str(),
                    entries: vec![(node.suffix.as_str(), node.ce32)],
                }),
            }
        }
        groups
    }

    /// Default value of every group: its own mapping without suffix, or
    /// else the default of the longest shorter prefix that it ends with.
    fn group_defaults(groups: &[PrefixGroup<'_>]) -> Vec<(Ce32, bool)> {
        let mut defaults: Vec<(Ce32, bool)> = Vec::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            let own = group
                .entries
                .first()
                .filter(|(suffix, _)| suffix.is_empty())
                .map(|&(_, ce32)| ce32);
            let default = match own {
                Some(ce32) => (ce32, true),
                None => {
                    let inherited = (0..i)
                        .rev()
                        .find(|&j| group.prefix.ends_with(groups[j].prefix))
                        .map_or(Ce32::Fallback, |j| defaults[j].0);
                    (inherited, false)
                }
            };
            defaults.push(default);
        }
        defaults
    }

    /// Compile every conditional chain and replace its `BuilderContext` value.
    pub(crate) fn build_contexts(&mut self) -> Result<()> {
        let chars: Vec<(u32, u32)> = self.context_chars.ranges().collect();
        let mut count = 0usize;
        for (start, end) in chars {
            for c in start..=end {
                if let Ce32::BuilderContext { index } = self.get_ce32(c) {
                    let ce32 = self.build_context(index)?;
                    trace!(code_point = c, ce32 = ?ce32, "compiled context");
                    self.trie.set(c, ce32.to_bits())?;
                    count += 1;
                }
            }
        }
        trace!(count, blob_len = self.contexts.len(), "built contexts");
        Ok(())
    }

    /// Compile one chain into a context CE32.
    pub(crate) fn build_context(&mut self, head: u32) -> Result<Ce32> {
        // Work on owned copies so that the blob can be extended.
        let groups: Vec<(CompactString, Vec<(CompactString, Ce32)>)> = self
            .prefix_groups(head)
            .into_iter()
            .map(|group| {
                (
                    CompactString::from(group.prefix),
                    group
                        .entries
                        .into_iter()
                        .map(|(suffix, ce32)| (CompactString::from(suffix), ce32))
                        .collect(),
                )
            })
            .collect();
        let defaults = {
            let borrowed: Vec<PrefixGroup<'_>> = groups
                .iter()
                .map(|(prefix, entries)| PrefixGroup {
                    prefix: prefix.as_str(),
                    entries: entries.iter().map(|(s, ce32)| (s.as_str(), *ce32)).collect(),
                })
                .collect();
            Self::group_defaults(&borrowed)
        };

        let mut group_ce32s = Vec::with_capacity(groups.len());
        for ((_, entries), &(default, has_own)) in groups.iter().zip(&defaults) {
            let contractions: Vec<&(CompactString, Ce32)> =
                entries.iter().filter(|(suffix, _)| !suffix.is_empty()).collect();
            if contractions.is_empty() {
                group_ce32s.push(default);
                continue;
            }

            let mut flags = ContractionFlags::empty();
            if !has_own {
                flags |= ContractionFlags::SINGLE_CP_NO_MATCH;
            }
            if contractions
                .iter()
                .all(|(suffix, _)| suffix.chars().next().is_some_and(|ch| lead_ccc(ch) != 0))
            {
                flags |= ContractionFlags::NEXT_CCC;
            }
            if contractions
                .iter()
                .any(|(suffix, _)| suffix.chars().next_back().is_some_and(|ch| trail_ccc(ch) != 0))
            {
                flags |= ContractionFlags::TRAILING_CCC;
            }

            let mut trie = ContextTrieBuilder::new();
            for (suffix, ce32) in &contractions {
                trie.insert_str(suffix, ce32.to_bits());
            }
            let index = self.contexts.add(default.to_bits(), &trie.serialize())?;
            group_ce32s.push(Ce32::Contraction { index, flags });
        }

        // The empty-prefix group always exists: it holds the chain head.
        let mut prefixes = ContextTrieBuilder::new();
        for ((prefix, _), ce32) in groups.iter().zip(&group_ce32s).skip(1) {
            prefixes.insert_reversed(prefix, ce32.to_bits());
        }
        let no_prefix = group_ce32s.first().copied().unwrap_or(Ce32::Fallback);
        if prefixes.is_empty() {
            return Ok(no_prefix);
        }
        let index = self.contexts.add(no_prefix.to_bits(), &prefixes.serialize())?;
        Ok(Ce32::Prefix { index })
    }

    /// Resolve a chain against text, mirroring the compiled tries.
    ///
    /// Returns the matched CE32 and the number of suffix characters consumed.
    pub(crate) fn lookup_chain(&self, head: u32, prefix_text: &str, rest: &str) -> (Ce32, usize) {
        let groups = self.prefix_groups(head);
        let defaults = Self::group_defaults(&groups);
        let Some(i) = (0..groups.len())
            .rev()
            .find(|&i| prefix_text.ends_with(groups[i].prefix))
        else {
            return (Ce32::Fallback, 0);
        };
        groups[i]
            .entries
            .iter()
            .filter(|(suffix, _)| !suffix.is_empty() && rest.starts_with(suffix))
            .max_by_key(|(suffix, _)| suffix.len())
            .map_or((defaults[i].0, 0), |&(suffix, ce32)| {
                (ce32, suffix.chars().count())
            })
    }
}

/// Combining class of the first character of the canonical decomposition.
fn lead_ccc(ch: char) -> u8 {
    let mut first = None;
    decompose_canonical(ch, |d| {
        first.get_or_insert(d);
    });
    first.map_or(0, canonical_combining_class)
}

/// Combining class of the last character of the canonical decomposition.
fn trail_ccc(ch: char) -> u8 {
    let mut last = None;
    decompose_canonical(ch, |d| last = Some(d));
    last.map_or(0, canonical_combining_class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kollate_core::Ce;

    fn lp(p: u32) -> Vec<Ce> {
        vec![Ce::from_primary(p)]
    }

    #[test]
    fn test_combining_classes() {
        assert_eq!(lead_ccc('a'), 0);
        assert_eq!(lead_ccc('\u{0301}'), 230);
        // U+00E1 decomposes to a + U+0301.
        assert_eq!(lead_ccc('\u{00E1}'), 0);
        assert_eq!(trail_ccc('\u{00E1}'), 230);
        // U+0344 decomposes to U+0308 U+0301.
        assert_eq!(lead_ccc('\u{0344}'), 230);
    }

    #[test]
    fn test_chain_order_and_groups() {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "abc", &lp(0x3000)).unwrap();
        builder.add("x", "a", &lp(0x4000)).unwrap();
        builder.add("", "ab", &lp(0x2000)).unwrap();

        let head = match builder.get_ce32('a' as u32) {
            Ce32::BuilderContext { index } => index,
            other => panic!("unexpected {other:?}"),
        };
        // Discovery order in the chain.
        let suffixes: Vec<&str> = builder
            .chain(head)
            .map(|(_, node)| node.suffix.as_str())
            .collect();
        assert_eq!(suffixes, vec!["", "bc", "", "b"]);

        let groups = builder.prefix_groups(head);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].prefix, "");
        assert_eq!(
            groups[0].entries.iter().map(|e| e.0).collect::<Vec<_>>(),
            vec!["", "b", "bc"]
        );
        assert_eq!(groups[1].prefix, "x");
    }

    #[test]
    fn test_longest_suffix_wins() {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "a", &lp(0x1000)).unwrap();
        builder.add("", "ab", &lp(0x2000)).unwrap();
        builder.add("", "abc", &lp(0x3000)).unwrap();

        let m = builder.lookup("", "abcd").unwrap();
        assert_eq!((m.ces, m.consumed), (lp(0x3000), 3));
        let m = builder.lookup("", "abd").unwrap();
        assert_eq!((m.ces, m.consumed), (lp(0x2000), 2));
        let m = builder.lookup("", "a").unwrap();
        assert_eq!((m.ces, m.consumed), (lp(0x1000), 1));
    }

    #[test]
    fn test_prefix_default_inherits() {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "a", &lp(0x1000)).unwrap();
        builder.add("y", "a", &lp(0x5000)).unwrap();
        builder.add("xy", "ab", &lp(0x6000)).unwrap();

        // "xy" has no mapping for "a" alone; it inherits the one for "y".
        let m = builder.lookup("xy", "ac").unwrap();
        assert_eq!(m.ces, lp(0x5000));
        let m = builder.lookup("xy", "ab").unwrap();
        assert_eq!((m.ces, m.consumed), (lp(0x6000), 2));
        let m = builder.lookup("zy", "ab").unwrap();
        assert_eq!((m.ces, m.consumed), (lp(0x5000), 1));
        let m = builder.lookup("", "ab").unwrap();
        assert_eq!((m.ces, m.consumed), (lp(0x1000), 1));

        let cases = [("xy", "ac"), ("xy", "ab"), ("zy", "ab"), ("", "ab")];
        let expected: Vec<_> = cases.iter().map(|(p, t)| builder.lookup(p, t)).collect();
        let data = builder.build().unwrap();
        for ((prefix, text), expected) in cases.iter().zip(expected) {
            assert_eq!(data.lookup(prefix, text), expected, "{prefix:?} {text:?}");
        }
        match data.ce32('a' as u32) {
            Ce32::Prefix { .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_identical_contexts_are_shared() {
        let mut builder = CollationDataBuilder::new();
        builder.add("", "pq", &lp(0x2000)).unwrap();
        builder.add("", "rq", &lp(0x2000)).unwrap();
        builder.add("", "p", &lp(0x1000)).unwrap();
        builder.add("", "r", &lp(0x1000)).unwrap();
        let data = builder.build().unwrap();
        assert_eq!(data.ce32('p' as u32), data.ce32('r' as u32));
    }
}
