use crate::budget::Budget;
use crate::matcher::PatternMatcher;
use crate::ordering::{ShortLex, StringOrdering};
use crate::overlap::overlaps;
use crate::string_store::StringStore;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Short strings over a three-letter alphabet, so patterns actually collide.
fn small_string(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..3, 0..=max_len)
}

/// Every (pattern index, start, end) occurrence found by brute force, in
/// matcher scan order.
fn naive_matches(patterns: &[Vec<u8>], haystack: &[u8]) -> Vec<(usize, usize, usize)> {
    let mut out = Vec::new();
    for end in 1..=haystack.len() {
        for start in (0..end).rev() {
            if let Some(index) = patterns.iter().position(|p| p.as_slice() == &haystack[start..end]) {
                out.push((index, start, end));
            }
        }
    }
    out
}

fn shortlex(a: &[u8], b: &[u8]) -> bool {
    ShortLex.prefers(a, b, &mut Budget::unlimited())
}

proptest! {
    /// Property 1: Interning idempotence
    /// Interning the same content twice returns the same id, and the id
    /// resolves back to the content.
    #[test]
    fn prop_interning_idempotent(strings in prop::collection::vec(small_string(5), 0..30)) {
        let mut store: StringStore<u8> = StringStore::new();
        let ids: Vec<_> = strings.iter().map(|s| store.get_or_create(s)).collect();

        for (s, &id) in strings.iter().zip(&ids) {
            prop_assert_eq!(store.get(id), s.as_slice());
            prop_assert_eq!(store.get_or_create(s), id);
            prop_assert_eq!(store.find(s), Some(id));
        }

        let distinct: BTreeSet<&Vec<u8>> = strings.iter().collect();
        prop_assert_eq!(store.len(), distinct.len());
    }

    /// Property 2: Sorted iteration
    /// `iter_sorted` visits every string exactly once in lexicographic order.
    #[test]
    fn prop_sorted_iteration(strings in prop::collection::vec(small_string(4), 0..30)) {
        let mut store: StringStore<u8> = StringStore::new();
        for s in &strings {
            store.get_or_create(s);
        }

        let sorted: Vec<&[u8]> = store.iter_sorted().map(|(_, s)| s).collect();
        prop_assert_eq!(sorted.len(), store.len());
        prop_assert!(sorted.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Property 3: Matcher agrees with brute force
    /// Every occurrence is reported once, by ascending end, shortest first.
    #[test]
    fn prop_matcher_finds_every_occurrence(
        patterns in prop::collection::btree_set(prop::collection::vec(0u8..3, 1..4), 0..8),
        haystack in small_string(12),
    ) {
        let patterns: Vec<Vec<u8>> = patterns.into_iter().collect();
        let mut matcher: PatternMatcher<u8, usize> = PatternMatcher::new();
        for (index, pattern) in patterns.iter().enumerate() {
            matcher.register(pattern, index);
        }

        let found: Vec<(usize, usize, usize)> = matcher
            .matches(&haystack)
            .into_iter()
            .map(|m| (*m.payload, m.range.start, m.range.end))
            .collect();
        prop_assert_eq!(found, naive_matches(&patterns, &haystack));
    }

    /// Property 4: Unregistering everything empties the trie
    #[test]
    fn prop_unregister_prunes_everything(
        patterns in prop::collection::btree_set(prop::collection::vec(0u8..3, 1..5), 0..10),
    ) {
        let mut matcher: PatternMatcher<u8, ()> = PatternMatcher::new();
        for pattern in &patterns {
            matcher.register(pattern, ());
        }
        prop_assert_eq!(matcher.len(), patterns.len());

        for pattern in &patterns {
            prop_assert_eq!(matcher.unregister(pattern), Some(()));
        }
        prop_assert!(matcher.is_empty());
        prop_assert_eq!(matcher.node_count(), 1);
    }

    /// Property 5: Overlaps are genuine
    /// Both strings sit inside the overlap word where the ranges say, and
    /// the ranges share at least one position.
    #[test]
    fn prop_overlaps_are_consistent(left in small_string(4), right in small_string(4)) {
        for overlap in overlaps(&left, &right) {
            prop_assert_eq!(&overlap.word[overlap.left.clone()], left.as_slice());
            prop_assert_eq!(&overlap.word[overlap.right.clone()], right.as_slice());
            prop_assert!(overlap.left.start < overlap.right.end);
            prop_assert!(overlap.right.start < overlap.left.end);
            prop_assert!(overlap.left.start == 0 || overlap.right.start == 0);
        }
    }

    /// Property 6: Shortlex is a strict total order compatible with
    /// concatenation
    #[test]
    fn prop_shortlex_total_and_monotone(
        a in small_string(4),
        b in small_string(4),
        prefix in small_string(2),
        suffix in small_string(2),
    ) {
        let forward = shortlex(&a, &b);
        let backward = shortlex(&b, &a);
        prop_assert!(!(forward && backward));
        prop_assert_eq!(forward || backward, a != b);

        if forward {
            let wrap = |s: &[u8]| [prefix.as_slice(), s, suffix.as_slice()].concat();
            prop_assert!(shortlex(&wrap(&a), &wrap(&b)));
        }
    }
}
