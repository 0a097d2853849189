//! Incremental multi-pattern matcher.
//!
//! Patterns are stored reversed in a trie, so a single left-to-right sweep over
//! the end positions of a haystack finds every registered pattern ending at
//! each position by walking backwards from it. Adding or removing a pattern
//! touches only its own branch; nothing is rebuilt.

use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};
use std::hash::Hash;
use std::ops::{ControlFlow, Range};

/// A node of the reversed pattern trie.
#[derive(Debug)]
struct TrieNode<T, P> {
    /// Parent node, `None` for the root
    parent: Option<DefaultKey>,
    /// Symbol on the edge leading here from the parent
    symbol: Option<T>,
    children: HashMap<T, DefaultKey>,
    /// Set when a registered pattern ends at this node
    payload: Option<P>,
}

impl<T, P> TrieNode<T, P> {
    fn new(parent: Option<DefaultKey>, symbol: Option<T>) -> Self {
        Self {
            parent,
            symbol,
            children: HashMap::default(),
            payload: None,
        }
    }
}

/// One occurrence of a registered pattern inside a haystack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a, P> {
    /// Payload registered with the pattern
    pub payload: &'a P,
    /// Position of the pattern in the haystack
    pub range: Range<usize>,
}

/// Multi-pattern matcher with a payload attached to every pattern.
///
/// The empty pattern can be stored but is never reported as a match.
#[derive(Debug)]
pub struct PatternMatcher<T, P> {
    nodes: SlotMap<DefaultKey, TrieNode<T, P>>,
    root: DefaultKey,
    patterns: usize,
}

impl<T: Hash + Eq + Clone, P> PatternMatcher<T, P> {
    /// Creates a matcher with no patterns.
    pub fn new() -> Self {
        let mut nodes = SlotMap::new();
        let root = nodes.insert(TrieNode::new(None, None));
        Self {
            nodes,
            root,
            patterns: 0,
        }
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns
    }

    /// Returns true if no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.patterns == 0
    }

    /// Registers `pattern`, returning the payload it replaced if it was
    /// already present.
    pub fn register(&mut self, pattern: &[T], payload: P) -> Option<P> {
        let node = self.node_or_create(pattern);
        let previous = self.nodes[node].payload.replace(payload);
        if previous.is_none() {
            self.patterns += 1;
        }
        previous
    }

    /// Returns the payload of `pattern`, registering it with a default
    /// payload first if needed.
    pub fn get_or_create(&mut self, pattern: &[T]) -> &mut P
    where
        P: Default,
    {
        let node = self.node_or_create(pattern);
        let slot = &mut self.nodes[node].payload;
        if slot.is_none() {
            self.patterns += 1;
        }
        slot.get_or_insert_with(P::default)
    }

    /// Removes `pattern` and returns its payload.
    ///
    /// Trie nodes left without payload or children are released.
    pub fn unregister(&mut self, pattern: &[T]) -> Option<P> {
        let node = self.find_node(pattern)?;
        let payload = self.nodes[node].payload.take()?;
        self.patterns -= 1;
        self.prune(node);
        Some(payload)
    }

    /// Payload attached to `pattern`, looked up by content.
    pub fn payload(&self, pattern: &[T]) -> Option<&P> {
        let node = self.find_node(pattern)?;
        self.nodes[node].payload.as_ref()
    }

    /// Mutable payload attached to `pattern`.
    pub fn payload_mut(&mut self, pattern: &[T]) -> Option<&mut P> {
        let node = self.find_node(pattern)?;
        self.nodes[node].payload.as_mut()
    }

    /// Reports every pattern occurrence in `haystack`.
    ///
    /// Occurrences are visited by ascending end position; patterns ending at
    /// the same position are visited shortest first. Returning
    /// `ControlFlow::Break` stops the scan.
    pub fn for_each_match<'a, F>(&'a self, haystack: &[T], mut f: F)
    where
        F: FnMut(Match<'a, P>) -> ControlFlow<()>,
    {
        for end in 1..=haystack.len() {
            let mut node = self.root;
            for start in (0..end).rev() {
                let Some(&child) = self.nodes[node].children.get(&haystack[start]) else {
                    break;
                };
                node = child;
                if let Some(payload) = &self.nodes[node].payload {
                    if f(Match {
                        payload,
                        range: start..end,
                    })
                    .is_break()
                    {
                        return;
                    }
                }
            }
        }
    }

    /// Returns the first occurrence, in scan order, accepted by `accept`.
    pub fn first_match<'a, F>(&'a self, haystack: &[T], mut accept: F) -> Option<Match<'a, P>>
    where
        F: FnMut(&P, &Range<usize>) -> bool,
    {
        let mut found = None;
        self.for_each_match(haystack, |m| {
            if accept(m.payload, &m.range) {
                found = Some(m);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Collects every occurrence in `haystack`.
    pub fn matches<'a>(&'a self, haystack: &[T]) -> Vec<Match<'a, P>> {
        let mut out = Vec::new();
        self.for_each_match(haystack, |m| {
            out.push(m);
            ControlFlow::Continue(())
        });
        out
    }

    fn find_node(&self, pattern: &[T]) -> Option<DefaultKey> {
        let mut node = self.root;
        for symbol in pattern.iter().rev() {
            node = *self.nodes[node].children.get(symbol)?;
        }
        Some(node)
    }

    fn node_or_create(&mut self, pattern: &[T]) -> DefaultKey {
        let mut node = self.root;
        for symbol in pattern.iter().rev() {
            node = match self.nodes[node].children.get(symbol) {
                Some(&child) => child,
                None => {
                    let child = self
                        .nodes
                        .insert(TrieNode::new(Some(node), Some(symbol.clone())));
                    self.nodes[node].children.insert(symbol.clone(), child);
                    child
                }
            };
        }
        node
    }

    /// Walks towards the root removing nodes that no longer carry anything.
    fn prune(&mut self, mut node: DefaultKey) {
        while node != self.root {
            let current = &self.nodes[node];
            if current.payload.is_some() || !current.children.is_empty() {
                return;
            }
            let parent = current.parent.expect("non-root trie node must have a parent");
            let symbol = current
                .symbol
                .clone()
                .expect("non-root trie node must have an edge symbol");
            self.nodes[parent].children.remove(&symbol);
            self.nodes.remove(node);
            node = parent;
        }
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<T: Hash + Eq + Clone, P> Default for PatternMatcher<T, P> {
    fn default() -> Self {
        Self::new()
    }
}
