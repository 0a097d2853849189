//! Equivalence-class completion with one elite set per ordering.
//!
//! Every interned string belongs to exactly one class. Classes are circular
//! linked lists threaded through `next`, so splicing two of them is a swap of
//! two links. For each registered ordering, a member is *elite* when no other
//! member of its class is strictly preferred; non-elite members act as
//! rewrite sources towards an elite of the same class.

use crate::budget::Budget;
use crate::config::CompletionConfig;
use crate::error::Result;
use crate::matcher::PatternMatcher;
use crate::ordering::{OrderingId, ShortLex, StringOrdering};
use crate::overlap::{overlaps, splice};
use crate::rule::{Reduction, Rule};
use crate::string_store::{StringId, StringStore};
use crate::symbol::{render, Symbol};
use ahash::AHashSet as HashSet;
use std::ops::Range;
use tracing::{debug, info, trace};

/// Summary of one call to [`EquivalenceCompletion::expand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpandReport {
    /// Substitution and critical-pair rounds run
    pub rounds: usize,
    /// Class merges performed
    pub merges: usize,
    /// True if the last round found nothing new. False when the budget or
    /// the round limit stopped expansion first.
    pub saturated: bool,
    /// Derived strings dropped for exceeding the length bound, over the
    /// lifetime of the engine. Dropped derivations are not retried.
    pub discarded: usize,
}

/// Elite and retired flags of one ordering, indexed by `StringId`.
struct OrderingSlot<T> {
    ordering: Box<dyn StringOrdering<T>>,
    elite: Vec<bool>,
    retired: Vec<bool>,
}

impl<T> OrderingSlot<T> {
    /// Returns true if `id` is a live rewrite source under this ordering.
    #[inline]
    fn is_source(&self, id: StringId) -> bool {
        !self.elite[id.index()] && !self.retired[id.index()]
    }
}

/// Iterator over the members of a class, starting from a given member.
pub struct ClassMembers<'a> {
    next: &'a [StringId],
    start: StringId,
    current: Option<StringId>,
}

impl Iterator for ClassMembers<'_> {
    type Item = StringId;

    fn next(&mut self) -> Option<StringId> {
        let current = self.current?;
        let following = self.next[current.index()];
        self.current = (following != self.start).then_some(following);
        Some(current)
    }
}

/// Completion by merging equivalence classes of interned strings.
///
/// [`ShortLex`] is always registered as [`OrderingId::SHORTLEX`]; more
/// orderings can be added at any time, and each gets its own elites and its
/// own rewriting system over the same classes.
///
/// ```
/// use knuth_bendix_rs::{Budget, EquivalenceCompletion, OrderingId};
///
/// let mut classes: EquivalenceCompletion<char> = EquivalenceCompletion::new();
/// classes.add_identity(&['b', 'a'], &['a', 'b']).unwrap();
/// assert!(classes.expand(&mut Budget::unlimited()).saturated);
///
/// let reduced = classes.reduce(&['b', 'a', 'b'], OrderingId::SHORTLEX);
/// assert_eq!(reduced.normal_form, vec!['a', 'b', 'b']);
/// ```
pub struct EquivalenceCompletion<T> {
    store: StringStore<T>,
    config: CompletionConfig,

    /// Successor of each string in its circular class list
    next: Vec<StringId>,

    /// Representative of each string's class
    class_of: Vec<StringId>,

    /// Class sizes, valid at representatives only
    class_len: Vec<usize>,

    orderings: Vec<OrderingSlot<T>>,

    /// Members of non-trivial classes, keyed by content
    matcher: PatternMatcher<T, StringId>,

    /// Substitutions already tried: (haystack, source, start, replacement)
    substituted: HashSet<(StringId, StringId, usize, StringId)>,

    /// Critical pairs already tried: [left, left replacement, right, right replacement]
    overlapped: HashSet<[StringId; 4]>,

    /// Set once `expand` reached a fixpoint; cleared by any change
    clean: bool,

    /// Derived strings dropped by the length bound
    discarded: usize,
}

impl<T: Symbol> EquivalenceCompletion<T> {
    pub fn new() -> Self {
        let mut engine = Self {
            store: StringStore::new(),
            config: CompletionConfig::default(),
            next: Vec::new(),
            class_of: Vec::new(),
            class_len: Vec::new(),
            orderings: Vec::new(),
            matcher: PatternMatcher::new(),
            substituted: HashSet::default(),
            overlapped: HashSet::default(),
            clean: true,
            discarded: 0,
        };
        let shortlex = engine.add_ordering(ShortLex);
        debug_assert_eq!(shortlex, OrderingId::SHORTLEX);
        engine.clean = true;
        engine
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: CompletionConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Interns into `store` instead of a fresh store. Every string already in
    /// `store` starts out in its own class.
    ///
    /// # Panics
    ///
    /// Panics if strings were already interned by this engine.
    pub fn with_store(mut self, store: StringStore<T>) -> Self {
        assert!(
            self.store.is_empty(),
            "store can only be replaced before strings are interned"
        );
        self.store = store;
        self.sync();
        self
    }

    /// Consumes the engine and returns its string store.
    pub fn into_store(self) -> StringStore<T> {
        self.store
    }

    /// Registers another ordering and partitions the existing classes into
    /// elite and non-elite members under it.
    pub fn add_ordering<O>(&mut self, ordering: O) -> OrderingId
    where
        O: StringOrdering<T> + 'static,
    {
        let population = self.store.len();
        let mut slot = OrderingSlot {
            ordering: Box::new(ordering),
            elite: vec![true; population],
            retired: vec![false; population],
        };

        let mut budget = Budget::unlimited();
        for index in 0..population {
            let id = StringId::from_index(index);
            if self.class_of[index] != id || self.class_len[index] == 1 {
                continue;
            }
            let members: Vec<StringId> = self.members(id).collect();
            for &member in &members {
                let beaten = members.iter().any(|&other| {
                    other != member
                        && slot.ordering.prefers(
                            self.store.get(other),
                            self.store.get(member),
                            &mut budget,
                        )
                });
                slot.elite[member.index()] = !beaten;
            }
        }

        let id = OrderingId(self.orderings.len());
        debug!(ordering = slot.ordering.name(), id = id.index(), "ordering registered");
        self.orderings.push(slot);
        self.clean = false;
        id
    }

    /// Asserts `a = b`, merging their classes.
    ///
    /// Returns `Ok(false)` if both strings were already in the same class.
    pub fn add_identity(&mut self, a: &[T], b: &[T]) -> Result<bool> {
        self.config.check_input(a.len())?;
        self.config.check_input(b.len())?;

        let a = self.intern(a);
        let b = self.intern(b);
        Ok(self.merge(a, b, &mut Budget::unlimited()))
    }

    /// Runs substitution and critical-pair rounds until one merges nothing,
    /// then retires redundant rewrite sources for every ordering.
    ///
    /// Returns early, with `saturated == false`, once `budget` is exhausted
    /// or `max_cycles` rounds have run. Every merge made before that point is
    /// kept, and a later call picks up where this one stopped.
    pub fn expand(&mut self, budget: &mut Budget) -> ExpandReport {
        let mut report = ExpandReport {
            discarded: self.discarded,
            ..ExpandReport::default()
        };
        if self.clean {
            report.saturated = true;
            return report;
        }

        loop {
            if budget.is_exhausted() || report.rounds >= self.config.max_cycles {
                debug!(?report, "expansion stopped early");
                return report;
            }
            report.rounds += 1;

            let mut merged = self.substitute(budget);
            if !budget.is_exhausted() {
                self.collapse_all(budget);
            }
            if !budget.is_exhausted() {
                merged += self.deduce(budget);
            }
            report.merges += merged;
            report.discarded = self.discarded;

            debug!(
                round = report.rounds,
                merged,
                discarded = self.discarded,
                strings = self.store.len(),
                sources = self.matcher.len(),
                "expand round"
            );
            if budget.is_exhausted() {
                return report;
            }
            if merged == 0 {
                break;
            }
        }

        self.collapse_all(budget);
        if budget.is_exhausted() {
            debug!(?report, "expansion stopped during collapse");
            return report;
        }
        self.clean = true;
        report.saturated = true;
        info!(
            rounds = report.rounds,
            merges = report.merges,
            discarded = report.discarded,
            strings = self.store.len(),
            "expansion saturated"
        );
        report
    }

    /// Rewrites every proper occurrence of a rewrite source inside every
    /// interned string.
    fn substitute(&mut self, budget: &mut Budget) -> usize {
        let mut merges = 0;
        let population = self.store.len();

        for index in 0..population {
            if !budget.tick() {
                return merges;
            }
            let haystack = StringId::from_index(index);
            let occurrences: Vec<(StringId, Range<usize>)> = {
                let text = self.store.get(haystack);
                self.matcher
                    .matches(text)
                    .into_iter()
                    .filter(|found| found.range.len() != text.len())
                    .map(|found| (*found.payload, found.range))
                    .collect()
            };

            for (source, range) in occurrences {
                for target in self.replacements(source) {
                    if !budget.tick() {
                        return merges;
                    }
                    if !self.substituted.insert((haystack, source, range.start, target)) {
                        continue;
                    }

                    let word = splice(self.store.get(haystack), range.clone(), self.store.get(target));
                    if !self.config.admits(word.len()) {
                        self.discarded += 1;
                        continue;
                    }
                    let derived = self.intern(&word);
                    if self.merge(haystack, derived, budget) {
                        merges += 1;
                    }
                }
            }
        }
        merges
    }

    /// Merges the two rewrites of every overlap between rewrite sources.
    fn deduce(&mut self, budget: &mut Budget) -> usize {
        let sources: Vec<(StringId, Vec<StringId>)> = (0..self.store.len())
            .map(StringId::from_index)
            .filter(|&id| self.class_size(id) > 1)
            .map(|id| (id, self.replacements(id)))
            .filter(|(_, targets)| !targets.is_empty())
            .collect();
        let mut merges = 0;

        for (i, (left, left_targets)) in sources.iter().enumerate() {
            for (right, right_targets) in &sources[i..] {
                if !budget.tick() {
                    return merges;
                }

                let mut unchecked = Vec::new();
                for &a in left_targets {
                    for &b in right_targets {
                        if self.overlapped.insert([*left, a, *right, b]) {
                            unchecked.push((a, b));
                        }
                    }
                }
                if unchecked.is_empty() {
                    continue;
                }

                for overlap in overlaps(self.store.get(*left), self.store.get(*right)) {
                    for &(a, b) in &unchecked {
                        let x = overlap.rewrite(&overlap.left, self.store.get(a));
                        let y = overlap.rewrite(&overlap.right, self.store.get(b));
                        if x == y {
                            continue;
                        }
                        if !self.config.admits(x.len()) || !self.config.admits(y.len()) {
                            self.discarded += 1;
                            continue;
                        }
                        let (x, y) = (self.intern(&x), self.intern(&y));
                        if self.merge(x, y, budget) {
                            merges += 1;
                        }
                    }
                }
            }
        }
        merges
    }

    fn collapse_all(&mut self, budget: &mut Budget) {
        for index in 0..self.orderings.len() {
            if budget.is_exhausted() {
                return;
            }
            self.collapse_with_budget(OrderingId(index), budget);
        }
    }

    /// Retires every rewrite source that contains another rewrite source
    /// under `ordering`. Retired members stay in their class but no longer
    /// rewrite.
    ///
    /// Returns the number of members retired.
    pub fn collapse(&mut self, ordering: OrderingId) -> usize {
        self.collapse_with_budget(ordering, &mut Budget::unlimited())
    }

    /// Like [`collapse`](Self::collapse), but stops once `budget` is
    /// exhausted. Members not reached yet keep their flags.
    pub fn collapse_with_budget(&mut self, ordering: OrderingId, budget: &mut Budget) -> usize {
        let mut retired = 0;
        for index in 0..self.store.len() {
            let member = StringId::from_index(index);
            let slot = &self.orderings[ordering.index()];
            if !slot.is_source(member) {
                continue;
            }
            if !budget.tick() {
                return retired;
            }

            // `member` itself is registered too; skipping it is the same as
            // unregistering it for the search.
            let redundant = self
                .matcher
                .first_match(self.store.get(member), |&found, _| {
                    found != member && slot.is_source(found)
                })
                .is_some();
            if redundant {
                trace!(member = %render(self.store.get(member)), ordering = ordering.index(), "retired");
                self.orderings[ordering.index()].retired[member.index()] = true;
                retired += 1;
            }
        }
        retired
    }

    /// Unions the classes of `a` and `b`. Returns false if they already
    /// shared a class.
    fn merge(&mut self, a: StringId, b: StringId, budget: &mut Budget) -> bool {
        let (class_a, class_b) = (self.class_of[a.index()], self.class_of[b.index()]);
        if class_a == class_b {
            return false;
        }

        let (keep, absorb) = if self.class_len[class_a.index()] >= self.class_len[class_b.index()] {
            (class_a, class_b)
        } else {
            (class_b, class_a)
        };
        let kept: Vec<StringId> = self.members(keep).collect();
        let absorbed: Vec<StringId> = self.members(absorb).collect();

        // Elites of either side can only lose against elites of the other.
        for slot in &mut self.orderings {
            let kept_elite: Vec<StringId> = kept
                .iter()
                .copied()
                .filter(|id| slot.elite[id.index()])
                .collect();
            let absorbed_elite: Vec<StringId> = absorbed
                .iter()
                .copied()
                .filter(|id| slot.elite[id.index()])
                .collect();

            for &x in &kept_elite {
                for &y in &absorbed_elite {
                    let (sx, sy) = (self.store.get(x), self.store.get(y));
                    if slot.ordering.prefers(sx, sy, budget) {
                        slot.elite[y.index()] = false;
                    } else if slot.ordering.prefers(sy, sx, budget) {
                        slot.elite[x.index()] = false;
                    }
                }
            }
        }

        for &member in &absorbed {
            self.class_of[member.index()] = keep;
        }
        let total = kept.len() + absorbed.len();
        self.class_len[keep.index()] = total;
        self.next.swap(keep.index(), absorb.index());
        assert_eq!(
            self.members(keep).take(total + 1).count(),
            total,
            "class list is not circular after merge"
        );

        // Singletons become rewrite candidates once they have company.
        for (single, len) in [(absorb, absorbed.len()), (keep, kept.len())] {
            let text = self.store.get(single);
            if len == 1 && !text.is_empty() {
                self.matcher.register(text, single);
            }
        }

        trace!(
            a = %render(self.store.get(a)),
            b = %render(self.store.get(b)),
            size = total,
            "merged"
        );
        self.clean = false;
        true
    }

    /// Elite members `source` can be rewritten to, over every ordering under
    /// which `source` is a live rewrite source. Sorted and deduplicated.
    fn replacements(&self, source: StringId) -> Vec<StringId> {
        let mut out = Vec::new();
        for slot in &self.orderings {
            if !slot.is_source(source) {
                continue;
            }
            out.extend(
                self.members(source)
                    .filter(|&member| member != source && slot.elite[member.index()]),
            );
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Rewrites `s` with the rewrite sources of `ordering` until none
    /// applies. The empty string is never rewritten.
    ///
    /// # Panics
    ///
    /// Panics if `ordering` was not issued by this engine.
    pub fn reduce(&self, s: &[T], ordering: OrderingId) -> Reduction<T> {
        self.reduce_with_budget(s, ordering, &mut Budget::unlimited())
    }

    /// Like [`reduce`](Self::reduce), but stops once `budget` is exhausted.
    pub fn reduce_with_budget(&self, s: &[T], ordering: OrderingId, budget: &mut Budget) -> Reduction<T> {
        let slot = &self.orderings[ordering.index()];
        let mut current = s.to_vec();
        let mut changed = false;

        while budget.tick() {
            let Some(found) = self
                .matcher
                .first_match(&current, |&source, _| slot.is_source(source))
            else {
                break;
            };
            let Some(target) = self.elite_of(*found.payload, ordering) else {
                break;
            };
            current = splice(&current, found.range, self.store.get(target));
            changed = true;
        }

        Reduction {
            normal_form: current,
            changed,
        }
    }

    /// The rewriting system `ordering` induces: every live rewrite source
    /// mapped to the elite of its class.
    pub fn rules(&self, ordering: OrderingId) -> Vec<Rule> {
        let slot = &self.orderings[ordering.index()];
        (0..self.store.len())
            .map(StringId::from_index)
            .filter(|&id| self.class_size(id) > 1 && slot.is_source(id))
            .filter_map(|id| Some(Rule::new(id, self.elite_of(id, ordering)?)))
            .collect()
    }

    /// The elite of `id`'s class with the smallest id.
    pub fn elite_of(&self, id: StringId, ordering: OrderingId) -> Option<StringId> {
        let slot = &self.orderings[ordering.index()];
        self.members(id).filter(|m| slot.elite[m.index()]).min()
    }

    /// Every class with more than one member, members in id order.
    pub fn classes(&self) -> Vec<Vec<StringId>> {
        (0..self.store.len())
            .map(StringId::from_index)
            .filter(|&id| self.class_of[id.index()] == id && self.class_len[id.index()] > 1)
            .map(|id| {
                let mut members: Vec<StringId> = self.members(id).collect();
                members.sort_unstable();
                members
            })
            .collect()
    }

    /// Iterates over the class of `id`, starting at `id`.
    pub fn members(&self, id: StringId) -> ClassMembers<'_> {
        ClassMembers {
            next: &self.next,
            start: id,
            current: Some(id),
        }
    }

    /// Representative of the class holding `s`, if `s` was interned.
    pub fn class_of(&self, s: &[T]) -> Option<StringId> {
        let id = self.store.find(s)?;
        Some(self.class_of[id.index()])
    }

    /// Returns true if `a` and `b` are known to be equal.
    pub fn same_class(&self, a: &[T], b: &[T]) -> bool {
        a == b
            || matches!(
                (self.class_of(a), self.class_of(b)),
                (Some(x), Some(y)) if x == y
            )
    }

    pub fn is_elite(&self, id: StringId, ordering: OrderingId) -> bool {
        self.orderings[ordering.index()].elite[id.index()]
    }

    pub fn is_retired(&self, id: StringId, ordering: OrderingId) -> bool {
        self.orderings[ordering.index()].retired[id.index()]
    }

    /// Returns true if nothing changed since the last saturated `expand`.
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    pub fn ordering_count(&self) -> usize {
        self.orderings.len()
    }

    pub fn ordering_name(&self, ordering: OrderingId) -> &str {
        self.orderings[ordering.index()].ordering.name()
    }

    /// Looks up `s` without interning it.
    pub fn find(&self, s: &[T]) -> Option<StringId> {
        self.store.find(s)
    }

    /// Symbols of an interned string.
    pub fn string(&self, id: StringId) -> &[T] {
        self.store.get(id)
    }

    pub fn store(&self) -> &StringStore<T> {
        &self.store
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn class_size(&self, id: StringId) -> usize {
        self.class_len[self.class_of[id.index()].index()]
    }

    fn intern(&mut self, s: &[T]) -> StringId {
        let id = self.store.get_or_create(s);
        self.sync();
        id
    }

    /// Gives every string the store holds beyond the class arrays a
    /// singleton class, elite under every ordering.
    fn sync(&mut self) {
        let population = self.store.len();
        for index in self.next.len()..population {
            let id = StringId::from_index(index);
            self.next.push(id);
            self.class_of.push(id);
            self.class_len.push(1);
        }
        for slot in &mut self.orderings {
            slot.elite.resize(population, true);
            slot.retired.resize(population, false);
        }
    }
}

impl<T: Symbol> Default for EquivalenceCompletion<T> {
    fn default() -> Self {
        Self::new()
    }
}
