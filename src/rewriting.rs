//! Rule/identity-set completion.
//!
//! The engine keeps a set of oriented rules and a set of identities that could
//! not be oriented yet, and runs the classic completion phases over them until
//! the state stops changing.

use crate::budget::Budget;
use crate::config::{CompletionConfig, DeduceStrategy};
use crate::error::Result;
use crate::fingerprint::{Fingerprint, StateHistory};
use crate::matcher::PatternMatcher;
use crate::ordering::{ShortLex, StringOrdering};
use crate::overlap::{overlaps, splice};
use crate::rule::{Identity, Reduction, Rule};
use crate::string_store::{StringId, StringStore};
use crate::symbol::{render, Symbol};
use std::collections::BTreeSet;
use tracing::{debug, info, trace};

/// How a call to [`KnuthBendix::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The state stopped changing and every identity became a rule. The
    /// rules are a complete rewriting system for the inputs.
    Confluent,
    /// The state stopped changing but some identities could not be oriented.
    Stalled { unresolved: usize },
    /// The state stopped changing, but the last cycle dropped critical pairs
    /// whose normal forms exceed the length bound. The rules may not be
    /// confluent.
    Truncated { discarded: usize },
    /// `max_cycles` cycles ran without the state settling.
    CycleLimit,
    /// The budget ran out.
    Cancelled,
}

impl CompletionOutcome {
    /// Returns true if the run produced a complete rewriting system.
    pub fn is_success(self) -> bool {
        matches!(self, CompletionOutcome::Confluent)
    }
}

/// Knuth-Bendix completion over a set of rules and identities.
///
/// Each cycle re-adds the caller's identities and then applies, in order:
/// delete, compose, simplify, orient, collapse and deduce. A fingerprint of the
/// resulting state is recorded; seeing the same fingerprint twice ends the run.
///
/// ```
/// use knuth_bendix_rs::{CompletionOutcome, KnuthBendix};
///
/// let mut kb: KnuthBendix<char> = KnuthBendix::new();
/// kb.add_identity(&['b', 'a'], &['a', 'b']).unwrap();
/// assert_eq!(kb.run(10), CompletionOutcome::Confluent);
/// assert_eq!(kb.reduce(&['b', 'a', 'b']).normal_form, vec!['a', 'b', 'b']);
/// ```
pub struct KnuthBendix<T> {
    store: StringStore<T>,
    ordering: Box<dyn StringOrdering<T>>,
    config: CompletionConfig,

    /// Identities supplied by the caller, re-added every cycle
    inputs: BTreeSet<Identity>,

    /// Identities not yet oriented
    identities: BTreeSet<Identity>,

    rules: BTreeSet<Rule>,

    /// Rule left-hand sides, each mapped to every rule sharing that lhs
    matcher: PatternMatcher<T, BTreeSet<Rule>>,

    history: StateHistory,

    /// Critical pairs dropped by the length bound in the latest cycle
    discarded: usize,

    /// Cycles run over the lifetime of the engine
    cycles: usize,
}

impl<T: Symbol> KnuthBendix<T> {
    /// Creates an engine ordering strings by [`ShortLex`].
    pub fn new() -> Self {
        Self::with_ordering(ShortLex)
    }

    /// Creates an engine that orients identities with `ordering`.
    pub fn with_ordering<O>(ordering: O) -> Self
    where
        O: StringOrdering<T> + 'static,
    {
        Self {
            store: StringStore::new(),
            ordering: Box::new(ordering),
            config: CompletionConfig::default(),
            inputs: BTreeSet::new(),
            identities: BTreeSet::new(),
            rules: BTreeSet::new(),
            matcher: PatternMatcher::new(),
            history: StateHistory::default(),
            discarded: 0,
            cycles: 0,
        }
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: CompletionConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Interns into `store` instead of a fresh store, so ids are shared with
    /// an earlier engine.
    ///
    /// # Panics
    ///
    /// Panics if identities were already added.
    pub fn with_store(mut self, store: StringStore<T>) -> Self {
        assert!(
            self.inputs.is_empty() && self.rules.is_empty() && self.identities.is_empty(),
            "store can only be replaced before identities are added"
        );
        self.store = store;
        self
    }

    /// Consumes the engine and returns its string store.
    pub fn into_store(self) -> StringStore<T> {
        self.store
    }

    /// Adds the identity `a = b`.
    ///
    /// Returns `Ok(false)` if the identity is trivial or was already added.
    /// Strings longer than the configured maximum are rejected.
    pub fn add_identity(&mut self, a: &[T], b: &[T]) -> Result<bool> {
        self.config.check_input(a.len())?;
        self.config.check_input(b.len())?;

        let a = self.store.get_or_create(a);
        let b = self.store.get_or_create(b);
        if a == b {
            return Ok(false);
        }

        let identity = self.normalize(a, b, &mut Budget::unlimited());
        let added = self.inputs.insert(identity);
        if added {
            trace!(identity = %self.describe(identity.as_pair(), "="), "input identity");
            // A new input changes every later state.
            self.history.clear();
        }
        Ok(added)
    }

    /// Runs at most `max_cycles` completion cycles.
    pub fn run(&mut self, max_cycles: usize) -> CompletionOutcome {
        self.run_with_budget(max_cycles, &mut Budget::unlimited())
    }

    /// Runs until the configured cycle limit.
    pub fn complete(&mut self) -> CompletionOutcome {
        self.run(self.config.max_cycles)
    }

    /// Runs at most `max_cycles` cycles, stopping early once `budget` is
    /// exhausted. A cancelled cycle leaves every rule and identity it touched
    /// in a consistent state.
    pub fn run_with_budget(&mut self, max_cycles: usize, budget: &mut Budget) -> CompletionOutcome {
        let outcome = self.drive(max_cycles, budget);
        info!(
            ?outcome,
            ordering = self.ordering.name(),
            cycles = self.cycles,
            rules = self.rules.len(),
            identities = self.identities.len(),
            "completion finished"
        );
        outcome
    }

    fn drive(&mut self, max_cycles: usize, budget: &mut Budget) -> CompletionOutcome {
        for _ in 0..max_cycles {
            if budget.is_exhausted() {
                return CompletionOutcome::Cancelled;
            }

            let fresh = self.cycle_once(budget);
            if budget.is_exhausted() {
                return CompletionOutcome::Cancelled;
            }
            if !fresh {
                return if self.discarded > 0 {
                    CompletionOutcome::Truncated {
                        discarded: self.discarded,
                    }
                } else if self.identities.is_empty() {
                    CompletionOutcome::Confluent
                } else {
                    CompletionOutcome::Stalled {
                        unresolved: self.identities.len(),
                    }
                };
            }
        }
        CompletionOutcome::CycleLimit
    }

    /// Runs every phase once. Returns false if the resulting state was seen
    /// before.
    fn cycle_once(&mut self, budget: &mut Budget) -> bool {
        self.cycles += 1;
        self.identities.extend(self.inputs.iter().copied());

        self.delete();
        self.compose(budget);
        self.simplify(budget);
        self.orient(budget);
        self.collapse(budget);
        let deduced = self.deduce(budget);

        let fingerprint = Fingerprint::of_sections(
            self.rules.iter().map(|rule| rule.as_pair()),
            self.identities.iter().map(|identity| identity.as_pair()),
        );
        let fresh = self.history.record(fingerprint);
        debug!(
            cycle = self.cycles,
            rules = self.rules.len(),
            identities = self.identities.len(),
            deduced,
            discarded = self.discarded,
            strings = self.store.len(),
            states = self.history.len(),
            fresh,
            "completion cycle"
        );
        fresh
    }

    /// Drops identities whose sides coincide.
    fn delete(&mut self) {
        self.identities.retain(|identity| !identity.is_trivial());
    }

    /// Rewrites every rule's rhs to its normal form.
    fn compose(&mut self, budget: &mut Budget) {
        let snapshot: Vec<Rule> = self.rules.iter().copied().collect();
        for rule in snapshot {
            if budget.is_exhausted() {
                return;
            }
            if !self.rules.contains(&rule) {
                continue;
            }

            let reduction = self.rewrite(self.store.get(rule.rhs), budget);
            if !reduction.changed {
                continue;
            }
            let Some(rhs) = self.intern(&reduction.normal_form) else {
                continue;
            };
            assert_ne!(rhs, rule.rhs, "compose must change the rhs it rewrote");

            self.detach(rule);
            self.rules.remove(&rule);
            let composed = Rule::new(rule.lhs, rhs);
            trace!(rule = %self.describe(composed.as_pair(), "->"), "composed");
            if self.rules.insert(composed) {
                self.attach(composed);
            }
        }
    }

    /// Rewrites both sides of every identity, dropping those that become
    /// trivial.
    fn simplify(&mut self, budget: &mut Budget) {
        let snapshot: Vec<Identity> = self.identities.iter().copied().collect();
        for identity in snapshot {
            if budget.is_exhausted() {
                return;
            }

            let heavier = self.rewrite(self.store.get(identity.heavier), budget);
            let lighter = self.rewrite(self.store.get(identity.lighter), budget);
            if !heavier.changed && !lighter.changed {
                continue;
            }
            // Keep the identity as is when a rewritten side is over the bound.
            let (Some(a), Some(b)) = (
                self.intern(&heavier.normal_form),
                self.intern(&lighter.normal_form),
            ) else {
                continue;
            };

            self.identities.remove(&identity);
            if a == b {
                continue;
            }
            let simplified = self.normalize(a, b, budget);
            assert_ne!(simplified, identity, "simplify must change the identity");
            trace!(identity = %self.describe(simplified.as_pair(), "="), "simplified");
            self.identities.insert(simplified);
        }
    }

    /// Turns every identity the ordering can decide into a rule.
    fn orient(&mut self, budget: &mut Budget) {
        let snapshot: Vec<Identity> = self.identities.iter().copied().collect();
        for identity in snapshot {
            if budget.is_exhausted() {
                return;
            }

            let heavier = self.store.get(identity.heavier);
            let lighter = self.store.get(identity.lighter);
            let rule = if self.ordering.prefers(lighter, heavier, budget) {
                Rule::new(identity.heavier, identity.lighter)
            } else if self.ordering.prefers(heavier, lighter, budget) {
                Rule::new(identity.lighter, identity.heavier)
            } else {
                continue;
            };
            // An empty lhs would match everywhere.
            if self.store.get(rule.lhs).is_empty() {
                continue;
            }

            self.identities.remove(&identity);
            trace!(rule = %self.describe(rule.as_pair(), "->"), "oriented");
            if self.rules.insert(rule) {
                self.attach(rule);
            }
        }
    }

    /// Replaces rules whose lhs is reducible by the other rules with an
    /// identity.
    fn collapse(&mut self, budget: &mut Budget) {
        let snapshot: Vec<Rule> = self.rules.iter().copied().collect();
        for rule in snapshot {
            if budget.is_exhausted() {
                return;
            }
            if !self.rules.contains(&rule) {
                continue;
            }

            self.detach(rule);
            let reduction = self.rewrite(self.store.get(rule.lhs), budget);
            if reduction.changed {
                if let Some(reduced) = self.intern(&reduction.normal_form) {
                    self.rules.remove(&rule);
                    trace!(rule = %self.describe(rule.as_pair(), "->"), "collapsed");
                    if reduced != rule.rhs {
                        let identity = self.normalize(reduced, rule.rhs, budget);
                        self.identities.insert(identity);
                    }
                    continue;
                }
            }
            self.attach(rule);
        }
    }

    /// Registers the critical pairs of the current rules as identities.
    /// Pairs with a normal form over the length bound are counted in
    /// `discarded` instead.
    ///
    /// Returns the number of new identities.
    fn deduce(&mut self, budget: &mut Budget) -> usize {
        let rules: Vec<Rule> = self.rules.iter().copied().collect();
        let mut found = 0;
        self.discarded = 0;

        for (i, &first) in rules.iter().enumerate() {
            for &second in &rules[i..] {
                if !budget.tick() {
                    return found;
                }

                let candidates = overlaps(self.store.get(first.lhs), self.store.get(second.lhs));
                for overlap in candidates {
                    let left = overlap.rewrite(&overlap.left, self.store.get(first.rhs));
                    let right = overlap.rewrite(&overlap.right, self.store.get(second.rhs));
                    let (Some(a), Some(b)) = (
                        self.reduce_and_intern(&left, budget),
                        self.reduce_and_intern(&right, budget),
                    ) else {
                        self.discarded += 1;
                        continue;
                    };
                    if a == b {
                        continue;
                    }

                    let identity = self.normalize(a, b, budget);
                    if self.identities.insert(identity) {
                        trace!(identity = %self.describe(identity.as_pair(), "="), "critical pair");
                        found += 1;
                        if self.config.deduce == DeduceStrategy::FirstNew {
                            return found;
                        }
                    }
                }
            }
        }
        found
    }

    /// Rewrites `s` to normal form with the current rules.
    pub fn reduce(&self, s: &[T]) -> Reduction<T> {
        self.rewrite(s, &mut Budget::unlimited())
    }

    /// Like [`reduce`](Self::reduce), but stops rewriting once `budget` is
    /// exhausted. The partial result is still equivalent to `s`.
    pub fn reduce_with_budget(&self, s: &[T], budget: &mut Budget) -> Reduction<T> {
        self.rewrite(s, budget)
    }

    /// Returns true if `a` and `b` have the same normal form.
    ///
    /// Only decides equality once a run ended [`Confluent`](CompletionOutcome::Confluent).
    pub fn equivalent(&self, a: &[T], b: &[T]) -> bool {
        self.reduce(a).normal_form == self.reduce(b).normal_form
    }

    fn rewrite(&self, s: &[T], budget: &mut Budget) -> Reduction<T> {
        let mut current = s.to_vec();
        let mut changed = false;

        while budget.tick() {
            let Some(found) = self.matcher.first_match(&current, |rules, _| !rules.is_empty()) else {
                break;
            };
            let Some(rule) = found.payload.first() else {
                break;
            };
            current = splice(&current, found.range, self.store.get(rule.rhs));
            changed = true;
        }

        Reduction {
            normal_form: current,
            changed,
        }
    }

    fn reduce_and_intern(&mut self, s: &[T], budget: &mut Budget) -> Option<StringId> {
        let reduction = self.rewrite(s, budget);
        self.intern(&reduction.normal_form)
    }

    /// Interns a derived string, or returns `None` if it is over the length
    /// bound.
    fn intern(&mut self, s: &[T]) -> Option<StringId> {
        self.config
            .admits(s.len())
            .then(|| self.store.get_or_create(s))
    }

    /// Orders the pair so the side the ordering does not prefer comes first.
    /// Ties go to the larger id.
    fn normalize(&self, a: StringId, b: StringId, budget: &mut Budget) -> Identity {
        let (sa, sb) = (self.store.get(a), self.store.get(b));
        let (heavier, lighter) = if self.ordering.prefers(sa, sb, budget) {
            (b, a)
        } else if self.ordering.prefers(sb, sa, budget) {
            (a, b)
        } else {
            (a.max(b), a.min(b))
        };
        Identity { heavier, lighter }
    }

    fn attach(&mut self, rule: Rule) {
        self.matcher
            .get_or_create(self.store.get(rule.lhs))
            .insert(rule);
    }

    fn detach(&mut self, rule: Rule) {
        let lhs = self.store.get(rule.lhs);
        let rules = self
            .matcher
            .payload_mut(lhs)
            .expect("live rule must be registered in the matcher");
        assert!(rules.remove(&rule), "matcher payload lost a live rule");
        if rules.is_empty() {
            self.matcher.unregister(lhs);
        }
    }

    fn describe(&self, (a, b): (StringId, StringId), arrow: &str) -> String {
        format!(
            "{} {arrow} {}",
            render(self.store.get(a)),
            render(self.store.get(b))
        )
    }

    /// Current rules in id order.
    pub fn rules(&self) -> impl Iterator<Item = Rule> + '_ {
        self.rules.iter().copied()
    }

    /// Identities that have not been oriented.
    pub fn identities(&self) -> impl Iterator<Item = Identity> + '_ {
        self.identities.iter().copied()
    }

    /// Identities added with [`add_identity`](Self::add_identity).
    pub fn inputs(&self) -> impl Iterator<Item = Identity> + '_ {
        self.inputs.iter().copied()
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

    /// Total number of cycles run.
    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

impl<T: Symbol> Default for KnuthBendix<T> {
    fn default() -> Self {
        Self::new()
    }
}
