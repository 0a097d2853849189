use crate::budget::Budget;
use crate::config::CompletionConfig;
use crate::equivalence::EquivalenceCompletion;
use crate::ordering::{OrderingId, PreferredSymbols};
use crate::rewriting::{CompletionOutcome, KnuthBendix};
use proptest::prelude::*;
use std::collections::BTreeSet;

const MAX_LEN: usize = 6;

fn word(alphabet: &'static str, max_len: usize) -> impl Strategy<Value = Vec<char>> {
    let symbols: Vec<char> = alphabet.chars().collect();
    prop::collection::vec(prop::sample::select(symbols), 0..=max_len)
}

fn identities() -> impl Strategy<Value = Vec<(Vec<char>, Vec<char>)>> {
    prop::collection::vec((word("ab", 4), word("ab", 4)), 1..=3)
}

fn bounded_engine(identities: &[(Vec<char>, Vec<char>)]) -> KnuthBendix<char> {
    let config = CompletionConfig::default().with_max_string_length(MAX_LEN);
    let mut kb: KnuthBendix<char> = KnuthBendix::new().with_config(config).unwrap();
    for (a, b) in identities {
        kb.add_identity(a, b).unwrap();
    }
    kb
}

fn monoid() -> Vec<(Vec<char>, Vec<char>)> {
    [
        ("1x", "x"),
        ("1y", "y"),
        ("x1", "x"),
        ("y1", "y"),
        ("xxx", "1"),
        ("yyy", "1"),
        ("xyxyxy", "1"),
    ]
    .iter()
    .map(|(a, b)| (a.chars().collect(), b.chars().collect()))
    .collect()
}

fn as_string(s: &[char]) -> String {
    s.iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property 1: Reduction idempotence
    /// A normal form has nothing left to rewrite.
    #[test]
    fn prop_reduce_idempotent(identities in identities(), w in word("ab", 8)) {
        let mut kb = bounded_engine(&identities);
        kb.run_with_budget(15, &mut Budget::with_steps(50_000));

        let once = kb.reduce(&w);
        let twice = kb.reduce(&once.normal_form);
        prop_assert!(!twice.changed);
        prop_assert_eq!(twice.normal_form, once.normal_form);
    }

    /// Property 2: Inputs are decided
    /// After a confluent run both sides of every input share a normal form.
    #[test]
    fn prop_inputs_joinable_when_confluent(identities in identities()) {
        let mut kb = bounded_engine(&identities);
        let outcome = kb.run_with_budget(15, &mut Budget::with_steps(50_000));

        if outcome == CompletionOutcome::Confluent {
            for (a, b) in &identities {
                prop_assert!(kb.equivalent(a, b), "{} = {}", as_string(a), as_string(b));
            }
        }
    }

    /// Property 3: Termination safety
    /// `run(n)` never runs more than `n` cycles.
    #[test]
    fn prop_run_respects_cycle_limit(identities in identities(), limit in 1usize..6) {
        let mut kb = bounded_engine(&identities);
        let outcome = kb.run(limit);
        prop_assert!(kb.cycles() <= limit);
        if kb.cycles() < limit {
            prop_assert_ne!(outcome, CompletionOutcome::CycleLimit);
        }
    }

    /// Property 4: Length bound
    /// No string longer than the bound is ever interned.
    #[test]
    fn prop_derived_strings_within_bound(identities in identities()) {
        let mut kb = bounded_engine(&identities);
        kb.run_with_budget(15, &mut Budget::with_steps(50_000));
        for (_, s) in kb.store().iter() {
            prop_assert!(s.len() <= MAX_LEN);
        }

        let config = CompletionConfig::default().with_max_string_length(MAX_LEN);
        let mut classes: EquivalenceCompletion<char> =
            EquivalenceCompletion::new().with_config(config).unwrap();
        for (a, b) in &identities {
            classes.add_identity(a, b).unwrap();
        }
        classes.expand(&mut Budget::with_steps(50_000));
        for (_, s) in classes.store().iter() {
            prop_assert!(s.len() <= MAX_LEN);
        }
    }

    /// Property 5: Identity symmetry
    /// Argument order does not change the completed system.
    #[test]
    fn prop_identity_symmetry(identities in identities()) {
        let forward = {
            let mut kb = bounded_engine(&identities);
            let outcome = kb.run(15);
            (outcome, kb)
        };
        let swapped: Vec<_> = identities.iter().map(|(a, b)| (b.clone(), a.clone())).collect();
        let backward = {
            let mut kb = bounded_engine(&swapped);
            let outcome = kb.run(15);
            (outcome, kb)
        };

        if forward.0.is_success() && backward.0.is_success() {
            let rules = |kb: &KnuthBendix<char>| {
                let mut out: Vec<(String, String)> = kb
                    .rules()
                    .map(|rule| (as_string(kb.string(rule.lhs)), as_string(kb.string(rule.rhs))))
                    .collect();
                out.sort();
                out
            };
            prop_assert_eq!(rules(&forward.1), rules(&backward.1));
        }
    }

    /// Property 6: Classes partition the store
    /// Every string is in exactly one class, every input pair shares a
    /// class, and every class keeps at least one elite.
    #[test]
    fn prop_classes_partition_store(identities in identities(), w in word("ab", 8)) {
        let config = CompletionConfig::default().with_max_string_length(MAX_LEN);
        let mut classes: EquivalenceCompletion<char> =
            EquivalenceCompletion::new().with_config(config).unwrap();
        for (a, b) in &identities {
            classes.add_identity(a, b).unwrap();
        }
        classes.expand(&mut Budget::with_steps(50_000));

        for (a, b) in &identities {
            prop_assert!(classes.same_class(a, b));
        }

        let mut seen = vec![0usize; classes.store().len()];
        for class in classes.classes() {
            prop_assert!(class
                .iter()
                .any(|&member| classes.is_elite(member, OrderingId::SHORTLEX)));
            for member in class {
                seen[member.index()] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&count| count <= 1));

        let once = classes.reduce(&w, OrderingId::SHORTLEX);
        let twice = classes.reduce(&once.normal_form, OrderingId::SHORTLEX);
        prop_assert!(!twice.changed);
    }

    /// Property 7: Classes have one normal form
    /// After a saturated expansion every member of a class reduces to the
    /// same string under shortlex.
    #[test]
    fn prop_class_members_share_normal_form(identities in identities()) {
        let config = CompletionConfig::default().with_max_string_length(MAX_LEN);
        let mut classes: EquivalenceCompletion<char> =
            EquivalenceCompletion::new().with_config(config).unwrap();
        for (a, b) in &identities {
            classes.add_identity(a, b).unwrap();
        }
        let report = classes.expand(&mut Budget::with_steps(50_000));
        prop_assume!(report.saturated);

        for class in classes.classes() {
            let normal_forms: BTreeSet<Vec<char>> = class
                .iter()
                .map(|&member| {
                    classes
                        .reduce(classes.string(member), OrderingId::SHORTLEX)
                        .normal_form
                })
                .collect();
            prop_assert_eq!(normal_forms.len(), 1, "{:?}", class);
        }
    }

    /// Property 8: Both engines agree on the monoid
    /// Every word over {x, y, 1} gets the same normal form from either engine,
    /// and normal forms are compatible with concatenation.
    #[test]
    fn prop_monoid_reduces_consistently(u in word("xy1", 8), v in word("xy1", 8)) {
        let mut kb: KnuthBendix<char> = KnuthBendix::new();
        let mut classes: EquivalenceCompletion<char> = EquivalenceCompletion::new();
        for (a, b) in monoid() {
            kb.add_identity(&a, &b).unwrap();
            classes.add_identity(&a, &b).unwrap();
        }
        prop_assert!(kb.run(50).is_success());
        prop_assert!(classes.expand(&mut Budget::unlimited()).saturated);

        let uv = [u.as_slice(), v.as_slice()].concat();
        let normal = kb.reduce(&uv).normal_form;
        prop_assert_eq!(&classes.reduce(&uv, OrderingId::SHORTLEX).normal_form, &normal);

        let parts = [
            kb.reduce(&u).normal_form,
            kb.reduce(&v).normal_form,
        ]
        .concat();
        prop_assert_eq!(kb.reduce(&parts).normal_form, normal);
    }

    /// Property 9: Numeral folding
    /// Preferring 1 turns any numeral string into its digit sum in unary.
    #[test]
    fn prop_numerals_fold_to_digit_sum(w in word("1234589", 6)) {
        let mut kb = KnuthBendix::with_ordering(PreferredSymbols::new(['1']));
        for (a, b) in [
            ("12", "3"),
            ("12", "21"),
            ("5", "32"),
            ("4", "22"),
            ("2", "11"),
            ("54", "9"),
            ("8", "53"),
        ] {
            let a: Vec<char> = a.chars().collect();
            let b: Vec<char> = b.chars().collect();
            kb.add_identity(&a, &b).unwrap();
        }
        prop_assert!(kb.run(20).is_success());

        let sum: usize = w.iter().map(|c| c.to_digit(10).unwrap() as usize).sum();
        prop_assert_eq!(as_string(&kb.reduce(&w).normal_form), "1".repeat(sum));
    }
}
