//! # Knuth-Bendix - String Rewriting Completion
//!
//! Knuth-Bendix completion for string rewriting systems: given equations
//! between strings of symbols, derive a set of directed rules that rewrites
//! equal strings to the same normal form.
//!
//! Two engines are provided:
//! 1. **[`EquivalenceCompletion`]**: merges equivalence classes of interned
//!    strings and keeps one elite representative set per ordering, so a single
//!    expansion serves several orderings at once
//! 2. **[`KnuthBendix`]**: the classic rule/identity formulation cycling
//!    through delete, compose, simplify, orient, collapse and deduce
//!
//! Completion does not terminate in general. Both engines take a [`Budget`]
//! and a [`CompletionConfig`] bounding cycles and string length.
//!
//! ## Example
//!
//! ```
//! use knuth_bendix_rs::{CompletionOutcome, KnuthBendix};
//!
//! // Z3 * Z3 generated by x and y, written with 1 as the identity element
//! let mut kb: KnuthBendix<char> = KnuthBendix::new();
//! for (a, b) in [("1x", "x"), ("x1", "x"), ("1y", "y"), ("y1", "y"), ("xxx", "1"), ("yyy", "1"), ("yx", "xy")] {
//!     let a: Vec<char> = a.chars().collect();
//!     let b: Vec<char> = b.chars().collect();
//!     kb.add_identity(&a, &b).unwrap();
//! }
//!
//! assert_eq!(kb.run(100), CompletionOutcome::Confluent);
//!
//! let word: Vec<char> = "yxyxyx".chars().collect();
//! let normal: String = kb.reduce(&word).normal_form.into_iter().collect();
//! assert_eq!(normal, "1");
//! ```

mod budget;
mod config;
mod equivalence;
mod error;
mod fingerprint;
mod matcher;
mod ordering;
mod overlap;
mod rewriting;
mod rule;
mod string_store;
mod symbol;

#[cfg(test)]
mod tests;

pub use budget::Budget;
pub use config::{CompletionConfig, DeduceStrategy};
pub use equivalence::{ClassMembers, EquivalenceCompletion, ExpandReport};
pub use error::{CompletionError, Result};
pub use fingerprint::Fingerprint;
pub use matcher::{Match, PatternMatcher};
pub use ordering::{from_fn, FnOrdering, OrderingId, PreferredSymbols, ShortLex, StringOrdering};
pub use rewriting::{CompletionOutcome, KnuthBendix};
pub use rule::{Identity, Reduction, Rule};
pub use string_store::{StringId, StringStore};
pub use symbol::Symbol;
