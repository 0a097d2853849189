//! String orderings used to orient identities and pick elite representatives.

use crate::budget::Budget;
use std::fmt;

/// A strict order over strings: `prefers(a, b)` holds when `a` is simpler
/// than `b`.
///
/// Implementations must be irreflexive and transitive. For completion to
/// terminate the order should also be well-founded and compatible with
/// concatenation, as [`ShortLex`] is. The budget is passed through so costly
/// orderings can account for their work.
pub trait StringOrdering<T> {
    /// Returns true if `a` is strictly preferred over `b`.
    fn prefers(&self, a: &[T], b: &[T], budget: &mut Budget) -> bool;

    /// Name used in log output.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Handle to an ordering registered with an
/// [`EquivalenceCompletion`](crate::EquivalenceCompletion).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderingId(pub(crate) usize);

impl OrderingId {
    /// The shortlex ordering every engine registers first.
    pub const SHORTLEX: OrderingId = OrderingId(0);

    /// Registration index of the ordering.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shorter strings first, equal lengths compared symbol by symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortLex;

impl<T: Ord> StringOrdering<T> for ShortLex {
    fn prefers(&self, a: &[T], b: &[T], _budget: &mut Budget) -> bool {
        shortlex_less(a, b)
    }

    fn name(&self) -> &str {
        "shortlex"
    }
}

#[inline]
pub(crate) fn shortlex_less<T: Ord>(a: &[T], b: &[T]) -> bool {
    a.len() < b.len() || (a.len() == b.len() && a < b)
}

/// Ranks strings by how many symbols fall outside a preferred set.
///
/// Fewer non-preferred symbols win, then more preferred symbols, then
/// shortlex. Useful for steering normal forms towards a sub-alphabet.
///
/// Not well-founded: with `a` preferred, `b`, `ab`, `aab`, ... each beat the
/// last. Rewriting under it can grow without end unless a length bound or a
/// [`Budget`] stops it.
#[derive(Debug, Clone)]
pub struct PreferredSymbols<T> {
    preferred: Vec<T>,
}

impl<T: PartialEq> PreferredSymbols<T> {
    pub fn new<I: IntoIterator<Item = T>>(preferred: I) -> Self {
        Self {
            preferred: preferred.into_iter().collect(),
        }
    }

    /// Returns `(preferred, other)` symbol counts of `s`.
    fn census(&self, s: &[T]) -> (usize, usize) {
        let good = s.iter().filter(|symbol| self.preferred.contains(symbol)).count();
        (good, s.len() - good)
    }
}

impl<T: Ord> StringOrdering<T> for PreferredSymbols<T> {
    fn prefers(&self, a: &[T], b: &[T], _budget: &mut Budget) -> bool {
        let (good_a, bad_a) = self.census(a);
        let (good_b, bad_b) = self.census(b);
        if bad_a != bad_b {
            return bad_a < bad_b;
        }
        if good_a != good_b {
            return good_a > good_b;
        }
        shortlex_less(a, b)
    }

    fn name(&self) -> &str {
        "preferred-symbols"
    }
}

/// Adapts a closure into a [`StringOrdering`].
pub struct FnOrdering<F> {
    name: String,
    f: F,
}

/// Wraps `f(a, b) -> bool` ("a is simpler than b") as an ordering.
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnOrdering<F> {
    FnOrdering {
        name: name.into(),
        f,
    }
}

impl<T, F> StringOrdering<T> for FnOrdering<F>
where
    F: Fn(&[T], &[T]) -> bool,
{
    fn prefers(&self, a: &[T], b: &[T], budget: &mut Budget) -> bool {
        budget.tick();
        (self.f)(a, b)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnOrdering<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOrdering").field("name", &self.name).finish()
    }
}

impl<T, O: StringOrdering<T> + ?Sized> StringOrdering<T> for Box<O> {
    fn prefers(&self, a: &[T], b: &[T], budget: &mut Budget) -> bool {
        (**self).prefers(a, b, budget)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
