use crate::string_store::StringId;
use std::fmt;

/// A directed rewrite `lhs -> rhs`, where `rhs` is simpler than `lhs` under
/// the ordering that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule {
    pub lhs: StringId,
    pub rhs: StringId,
}

impl Rule {
    pub fn new(lhs: StringId, rhs: StringId) -> Self {
        debug_assert_ne!(lhs, rhs, "a rule must rewrite to a different string");
        Self { lhs, rhs }
    }

    pub(crate) fn as_pair(self) -> (StringId, StringId) {
        (self.lhs, self.rhs)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs)
    }
}

/// An unoriented equation between two interned strings.
///
/// Stored normalized: `heavier` is the side the ordering does not prefer, so
/// the same pair of strings always yields the same `Identity` regardless of
/// argument order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    pub heavier: StringId,
    pub lighter: StringId,
}

impl Identity {
    pub(crate) fn as_pair(self) -> (StringId, StringId) {
        (self.heavier, self.lighter)
    }

    /// Returns true if both sides are the same string.
    pub fn is_trivial(self) -> bool {
        self.heavier == self.lighter
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.heavier, self.lighter)
    }
}

/// Result of rewriting a string to normal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction<T> {
    /// The rewritten string
    pub normal_form: Vec<T>,
    /// True if at least one rewrite was applied
    pub changed: bool,
}
