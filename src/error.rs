use thiserror::Error;

/// Errors reported to callers of the completion engines.
///
/// Running out of cycles or budget is not an error; it shows up in the
/// outcome of [`run`](crate::KnuthBendix::run) or
/// [`expand`](crate::EquivalenceCompletion::expand).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("string of length {length} exceeds the configured maximum of {max}")]
    StringTooLong { length: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, CompletionError>;
