use crate::error::{CompletionError, Result};

/// How many critical pairs the deduce phase registers per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeduceStrategy {
    /// Stop at the first new critical pair and let the next cycle
    /// simplify and orient it before looking for more.
    #[default]
    FirstNew,
    /// Register every critical pair found in one pass.
    Exhaustive,
}

/// Tuning knobs shared by both completion engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Derived strings longer than this are discarded; caller inputs longer
    /// than this are rejected
    pub max_string_length: Option<usize>,

    /// Cycle limit used by `complete()`
    pub max_cycles: usize,

    pub deduce: DeduceStrategy,
}

impl CompletionConfig {
    pub fn with_max_string_length(mut self, max: usize) -> Self {
        self.max_string_length = Some(max);
        self
    }

    pub fn with_max_cycles(mut self, cycles: usize) -> Self {
        self.max_cycles = cycles;
        self
    }

    pub fn with_deduce(mut self, deduce: DeduceStrategy) -> Self {
        self.deduce = deduce;
        self
    }

    /// Checks the configuration for values no run can work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_string_length == Some(0) {
            return Err(CompletionError::InvalidConfig(
                "max_string_length must be at least 1",
            ));
        }
        if self.max_cycles == 0 {
            return Err(CompletionError::InvalidConfig("max_cycles must be at least 1"));
        }
        Ok(())
    }

    /// Returns true if a string of `length` symbols may be registered.
    #[inline]
    pub(crate) fn admits(&self, length: usize) -> bool {
        self.max_string_length.map_or(true, |max| length <= max)
    }

    /// Rejects caller-supplied strings over the length bound.
    pub(crate) fn check_input(&self, length: usize) -> Result<()> {
        match self.max_string_length {
            Some(max) if length > max => Err(CompletionError::StringTooLong { length, max }),
            _ => Ok(()),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_string_length: None,
            max_cycles: 1000,
            deduce: DeduceStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.max_string_length, None);
        assert_eq!(config.max_cycles, 1000);
        assert_eq!(config.deduce, DeduceStrategy::FirstNew);
        assert!(config.validate().is_ok());
        assert!(config.admits(1_000_000));
    }

    #[test]
    fn test_length_bound() {
        let config = CompletionConfig::default().with_max_string_length(4);
        assert!(config.admits(4));
        assert!(!config.admits(5));
        assert_eq!(config.check_input(4), Ok(()));
        assert_eq!(
            config.check_input(7),
            Err(CompletionError::StringTooLong { length: 7, max: 4 })
        );
    }

    #[test]
    fn test_validate_rejects_zero() {
        let zero_length = CompletionConfig::default().with_max_string_length(0);
        assert!(matches!(
            zero_length.validate(),
            Err(CompletionError::InvalidConfig(_))
        ));

        let zero_cycles = CompletionConfig::default().with_max_cycles(0);
        assert!(zero_cycles.validate().is_err());
    }

    #[test]
    fn test_error_message() {
        let err = CompletionError::StringTooLong { length: 9, max: 8 };
        assert_eq!(
            err.to_string(),
            "string of length 9 exceeds the configured maximum of 8"
        );
    }
}
