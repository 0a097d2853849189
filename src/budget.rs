use std::time::{Duration, Instant};

/// How many ticks pass between two deadline checks.
const DEADLINE_POLL_INTERVAL: u64 = 64;

/// Cooperative cancellation token threaded through long-running passes.
///
/// A budget limits the number of steps, the wall-clock time, or both. Passes
/// poll it between atomic mutations and return early once it is exhausted.
#[derive(Debug, Clone)]
pub struct Budget {
    /// Remaining steps, `None` for no step limit
    remaining: Option<u64>,
    deadline: Option<Instant>,
    spent: u64,
    exhausted: bool,
}

impl Budget {
    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self {
            remaining: None,
            deadline: None,
            spent: 0,
            exhausted: false,
        }
    }

    /// A budget allowing `steps` ticks.
    pub fn with_steps(steps: u64) -> Self {
        Self {
            remaining: Some(steps),
            ..Self::unlimited()
        }
    }

    /// A budget that runs out at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::unlimited()
        }
    }

    /// A budget that runs out `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Adds a step limit to an existing budget.
    pub fn and_steps(mut self, steps: u64) -> Self {
        self.remaining = Some(steps);
        self
    }

    /// Consumes one step. Returns false once the budget is exhausted.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.consume(1)
    }

    /// Consumes `steps` steps. Returns false once the budget is exhausted.
    pub fn consume(&mut self, steps: u64) -> bool {
        if self.exhausted {
            return false;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining < steps {
                *remaining = 0;
                self.exhausted = true;
                return false;
            }
            *remaining -= steps;
        }

        let before = self.spent;
        self.spent = self.spent.saturating_add(steps);
        if let Some(deadline) = self.deadline {
            if before / DEADLINE_POLL_INTERVAL != self.spent / DEADLINE_POLL_INTERVAL
                && Instant::now() >= deadline
            {
                self.exhausted = true;
                return false;
            }
        }

        true
    }

    /// Returns true once a tick has failed or [`exhaust`](Self::exhaust) was called.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Marks the budget as spent so every pass holding it stops.
    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }

    /// Steps consumed so far.
    pub fn spent(&self) -> u64 {
        self.spent
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}
