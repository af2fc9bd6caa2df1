//! Run state management
//!
//! Tracks where the controller is in its plan/execute loop and how much of the
//! failure budget has been spent.

/// Reason recorded when the failure budget runs out
pub const MAX_RETRIES_REASON: &str = "Max retries reached";

/// Terminal or running state of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Running,
    Succeeded { reason: String },
    Failed { reason: String },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// State of the controller loop
#[derive(Debug, Clone)]
pub struct RunLoopState {
    pub state: RunState,
    /// Planning cycles started so far
    pub cycle: usize,
    pub consecutive_failures: usize,
    pub max_retries: usize,
}

impl RunLoopState {
    pub fn new(max_retries: usize) -> Self {
        Self {
            state: RunState::Running,
            cycle: 0,
            consecutive_failures: 0,
            max_retries,
        }
    }

    /// Check if another planning cycle may start.
    ///
    /// Exhausting the failure budget moves the run to `Failed`.
    pub fn should_continue(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        if self.consecutive_failures >= self.max_retries {
            self.state = RunState::Failed {
                reason: MAX_RETRIES_REASON.to_string(),
            };
            return false;
        }
        true
    }

    pub fn next_cycle(&mut self) {
        self.cycle += 1;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn succeed(&mut self, reason: impl Into<String>) {
        self.state = RunState::Succeeded {
            reason: reason.into(),
        };
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = RunState::Failed {
            reason: reason.into(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_new() {
        let state = RunLoopState::new(5);
        assert_eq!(state.state, RunState::Running);
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.cycle, 0);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut state = RunLoopState::new(2);
        assert!(state.should_continue());

        state.record_failure();
        assert!(state.should_continue());

        state.record_failure();
        assert!(!state.should_continue());
        assert_eq!(
            state.state,
            RunState::Failed {
                reason: MAX_RETRIES_REASON.to_string()
            }
        );
    }

    #[test]
    fn test_success_resets_failures() {
        let mut state = RunLoopState::new(2);
        state.record_failure();
        state.record_success();
        state.record_failure();
        assert!(state.should_continue());
    }

    #[test]
    fn test_terminal_states_stop_the_loop() {
        let mut state = RunLoopState::new(5);
        state.succeed("Logged in");
        assert!(!state.should_continue());
        assert_eq!(
            state.state,
            RunState::Succeeded {
                reason: "Logged in".into()
            }
        );
    }
}
