//! Attempt state machine for push and pull sessions
//!
//! `Pending -> Attempting -> {Succeeded | RetryableFailure | TerminalFailure}`,
//! with `RetryableFailure -> Attempting` while attempts remain. A session
//! cancelled before or between attempts goes straight to `TerminalFailure`.

use crate::error::SyncError;

/// State of one push/pull session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptState {
    Pending,
    Attempting,
    Succeeded,
    RetryableFailure,
    TerminalFailure,
}

impl AttemptState {
    /// No transitions leave this state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::TerminalFailure)
    }
}

/// Validates a state transition
///
/// # Errors
/// Returns `SyncError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: AttemptState, to: AttemptState) -> Result<(), SyncError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(SyncError::IllegalTransition { from, to })
    }
}

/// States reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: AttemptState) -> Vec<AttemptState> {
    use AttemptState::{Attempting, Pending, RetryableFailure, Succeeded, TerminalFailure};
    match from {
        Pending => vec![Attempting, TerminalFailure],
        Attempting => vec![Succeeded, RetryableFailure, TerminalFailure],
        RetryableFailure => vec![Attempting, TerminalFailure],
        Succeeded | TerminalFailure => vec![],
    }
}

/// Tracks attempts against a bound of `max_retries + 1`
#[derive(Debug, Clone)]
pub struct AttemptTracker {
    state: AttemptState,
    attempt: u32,
    max_attempts: u32,
}

impl AttemptTracker {
    /// Tracker allowing `max_retries` retries after the first attempt
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: AttemptState::Pending,
            attempt: 0,
            max_attempts: max_retries.saturating_add(1),
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Number of attempts started so far
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Total attempts allowed
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Start the next attempt
    ///
    /// # Errors
    /// Returns `SyncError::IllegalTransition` from a terminal state
    pub fn begin(&mut self) -> Result<u32, SyncError> {
        self.transition(AttemptState::Attempting)?;
        self.attempt += 1;
        Ok(self.attempt)
    }

    /// Current attempt succeeded
    ///
    /// # Errors
    /// Returns `SyncError::IllegalTransition` unless an attempt is running
    pub fn succeed(&mut self) -> Result<(), SyncError> {
        self.transition(AttemptState::Succeeded)
    }

    /// Current attempt failed
    ///
    /// Moves to `RetryableFailure` when the failure is transient and attempts
    /// remain, otherwise to `TerminalFailure`. Returns the new state.
    ///
    /// # Errors
    /// Returns `SyncError::IllegalTransition` unless an attempt is running
    pub fn fail(&mut self, transient: bool) -> Result<AttemptState, SyncError> {
        let next = if transient && self.attempt < self.max_attempts {
            AttemptState::RetryableFailure
        } else {
            AttemptState::TerminalFailure
        };
        self.transition(next)?;
        Ok(next)
    }

    /// Abandon the session (cancellation)
    ///
    /// # Errors
    /// Returns `SyncError::IllegalTransition` from a terminal state or while
    /// an attempt is running
    pub fn abort(&mut self) -> Result<(), SyncError> {
        if self.state == AttemptState::Attempting {
            return Err(SyncError::IllegalTransition {
                from: self.state,
                to: AttemptState::TerminalFailure,
            });
        }
        self.transition(AttemptState::TerminalFailure)
    }

    fn transition(&mut self, to: AttemptState) -> Result<(), SyncError> {
        validate_transition(self.state, to)?;
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_state() -> impl Strategy<Value = AttemptState> {
        prop_oneof![
            Just(AttemptState::Pending),
            Just(AttemptState::Attempting),
            Just(AttemptState::Succeeded),
            Just(AttemptState::RetryableFailure),
            Just(AttemptState::TerminalFailure),
        ]
    }

    #[test]
    fn happy_path() {
        let mut tracker = AttemptTracker::new(3);
        assert_eq!(tracker.begin().unwrap(), 1);
        tracker.succeed().unwrap();
        assert_eq!(tracker.state(), AttemptState::Succeeded);
        assert!(tracker.begin().is_err());
    }

    #[test]
    fn retries_are_bounded() {
        let mut tracker = AttemptTracker::new(2);
        for expected in 1..=2 {
            assert_eq!(tracker.begin().unwrap(), expected);
            assert_eq!(tracker.fail(true).unwrap(), AttemptState::RetryableFailure);
        }
        assert_eq!(tracker.begin().unwrap(), 3);
        assert_eq!(tracker.fail(true).unwrap(), AttemptState::TerminalFailure);
        assert_eq!(tracker.attempt(), tracker.max_attempts());
    }

    #[test]
    fn terminal_failure_is_not_retried() {
        let mut tracker = AttemptTracker::new(5);
        tracker.begin().unwrap();
        assert_eq!(tracker.fail(false).unwrap(), AttemptState::TerminalFailure);
    }

    #[test]
    fn zero_retries_means_one_attempt() {
        let mut tracker = AttemptTracker::new(0);
        tracker.begin().unwrap();
        assert_eq!(tracker.fail(true).unwrap(), AttemptState::TerminalFailure);
    }

    #[test]
    fn abort_between_attempts() {
        let mut tracker = AttemptTracker::new(1);
        tracker.abort().unwrap();
        assert!(tracker.state().is_terminal());

        let mut tracker = AttemptTracker::new(1);
        tracker.begin().unwrap();
        assert!(tracker.abort().is_err());
        tracker.fail(true).unwrap();
        tracker.abort().unwrap();
    }

    proptest! {
        #[test]
        fn terminal_states_have_no_exits(from in any_state(), to in any_state()) {
            if from.is_terminal() {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }

        #[test]
        fn retryable_failure_never_ends_a_session(
            failures in prop::collection::vec(any::<bool>(), 0..10),
            max_retries in 0u32..6,
        ) {
            let mut tracker = AttemptTracker::new(max_retries);
            for transient in failures {
                if tracker.state().is_terminal() {
                    break;
                }
                tracker.begin().unwrap();
                tracker.fail(transient).unwrap();
            }
            prop_assert!(tracker.attempt() <= tracker.max_attempts());
            if tracker.state() == AttemptState::RetryableFailure {
                prop_assert!(tracker.attempt() < tracker.max_attempts());
                prop_assert!(tracker.begin().is_ok());
            }
        }
    }
}
