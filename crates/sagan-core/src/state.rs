//! Mission state machine
//!
//! ```text
//! Start -> Detecting -> Clean -----------------------------> Done
//!                    -> Triggered -> Remediating -> Verifying -> Passed -> Done
//!                                                             -> Failed -> Done
//! ```

use crate::error::MissionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a running mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionState {
    /// Accepted, nothing done yet
    Start,
    /// Running the detector over every file
    Detecting,
    /// Nothing detected
    Clean,
    /// Labels detected, check failed and annotated
    Triggered,
    /// Applying remediations
    Remediating,
    /// Re-running the detector on written-back files
    Verifying,
    /// Verification found nothing
    Passed,
    /// Verification still found labels
    Failed,
    /// Result returned
    Done,
}

impl MissionState {
    /// Check if no transition leaves this state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Detecting => "detecting",
            Self::Clean => "clean",
            Self::Triggered => "triggered",
            Self::Remediating => "remediating",
            Self::Verifying => "verifying",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// States reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: MissionState) -> Vec<MissionState> {
    use MissionState::{Clean, Detecting, Done, Failed, Passed, Remediating, Start, Triggered, Verifying};
    match from {
        Start => vec![Detecting],
        Detecting => vec![Clean, Triggered],
        Clean | Passed | Failed => vec![Done],
        Triggered => vec![Remediating],
        Remediating => vec![Verifying],
        Verifying => vec![Passed, Failed],
        Done => vec![],
    }
}

/// Validate a single transition
///
/// # Errors
/// Returns `MissionError::IllegalTransition` if `to` is not reachable from
/// `from` in one step.
pub fn validate_transition(from: MissionState, to: MissionState) -> Result<(), MissionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(MissionError::IllegalTransition { from, to })
    }
}
