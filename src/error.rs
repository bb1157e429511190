//! Errors reported by step actions and tuning loads
//!
//! There is no I/O in the simulation itself; everything here is either a
//! caller invoking an action at the wrong time or a bad tuning file.

use thiserror::Error;

use crate::sim::Step;

#[derive(Debug, Error)]
pub enum RitualError {
    /// A step-specific action was invoked while another step is active
    #[error("`{action}` belongs to the {expected} step, but the current step is {current}")]
    WrongStep {
        action: &'static str,
        expected: Step,
        current: Step,
    },

    /// A vibe reveal is still running; new selections are rejected until it finishes
    #[error("a vibe selection is already in progress")]
    VibeSelectionPending,

    #[error("no vibe has been selected yet")]
    NoVibeSelected,

    /// Manual continue before the step produced anything to carry forward
    #[error("nothing has been committed in the {0} step yet")]
    NothingToCommit(Step),

    #[error("the cup has not been served yet")]
    NotServed,

    /// The certificate ends the ritual; only back or reset leave it
    #[error("the ritual is already complete")]
    RitualComplete,

    #[error("cannot go back from the {0} step")]
    NoPreviousStep(Step),

    #[error("invalid tuning: {0}")]
    Tuning(String),

    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read tuning: {0}")]
    Io(#[from] std::io::Error),
}

impl RitualError {
    pub(crate) fn wrong_step(action: &'static str, expected: Step, current: Step) -> Self {
        Self::WrongStep {
            action,
            expected,
            current,
        }
    }
}
