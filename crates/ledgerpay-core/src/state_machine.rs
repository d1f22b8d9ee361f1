use thiserror::Error;

/// Phases of one submission attempt. `Confirmed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Validating,
    Resolving,
    Fetching,
    Building,
    Signing,
    Submitting,
    Confirmed,
    Failed,
}

impl SubmitPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmitPhase::Confirmed | SubmitPhase::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    /// Move to the next phase in the fixed forward order.
    Advance,
    /// Submission acknowledged; only legal from `Submitting`.
    Complete,
    /// Any failure; legal from every non-terminal phase.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: SubmitPhase,
    pub to: SubmitPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal submit transition: {from:?} cannot {action:?}")]
pub struct IllegalTransition {
    pub from: SubmitPhase,
    pub action: PhaseAction,
}

/// The workflow drives phases strictly forward; anything else is a bug in
/// the caller and is rejected rather than silently accepted.
pub fn phase_transition(
    from: SubmitPhase,
    action: PhaseAction,
) -> Result<(SubmitPhase, PhaseTransition), IllegalTransition> {
    use PhaseAction::*;
    use SubmitPhase::*;

    let to = match (from, action) {
        (Validating, Advance) => Resolving,
        (Resolving, Advance) => Fetching,
        (Fetching, Advance) => Building,
        (Building, Advance) => Signing,
        (Signing, Advance) => Submitting,
        (Submitting, Complete) => Confirmed,
        (phase, Fail) if !phase.is_terminal() => Failed,
        _ => return Err(IllegalTransition { from, action }),
    };
    Ok((to, PhaseTransition { from, to }))
}
