use thiserror::Error;

use crate::ActionType;

/// A required target was missing when an action was started.
///
/// The action is still constructed, without the claim it would have taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("{action} requires a target cell")]
    MissingCell { action: ActionType },

    #[error("{action} requires a target entity")]
    MissingEntity { action: ActionType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("action stack is empty")]
    Empty,

    #[error("the fallback action cannot be popped")]
    FallbackPinned,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action type token: {0:?}")]
pub struct ParseActionTypeError(pub String);
