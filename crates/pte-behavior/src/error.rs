use thiserror::Error;

use pte_priority::PriorityError;

/// Failures raised by guards, actions, and behavior registration.
///
/// Guard and action closures return these through `?`; the engine wraps
/// them with the name of the behavior that failed.
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("guard failed: {0}")]
    Guard(String),

    #[error("action failed: {0}")]
    Action(String),

    #[error("behavior configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Priority(#[from] PriorityError),
}

impl BehaviorError {
    pub fn guard(message: impl Into<String>) -> Self {
        Self::Guard(message.into())
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self::Action(message.into())
    }
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
