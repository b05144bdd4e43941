use pte_behavior::BehaviorError;
use pte_core::DocumentError;
use pte_priority::PriorityError;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine configuration error: {0}")]
    Config(String),

    #[error("guard of behavior {behavior} failed: {source}")]
    Guard {
        behavior: String,
        #[source]
        source:   BehaviorError,
    },

    #[error("action of behavior {behavior} failed: {source}")]
    Action {
        behavior: String,
        #[source]
        source:   BehaviorError,
    },

    #[error("command {command} failed: {source}")]
    Command {
        command: SmolStr,
        #[source]
        source:  DocumentError,
    },

    #[error("no command registered for {0}")]
    UnknownCommand(SmolStr),

    #[error("cascade depth {depth} exceeds the limit of {limit} at {event_type}")]
    CascadeDepthExceeded {
        depth:      usize,
        limit:      usize,
        event_type: SmolStr,
    },

    #[error("cascade processed more than {limit} events")]
    CascadeLimitExceeded { limit: usize },

    #[error("behavior registration failed: {0}")]
    Registration(BehaviorError),

    #[error(transparent)]
    Priority(#[from] PriorityError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Registration errors keep priority cycles distinguishable from the rest.
impl From<BehaviorError> for EngineError {
    fn from(err: BehaviorError) -> Self {
        match err {
            BehaviorError::Priority(p) => EngineError::Priority(p),
            other => EngineError::Registration(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
