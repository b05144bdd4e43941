use pte_core::PriorityId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriorityError {
    /// A priority transitively references itself.  This is a configuration
    /// error and is never resolved silently.
    #[error("priority reference cycle through {label}")]
    Cycle {
        id:    PriorityId,
        label: String,
    },
}

pub type PriorityResult<T> = Result<T, PriorityError>;
