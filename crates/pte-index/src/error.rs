use thiserror::Error;

use pte_core::{BlockPath, KeyPath};

/// An operation referenced index state that does not exist.
///
/// The index is left untouched whenever one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("no indexed node at {0}")]
    PathNotFound(BlockPath),

    #[error("position {path} is out of bounds (parent has {len} children)")]
    PositionOutOfBounds { path: BlockPath, len: usize },

    #[error("key path {0} is not indexed")]
    KeyNotFound(KeyPath),

    #[error("key path {0} is already indexed")]
    DuplicateKey(KeyPath),
}

pub type IndexResult<T> = Result<T, IndexError>;
