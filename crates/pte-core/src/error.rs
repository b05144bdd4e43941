//! Document-level error type.
//!
//! Raised by the primitive mutators in [`crate::document`].  Higher crates
//! wrap it (`EngineError::Document`) rather than flattening its variants.

use thiserror::Error;

use crate::{BlockKey, BlockPath, KeyPath};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("no node at path {0}")]
    PathNotFound(BlockPath),

    #[error("no node with key path {0}")]
    KeyNotFound(KeyPath),

    #[error("position {position} is out of bounds at {path}")]
    InvalidPosition { path: BlockPath, position: usize },

    #[error("offset {offset} is out of bounds in span {path}")]
    InvalidOffset { path: KeyPath, offset: usize },

    #[error("key {0} already exists among its siblings")]
    DuplicateKey(BlockKey),

    #[error("node {0} is not a span")]
    NotASpan(KeyPath),

    #[error("node {0} is not a text block")]
    NotATextBlock(KeyPath),

    #[error("node at {0} has no previous sibling to merge into")]
    NoPreviousSibling(BlockPath),

    #[error("node at {0} cannot merge into a sibling of a different kind")]
    IncompatibleMerge(BlockPath),

    #[error("the editor has no selection")]
    NoSelection,

    #[error("selection spans more than one block")]
    InvalidRange,
}

/// Shorthand result type for document mutators.
pub type DocumentResult<T> = Result<T, DocumentError>;
