//! `pte-index` — O(1) translation from stable key paths to positional paths.
//!
//! # Crate layout
//!
//! | Module    | Contents                                               |
//! |-----------|--------------------------------------------------------|
//! | [`index`] | `BlockPathIndex`                                       |
//! | [`error`] | `IndexError`, `IndexResult<T>`                         |
//!
//! # Usage
//!
//! ```text
//! let mut index = BlockPathIndex::from_document(&doc);
//! for op in doc.insert_node(&path, node)? {
//!     index.apply_operation(&op)?;
//! }
//! assert_eq!(index, BlockPathIndex::from_document(&doc));
//! ```
//!
//! The last line is the defining property: replaying a document's
//! operation stream must leave the index equal to a fresh rebuild.

pub mod error;
pub mod index;

#[cfg(test)]
mod tests;

pub use error::{IndexError, IndexResult};
pub use index::BlockPathIndex;
