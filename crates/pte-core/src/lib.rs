//! `pte-core` — foundational types for the pte behavior engine.
//!
//! This crate is a dependency of every other `pte-*` crate.  It has no
//! `pte-*` dependencies and minimal external ones (`rand`, `smol_str`,
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `BehaviorId`, `PriorityId`                                |
//! | [`path`]        | `BlockKey`, `KeyPath`, `BlockPath`                        |
//! | [`node`]        | `Node`, `NodeKind`                                        |
//! | [`document`]    | `Document`, `Selection`, `Point`, primitive mutators      |
//! | [`operation`]   | `Operation` — the structural operation stream             |
//! | [`keys`]        | `KeyGenerator`, `SeededKeys`, `SequentialKeys`            |
//! | [`config`]      | `EngineConfig`                                            |
//! | [`error`]       | `DocumentError`, `DocumentResult`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod config;
pub mod document;
pub mod error;
pub mod ids;
pub mod keys;
pub mod node;
pub mod operation;
pub mod path;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::EngineConfig;
pub use document::{Document, Point, Selection};
pub use error::{DocumentError, DocumentResult};
pub use ids::{BehaviorId, PriorityId};
pub use keys::{KeyGenerator, SeededKeys, SequentialKeys};
pub use node::{Node, NodeKind};
pub use operation::Operation;
pub use path::{BlockKey, BlockPath, KeyPath};
