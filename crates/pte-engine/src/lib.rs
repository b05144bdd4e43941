//! `pte-engine` — the dispatch cascade that drives the pte behavior engine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`engine`]   | `Engine`, `DispatchPhase` — resolution, raise, forward      |
//! | [`builder`]  | `EngineBuilder` — fluent construction                       |
//! | [`commands`] | `CommandTable` — primitive document commands by event type  |
//! | [`effect`]   | `EffectQueue` — effects collected during one cascade        |
//! | [`observer`] | `EngineObserver`, `NoopObserver`, `RecordingObserver`       |
//! | [`error`]    | `EngineError`, `EngineResult<T>`                            |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use pte_behavior::{CoreBehaviors, EditorEvent};
//! use pte_engine::EngineBuilder;
//!
//! let mut engine = EngineBuilder::new(document)
//!     .set(&CoreBehaviors::new())
//!     .build()?;
//!
//! engine.send(EditorEvent::text("hi"))?;
//! engine.send(EditorEvent::InsertBreak)?;
//! ```

pub mod builder;
pub mod commands;
pub mod effect;
pub mod engine;
pub mod error;
pub mod observer;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;
pub use commands::{CommandFn, CommandTable};
pub use effect::EffectQueue;
pub use engine::{DispatchPhase, Engine};
pub use error::{EngineError, EngineResult};
pub use observer::{EngineObserver, NoopObserver, RecordingObserver, TraceEntry};
