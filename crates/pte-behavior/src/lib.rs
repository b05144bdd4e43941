//! `pte-behavior` — editor events, behaviors, and the behavior registry.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                         |
//! |--------------|------------------------------------------------------------------|
//! | [`event`]    | `EditorEvent` (synthetic, abstract, custom), `Placement`         |
//! | [`pattern`]  | `EventPattern` — exact, `prefix.*`, `*`                          |
//! | [`behavior`] | `Behavior` builder, `GuardResult`, `GuardPayload`, `ActionResult` |
//! | [`context`]  | `EditorContext<'a>` — read-only view for guards and actions      |
//! | [`effect`]   | `Effect`, `EffectContext<'a>` — deferred side effects            |
//! | [`registry`] | `BehaviorRegistry` — priority-sorted groups per pattern          |
//! | [`set`]      | `BehaviorSet` trait, `CoreBehaviors`                             |
//! | [`error`]    | `BehaviorError`, `BehaviorResult<T>`                             |
//!
//! # Design notes
//!
//! Guards and actions are plain closures over a read-only
//! [`EditorContext`].  They never mutate the document themselves; they
//! return [`ActionResult`]s and the engine in `pte-engine` carries them out.
//! That keeps every behavior `Send + Sync` and trivially re-entrant.

pub mod behavior;
pub mod context;
pub mod effect;
pub mod error;
pub mod event;
pub mod pattern;
pub mod registry;
pub mod set;


pub use behavior::{ActionResult, Behavior, GuardPayload, GuardResult};
pub use context::EditorContext;
pub use effect::{Effect, EffectContext};
pub use error::{BehaviorError, BehaviorResult};
pub use event::{EditorEvent, Placement};
pub use pattern::EventPattern;
pub use registry::BehaviorRegistry;
pub use set::{BehaviorSet, CoreBehaviors, PrioritizedBehavior};
