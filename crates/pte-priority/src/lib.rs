//! `pte-priority` — relative execution order for behaviors.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`priority`] | `Priority`, `PriorityReference`, `Importance`, `AUTO_ID_BIT` |
//! | [`sort`]     | `sort_by_priority`, `priority_order`, `Prioritized` trait    |
//! | [`error`]    | `PriorityError`, `PriorityResult<T>`                         |
//!
//! # Model
//!
//! A priority never carries an absolute rank.  It may declare itself
//! *higher* or *lower* than one other priority, which may in turn reference
//! another, forming chains.  Independent chains stay mutually unordered; the
//! sort breaks those ties by first appearance so output is stable across runs.
//! A priority outside every chain sorts after all chained ones.
//!
//! ```text
//! c = Priority::named("c")
//! b = Priority::named("b").higher_than(&c)
//! a = Priority::named("a").higher_than(&b)     // order: a, b, c
//! ```

pub mod error;
pub mod priority;
pub mod sort;


pub use error::{PriorityError, PriorityResult};
pub use priority::{AUTO_ID_BIT, Importance, Priority, PriorityReference};
pub use sort::{Prioritized, priority_order, sort_by_priority};
