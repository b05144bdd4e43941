//! Priority nodes and their single outgoing reference.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use smol_str::SmolStr;

use pte_core::PriorityId;

/// Set on every id handed out by [`Priority::new`] and clear on every id
/// accepted by [`Priority::with_id`], so the two never collide.
pub const AUTO_ID_BIT: u32 = 1 << 31;

/// Next id handed out by [`Priority::new`].
static NEXT_ID: AtomicU32 = AtomicU32::new(AUTO_ID_BIT);

/// Which side of its reference a priority runs on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Importance {
    /// Runs before the referenced priority.
    Higher,
    /// Runs after the referenced priority.
    Lower,
}

/// "This priority is `importance` than `priority`."
#[derive(Clone, Debug)]
pub struct PriorityReference {
    pub priority:   Priority,
    pub importance: Importance,
}

/// A node in the relative-order graph.
///
/// Cheap to clone: the reference chain is shared behind an `Arc`.  Identity
/// is the [`PriorityId`]; two values with the same id are the same node even
/// if they were built separately.
#[derive(Clone, Debug)]
pub struct Priority {
    id:        PriorityId,
    name:      Option<SmolStr>,
    reference: Option<Arc<PriorityReference>>,
}

impl Priority {
    /// A fresh, unreferenced priority with a process-unique id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            id:        PriorityId(NEXT_ID.fetch_add(1, Ordering::Relaxed) | AUTO_ID_BIT),
            name:      None,
            reference: None,
        }
    }

    /// A fresh priority carrying a human-readable name for diagnostics.
    pub fn named(name: &str) -> Self {
        Self { name: Some(SmolStr::new(name)), ..Self::new() }
    }

    /// A priority with a caller-chosen id.
    ///
    /// Used when priorities are declared in configuration rather than code.
    /// Caller ids live below [`AUTO_ID_BIT`]; the bit is cleared if set.
    /// Reusing an id on both ends of a chain is how reference cycles arise;
    /// the sort reports them as [`PriorityError::Cycle`][crate::PriorityError].
    pub fn with_id(id: PriorityId) -> Self {
        Self { id: PriorityId(id.0 & !AUTO_ID_BIT), name: None, reference: None }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(SmolStr::new(name));
        self
    }

    /// Declare that `self` runs before `other`.
    pub fn higher_than(self, other: &Priority) -> Self {
        self.referencing(other, Importance::Higher)
    }

    /// Declare that `self` runs after `other`.
    pub fn lower_than(self, other: &Priority) -> Self {
        self.referencing(other, Importance::Lower)
    }

    pub fn referencing(mut self, other: &Priority, importance: Importance) -> Self {
        self.reference = Some(Arc::new(PriorityReference { priority: other.clone(), importance }));
        self
    }

    #[inline]
    pub fn id(&self) -> PriorityId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn reference(&self) -> Option<&PriorityReference> {
        self.reference.as_deref()
    }

    /// Name if present, otherwise the id.  Used in error messages.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Priority {}
