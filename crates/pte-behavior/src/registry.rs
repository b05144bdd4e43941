//! `BehaviorRegistry` — active behaviors grouped by pattern, priority-sorted.
//!
//! # Layout
//!
//! ```text
//! exact:    "insert.text" → [id, id, …]      one group per exact type
//! prefixes: ("drag.", [id, …]), …            longest prefix first
//! all:      [id, …]                          the "*" group
//! ```
//!
//! Each group is kept in [`sort_by_priority`] order.  Adding a behavior
//! re-sorts only the group it joins; removing one just deletes it, since
//! the relative order of the survivors does not change.  Within a group,
//! ties keep registration order (ids are handed out monotonically).

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use pte_core::BehaviorId;
use pte_priority::{Priority, sort_by_priority};

use crate::{Behavior, BehaviorResult, EventPattern};

struct Registered {
    behavior: Arc<Behavior>,
    priority: Option<Priority>,
}

#[derive(Default)]
pub struct BehaviorRegistry {
    next_id:  BehaviorId,
    entries:  FxHashMap<BehaviorId, Registered>,
    exact:    FxHashMap<SmolStr, Vec<BehaviorId>>,
    prefixes: Vec<(SmolStr, Vec<BehaviorId>)>,
    all:      Vec<BehaviorId>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `behavior` and re-sort the group it joins.
    ///
    /// # Errors
    ///
    /// A priority cycle in the group leaves the registry unchanged and
    /// returns [`BehaviorError::Priority`][crate::BehaviorError::Priority].
    pub fn add(&mut self, behavior: Behavior, priority: Option<Priority>) -> BehaviorResult<BehaviorId> {
        let id = self.next_id;
        let pattern = behavior.pattern().clone();
        self.entries.insert(id, Registered { behavior: Arc::new(behavior), priority });
        self.group_mut(&pattern).push(id);

        if let Err(err) = self.resort(&pattern) {
            self.group_mut(&pattern).retain(|&g| g != id);
            self.prune(&pattern);
            self.entries.remove(&id);
            return Err(err.into());
        }
        self.next_id = id.next();
        debug!(%id, %pattern, "behavior registered");
        Ok(id)
    }

    /// Unregister by id.  Returns `false` if `id` was not registered.
    pub fn remove(&mut self, id: BehaviorId) -> bool {
        let Some(entry) = self.entries.remove(&id) else { return false };
        let pattern = entry.behavior.pattern().clone();
        self.group_mut(&pattern).retain(|&g| g != id);
        self.prune(&pattern);
        debug!(%id, %pattern, "behavior unregistered");
        true
    }

    /// Candidates for `event_type`, in the order they must be consulted:
    /// exact subscribers, then prefix groups from longest to shortest
    /// prefix, then `*` subscribers.  Each part is in priority order.
    pub fn candidates(&self, event_type: &str) -> Vec<(BehaviorId, Arc<Behavior>)> {
        let exact = self.exact.get(event_type).into_iter().flatten();
        let prefixed = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| event_type.starts_with(prefix.as_str()))
            .flat_map(|(_, ids)| ids);
        exact
            .chain(prefixed)
            .chain(&self.all)
            .filter_map(|id| self.entries.get(id).map(|e| (*id, Arc::clone(&e.behavior))))
            .collect()
    }

    pub fn get(&self, id: BehaviorId) -> Option<&Behavior> {
        self.entries.get(&id).map(|e| e.behavior.as_ref())
    }

    #[inline]
    pub fn contains(&self, id: BehaviorId) -> bool {
        self.entries.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn group_mut(&mut self, pattern: &EventPattern) -> &mut Vec<BehaviorId> {
        match pattern {
            EventPattern::Exact(name) => self.exact.entry(name.clone()).or_default(),
            EventPattern::All => &mut self.all,
            EventPattern::Prefix(prefix) => {
                let slot = match self.prefixes.iter().position(|(p, _)| p == prefix) {
                    Some(slot) => slot,
                    None => {
                        // Longest prefix first; equal lengths alphabetically.
                        let at = self
                            .prefixes
                            .iter()
                            .position(|(p, _)| {
                                p.len() < prefix.len() || (p.len() == prefix.len() && p > prefix)
                            })
                            .unwrap_or(self.prefixes.len());
                        self.prefixes.insert(at, (prefix.clone(), Vec::new()));
                        at
                    }
                };
                &mut self.prefixes[slot].1
            }
        }
    }

    /// Drop an emptied exact or prefix group.
    fn prune(&mut self, pattern: &EventPattern) {
        match pattern {
            EventPattern::Exact(name) => {
                if self.exact.get(name).is_some_and(Vec::is_empty) {
                    self.exact.remove(name);
                }
            }
            EventPattern::Prefix(_) => self.prefixes.retain(|(_, ids)| !ids.is_empty()),
            EventPattern::All => {}
        }
    }

    fn resort(&mut self, pattern: &EventPattern) -> pte_priority::PriorityResult<()> {
        let original = std::mem::take(self.group_mut(pattern));
        let mut ids = original.clone();
        ids.sort_unstable();
        let keyed: Vec<(BehaviorId, Option<Priority>)> = ids
            .iter()
            .map(|id| (*id, self.entries.get(id).and_then(|e| e.priority.clone())))
            .collect();
        let sorted = match sort_by_priority(keyed) {
            Ok(sorted) => sorted,
            Err(err) => {
                *self.group_mut(pattern) = original;
                return Err(err);
            }
        };
        *self.group_mut(pattern) = sorted.into_iter().map(|(id, _)| id).collect();
        Ok(())
    }
}
