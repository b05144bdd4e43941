//! `sort_by_priority` — topological ordering of prioritized items.
//!
//! # Algorithm
//!
//! ```text
//! for each input priority p:
//!     add node p
//!     walk p's reference chain, tracking visited ids:
//!         id seen twice on one chain    → Cycle error
//!         Higher reference (p → r)      → edge p → r   (p runs first)
//!         Lower  reference (p → r)      → edge r → p   (r runs first)
//! Kahn: pop zero in-degree nodes FIFO, decrement successors
//! nodes left unpopped                   → Cycle error
//! move isolated nodes (no edge either way) behind every connected node
//! emit items bucketed by their priority's rank, then items with no priority
//! ```
//!
//! Nodes are numbered in order of first appearance and the Kahn queue is
//! FIFO, so mutually unordered priorities come out in discovery order.
//! A priority that neither references nor is referenced by anything ranks
//! lowest among prioritized items, keeping input order within that tier.
//! Priorities that are only *referenced* (no input item carries them) still
//! become nodes; they anchor order between items but emit nothing.

use rustc_hash::{FxHashMap, FxHashSet};

use pte_core::PriorityId;

use crate::{Importance, Priority, PriorityError, PriorityResult};

/// Anything that may carry a [`Priority`].
pub trait Prioritized {
    fn priority(&self) -> Option<&Priority>;
}

impl Prioritized for Priority {
    fn priority(&self) -> Option<&Priority> {
        Some(self)
    }
}

impl Prioritized for Option<Priority> {
    fn priority(&self) -> Option<&Priority> {
        self.as_ref()
    }
}

impl<T> Prioritized for (T, Option<Priority>) {
    fn priority(&self) -> Option<&Priority> {
        self.1.as_ref()
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// Dense adjacency graph over priority ids, numbered by first appearance.
#[derive(Default)]
struct PriorityGraph {
    slot:      FxHashMap<PriorityId, usize>,
    ids:       Vec<PriorityId>,
    labels:    Vec<String>,
    edges:     Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl PriorityGraph {
    fn node(&mut self, priority: &Priority) -> usize {
        if let Some(&slot) = self.slot.get(&priority.id()) {
            return slot;
        }
        let slot = self.ids.len();
        self.slot.insert(priority.id(), slot);
        self.ids.push(priority.id());
        self.labels.push(priority.label());
        self.edges.push(Vec::new());
        self.in_degree.push(0);
        slot
    }

    /// `before` must be scheduled ahead of `after`.  Duplicate edges are
    /// collapsed so in-degrees stay exact.
    fn edge(&mut self, before: usize, after: usize) {
        if !self.edges[before].contains(&after) {
            self.edges[before].push(after);
            self.in_degree[after] += 1;
        }
    }

    /// Add `priority` and its whole reference chain.
    fn add_chain(&mut self, priority: &Priority) -> PriorityResult<()> {
        let mut visited = FxHashSet::default();
        visited.insert(priority.id());
        let mut current = priority;
        let mut current_slot = self.node(current);

        while let Some(reference) = current.reference() {
            let target = &reference.priority;
            if !visited.insert(target.id()) {
                return Err(PriorityError::Cycle { id: target.id(), label: target.label() });
            }
            let target_slot = self.node(target);
            match reference.importance {
                Importance::Higher => self.edge(current_slot, target_slot),
                Importance::Lower  => self.edge(target_slot, current_slot),
            }
            current = target;
            current_slot = target_slot;
        }
        Ok(())
    }

    /// Kahn's algorithm.  Returns node slots in execution order, or the first
    /// node stuck on a cycle that no single chain walk exposed.
    fn topological_order(mut self) -> PriorityResult<Vec<PriorityId>> {
        let isolated: Vec<bool> = (0..self.ids.len())
            .map(|n| self.edges[n].is_empty() && self.in_degree[n] == 0)
            .collect();
        let mut queue: std::collections::VecDeque<usize> = (0..self.ids.len())
            .filter(|&n| self.in_degree[n] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.ids.len());
        let mut trailing = Vec::new();

        while let Some(n) = queue.pop_front() {
            if isolated[n] {
                trailing.push(self.ids[n]);
                continue;
            }
            order.push(self.ids[n]);
            for i in 0..self.edges[n].len() {
                let next = self.edges[n][i];
                self.in_degree[next] -= 1;
                if self.in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() + trailing.len() < self.ids.len() {
            if let Some(stuck) = (0..self.ids.len()).find(|&n| self.in_degree[n] > 0) {
                return Err(PriorityError::Cycle {
                    id:    self.ids[stuck],
                    label: self.labels[stuck].clone(),
                });
            }
        }
        order.extend(trailing);
        Ok(order)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Compute the execution order of `items` without moving them.
///
/// Returns a permutation of `0..items.len()`: prioritized items in
/// topological order (ties in input order), then items whose priority has no
/// reference in either direction, then unprioritized items.  Both trailing
/// tiers keep input order.
///
/// # Errors
///
/// [`PriorityError::Cycle`] if any priority transitively references itself.
pub fn priority_order<T: Prioritized>(items: &[T]) -> PriorityResult<Vec<usize>> {
    let mut graph = PriorityGraph::default();
    for priority in items.iter().filter_map(Prioritized::priority) {
        graph.add_chain(priority)?;
    }
    let ranked = graph.topological_order()?;

    let mut buckets: FxHashMap<PriorityId, Vec<usize>> = FxHashMap::default();
    let mut unprioritized = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match item.priority() {
            Some(p) => buckets.entry(p.id()).or_default().push(i),
            None => unprioritized.push(i),
        }
    }

    let mut order = Vec::with_capacity(items.len());
    for id in ranked {
        if let Some(bucket) = buckets.remove(&id) {
            order.extend(bucket);
        }
    }

    // Anything the graph did not reach keeps its input position relative to
    // the other leftovers.
    if !buckets.is_empty() {
        let mut leftovers: Vec<usize> = buckets.into_values().flatten().collect();
        leftovers.sort_unstable();
        order.extend(leftovers);
    }
    order.extend(unprioritized);
    Ok(order)
}

/// Reorder `items` into execution order.  See [`priority_order`].
pub fn sort_by_priority<T: Prioritized>(items: Vec<T>) -> PriorityResult<Vec<T>> {
    let order = priority_order(&items)?;
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
