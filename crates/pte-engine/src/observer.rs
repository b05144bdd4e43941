//! Engine observer trait for tracing cascades and collecting test traces.

use pte_behavior::EditorEvent;
use pte_core::{BehaviorId, Operation};
use pte_index::IndexError;

use crate::DispatchPhase;

/// Callbacks invoked by the engine at key points of a cascade.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — command counter
///
/// ```rust,ignore
/// struct Counter(usize);
///
/// impl EngineObserver for Counter {
///     fn on_command(&mut self, _name: &str, _ops: &[Operation]) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait EngineObserver {
    /// An event is about to be resolved.  `depth` is 0 for external events
    /// and grows by one per nested `Raise`.
    fn on_dispatch_start(&mut self, _event: &EditorEvent, _depth: usize) {}

    /// A behavior's guard matched and its actions are about to run.
    fn on_behavior_matched(&mut self, _id: BehaviorId, _name: Option<&str>, _event: &EditorEvent) {}

    /// A primitive command ran and applied `ops`.
    fn on_command(&mut self, _name: &str, _ops: &[Operation]) {}

    /// The path index rejected an operation.
    fn on_index_error(&mut self, _error: &IndexError) {}

    /// Resolution of one event finished, successfully or not.
    fn on_dispatch_end(&mut self, _event_type: &str, _depth: usize, _ok: bool) {}

    /// `count` effects were run by a flush.
    fn on_effects_flushed(&mut self, _count: usize) {}

    fn on_phase_change(&mut self, _from: DispatchPhase, _to: DispatchPhase) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

// ── RecordingObserver ─────────────────────────────────────────────────────────

/// One entry in a [`RecordingObserver`] trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEntry {
    DispatchStart { event_type: String, depth: usize },
    Matched { id: BehaviorId, name: Option<String> },
    Command { name: String, ops: usize },
    IndexError(String),
    DispatchEnd { event_type: String, depth: usize, ok: bool },
    EffectsFlushed(usize),
    Phase { from: DispatchPhase, to: DispatchPhase },
}

/// Keeps every callback as a [`TraceEntry`].
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub trace: Vec<TraceEntry>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the behaviors that matched, in order.  Unnamed behaviors
    /// appear as their id.
    pub fn matched(&self) -> Vec<String> {
        self.trace
            .iter()
            .filter_map(|e| match e {
                TraceEntry::Matched { id, name } => Some(name.clone().unwrap_or_else(|| id.to_string())),
                _ => None,
            })
            .collect()
    }

    /// Commands that ran, in order.
    pub fn commands(&self) -> Vec<&str> {
        self.trace
            .iter()
            .filter_map(|e| match e {
                TraceEntry::Command { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `(event_type, depth)` of every resolved event, in start order.
    pub fn dispatched(&self) -> Vec<(&str, usize)> {
        self.trace
            .iter()
            .filter_map(|e| match e {
                TraceEntry::DispatchStart { event_type, depth } => Some((event_type.as_str(), *depth)),
                _ => None,
            })
            .collect()
    }

    pub fn phases(&self) -> Vec<DispatchPhase> {
        self.trace
            .iter()
            .filter_map(|e| match e {
                TraceEntry::Phase { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    pub fn index_errors(&self) -> usize {
        self.trace.iter().filter(|e| matches!(e, TraceEntry::IndexError(_))).count()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_dispatch_start(&mut self, event: &EditorEvent, depth: usize) {
        self.trace.push(TraceEntry::DispatchStart { event_type: event.event_type().to_owned(), depth });
    }

    fn on_behavior_matched(&mut self, id: BehaviorId, name: Option<&str>, _event: &EditorEvent) {
        self.trace.push(TraceEntry::Matched { id, name: name.map(str::to_owned) });
    }

    fn on_command(&mut self, name: &str, ops: &[Operation]) {
        self.trace.push(TraceEntry::Command { name: name.to_owned(), ops: ops.len() });
    }

    fn on_index_error(&mut self, error: &IndexError) {
        self.trace.push(TraceEntry::IndexError(error.to_string()));
    }

    fn on_dispatch_end(&mut self, event_type: &str, depth: usize, ok: bool) {
        self.trace.push(TraceEntry::DispatchEnd { event_type: event_type.to_owned(), depth, ok });
    }

    fn on_effects_flushed(&mut self, count: usize) {
        self.trace.push(TraceEntry::EffectsFlushed(count));
    }

    fn on_phase_change(&mut self, from: DispatchPhase, to: DispatchPhase) {
        self.trace.push(TraceEntry::Phase { from, to });
    }
}
