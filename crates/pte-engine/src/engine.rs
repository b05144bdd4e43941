//! The `Engine` struct and its dispatch cascade.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, debug_span, error, trace, warn};

use pte_behavior::{
    ActionResult, Behavior, BehaviorRegistry, BehaviorSet, EditorContext, EditorEvent, EffectContext, GuardResult,
};
use pte_core::{BehaviorId, Document, DocumentResult, EngineConfig, KeyGenerator, Operation, SeededKeys};
use pte_index::BlockPathIndex;
use pte_priority::Priority;

use crate::{CommandTable, EffectQueue, EngineError, EngineObserver, EngineResult, NoopObserver};

// ── DispatchPhase ─────────────────────────────────────────────────────────────

/// Where the engine is in a dispatch cycle.
///
/// ```text
/// Idle ──event──▶ Resolving ──guard match──▶ Executing ──Raise──▶ Draining
///   ▲                 ▲                          │                   │
///   │                 └───────Forward────────────┘◀──nested cascade──┘
///   └──────────── Flushing ◀── flush(queue) ─────┘
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchPhase {
    #[default]
    Idle,
    /// Consulting the registry and guards for the current event.
    Resolving,
    /// Running the action list of a matched behavior.
    Executing,
    /// Resolving events raised by an action.
    Draining,
    /// Running queued effects.
    Flushing,
}

/// Per-cascade bookkeeping threaded through the nested dispatch calls.
#[derive(Default)]
struct Cascade {
    effects: EffectQueue,
    events:  usize,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// The behavior engine.
///
/// Owns the document, its path index, the behavior registry, and the
/// command table.  Each external event is resolved to completion before the
/// next one is accepted:
///
/// 1. **Resolve**: consult the registry's candidates for the event type in
///    order.  The first behavior whose guard matches runs all of its actions.
/// 2. **Execute**: action results are applied in order.  `Raise` resolves a
///    new event depth-first, `Execute` runs a primitive command, `Effect` is
///    queued, and `Forward` hands the event on to the next candidate once the
///    current behavior is done.
/// 3. **Fall through**: an event no behavior claimed runs its primitive
///    command if one exists (configurable), otherwise it is dropped.
///
/// Every command's operations are replayed against the [`BlockPathIndex`] so
/// guards always see an index consistent with the document.
///
/// Create via [`EngineBuilder`][crate::EngineBuilder] or [`Engine::new`].
pub struct Engine {
    pub(crate) document: Document,
    pub(crate) index:    BlockPathIndex,
    pub(crate) registry: BehaviorRegistry,
    pub(crate) commands: CommandTable,
    pub(crate) keys:     Box<dyn KeyGenerator>,
    pub(crate) config:   EngineConfig,
    pub(crate) phase:    DispatchPhase,
}

impl Engine {
    /// An engine over `document` with the default configuration, the
    /// standard command table, and no behaviors.
    pub fn new(document: Document) -> Self {
        let config = EngineConfig::default();
        Self {
            index: BlockPathIndex::from_document(&document),
            document,
            registry: BehaviorRegistry::new(),
            commands: CommandTable::standard(),
            keys: Box::new(SeededKeys::new(config.key_seed)),
            config,
            phase: DispatchPhase::Idle,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn index(&self) -> &BlockPathIndex {
        &self.index
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandTable {
        &mut self.commands
    }

    /// Rebuild the path index from the document.
    pub fn reindex(&mut self) {
        self.index.rebuild(&self.document);
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register a behavior.  The returned id unregisters it.
    ///
    /// # Errors
    ///
    /// [`EngineError::Priority`] if `priority` closes a reference cycle with
    /// the behaviors already subscribed to the same pattern.
    pub fn register_behavior(&mut self, behavior: Behavior, priority: Option<Priority>) -> EngineResult<BehaviorId> {
        Ok(self.registry.add(behavior, priority)?)
    }

    pub fn unregister_behavior(&mut self, id: BehaviorId) -> bool {
        self.registry.remove(id)
    }

    /// Register every behavior of `set`, in order.  Stops at the first
    /// failure; behaviors registered before it stay registered.
    pub fn register_set<S: BehaviorSet + ?Sized>(&mut self, set: &S) -> EngineResult<Vec<BehaviorId>> {
        let behaviors = set.behaviors();
        debug!(set = set.name(), count = behaviors.len(), "registering behavior set");
        behaviors
            .into_iter()
            .map(|b| self.register_behavior(b.behavior, b.priority))
            .collect()
    }

    // ── Direct edits ──────────────────────────────────────────────────────

    /// Apply mutations outside of any cascade, keeping the index in step.
    ///
    /// ```rust,ignore
    /// engine.edit(|doc| doc.insert_node(&BlockPath::from([0]), node))?;
    /// ```
    pub fn edit<F>(&mut self, f: F) -> EngineResult<Vec<Operation>>
    where
        F: FnOnce(&mut Document) -> DocumentResult<Vec<Operation>>,
    {
        let ops = f(&mut self.document)?;
        self.sync_index(&ops, &mut NoopObserver);
        Ok(ops)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Resolve `event` and everything it raises.  Effects are returned
    /// undrained.
    ///
    /// # Errors
    ///
    /// A failing guard, action, or command aborts the whole cascade.
    /// Mutations committed before the failure stay in place.
    pub fn dispatch(&mut self, event: EditorEvent) -> EngineResult<EffectQueue> {
        self.dispatch_observed(event, &mut NoopObserver)
    }

    /// [`dispatch`][Self::dispatch] with observer callbacks.
    pub fn dispatch_observed<O: EngineObserver>(
        &mut self,
        event:    EditorEvent,
        observer: &mut O,
    ) -> EngineResult<EffectQueue> {
        self.run_cascade(event, observer)
    }

    /// Run `queue`'s effects in order, then dispatch and flush every event
    /// they sent.
    pub fn flush(&mut self, queue: EffectQueue) -> EngineResult<()> {
        self.flush_observed(queue, &mut NoopObserver)
    }

    pub fn flush_observed<O: EngineObserver>(&mut self, queue: EffectQueue, observer: &mut O) -> EngineResult<()> {
        let follow_ups = self.run_effects(queue, observer);
        self.drain(follow_ups.into(), observer)
    }

    /// Dispatch `event`, flush its effects, and keep going until no effect
    /// sends anything further.
    pub fn send(&mut self, event: EditorEvent) -> EngineResult<()> {
        self.send_observed(event, &mut NoopObserver)
    }

    pub fn send_observed<O: EngineObserver>(&mut self, event: EditorEvent, observer: &mut O) -> EngineResult<()> {
        self.drain(VecDeque::from([event]), observer)
    }

    // ── Cascade internals ─────────────────────────────────────────────────

    fn run_cascade(&mut self, event: EditorEvent, observer: &mut dyn EngineObserver) -> EngineResult<EffectQueue> {
        let mut cascade = Cascade::default();
        let result = self.resolve(event, 0, &mut cascade, observer);
        self.enter(DispatchPhase::Idle, observer);
        match result {
            Ok(()) => Ok(cascade.effects),
            Err(err) => {
                error!(error = %err, "cascade aborted");
                Err(err)
            }
        }
    }

    /// Dispatch queued external events one cascade at a time.
    fn drain(&mut self, mut pending: VecDeque<EditorEvent>, observer: &mut dyn EngineObserver) -> EngineResult<()> {
        let mut sent = 0usize;
        while let Some(event) = pending.pop_front() {
            sent += 1;
            if sent > self.config.max_cascade_events {
                error!(limit = self.config.max_cascade_events, "effects kept sending events");
                return Err(EngineError::CascadeLimitExceeded { limit: self.config.max_cascade_events });
            }
            let effects = self.run_cascade(event, observer)?;
            pending.extend(self.run_effects(effects, observer));
        }
        Ok(())
    }

    fn run_effects(&mut self, queue: EffectQueue, observer: &mut dyn EngineObserver) -> Vec<EditorEvent> {
        self.enter(DispatchPhase::Flushing, observer);
        let count = queue.len();
        let mut ctx = EffectContext::new(&self.document);
        for effect in queue {
            trace!(label = effect.label().unwrap_or("anonymous"), "running effect");
            effect.run(&mut ctx);
        }
        let events = ctx.into_events();
        observer.on_effects_flushed(count);
        self.enter(DispatchPhase::Idle, observer);
        events
    }

    fn resolve(
        &mut self,
        event:    EditorEvent,
        depth:    usize,
        cascade:  &mut Cascade,
        observer: &mut dyn EngineObserver,
    ) -> EngineResult<()> {
        let event_type = event.event_type().to_owned();
        let span = debug_span!("dispatch", event_type = %event_type, depth);
        let _enter = span.enter();

        observer.on_dispatch_start(&event, depth);
        let result = self.resolve_inner(event, depth, cascade, observer);
        observer.on_dispatch_end(&event_type, depth, result.is_ok());
        result
    }

    fn resolve_inner(
        &mut self,
        event:    EditorEvent,
        depth:    usize,
        cascade:  &mut Cascade,
        observer: &mut dyn EngineObserver,
    ) -> EngineResult<()> {
        let limit = self.config.max_cascade_depth;
        if depth > limit {
            return Err(EngineError::CascadeDepthExceeded {
                depth,
                limit,
                event_type: event.event_type().into(),
            });
        }
        cascade.events += 1;
        if cascade.events > self.config.max_cascade_events {
            return Err(EngineError::CascadeLimitExceeded { limit: self.config.max_cascade_events });
        }

        self.enter(DispatchPhase::Resolving, observer);
        let mut current = event;
        for (id, behavior) in self.registry.candidates(current.event_type()) {
            // A forwarded event may have a different type than the one the
            // candidates were collected for.
            if !behavior.pattern().matches(current.event_type()) {
                continue;
            }

            let guard = behavior
                .evaluate_guard(&self.context(depth), &current)
                .map_err(|source| EngineError::Guard { behavior: label(id, &behavior), source })?;
            trace!(behavior = %label(id, &behavior), matched = guard.is_match(), "guard evaluated");
            let payload = match guard {
                GuardResult::Skip => continue,
                GuardResult::Match => None,
                GuardResult::Payload(p) => Some(p),
            };

            observer.on_behavior_matched(id, behavior.name(), &current);
            let mut forward = None;
            for action in 0..behavior.action_count() {
                self.enter(DispatchPhase::Executing, observer);
                let results = behavior
                    .run_action(action, &self.context(depth), &current, payload.as_ref())
                    .map_err(|source| EngineError::Action { behavior: label(id, &behavior), source })?;
                for result in results {
                    self.apply_result(result, &current, depth, cascade, observer, &mut forward)?;
                }
            }

            match forward {
                Some(next) => {
                    self.enter(DispatchPhase::Resolving, observer);
                    current = next;
                }
                None => return Ok(()),
            }
        }

        if self.config.fall_through_unhandled && self.commands.contains(current.event_type()) {
            self.enter(DispatchPhase::Executing, observer);
            self.execute(&current, observer)
        } else {
            warn!(event_type = current.event_type(), "no behavior or command, event dropped");
            Ok(())
        }
    }

    fn apply_result(
        &mut self,
        result:   ActionResult,
        current:  &EditorEvent,
        depth:    usize,
        cascade:  &mut Cascade,
        observer: &mut dyn EngineObserver,
        forward:  &mut Option<EditorEvent>,
    ) -> EngineResult<()> {
        match result {
            ActionResult::Raise(next) => {
                debug!(event_type = next.event_type(), "raise");
                self.enter(DispatchPhase::Draining, observer);
                self.resolve(next, depth + 1, cascade, observer)?;
                self.enter(DispatchPhase::Executing, observer);
            }
            ActionResult::Forward(next) => {
                debug!(event_type = next.event_type(), "forward");
                *forward = Some(next);
            }
            ActionResult::Execute(next) => {
                debug!(event_type = next.event_type(), "execute");
                self.execute(&next, observer)?;
            }
            ActionResult::Command(name) => {
                debug!(command = %name, "execute by name");
                self.run_command(&name, current, observer)?;
            }
            ActionResult::Effect(effect) => {
                debug!(label = effect.label().unwrap_or("anonymous"), "effect queued");
                cascade.effects.push(effect);
            }
        }
        Ok(())
    }

    /// Run the primitive command for `event`.
    fn execute(&mut self, event: &EditorEvent, observer: &mut dyn EngineObserver) -> EngineResult<()> {
        self.run_command(event.event_type(), event, observer)
    }

    /// Run command `name` with `event` as its argument and replay its
    /// operations against the index.
    fn run_command(&mut self, name: &str, event: &EditorEvent, observer: &mut dyn EngineObserver) -> EngineResult<()> {
        let command = self.commands.get(name).ok_or_else(|| EngineError::UnknownCommand(name.into()))?;
        let ops = command(&mut self.document, event, &mut *self.keys)
            .map_err(|source| EngineError::Command { command: name.into(), source })?;
        debug!(command = name, ops = ops.len(), "command executed");
        observer.on_command(name, &ops);
        self.sync_index(&ops, observer);
        Ok(())
    }

    /// Replay `ops` against the index.  The first rejected operation is
    /// reported and ends the replay; the index is then rebuilt or left as-is
    /// depending on `rebuild_index_on_error`.
    fn sync_index(&mut self, ops: &[Operation], observer: &mut dyn EngineObserver) {
        for op in ops {
            if let Err(err) = self.index.apply_operation(op) {
                warn!(error = %err, op = op.kind(), "index rejected operation");
                observer.on_index_error(&err);
                if self.config.rebuild_index_on_error {
                    self.index.rebuild(&self.document);
                }
                return;
            }
        }
    }

    fn context(&self, depth: usize) -> EditorContext<'_> {
        EditorContext::new(&self.document, &self.index, depth)
    }

    fn enter(&mut self, phase: DispatchPhase, observer: &mut dyn EngineObserver) {
        if self.phase != phase {
            observer.on_phase_change(self.phase, phase);
            self.phase = phase;
        }
    }
}

fn label(id: BehaviorId, behavior: &Arc<Behavior>) -> String {
    match behavior.name() {
        Some(name) => format!("{name} ({id})"),
        None => id.to_string(),
    }
}
