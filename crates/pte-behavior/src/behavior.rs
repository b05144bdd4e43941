//! `Behavior` — a guard plus an ordered list of actions.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::{BehaviorResult, EditorContext, EditorEvent, Effect, EventPattern};

// ── Guard results ─────────────────────────────────────────────────────────────

/// Opaque value a guard hands to the behavior's actions.
#[derive(Clone)]
pub struct GuardPayload(Arc<dyn Any + Send + Sync>);

impl GuardPayload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for GuardPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GuardPayload(..)")
    }
}

/// Outcome of a guard.
#[derive(Clone, Debug)]
pub enum GuardResult {
    /// The behavior does not apply.
    Skip,
    /// The behavior applies with no payload.
    Match,
    /// The behavior applies; actions receive the payload.
    Payload(GuardPayload),
}

impl GuardResult {
    pub fn payload<T: Any + Send + Sync>(value: T) -> Self {
        GuardResult::Payload(GuardPayload::new(value))
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        !matches!(self, GuardResult::Skip)
    }
}

impl From<bool> for GuardResult {
    fn from(applies: bool) -> Self {
        if applies { GuardResult::Match } else { GuardResult::Skip }
    }
}

/// `Some(v)` matches with payload `v`, `None` skips.
impl<T: Any + Send + Sync> From<Option<T>> for GuardResult {
    fn from(value: Option<T>) -> Self {
        value.map_or(GuardResult::Skip, GuardResult::payload)
    }
}

// ── Action results ────────────────────────────────────────────────────────────

/// One instruction produced by an action.
#[derive(Debug)]
pub enum ActionResult {
    /// Dispatch a new event now, depth-first, before the remaining results.
    Raise(EditorEvent),
    /// Hand this event on to the next lower-priority candidate instead of
    /// stopping after this behavior.
    Forward(EditorEvent),
    /// Run the primitive command for this event directly.
    Execute(EditorEvent),
    /// Run the command registered under this name, passing it the event
    /// currently being resolved.
    Command(SmolStr),
    /// Run after the whole cascade has drained.
    Effect(Effect),
}

impl ActionResult {
    pub fn effect<F>(thunk: F) -> Self
    where
        F: FnOnce(&mut crate::EffectContext<'_>) + Send + 'static,
    {
        ActionResult::Effect(Effect::new(thunk))
    }

    pub fn command(name: &str) -> Self {
        ActionResult::Command(SmolStr::new(name))
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionResult::Raise(_)   => "raise",
            ActionResult::Forward(_) => "forward",
            ActionResult::Execute(_) => "execute",
            ActionResult::Command(_) => "command",
            ActionResult::Effect(_)  => "effect",
        }
    }
}

// ── Behavior ──────────────────────────────────────────────────────────────────

type GuardFn = dyn Fn(&EditorContext<'_>, &EditorEvent) -> BehaviorResult<GuardResult> + Send + Sync;
type ActionFn = dyn Fn(&EditorContext<'_>, &EditorEvent, Option<&GuardPayload>) -> BehaviorResult<Vec<ActionResult>>
    + Send
    + Sync;

/// A guard and its actions, subscribed to an [`EventPattern`].
///
/// Built fluently and immutable once registered:
///
/// ```rust,ignore
/// let shout = Behavior::on("insert.text")
///     .named("shout")
///     .guard(|_, ev| matches!(ev, EditorEvent::InsertText { text } if text == "!"))
///     .action(|_, _, _| vec![ActionResult::Execute(EditorEvent::text("!!!"))]);
/// ```
///
/// A behavior without a guard always applies.
pub struct Behavior {
    name:    Option<SmolStr>,
    pattern: EventPattern,
    guard:   Option<Box<GuardFn>>,
    actions: Vec<Box<ActionFn>>,
}

impl Behavior {
    pub fn on(pattern: impl Into<EventPattern>) -> Self {
        Self { name: None, pattern: pattern.into(), guard: None, actions: Vec::new() }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(SmolStr::new(name));
        self
    }

    /// Infallible guard.  Return a `bool`, an `Option<T>` (payload), or a
    /// [`GuardResult`].
    pub fn guard<F, R>(self, guard: F) -> Self
    where
        F: Fn(&EditorContext<'_>, &EditorEvent) -> R + Send + Sync + 'static,
        R: Into<GuardResult>,
    {
        self.try_guard(move |ctx, ev| Ok(guard(ctx, ev).into()))
    }

    pub fn try_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&EditorContext<'_>, &EditorEvent) -> BehaviorResult<GuardResult> + Send + Sync + 'static,
    {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Append an infallible action.
    pub fn action<F>(self, action: F) -> Self
    where
        F: Fn(&EditorContext<'_>, &EditorEvent, Option<&GuardPayload>) -> Vec<ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.try_action(move |ctx, ev, payload| Ok(action(ctx, ev, payload)))
    }

    pub fn try_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&EditorContext<'_>, &EditorEvent, Option<&GuardPayload>) -> BehaviorResult<Vec<ActionResult>>
            + Send
            + Sync
            + 'static,
    {
        self.actions.push(Box::new(action));
        self
    }

    #[inline]
    pub fn pattern(&self) -> &EventPattern {
        &self.pattern
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    pub fn evaluate_guard(&self, ctx: &EditorContext<'_>, event: &EditorEvent) -> BehaviorResult<GuardResult> {
        match &self.guard {
            Some(guard) => guard(ctx, event),
            None => Ok(GuardResult::Match),
        }
    }

    /// Run action `index`.  Out-of-range indices produce no results.
    pub fn run_action(
        &self,
        index:   usize,
        ctx:     &EditorContext<'_>,
        event:   &EditorEvent,
        payload: Option<&GuardPayload>,
    ) -> BehaviorResult<Vec<ActionResult>> {
        match self.actions.get(index) {
            Some(action) => action(ctx, event, payload),
            None => Ok(Vec::new()),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("guarded", &self.guard.is_some())
            .field("actions", &self.actions.len())
            .finish()
    }
}
