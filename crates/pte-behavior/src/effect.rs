//! Deferred side effects.
//!
//! An [`Effect`] is captured while a cascade runs and executed only after
//! the whole cascade has drained.  Effects cannot touch the document
//! directly; they read it and may `send` follow-up events, which the engine
//! dispatches as fresh external cascades once the flush completes.

use std::fmt;

use smol_str::SmolStr;

use pte_core::Document;

use crate::EditorEvent;

type Thunk = Box<dyn FnOnce(&mut EffectContext<'_>) + Send>;

/// A side-effecting callback deferred until the end of a cascade.
pub struct Effect {
    label: Option<SmolStr>,
    thunk: Thunk,
}

impl Effect {
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce(&mut EffectContext<'_>) + Send + 'static,
    {
        Self { label: None, thunk: Box::new(thunk) }
    }

    /// Attach a label shown in logs and `Debug` output.
    pub fn named(mut self, label: &str) -> Self {
        self.label = Some(SmolStr::new(label));
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn run(self, ctx: &mut EffectContext<'_>) {
        (self.thunk)(ctx)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("label", &self.label).finish_non_exhaustive()
    }
}

/// What an effect sees when it runs.
pub struct EffectContext<'a> {
    document: &'a Document,
    outbox:   Vec<EditorEvent>,
}

impl<'a> EffectContext<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document, outbox: Vec::new() }
    }

    /// The document as it stands after the cascade.
    pub fn document(&self) -> &Document {
        self.document
    }

    /// Queue an event to dispatch after the flush.
    pub fn send(&mut self, event: EditorEvent) {
        self.outbox.push(event);
    }

    pub fn into_events(self) -> Vec<EditorEvent> {
        self.outbox
    }
}
