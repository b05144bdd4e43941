//! Fluent builder for constructing an [`Engine`].

use pte_behavior::{Behavior, BehaviorRegistry, BehaviorSet, PrioritizedBehavior};
use pte_core::{Document, EngineConfig, KeyGenerator, SeededKeys};
use pte_index::BlockPathIndex;
use pte_priority::Priority;
use tracing::debug;

use crate::{CommandTable, DispatchPhase, Engine, EngineError, EngineResult};

/// Fluent builder for [`Engine`].
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                  |
/// |------------------------|------------------------------------------|
/// | `.config(c)`           | `EngineConfig::default()`                |
/// | `.commands(t)`         | `CommandTable::standard()`               |
/// | `.key_generator(k)`    | `SeededKeys::new(config.key_seed)`       |
/// | `.behavior(b, p)`      | none                                     |
/// | `.set(&s)`             | none                                     |
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = EngineBuilder::new(document)
///     .config(config)
///     .set(&CoreBehaviors::new())
///     .behavior(auto_bold, Some(Priority::new().higher_than(core.priority())))
///     .build()?;
/// engine.send(EditorEvent::text("hello"))?;
/// ```
pub struct EngineBuilder {
    document:  Document,
    config:    EngineConfig,
    commands:  Option<CommandTable>,
    keys:      Option<Box<dyn KeyGenerator>>,
    behaviors: Vec<PrioritizedBehavior>,
}

impl EngineBuilder {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            config:    EngineConfig::default(),
            commands:  None,
            keys:      None,
            behaviors: Vec::new(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the standard command table.
    pub fn commands(mut self, commands: CommandTable) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Use `keys` instead of a generator seeded from `config.key_seed`.
    pub fn key_generator<K: KeyGenerator + 'static>(mut self, keys: K) -> Self {
        self.keys = Some(Box::new(keys));
        self
    }

    /// Queue a behavior for registration.  Behaviors register in the order
    /// they were added to the builder.
    pub fn behavior(mut self, behavior: Behavior, priority: Option<Priority>) -> Self {
        self.behaviors.push(PrioritizedBehavior::new(behavior, priority));
        self
    }

    /// Queue every behavior of `set`.
    pub fn set<S: BehaviorSet + ?Sized>(mut self, set: &S) -> Self {
        let behaviors = set.behaviors();
        debug!(set = set.name(), count = behaviors.len(), "queued behavior set");
        self.behaviors.extend(behaviors);
        self
    }

    /// Validate the configuration, index the document, register the queued
    /// behaviors, and return a ready engine.
    pub fn build(self) -> EngineResult<Engine> {
        if self.config.max_cascade_depth == 0 {
            return Err(EngineError::Config("max_cascade_depth must be at least 1".into()));
        }
        if self.config.max_cascade_events == 0 {
            return Err(EngineError::Config("max_cascade_events must be at least 1".into()));
        }

        let mut registry = BehaviorRegistry::new();
        for PrioritizedBehavior { behavior, priority } in self.behaviors {
            registry.add(behavior, priority)?;
        }

        let keys = self.keys.unwrap_or_else(|| Box::new(SeededKeys::new(self.config.key_seed)));
        Ok(Engine {
            index: BlockPathIndex::from_document(&self.document),
            document: self.document,
            registry,
            commands: self.commands.unwrap_or_else(CommandTable::standard),
            keys,
            config: self.config,
            phase: DispatchPhase::Idle,
        })
    }
}
