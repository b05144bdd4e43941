//! Engine configuration.

/// Top-level engine configuration.
///
/// Typically loaded from a JSON file by the application crate and passed to
/// the engine builder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Maximum nesting of `Raise` inside one cascade.  A behavior that keeps
    /// raising events into itself fails with a depth error at this point
    /// instead of overflowing the stack.  Default: 64.
    pub max_cascade_depth: usize,

    /// Maximum number of events (external + raised + forwarded) processed in
    /// one cascade.  Catches wide loops that never get deep.  Default: 10,000.
    pub max_cascade_events: usize,

    /// Seed for the engine's key generator.  The same seed always produces
    /// the same keys for the same event sequence.
    pub key_seed: u64,

    /// When an operation cannot be applied to the path index, rebuild the
    /// index from the document instead of leaving it as-is.  Default: false.
    pub rebuild_index_on_error: bool,

    /// Execute the primitive command for an event that no behavior matched.
    /// When false, unmatched events are dropped.  Default: true.
    pub fall_through_unhandled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth:      64,
            max_cascade_events:     10_000,
            key_seed:               0,
            rebuild_index_on_error: false,
            fall_through_unhandled: true,
        }
    }
}
