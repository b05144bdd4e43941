//! The queue of effects collected during one cascade.

use pte_behavior::Effect;

/// Effects in the order their actions produced them.
///
/// Returned undrained by [`Engine::dispatch`][crate::Engine::dispatch];
/// hand it back to [`Engine::flush`][crate::Engine::flush] or drain it
/// yourself.
#[derive(Debug, Default)]
pub struct EffectQueue {
    effects: Vec<Effect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Labels in queue order; unlabelled effects show as `None`.
    pub fn labels(&self) -> Vec<Option<&str>> {
        self.effects.iter().map(Effect::label).collect()
    }

    /// Move every effect of `other` to the back of this queue.
    pub fn append(&mut self, other: &mut EffectQueue) {
        self.effects.append(&mut other.effects);
    }
}

impl IntoIterator for EffectQueue {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.into_iter()
    }
}

impl Extend<Effect> for EffectQueue {
    fn extend<I: IntoIterator<Item = Effect>>(&mut self, iter: I) {
        self.effects.extend(iter);
    }
}
