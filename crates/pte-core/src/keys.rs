//! Key generation for nodes created during editing.
//!
//! # Determinism strategy
//!
//! Splits, pastes, and inserted blocks all need fresh keys.  Keys come from a
//! [`KeyGenerator`] owned by the engine, never from ambient randomness, so
//! two engines built with the same seed and fed the same events produce the
//! same documents key for key.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::BlockKey;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Length of a generated key in hex chars.
const KEY_LEN: usize = 12;

/// Source of fresh node keys.
pub trait KeyGenerator: Send {
    fn next_key(&mut self) -> BlockKey;
}

// ── SeededKeys ────────────────────────────────────────────────────────────────

/// Random 12-hex-char keys from a seeded `SmallRng`.
pub struct SeededKeys(SmallRng);

impl SeededKeys {
    pub fn new(seed: u64) -> Self {
        SeededKeys(SmallRng::seed_from_u64(seed ^ MIXING_CONSTANT))
    }
}

impl KeyGenerator for SeededKeys {
    fn next_key(&mut self) -> BlockKey {
        let bits: u64 = self.0.r#gen();
        let hex = format!("{bits:016x}");
        BlockKey::new(&hex[..KEY_LEN])
    }
}

// ── SequentialKeys ────────────────────────────────────────────────────────────

/// `prefix0`, `prefix1`, …: readable keys for tests and demos.
pub struct SequentialKeys {
    prefix: String,
    next:   u64,
}

impl SequentialKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: 0 }
    }
}

impl KeyGenerator for SequentialKeys {
    fn next_key(&mut self) -> BlockKey {
        let key = BlockKey::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        key
    }
}
