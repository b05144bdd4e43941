//! Node identity and position.
//!
//! Every node carries a [`BlockKey`] that never changes while the node lives
//! (except through an explicit rekey).  Two coordinate systems address nodes:
//!
//! | Type        | Segments          | Stable across edits? |
//! |-------------|-------------------|----------------------|
//! | [`KeyPath`] | keys, root → node | yes                  |
//! | [`BlockPath`]| child indices    | no, valid until the next structural edit |
//!
//! Both always have the same length for the same node.

use std::fmt;

use smol_str::SmolStr;

// ── BlockKey ──────────────────────────────────────────────────────────────────

/// Stable identity of a single node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockKey(pub SmolStr);

impl BlockKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(SmolStr::new(key))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for BlockKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── KeyPath ───────────────────────────────────────────────────────────────────

/// Ordered list of keys from the document root down to a node.
///
/// The empty key path addresses the document root itself.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyPath(pub Vec<BlockKey>);

impl KeyPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Key path of a top-level node.
    pub fn top(key: impl Into<BlockKey>) -> Self {
        Self(vec![key.into()])
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The node's own key, `None` for the root.
    pub fn key(&self) -> Option<&BlockKey> {
        self.0.last()
    }

    /// Key path of the parent, `None` for the root.
    pub fn parent(&self) -> Option<KeyPath> {
        let (_, head) = self.0.split_last()?;
        Some(KeyPath(head.to_vec()))
    }

    /// Extend by one segment.
    pub fn child(&self, key: BlockKey) -> KeyPath {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(key);
        KeyPath(segments)
    }

    /// `true` if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &KeyPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for KeyPath {
    /// Deterministic serialization: `[k0][k1]…`.  Brackets keep keys that
    /// contain separators unambiguous.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "[{key}]")?;
        }
        Ok(())
    }
}

impl<K: Into<BlockKey>> FromIterator<K> for KeyPath {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        KeyPath(iter.into_iter().map(Into::into).collect())
    }
}

// ── BlockPath ─────────────────────────────────────────────────────────────────

/// Ordered list of child indices from the document root down to a node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockPath(pub Vec<usize>);

impl BlockPath {
    pub fn new(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Index among siblings, `None` for the root.
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<BlockPath> {
        let (_, head) = self.0.split_last()?;
        Some(BlockPath(head.to_vec()))
    }

    pub fn child(&self, index: usize) -> BlockPath {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        BlockPath(indices)
    }

    /// Same parent, different final index.  Returns `None` for the root.
    pub fn sibling(&self, index: usize) -> Option<BlockPath> {
        let mut indices = self.0.clone();
        *indices.last_mut()? = index;
        Some(BlockPath(indices))
    }

    /// `true` if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &BlockPath) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<usize>> for BlockPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl<const N: usize> From<[usize; N]> for BlockPath {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}
