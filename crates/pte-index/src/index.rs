//! `BlockPathIndex` — key path → positional path, kept in step with edits.
//!
//! # Storage
//!
//! ```text
//! paths:    KeyPath → BlockPath          one entry per node, any depth
//! children: KeyPath → [BlockKey]         ordered child keys per non-leaf
//!                                        (the empty key path is the root)
//! ```
//!
//! `paths` answers `get`/`has` in O(1).  `children` makes the index
//! self-sufficient: it can resolve a positional path back to a key path and
//! enumerate the subtree under any node without consulting the document,
//! so every structural update only touches the entries that actually move.
//!
//! # Updates
//!
//! Every `on_*` method validates first and mutates second: on `Err` the
//! index is exactly as it was before the call.  A sibling shift rewrites one
//! component of each affected path (the component at the shifted depth), for
//! the shifted siblings and all of their descendants.

use rustc_hash::FxHashMap;
use tracing::trace;

use pte_core::{BlockKey, BlockPath, Document, KeyPath, Node, Operation};

use crate::{IndexError, IndexResult};

/// Key skeleton of a subtree that is being moved or inserted.
#[derive(Clone, Debug)]
struct KeyTree {
    key:      BlockKey,
    children: Vec<KeyTree>,
}

impl KeyTree {
    fn leaf(key: BlockKey) -> Self {
        Self { key, children: Vec::new() }
    }

    fn of(node: &Node) -> Self {
        Self {
            key:      node.key.clone(),
            children: node.children.iter().map(KeyTree::of).collect(),
        }
    }
}

/// Bidirectional map between the key path and the positional path of every
/// node in a document.
///
/// Two indexes compare equal when they hold the same entries, which is how
/// the incremental updates are checked against [`rebuild`][Self::rebuild].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockPathIndex {
    paths:    FxHashMap<KeyPath, BlockPath>,
    children: FxHashMap<KeyPath, Vec<BlockKey>>,
}

impl BlockPathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: &Document) -> Self {
        let mut index = Self::new();
        index.rebuild(doc);
        index
    }

    /// Discard all entries and re-index `doc` from scratch.  O(n).
    pub fn rebuild(&mut self, doc: &Document) {
        self.paths.clear();
        self.children.clear();
        let Self { paths, children } = self;
        doc.for_each_node(|keys, path, node| {
            paths.insert(keys.clone(), path.clone());
            children
                .entry(keys.parent().unwrap_or_default())
                .or_default()
                .push(node.key.clone());
        });
        trace!(entries = self.paths.len(), "index rebuilt");
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn get(&self, keys: &KeyPath) -> Option<&BlockPath> {
        self.paths.get(keys)
    }

    #[inline]
    pub fn has(&self, keys: &KeyPath) -> bool {
        self.paths.contains_key(keys)
    }

    /// Number of indexed nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All `(key path, positional path)` pairs, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&KeyPath, &BlockPath)> + '_ {
        self.paths.iter()
    }

    /// Reverse lookup.  O(depth).
    pub fn key_path_at(&self, path: &BlockPath) -> Option<KeyPath> {
        if path.is_root() {
            return None;
        }
        let mut keys = KeyPath(Vec::with_capacity(path.depth()));
        for &i in &path.0 {
            let key = self.children.get(&keys)?.get(i)?.clone();
            keys.0.push(key);
        }
        Some(keys)
    }

    /// Ordered child keys of `parent` (the root for an empty key path).
    pub fn children_of(&self, parent: &KeyPath) -> &[BlockKey] {
        self.children.get(parent).map_or(&[], Vec::as_slice)
    }

    // ── Incremental updates ───────────────────────────────────────────────

    /// A childless node keyed `key` now lives at `at`.  Later siblings shift
    /// right by one.
    pub fn on_insert(&mut self, at: &BlockPath, key: BlockKey) -> IndexResult<()> {
        self.attach(at, KeyTree::leaf(key)).map_err(|(err, _)| err)
    }

    /// The node at `at` and its subtree are gone.  Later siblings shift left.
    pub fn on_remove(&mut self, at: &BlockPath) -> IndexResult<()> {
        self.detach(at).map(drop)
    }

    /// A new sibling keyed `new_key` was created right after `at`.
    pub fn on_split(&mut self, at: &BlockPath, new_key: BlockKey) -> IndexResult<()> {
        let next = match (at.last(), self.key_path_at(at)) {
            (Some(index), Some(_)) => at.sibling(index + 1).unwrap_or_default(),
            _ => return Err(IndexError::PathNotFound(at.clone())),
        };
        self.on_insert(&next, new_key)
    }

    /// The node at `at` was merged into its previous sibling.
    pub fn on_merge(&mut self, at: &BlockPath) -> IndexResult<()> {
        self.on_remove(at)
    }

    /// Remove at `from`, then reinsert the same subtree at `to`.
    ///
    /// `to` is read against the state *after* the removal, so adjacent swaps
    /// and moves onto the node's own position come out right.
    pub fn on_move(&mut self, from: &BlockPath, to: &BlockPath) -> IndexResult<()> {
        let tree = self.detach(from)?;
        match self.attach(to, tree) {
            Ok(()) => Ok(()),
            Err((err, tree)) => {
                self.attach(from, tree).map_err(|(restore, _)| restore)?;
                Err(err)
            }
        }
    }

    /// The node at `at` changed key.  Every entry below it is re-keyed too.
    pub fn on_rename(&mut self, at: &BlockPath, old_key: &BlockKey, new_key: &BlockKey) -> IndexResult<()> {
        let keys = self
            .key_path_at(at)
            .ok_or_else(|| IndexError::PathNotFound(at.clone()))?;
        let parent = keys.parent().unwrap_or_default();
        if keys.key() != Some(old_key) {
            return Err(IndexError::KeyNotFound(parent.child(old_key.clone())));
        }
        if old_key == new_key {
            return Ok(());
        }
        let renamed = parent.child(new_key.clone());
        if self.paths.contains_key(&renamed) {
            return Err(IndexError::DuplicateKey(renamed));
        }

        let segment = parent.depth();
        for old in self.subtree_keys(&keys) {
            let mut new = old.clone();
            new.0[segment] = new_key.clone();
            if let Some(path) = self.paths.remove(&old) {
                self.paths.insert(new.clone(), path);
            }
            if let Some(list) = self.children.remove(&old) {
                self.children.insert(new, list);
            }
        }
        if let (Some(list), Some(index)) = (self.children.get_mut(&parent), at.last()) {
            list[index] = new_key.clone();
        }
        Ok(())
    }

    /// Replay one operation.  Text, mark, prop and selection operations are
    /// ignored without touching the map.
    pub fn apply_operation(&mut self, op: &Operation) -> IndexResult<()> {
        if !op.is_structural() {
            return Ok(());
        }
        trace!(op = op.kind(), "index update");
        match op {
            Operation::InsertNode { path, node } => {
                self.attach(path, KeyTree::of(node)).map_err(|(err, _)| err)
            }
            Operation::RemoveNode { path } => self.on_remove(path),
            Operation::SplitNode { path, new_key, .. } => self.on_split(path, new_key.clone()),
            Operation::MergeNode { path, .. } => self.on_merge(path),
            Operation::MoveNode { from, to } => self.on_move(from, to),
            Operation::SetKey { path, old_key, new_key } => self.on_rename(path, old_key, new_key),
            _ => Ok(()),
        }
    }

    /// Replay a batch, stopping at the first failure.
    pub fn apply_operations<'a, I>(&mut self, ops: I) -> IndexResult<()>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        ops.into_iter().try_for_each(|op| self.apply_operation(op))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Key paths of `root` and everything below it.
    fn subtree_keys(&self, root: &KeyPath) -> Vec<KeyPath> {
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(keys) = stack.pop() {
            if let Some(kids) = self.children.get(&keys) {
                stack.extend(kids.iter().map(|k| keys.child(k.clone())));
            }
            out.push(keys);
        }
        out
    }

    /// Re-sync the positional component of every subtree under
    /// `parent.children[from..]` with its current sibling index.
    fn renumber(&mut self, parent: &KeyPath, from: usize) {
        let slot = parent.depth();
        let Some(siblings) = self.children.get(parent) else { return };
        let shifted: Vec<(usize, KeyPath)> = siblings
            .iter()
            .enumerate()
            .skip(from)
            .map(|(i, key)| (i, parent.child(key.clone())))
            .collect();
        for (index, keys) in shifted {
            for member in self.subtree_keys(&keys) {
                if let Some(path) = self.paths.get_mut(&member) {
                    path.0[slot] = index;
                }
            }
        }
    }

    /// Insert `tree` at `at`.  On failure the tree is handed back unchanged.
    fn attach(&mut self, at: &BlockPath, tree: KeyTree) -> Result<(), (IndexError, KeyTree)> {
        let Some(index) = at.last() else {
            return Err((IndexError::PathNotFound(at.clone()), tree));
        };
        let parent_path = at.parent().unwrap_or_default();
        let parent = if parent_path.is_root() {
            KeyPath::root()
        } else {
            match self.key_path_at(&parent_path) {
                Some(keys) => keys,
                None => return Err((IndexError::PathNotFound(parent_path), tree)),
            }
        };
        let len = self.children_of(&parent).len();
        if index > len {
            return Err((IndexError::PositionOutOfBounds { path: at.clone(), len }, tree));
        }
        let keys = parent.child(tree.key.clone());
        if self.paths.contains_key(&keys) {
            return Err((IndexError::DuplicateKey(keys), tree));
        }

        self.children
            .entry(parent.clone())
            .or_default()
            .insert(index, tree.key.clone());
        self.renumber(&parent, index + 1);
        self.record(keys, at.clone(), tree);
        Ok(())
    }

    fn record(&mut self, keys: KeyPath, path: BlockPath, tree: KeyTree) {
        if !tree.children.is_empty() {
            let kids = tree.children.iter().map(|c| c.key.clone()).collect();
            self.children.insert(keys.clone(), kids);
        }
        for (i, child) in tree.children.into_iter().enumerate() {
            self.record(keys.child(child.key.clone()), path.child(i), child);
        }
        self.paths.insert(keys, path);
    }

    /// Remove the subtree at `at` and return its key skeleton.
    fn detach(&mut self, at: &BlockPath) -> IndexResult<KeyTree> {
        let (Some(index), Some(keys)) = (at.last(), self.key_path_at(at)) else {
            return Err(IndexError::PathNotFound(at.clone()));
        };
        let parent = keys.parent().unwrap_or_default();
        let key = keys.key().cloned().unwrap_or_else(|| BlockKey::new(""));
        let tree = self.take(&keys, key);

        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.remove(index);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
        self.renumber(&parent, index);
        Ok(tree)
    }

    fn take(&mut self, keys: &KeyPath, key: BlockKey) -> KeyTree {
        self.paths.remove(keys);
        let kids = self.children.remove(keys).unwrap_or_default();
        let children = kids
            .into_iter()
            .map(|k| self.take(&keys.child(k.clone()), k))
            .collect();
        KeyTree { key, children }
    }
}
