//! The document tree and its primitive mutators.
//!
//! `Document` is the only mutable state the engine owns besides the index.
//! Every mutator here is *primitive*: it performs one well-defined edit,
//! validates before touching anything, and returns the [`Operation`]s it
//! applied so the caller can replay them against the path index.
//!
//! Text offsets are counted in chars, never bytes.

use smol_str::SmolStr;

use crate::node::byte_offset;
use crate::{BlockKey, BlockPath, DocumentError, DocumentResult, KeyPath, Node, NodeKind, Operation};

// ── Selection ─────────────────────────────────────────────────────────────────

/// A caret position: a span (by key path) and a char offset inside it.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub path:   KeyPath,
    pub offset: usize,
}

impl Point {
    pub fn new(path: KeyPath, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    pub anchor: Point,
    pub focus:  Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self { anchor: point.clone(), focus: point }
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

// ── Document ──────────────────────────────────────────────────────────────────

/// Ordered top-level nodes plus the current selection.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub children:  Vec<Node>,
    pub selection: Option<Selection>,
    pub focused:   bool,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children, selection: None, focused: false }
    }

    /// Number of top-level nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes at every depth.
    pub fn node_count(&self) -> usize {
        self.children.iter().map(Node::subtree_len).sum()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn node_at(&self, path: &BlockPath) -> Option<&Node> {
        let mut siblings = &self.children;
        let mut found = None;
        for &i in &path.0 {
            let node = siblings.get(i)?;
            siblings = &node.children;
            found = Some(node);
        }
        found
    }

    /// Children of the node at `parent`, or the top-level list for the root.
    pub fn children_at(&self, parent: &BlockPath) -> Option<&[Node]> {
        if parent.is_root() {
            return Some(&self.children);
        }
        self.node_at(parent).map(|n| n.children.as_slice())
    }

    fn node_at_mut(&mut self, path: &BlockPath) -> Option<&mut Node> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    fn children_at_mut(&mut self, parent: &BlockPath) -> Option<&mut Vec<Node>> {
        if parent.is_root() {
            return Some(&mut self.children);
        }
        self.node_at_mut(parent).map(|n| &mut n.children)
    }

    /// Walk key segments down the tree.  O(depth × siblings).
    pub fn node_by_keys(&self, keys: &KeyPath) -> Option<&Node> {
        let path = self.resolve_keys(keys)?;
        self.node_at(&path)
    }

    /// Translate a key path to its current positional path by scanning.
    ///
    /// This is the slow path a `BlockPathIndex` exists to avoid; it is kept
    /// for mutators that must not depend on the index and as a test oracle.
    pub fn resolve_keys(&self, keys: &KeyPath) -> Option<BlockPath> {
        if keys.is_root() {
            return None;
        }
        let mut siblings = &self.children;
        let mut indices = Vec::with_capacity(keys.depth());
        for key in &keys.0 {
            let i = siblings.iter().position(|n| &n.key == key)?;
            indices.push(i);
            siblings = &siblings[i].children;
        }
        Some(BlockPath(indices))
    }

    /// Translate a positional path to the key path of the node there.
    pub fn key_path_of(&self, path: &BlockPath) -> Option<KeyPath> {
        if path.is_root() {
            return None;
        }
        let mut siblings = &self.children;
        let mut keys = Vec::with_capacity(path.depth());
        for &i in &path.0 {
            let node = siblings.get(i)?;
            keys.push(node.key.clone());
            siblings = &node.children;
        }
        Some(KeyPath(keys))
    }

    /// Depth-first search for the first node keyed `key`.
    pub fn find_key(&self, key: &BlockKey) -> Option<KeyPath> {
        fn search(nodes: &[Node], key: &BlockKey, trail: &mut Vec<BlockKey>) -> bool {
            for node in nodes {
                trail.push(node.key.clone());
                if &node.key == key || search(&node.children, key, trail) {
                    return true;
                }
                trail.pop();
            }
            false
        }
        let mut trail = Vec::new();
        search(&self.children, key, &mut trail).then_some(KeyPath(trail))
    }

    /// Visit every node in pre-order with both of its coordinates.
    pub fn for_each_node<F>(&self, mut f: F)
    where
        F: FnMut(&KeyPath, &BlockPath, &Node),
    {
        fn visit<F>(nodes: &[Node], keys: &mut KeyPath, path: &mut BlockPath, f: &mut F)
        where
            F: FnMut(&KeyPath, &BlockPath, &Node),
        {
            for (i, node) in nodes.iter().enumerate() {
                keys.0.push(node.key.clone());
                path.0.push(i);
                f(keys, path, node);
                visit(&node.children, keys, path, f);
                keys.0.pop();
                path.0.pop();
            }
        }
        visit(&self.children, &mut KeyPath::root(), &mut BlockPath::default(), &mut f);
    }

    /// Positional path of the top-level block containing the selection focus.
    pub fn focus_block(&self) -> Option<BlockPath> {
        let focus = &self.selection.as_ref()?.focus;
        let top = focus.path.0.first()?;
        let i = self.children.iter().position(|n| &n.key == top)?;
        Some(BlockPath(vec![i]))
    }

    // ── Structural mutators ───────────────────────────────────────────────

    /// Insert `node` (with its subtree) so that it ends up at `at`.
    pub fn insert_node(&mut self, at: &BlockPath, node: Node) -> DocumentResult<Vec<Operation>> {
        let (parent, index) = split_path(at)?;
        let siblings = self
            .children_at_mut(&parent)
            .ok_or(DocumentError::PathNotFound(parent))?;
        if index > siblings.len() {
            return Err(DocumentError::InvalidPosition { path: at.clone(), position: index });
        }
        if siblings.iter().any(|s| s.key == node.key) {
            return Err(DocumentError::DuplicateKey(node.key));
        }
        siblings.insert(index, node.clone());
        Ok(vec![Operation::InsertNode { path: at.clone(), node }])
    }

    /// Remove the node at `at` and its subtree.
    pub fn remove_node(&mut self, at: &BlockPath) -> DocumentResult<Vec<Operation>> {
        let (_, ops) = self.take_node(at)?;
        Ok(ops)
    }

    /// Remove the node at `at`, returning it along with the applied operations.
    pub fn take_node(&mut self, at: &BlockPath) -> DocumentResult<(Node, Vec<Operation>)> {
        let (parent, index) = split_path(at)?;
        let siblings = self
            .children_at_mut(&parent)
            .ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        if index >= siblings.len() {
            return Err(DocumentError::PathNotFound(at.clone()));
        }
        let node = siblings.remove(index);
        let mut ops = vec![Operation::RemoveNode { path: at.clone() }];
        self.repair_selection(&mut ops);
        Ok((node, ops))
    }

    /// Split the node at `at` into two siblings.  The new sibling is keyed
    /// `new_key` and placed right after `at`.
    ///
    /// - Spans split their text at char offset `position`.
    /// - Blocks and objects move `children[position..]` into the new sibling.
    pub fn split_node(
        &mut self,
        at:       &BlockPath,
        position: usize,
        new_key:  BlockKey,
    ) -> DocumentResult<Vec<Operation>> {
        let (parent, index) = split_path(at)?;
        let old_keys = self.key_path_of(at).ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        let siblings = self
            .children_at_mut(&parent)
            .ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        if siblings.iter().any(|s| s.key == new_key) {
            return Err(DocumentError::DuplicateKey(new_key));
        }
        let node = siblings
            .get_mut(index)
            .ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;

        let mut sibling = node.empty_like(new_key.clone());
        let moved = match &mut node.kind {
            NodeKind::Span { text, .. } => {
                let byte = byte_offset(text, position)
                    .ok_or_else(|| DocumentError::InvalidPosition { path: at.clone(), position })?;
                let tail = text.split_off(byte);
                if let NodeKind::Span { text: new_text, .. } = &mut sibling.kind {
                    *new_text = tail;
                }
                0
            }
            NodeKind::TextBlock { .. } | NodeKind::Object { .. } => {
                if position > node.children.len() {
                    return Err(DocumentError::InvalidPosition { path: at.clone(), position });
                }
                sibling.children = node.children.split_off(position);
                sibling.children.len()
            }
        };
        siblings.insert(index + 1, sibling);

        let new_path = at.sibling(index + 1).unwrap_or_default();
        let mut ops = vec![Operation::SplitNode { path: at.clone(), position, new_key: new_key.clone() }];
        for i in 0..moved {
            ops.push(Operation::MoveNode { from: at.child(position), to: new_path.child(i) });
        }

        // Carets past the split point follow the text into the new span.
        if let Some(sel) = &mut self.selection {
            let new_keys = old_keys.parent().unwrap_or_default().child(new_key);
            let mut changed = false;
            for point in [&mut sel.anchor, &mut sel.focus] {
                if moved == 0 && point.path == old_keys && point.offset >= position {
                    point.path = new_keys.clone();
                    point.offset -= position;
                    changed = true;
                }
            }
            if changed {
                ops.push(Operation::SetSelection { selection: self.selection.clone() });
            }
        }
        self.repair_selection(&mut ops);
        Ok(ops)
    }

    /// Merge the node at `at` into its previous sibling and remove it.
    ///
    /// Spans concatenate text; blocks and objects append their children.
    pub fn merge_node(&mut self, at: &BlockPath) -> DocumentResult<Vec<Operation>> {
        let (parent, index) = split_path(at)?;
        if index == 0 {
            return Err(DocumentError::NoPreviousSibling(at.clone()));
        }
        let old_keys = self.key_path_of(at).ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        let prev_path = at.sibling(index - 1).unwrap_or_default();
        let prev_keys = self.key_path_of(&prev_path).unwrap_or_default();

        let siblings = self
            .children_at_mut(&parent)
            .ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        if index >= siblings.len() {
            return Err(DocumentError::PathNotFound(at.clone()));
        }

        let mut ops = Vec::new();
        let position;
        {
            let (head, tail) = siblings.split_at_mut(index);
            let prev = &mut head[index - 1];
            let node = &mut tail[0];
            match (&mut prev.kind, &node.kind) {
                (NodeKind::Span { text: prev_text, .. }, NodeKind::Span { text, .. }) => {
                    position = prev_text.chars().count();
                    prev_text.push_str(text);
                }
                (NodeKind::TextBlock { .. }, NodeKind::TextBlock { .. })
                | (NodeKind::Object { .. }, NodeKind::Object { .. }) => {
                    if let Some(dup) = node
                        .children
                        .iter()
                        .find(|c| prev.children.iter().any(|p| p.key == c.key))
                    {
                        return Err(DocumentError::DuplicateKey(dup.key.clone()));
                    }
                    position = prev.children.len();
                    for i in 0..node.children.len() {
                        ops.push(Operation::MoveNode {
                            from: at.child(0),
                            to:   prev_path.child(position + i),
                        });
                    }
                    prev.children.append(&mut node.children);
                }
                _ => return Err(DocumentError::IncompatibleMerge(at.clone())),
            }
        }
        siblings.remove(index);
        ops.push(Operation::MergeNode { path: at.clone(), position });

        if let Some(sel) = &mut self.selection {
            let mut changed = false;
            for point in [&mut sel.anchor, &mut sel.focus] {
                if point.path == old_keys {
                    point.path = prev_keys.clone();
                    point.offset += position;
                    changed = true;
                }
            }
            if changed {
                ops.push(Operation::SetSelection { selection: self.selection.clone() });
            }
        }
        self.repair_selection(&mut ops);
        Ok(ops)
    }

    /// Move the node at `from` to `to`.  `to` is interpreted after the node
    /// has been taken out, so moving a node onto its own path is a no-op.
    ///
    /// On failure the document is left unchanged.
    pub fn move_node(&mut self, from: &BlockPath, to: &BlockPath) -> DocumentResult<Vec<Operation>> {
        let (from_parent, from_index) = split_path(from)?;
        let (to_parent, to_index) = split_path(to)?;
        let siblings = self
            .children_at_mut(&from_parent)
            .ok_or_else(|| DocumentError::PathNotFound(from.clone()))?;
        if from_index >= siblings.len() {
            return Err(DocumentError::PathNotFound(from.clone()));
        }
        let node = siblings.remove(from_index);

        let target_ok = match self.children_at_mut(&to_parent) {
            Some(target) if to_index <= target.len() => {
                if target.iter().any(|s| s.key == node.key) {
                    Err(DocumentError::DuplicateKey(node.key.clone()))
                } else {
                    Ok(())
                }
            }
            Some(_) => Err(DocumentError::InvalidPosition { path: to.clone(), position: to_index }),
            None => Err(DocumentError::PathNotFound(to_parent.clone())),
        };
        if let Err(e) = target_ok {
            if let Some(siblings) = self.children_at_mut(&from_parent) {
                siblings.insert(from_index, node);
            }
            return Err(e);
        }
        if let Some(target) = self.children_at_mut(&to_parent) {
            target.insert(to_index, node);
        }

        let mut ops = vec![Operation::MoveNode { from: from.clone(), to: to.clone() }];
        self.repair_selection(&mut ops);
        Ok(ops)
    }

    /// Give the node at `at` a new key.
    pub fn set_key(&mut self, at: &BlockPath, new_key: BlockKey) -> DocumentResult<Vec<Operation>> {
        let (parent, index) = split_path(at)?;
        let old_keys = self.key_path_of(at).ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        let siblings = self
            .children_at_mut(&parent)
            .ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        if siblings
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.key == new_key)
        {
            return Err(DocumentError::DuplicateKey(new_key));
        }
        let node = siblings
            .get_mut(index)
            .ok_or_else(|| DocumentError::PathNotFound(at.clone()))?;
        let old_key = std::mem::replace(&mut node.key, new_key.clone());

        let mut ops = vec![Operation::SetKey { path: at.clone(), old_key, new_key: new_key.clone() }];
        if let Some(sel) = &mut self.selection {
            let depth = old_keys.depth();
            let mut changed = false;
            for point in [&mut sel.anchor, &mut sel.focus] {
                if old_keys.is_prefix_of(&point.path) {
                    point.path.0[depth - 1] = new_key.clone();
                    changed = true;
                }
            }
            if changed {
                ops.push(Operation::SetSelection { selection: self.selection.clone() });
            }
        }
        Ok(ops)
    }

    // ── Text, marks, props, selection ─────────────────────────────────────

    /// Insert `text` into the span at `point`.  Carets at or after the
    /// insertion point in the same span shift right.
    pub fn insert_text(&mut self, point: &Point, text: &str) -> DocumentResult<Vec<Operation>> {
        let span_text = self.span_text_mut(&point.path)?;
        let byte = byte_offset(span_text, point.offset).ok_or_else(|| DocumentError::InvalidOffset {
            path:   point.path.clone(),
            offset: point.offset,
        })?;
        span_text.insert_str(byte, text);

        let inserted = text.chars().count();
        let mut ops = vec![Operation::InsertText {
            path:   point.path.clone(),
            offset: point.offset,
            text:   text.to_owned(),
        }];
        self.shift_carets(&point.path, |offset| {
            if offset >= point.offset { offset + inserted } else { offset }
        }, &mut ops);
        Ok(ops)
    }

    /// Remove `len` chars starting at `offset` from the span at `path`.
    pub fn remove_text(&mut self, path: &KeyPath, offset: usize, len: usize) -> DocumentResult<Vec<Operation>> {
        let span_text = self.span_text_mut(path)?;
        let start = byte_offset(span_text, offset)
            .ok_or_else(|| DocumentError::InvalidOffset { path: path.clone(), offset })?;
        let end = byte_offset(span_text, offset + len).ok_or_else(|| DocumentError::InvalidOffset {
            path:   path.clone(),
            offset: offset + len,
        })?;
        let removed: String = span_text.drain(start..end).collect();

        let mut ops = vec![Operation::RemoveText { path: path.clone(), offset, text: removed }];
        self.shift_carets(path, |o| {
            if o >= offset + len {
                o - len
            } else if o > offset {
                offset
            } else {
                o
            }
        }, &mut ops);
        Ok(ops)
    }

    /// Replace the marks of the span at `path`.
    pub fn set_marks(&mut self, path: &KeyPath, new_marks: Vec<SmolStr>) -> DocumentResult<Vec<Operation>> {
        let node = self.node_by_keys_mut(path)?;
        match &mut node.kind {
            NodeKind::Span { marks, .. } => *marks = new_marks.clone(),
            _ => return Err(DocumentError::NotASpan(path.clone())),
        }
        Ok(vec![Operation::SetMarks { path: path.clone(), marks: new_marks }])
    }

    /// Change the style and/or list item of the text block at `path`.
    /// `None` leaves the respective property untouched; an empty list item
    /// clears it.
    pub fn set_block_props(
        &mut self,
        path:          &KeyPath,
        new_style:     Option<SmolStr>,
        new_list_item: Option<SmolStr>,
    ) -> DocumentResult<Vec<Operation>> {
        let node = self.node_by_keys_mut(path)?;
        let NodeKind::TextBlock { style, list_item, .. } = &mut node.kind else {
            return Err(DocumentError::NotATextBlock(path.clone()));
        };
        if let Some(s) = &new_style {
            *style = s.clone();
        }
        if let Some(item) = &new_list_item {
            *list_item = (!item.is_empty()).then(|| item.clone());
        }
        Ok(vec![Operation::SetProps { path: path.clone(), style: new_style, list_item: new_list_item }])
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) -> Vec<Operation> {
        self.selection = selection.clone();
        vec![Operation::SetSelection { selection }]
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn node_by_keys_mut(&mut self, keys: &KeyPath) -> DocumentResult<&mut Node> {
        let path = self
            .resolve_keys(keys)
            .ok_or_else(|| DocumentError::KeyNotFound(keys.clone()))?;
        self.node_at_mut(&path)
            .ok_or_else(|| DocumentError::KeyNotFound(keys.clone()))
    }

    fn span_text_mut(&mut self, keys: &KeyPath) -> DocumentResult<&mut String> {
        match &mut self.node_by_keys_mut(keys)?.kind {
            NodeKind::Span { text, .. } => Ok(text),
            _ => Err(DocumentError::NotASpan(keys.clone())),
        }
    }

    fn shift_carets<F>(&mut self, span: &KeyPath, shift: F, ops: &mut Vec<Operation>)
    where
        F: Fn(usize) -> usize,
    {
        let Some(sel) = &mut self.selection else { return };
        let mut changed = false;
        for point in [&mut sel.anchor, &mut sel.focus] {
            if &point.path == span {
                let shifted = shift(point.offset);
                changed |= shifted != point.offset;
                point.offset = shifted;
            }
        }
        if changed {
            ops.push(Operation::SetSelection { selection: self.selection.clone() });
        }
    }

    /// Re-resolve selection points after a structural edit.  A point whose
    /// key path went stale is relocated by its span key; if the span is gone
    /// the selection is cleared.
    fn repair_selection(&mut self, ops: &mut Vec<Operation>) {
        let Some(sel) = &self.selection else { return };
        let fixed = [&sel.anchor, &sel.focus].map(|point| {
            if self.resolve_keys(&point.path).is_some() {
                return Some(point.clone());
            }
            let key = point.path.key()?;
            self.find_key(key).map(|path| Point::new(path, point.offset))
        });
        let repaired = match fixed {
            [Some(anchor), Some(focus)] => Some(Selection { anchor, focus }),
            _ => None,
        };
        if repaired.as_ref() != self.selection.as_ref() {
            self.selection = repaired;
            ops.push(Operation::SetSelection { selection: self.selection.clone() });
        }
    }
}

/// Split a non-root path into (parent path, index among siblings).
fn split_path(path: &BlockPath) -> DocumentResult<(BlockPath, usize)> {
    let index = path.last().ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
    Ok((path.parent().unwrap_or_default(), index))
}
