//! `CommandTable` — event type name → primitive document mutator.
//!
//! Commands are the only code that mutates the document during a cascade.
//! Each one receives the event that triggered it and returns the operations
//! it applied, which the engine replays against the path index.
//!
//! # Standard commands
//!
//! | Command            | Effect                                                      |
//! |--------------------|-------------------------------------------------------------|
//! | `insert.text`      | Replace the selection (single span) and insert at the caret |
//! | `delete.backward`  | Remove the char before the caret, or merge into the previous block |
//! | `delete.forward`   | Remove the char after the caret, or merge the next block in |
//! | `insert.block`     | Insert a block at a fixed index or after the focus block    |
//! | `delete.block`     | Remove a block by key path                                  |
//! | `split.block`      | Split the focus block at the caret                          |
//! | `merge.block`      | Merge a block into its previous sibling                     |
//! | `move.block`       | Move a top-level block to a new index                       |
//! | `block.set`        | Set style and list item of a text block                     |
//! | `block.rekey`      | Give a node a new key                                       |
//! | `decorator.add`    | Add a mark to every selected span (splitting at the edges)  |
//! | `decorator.remove` | Remove a mark from every selected span                      |
//! | `select`           | Replace the selection                                       |
//! | `focus` / `blur`   | Toggle `Document::focused`                                  |
//!
//! Selections that cross blocks are only supported by `select`; the text
//! and decorator commands reject them with `DocumentError::InvalidRange`.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use pte_behavior::{EditorEvent, Placement};
use pte_core::{
    BlockPath, Document, DocumentError, DocumentResult, KeyGenerator, KeyPath, Node, Operation, Point,
    Selection,
};

/// Signature of a primitive command.
pub type CommandFn =
    dyn Fn(&mut Document, &EditorEvent, &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> + Send + Sync;

/// Command lookup table keyed by event type name.
#[derive(Clone, Default)]
pub struct CommandTable {
    commands: FxHashMap<SmolStr, Arc<CommandFn>>,
}

impl CommandTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with a command for every synthetic event.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table
            .insert("insert.text", insert_text)
            .insert("delete.backward", delete_backward)
            .insert("delete.forward", delete_forward)
            .insert("insert.block", insert_block)
            .insert("delete.block", delete_block)
            .insert("split.block", split_block)
            .insert("merge.block", merge_block)
            .insert("move.block", move_block)
            .insert("block.set", block_set)
            .insert("block.rekey", block_rekey)
            .insert("decorator.add", |doc, ev, keys| match ev {
                EditorEvent::DecoratorAdd { decorator } => decorate(doc, keys, decorator, true),
                _ => Ok(Vec::new()),
            })
            .insert("decorator.remove", |doc, ev, keys| match ev {
                EditorEvent::DecoratorRemove { decorator } => decorate(doc, keys, decorator, false),
                _ => Ok(Vec::new()),
            })
            .insert("select", select)
            .insert("focus", |doc, _, _| {
                doc.focused = true;
                Ok(Vec::new())
            })
            .insert("blur", |doc, _, _| {
                doc.focused = false;
                Ok(Vec::new())
            });
        table
    }

    /// Register or replace the command for `name`.
    pub fn insert<F>(&mut self, name: &str, command: F) -> &mut Self
    where
        F: Fn(&mut Document, &EditorEvent, &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>>
            + Send
            + Sync
            + 'static,
    {
        self.commands.insert(SmolStr::new(name), Arc::new(command));
        self
    }

    /// Builder form of [`insert`][Self::insert].
    pub fn with<F>(mut self, name: &str, command: F) -> Self
    where
        F: Fn(&mut Document, &EditorEvent, &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>>
            + Send
            + Sync
            + 'static,
    {
        self.insert(name, command);
        self
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandFn>> {
        self.commands.get(name).cloned()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(SmolStr::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable").field("commands", &self.names()).finish()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn selection(doc: &Document) -> DocumentResult<Selection> {
    doc.selection.clone().ok_or(DocumentError::NoSelection)
}

fn resolve(doc: &Document, keys: &KeyPath) -> DocumentResult<BlockPath> {
    doc.resolve_keys(keys).ok_or_else(|| DocumentError::KeyNotFound(keys.clone()))
}

/// `(block, child)` indices of a point that sits in a child of a top-level
/// block.
fn locate(doc: &Document, point: &Point) -> DocumentResult<(usize, usize)> {
    let path = resolve(doc, &point.path)?;
    match path.0[..] {
        [block, child] => Ok((block, child)),
        _ => Err(DocumentError::NotASpan(point.path.clone())),
    }
}

fn text_len_at(doc: &Document, block: usize, child: usize) -> usize {
    doc.node_at(&BlockPath::from([block, child])).map_or(0, Node::text_len)
}

/// Key path of `children[child]` of top-level block `block`.
fn child_keys(doc: &Document, block: usize, child: usize) -> DocumentResult<KeyPath> {
    let path = BlockPath::from([block, child]);
    doc.key_path_of(&path).ok_or(DocumentError::PathNotFound(path))
}

/// Delete an expanded selection inside one span and return the caret left
/// behind.  A collapsed selection is returned as-is.
fn collapse(doc: &mut Document, ops: &mut Vec<Operation>) -> DocumentResult<Point> {
    let sel = selection(doc)?;
    if sel.is_collapsed() {
        return Ok(sel.focus);
    }
    if sel.anchor.path != sel.focus.path {
        return Err(DocumentError::InvalidRange);
    }
    let start = sel.anchor.offset.min(sel.focus.offset);
    let len = sel.anchor.offset.max(sel.focus.offset) - start;
    ops.extend(doc.remove_text(&sel.focus.path, start, len)?);
    Ok(Point::new(sel.focus.path, start))
}

// ── Text ──────────────────────────────────────────────────────────────────────

fn insert_text(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::InsertText { text } = ev else { return Ok(Vec::new()) };
    let mut ops = Vec::new();
    let caret = collapse(doc, &mut ops)?;
    ops.extend(doc.insert_text(&caret, text)?);
    Ok(ops)
}

fn delete_backward(doc: &mut Document, _: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let sel = selection(doc)?;
    let mut ops = Vec::new();
    if !sel.is_collapsed() {
        collapse(doc, &mut ops)?;
        return Ok(ops);
    }
    let caret = sel.focus;
    if caret.offset > 0 {
        return doc.remove_text(&caret.path, caret.offset - 1, 1);
    }

    let (block, child) = locate(doc, &caret)?;
    if child > 0 {
        let prev_len = text_len_at(doc, block, child - 1);
        if prev_len == 0 {
            return Ok(ops);
        }
        let prev = child_keys(doc, block, child - 1)?;
        return doc.remove_text(&prev, prev_len - 1, 1);
    }

    // Caret at the very start of a block: join it onto the previous one.
    let mergeable = block > 0
        && doc.children.get(block - 1).is_some_and(Node::is_text_block)
        && doc.children.get(block).is_some_and(Node::is_text_block);
    if mergeable {
        ops.extend(doc.merge_node(&BlockPath::from([block]))?);
    }
    Ok(ops)
}

fn delete_forward(doc: &mut Document, _: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let sel = selection(doc)?;
    let mut ops = Vec::new();
    if !sel.is_collapsed() {
        collapse(doc, &mut ops)?;
        return Ok(ops);
    }
    let caret = sel.focus;
    let (block, child) = locate(doc, &caret)?;
    if caret.offset < text_len_at(doc, block, child) {
        return doc.remove_text(&caret.path, caret.offset, 1);
    }

    let siblings = doc.children.get(block).map_or(0, |b| b.children.len());
    if child + 1 < siblings {
        if text_len_at(doc, block, child + 1) == 0 {
            return Ok(ops);
        }
        let next = child_keys(doc, block, child + 1)?;
        return doc.remove_text(&next, 0, 1);
    }

    let mergeable = doc.children.get(block).is_some_and(Node::is_text_block)
        && doc.children.get(block + 1).is_some_and(Node::is_text_block);
    if mergeable {
        ops.extend(doc.merge_node(&BlockPath::from([block + 1]))?);
    }
    Ok(ops)
}

// ── Blocks ────────────────────────────────────────────────────────────────────

fn insert_block(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::InsertBlock { node, placement } = ev else { return Ok(Vec::new()) };
    let index = match placement {
        Placement::At(i) => *i,
        Placement::Auto => doc.focus_block().and_then(|p| p.last()).map_or(doc.len(), |i| i + 1),
    };
    doc.insert_node(&BlockPath::from([index]), node.clone())
}

fn delete_block(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::DeleteBlock { at } = ev else { return Ok(Vec::new()) };
    let path = resolve(doc, at)?;
    doc.remove_node(&path)
}

/// Split the focus block at the caret.
///
/// A caret inside a span splits the span first.  Both halves always end up
/// with at least one span, and the caret lands at the start of the new block.
fn split_block(doc: &mut Document, _: &EditorEvent, keys: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let mut ops = Vec::new();
    let caret = collapse(doc, &mut ops)?;
    let (block, child) = locate(doc, &caret)?;
    let span_len = text_len_at(doc, block, child);

    let position = if caret.offset == 0 {
        child
    } else if caret.offset >= span_len {
        child + 1
    } else {
        ops.extend(doc.split_node(&BlockPath::from([block, child]), caret.offset, keys.next_key())?);
        child + 1
    };

    let new_key = keys.next_key();
    ops.extend(doc.split_node(&BlockPath::from([block]), position, new_key.clone())?);

    if doc.children.get(block).is_some_and(|b| b.children.is_empty()) {
        ops.extend(doc.insert_node(&BlockPath::from([block, 0]), Node::span(keys.next_key(), ""))?);
    }
    if doc.children.get(block + 1).is_some_and(|b| b.children.is_empty()) {
        let span_key = keys.next_key();
        ops.extend(doc.insert_node(&BlockPath::from([block + 1, 0]), Node::span(span_key.clone(), ""))?);
        let caret = Point::new(KeyPath(vec![new_key, span_key]), 0);
        ops.extend(doc.set_selection(Some(Selection::collapsed(caret))));
    }
    Ok(ops)
}

fn merge_block(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::MergeBlock { at } = ev else { return Ok(Vec::new()) };
    let path = resolve(doc, at)?;
    doc.merge_node(&path)
}

fn move_block(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::MoveBlock { at, to } = ev else { return Ok(Vec::new()) };
    let from = resolve(doc, at)?;
    if from.depth() != 1 {
        return Err(DocumentError::InvalidPosition { path: from, position: *to });
    }
    doc.move_node(&from, &BlockPath::from([*to]))
}

fn block_set(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::BlockSet { at, style, list_item } = ev else { return Ok(Vec::new()) };
    doc.set_block_props(at, style.clone(), list_item.clone())
}

fn block_rekey(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::BlockRekey { at, key } = ev else { return Ok(Vec::new()) };
    let path = resolve(doc, at)?;
    doc.set_key(&path, key.clone())
}

// ── Decorators ────────────────────────────────────────────────────────────────

/// Add or remove `decorator` on every span covered by the selection.
///
/// Spans that straddle an edge of the selection are split so that only the
/// selected text changes.  The selection is then reset to cover exactly the
/// decorated spans, keeping its direction.  A collapsed selection is a no-op.
fn decorate(
    doc:       &mut Document,
    keys:      &mut dyn KeyGenerator,
    decorator: &SmolStr,
    add:       bool,
) -> DocumentResult<Vec<Operation>> {
    let sel = selection(doc)?;
    if sel.is_collapsed() {
        return Ok(Vec::new());
    }
    let (anchor_block, anchor_child) = locate(doc, &sel.anchor)?;
    let (focus_block, focus_child) = locate(doc, &sel.focus)?;
    if anchor_block != focus_block {
        return Err(DocumentError::InvalidRange);
    }
    let block = anchor_block;
    let anchor = (anchor_child, sel.anchor.offset);
    let focus = (focus_child, sel.focus.offset);
    let forward = anchor <= focus;
    let ((lo_child, lo_offset), (hi_child, hi_offset)) = if forward { (anchor, focus) } else { (focus, anchor) };

    let mut ops = Vec::new();

    // End edge first so splitting the start edge cannot shift it.
    if hi_offset > 0 && hi_offset < text_len_at(doc, block, hi_child) {
        ops.extend(doc.split_node(&BlockPath::from([block, hi_child]), hi_offset, keys.next_key())?);
    }
    let last = if hi_offset == 0 { hi_child.checked_sub(1) } else { Some(hi_child) };
    let Some(mut last) = last else { return Ok(ops) };

    let lo_len = text_len_at(doc, block, lo_child);
    let first = if lo_offset == 0 {
        lo_child
    } else if lo_offset >= lo_len {
        lo_child + 1
    } else {
        ops.extend(doc.split_node(&BlockPath::from([block, lo_child]), lo_offset, keys.next_key())?);
        last += 1;
        lo_child + 1
    };

    let mut covered: Vec<(KeyPath, usize)> = Vec::new();
    for child in first..=last {
        let Some(node) = doc.node_at(&BlockPath::from([block, child])) else { break };
        if !node.is_span() {
            continue;
        }
        let has = node.marks().contains(decorator);
        let mut marks = node.marks().to_vec();
        let len = node.text_len();
        let path = child_keys(doc, block, child)?;
        covered.push((path.clone(), len));
        if add == has {
            continue;
        }
        if add {
            marks.push(decorator.clone());
        } else {
            marks.retain(|m| m != decorator);
        }
        ops.extend(doc.set_marks(&path, marks)?);
    }

    if let (Some((first_path, _)), Some((last_path, last_len))) = (covered.first(), covered.last()) {
        let start = Point::new(first_path.clone(), 0);
        let end = Point::new(last_path.clone(), *last_len);
        let selection = if forward {
            Selection { anchor: start, focus: end }
        } else {
            Selection { anchor: end, focus: start }
        };
        ops.extend(doc.set_selection(Some(selection)));
    }
    Ok(ops)
}

// ── Selection ─────────────────────────────────────────────────────────────────

fn select(doc: &mut Document, ev: &EditorEvent, _: &mut dyn KeyGenerator) -> DocumentResult<Vec<Operation>> {
    let EditorEvent::Select { selection } = ev else { return Ok(Vec::new()) };
    if let Some(sel) = selection {
        for point in [&sel.anchor, &sel.focus] {
            let node = doc
                .node_by_keys(&point.path)
                .ok_or_else(|| DocumentError::KeyNotFound(point.path.clone()))?;
            if point.offset > node.text_len() {
                return Err(DocumentError::InvalidOffset { path: point.path.clone(), offset: point.offset });
            }
        }
    }
    Ok(doc.set_selection(selection.clone()))
}
