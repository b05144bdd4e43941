//! Read-only editor state passed to every guard and action.

use pte_core::{BlockPath, Document, KeyPath, Node, Point, Selection};
use pte_index::BlockPathIndex;

/// A read-only snapshot of the editor handed to guards and actions.
///
/// Built by the engine for each guard evaluation and each action call, so a
/// later action in the same behavior sees the mutations an earlier one
/// caused through `Raise`.
pub struct EditorContext<'a> {
    pub document: &'a Document,
    pub index:    &'a BlockPathIndex,

    /// Nesting depth of the current dispatch cycle.  0 for an external event.
    pub depth: usize,
}

impl<'a> EditorContext<'a> {
    #[inline]
    pub fn new(document: &'a Document, index: &'a BlockPathIndex, depth: usize) -> Self {
        Self { document, index, depth }
    }

    #[inline]
    pub fn selection(&self) -> Option<&'a Selection> {
        self.document.selection.as_ref()
    }

    /// Node at `keys`, looked up through the index.
    pub fn node(&self, keys: &KeyPath) -> Option<&'a Node> {
        self.document.node_at(self.index.get(keys)?)
    }

    /// Current top-level index of the block at `keys`.
    pub fn block_index(&self, keys: &KeyPath) -> Option<usize> {
        let path = self.index.get(keys)?;
        (path.depth() == 1).then(|| path.last()).flatten()
    }

    /// Positional path of the top-level block holding the selection focus.
    pub fn focus_block_path(&self) -> Option<&'a BlockPath> {
        let top = self.selection()?.focus.path.0.first()?;
        self.index.get(&KeyPath::top(top.clone()))
    }

    pub fn focus_block(&self) -> Option<&'a Node> {
        self.document.node_at(self.focus_block_path()?)
    }

    pub fn focus_span(&self) -> Option<&'a Node> {
        self.node(&self.selection()?.focus.path)
    }

    /// Spans covered by the selection.
    ///
    /// A collapsed selection covers the span under the caret.  An expanded
    /// selection covers every span of one block with at least one selected
    /// char; a selection spanning blocks covers nothing.
    pub fn selected_spans(&self) -> Vec<&'a Node> {
        let Some(sel) = self.selection() else { return Vec::new() };
        if sel.is_collapsed() {
            return self.focus_span().filter(|n| n.is_span()).into_iter().collect();
        }
        let Some((block, (lo, lo_off), (hi, hi_off))) = self.ordered_range(sel) else {
            return Vec::new();
        };
        (lo..=hi)
            .filter_map(|i| {
                let span = block.children.get(i)?;
                let start = if i == lo { lo_off } else { 0 };
                let end = if i == hi { hi_off } else { span.text_len() };
                (span.is_span() && start < end).then_some(span)
            })
            .collect()
    }

    /// `true` when every selected span carries `mark`.
    pub fn all_marked(&self, mark: &str) -> bool {
        let spans = self.selected_spans();
        !spans.is_empty() && spans.iter().all(|s| s.marks().iter().any(|m| m == mark))
    }

    /// Block and (child index, offset) of both selection ends, start first.
    /// `None` unless both points sit on children of the same top-level block.
    fn ordered_range(&self, sel: &Selection) -> Option<(&'a Node, (usize, usize), (usize, usize))> {
        let locate = |point: &Point| -> Option<(KeyPath, usize, usize)> {
            let block = KeyPath::top(point.path.0.first()?.clone());
            let path = self.index.get(&point.path)?;
            (path.depth() == 2).then_some((block, path.0[1], point.offset))
        };
        let (block_a, ia, oa) = locate(&sel.anchor)?;
        let (block_f, i_f, of) = locate(&sel.focus)?;
        if block_a != block_f {
            return None;
        }
        let block = self.node(&block_a)?;
        let (lo, hi) = if (ia, oa) <= (i_f, of) { ((ia, oa), (i_f, of)) } else { ((i_f, of), (ia, oa)) };
        Some((block, lo, hi))
    }
}
