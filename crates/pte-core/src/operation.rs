//! The structural operation stream.
//!
//! Every primitive [`Document`][crate::Document] mutator returns the
//! operations it applied, in order.  Replaying that stream against a
//! `BlockPathIndex` keeps it in step with the document without a rebuild.
//!
//! Structural operations carry [`BlockPath`]s that are valid in the document
//! state *immediately before* that single operation is applied.  Text and
//! selection operations carry [`KeyPath`]s; the index never looks at them.

use smol_str::SmolStr;

use crate::{BlockKey, BlockPath, KeyPath, Node, Selection};

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    // ── Structural ────────────────────────────────────────────────────────
    /// `node` (with its whole subtree) now lives at `path`.
    InsertNode { path: BlockPath, node: Node },

    /// The node at `path` and its subtree are gone.
    RemoveNode { path: BlockPath },

    /// A new, childless sibling keyed `new_key` was created right after
    /// `path`.  `position` is the text offset (spans) or child offset
    /// (containers) at which the split happened; children that moved into the
    /// new node are reported as separate `MoveNode`s.
    SplitNode { path: BlockPath, position: usize, new_key: BlockKey },

    /// The node at `path` was merged into its previous sibling and removed.
    /// Children it held were moved out beforehand via `MoveNode`s.
    MergeNode { path: BlockPath, position: usize },

    /// The node at `from` moved to `to`, where `to` is read *after* the node
    /// has been taken out of its old position.
    MoveNode { from: BlockPath, to: BlockPath },

    /// The node at `path` changed key from `old_key` to `new_key`.
    SetKey { path: BlockPath, old_key: BlockKey, new_key: BlockKey },

    // ── Text and selection (ignored by the index) ─────────────────────────
    InsertText { path: KeyPath, offset: usize, text: String },

    RemoveText { path: KeyPath, offset: usize, text: String },

    SetMarks { path: KeyPath, marks: Vec<SmolStr> },

    SetProps {
        path:      KeyPath,
        style:     Option<SmolStr>,
        list_item: Option<SmolStr>,
    },

    SetSelection { selection: Option<Selection> },
}

impl Operation {
    /// `true` for operations that change tree shape or node identity.
    #[inline]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MergeNode { .. }
                | Operation::MoveNode { .. }
                | Operation::SetKey { .. }
        )
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. }   => "insert_node",
            Operation::RemoveNode { .. }   => "remove_node",
            Operation::SplitNode { .. }    => "split_node",
            Operation::MergeNode { .. }    => "merge_node",
            Operation::MoveNode { .. }     => "move_node",
            Operation::SetKey { .. }       => "set_key",
            Operation::InsertText { .. }   => "insert_text",
            Operation::RemoveText { .. }   => "remove_text",
            Operation::SetMarks { .. }     => "set_marks",
            Operation::SetProps { .. }     => "set_props",
            Operation::SetSelection { .. } => "set_selection",
        }
    }
}
