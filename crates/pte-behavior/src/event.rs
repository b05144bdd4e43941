//! Editor events: everything that flows through the dispatcher.

use smol_str::SmolStr;

use pte_core::{BlockKey, KeyPath, Node, Selection};

/// Where an inserted block lands among the top-level blocks.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Placement {
    /// Right after the block holding the selection focus, or at the end of
    /// the document when there is no selection.
    #[default]
    Auto,
    /// At this top-level index.
    At(usize),
}

/// A closed set of editing intents.
///
/// **Synthetic** events map one-to-one onto a primitive command of the same
/// name and fall through to it when no behavior handles them.  **Abstract**
/// events have no command; they only do something when a behavior (usually
/// one of [`CoreBehaviors`][crate::CoreBehaviors]) translates them into
/// synthetic ones.  **Custom** events belong to the host application.
#[derive(Clone, PartialEq, Debug)]
pub enum EditorEvent {
    // ── Synthetic ─────────────────────────────────────────────────────────
    /// Insert text at the selection, replacing an expanded selection that
    /// lies inside one span.
    InsertText { text: String },
    /// Delete one char before the caret, or merge into the previous block at
    /// the start of a block.
    DeleteBackward,
    /// Delete one char after the caret, or pull the next block in at the end
    /// of a block.
    DeleteForward,
    InsertBlock { node: Node, placement: Placement },
    DeleteBlock { at: KeyPath },
    /// Split the focus block at the caret.
    SplitBlock,
    /// Merge the block at `at` into its previous sibling.
    MergeBlock { at: KeyPath },
    /// Move a top-level block.  `to` is read after the block is taken out.
    MoveBlock { at: KeyPath, to: usize },
    BlockSet {
        at:        KeyPath,
        style:     Option<SmolStr>,
        list_item: Option<SmolStr>,
    },
    BlockRekey { at: KeyPath, key: BlockKey },
    DecoratorAdd { decorator: SmolStr },
    DecoratorRemove { decorator: SmolStr },
    Select { selection: Option<Selection> },
    Focus,
    Blur,

    // ── Abstract ──────────────────────────────────────────────────────────
    InsertBreak,
    InsertBlocks { nodes: Vec<Node> },
    DecoratorToggle { decorator: SmolStr },
    StyleToggle { style: SmolStr },
    MoveBlockUp { at: KeyPath },
    MoveBlockDown { at: KeyPath },
    ClipboardPaste { text: String },
    DragStart { at: KeyPath },
    DragDrop { at: KeyPath, to: usize },

    // ── Host-defined ──────────────────────────────────────────────────────
    /// `name` always carries the `custom.` prefix; build with
    /// [`EditorEvent::custom`].
    Custom { name: SmolStr, payload: serde_json::Value },
}

impl EditorEvent {
    /// A host event named `custom.<name>`.
    pub fn custom(name: &str, payload: serde_json::Value) -> Self {
        let name = if name.starts_with("custom.") {
            SmolStr::new(name)
        } else {
            SmolStr::new(format!("custom.{name}"))
        };
        EditorEvent::Custom { name, payload }
    }

    /// Shorthand for `InsertText`.
    pub fn text(text: impl Into<String>) -> Self {
        EditorEvent::InsertText { text: text.into() }
    }

    /// The dotted type name behaviors subscribe to.
    pub fn event_type(&self) -> &str {
        match self {
            EditorEvent::InsertText { .. }      => "insert.text",
            EditorEvent::DeleteBackward         => "delete.backward",
            EditorEvent::DeleteForward          => "delete.forward",
            EditorEvent::InsertBlock { .. }     => "insert.block",
            EditorEvent::DeleteBlock { .. }     => "delete.block",
            EditorEvent::SplitBlock             => "split.block",
            EditorEvent::MergeBlock { .. }      => "merge.block",
            EditorEvent::MoveBlock { .. }       => "move.block",
            EditorEvent::BlockSet { .. }        => "block.set",
            EditorEvent::BlockRekey { .. }      => "block.rekey",
            EditorEvent::DecoratorAdd { .. }    => "decorator.add",
            EditorEvent::DecoratorRemove { .. } => "decorator.remove",
            EditorEvent::Select { .. }          => "select",
            EditorEvent::Focus                  => "focus",
            EditorEvent::Blur                   => "blur",
            EditorEvent::InsertBreak            => "insert.break",
            EditorEvent::InsertBlocks { .. }    => "insert.blocks",
            EditorEvent::DecoratorToggle { .. } => "decorator.toggle",
            EditorEvent::StyleToggle { .. }     => "style.toggle",
            EditorEvent::MoveBlockUp { .. }     => "move.block.up",
            EditorEvent::MoveBlockDown { .. }   => "move.block.down",
            EditorEvent::ClipboardPaste { .. }  => "clipboard.paste",
            EditorEvent::DragStart { .. }       => "drag.start",
            EditorEvent::DragDrop { .. }        => "drag.drop",
            EditorEvent::Custom { name, .. }    => name.as_str(),
        }
    }

    /// `true` for events backed by a primitive command.
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            EditorEvent::InsertText { .. }
                | EditorEvent::DeleteBackward
                | EditorEvent::DeleteForward
                | EditorEvent::InsertBlock { .. }
                | EditorEvent::DeleteBlock { .. }
                | EditorEvent::SplitBlock
                | EditorEvent::MergeBlock { .. }
                | EditorEvent::MoveBlock { .. }
                | EditorEvent::BlockSet { .. }
                | EditorEvent::BlockRekey { .. }
                | EditorEvent::DecoratorAdd { .. }
                | EditorEvent::DecoratorRemove { .. }
                | EditorEvent::Select { .. }
                | EditorEvent::Focus
                | EditorEvent::Blur
        )
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, EditorEvent::Custom { .. })
    }
}
