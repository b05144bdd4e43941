//! Bundles of behaviors registered together.

use pte_core::{KeyPath, NodeKind};
use pte_priority::Priority;
use smol_str::SmolStr;

use crate::{ActionResult, Behavior, EditorEvent, Placement};

/// A behavior paired with the priority it registers at.
pub struct PrioritizedBehavior {
    pub behavior: Behavior,
    pub priority: Option<Priority>,
}

impl PrioritizedBehavior {
    pub fn new(behavior: Behavior, priority: Option<Priority>) -> Self {
        Self { behavior, priority }
    }
}

/// A reusable group of behaviors, e.g. a plugin or the core translations.
///
/// Only [`behaviors`][Self::behaviors] is required.
pub trait BehaviorSet {
    fn name(&self) -> &str {
        "unnamed"
    }

    /// Fresh behaviors to register, in registration order.
    fn behaviors(&self) -> Vec<PrioritizedBehavior>;
}

// ── CoreBehaviors ─────────────────────────────────────────────────────────────

/// Translations from abstract events to synthetic ones.
///
/// | Event              | Raises                                          |
/// |--------------------|-------------------------------------------------|
/// | `insert.break`     | `split.block`                                   |
/// | `insert.blocks`    | `insert.block` per node, after the focus block  |
/// | `decorator.toggle` | `decorator.remove` if all selected spans carry it, else `decorator.add` |
/// | `style.toggle`     | `block.set` (back to `normal` if already set)   |
/// | `move.block.up`    | `move.block` one slot up                        |
/// | `move.block.down`  | `move.block` one slot down                      |
/// | `clipboard.paste`  | `insert.text` per line, `insert.break` between  |
/// | `drag.drop`        | `move.block`                                    |
///
/// Every core behavior shares one [`Priority`].  Declare a behavior
/// `higher_than(core.priority())` to override a translation; behaviors with
/// no priority run after the core set.
pub struct CoreBehaviors {
    priority: Priority,
}

impl CoreBehaviors {
    pub fn new() -> Self {
        Self { priority: Priority::named("core") }
    }

    pub fn priority(&self) -> &Priority {
        &self.priority
    }
}

impl Default for CoreBehaviors {
    fn default() -> Self {
        Self::new()
    }
}

impl BehaviorSet for CoreBehaviors {
    fn name(&self) -> &str {
        "core"
    }

    fn behaviors(&self) -> Vec<PrioritizedBehavior> {
        [
            insert_break(),
            insert_blocks(),
            decorator_toggle(),
            style_toggle(),
            move_block_up(),
            move_block_down(),
            clipboard_paste(),
            drag_drop(),
        ]
        .into_iter()
        .map(|b| PrioritizedBehavior::new(b, Some(self.priority.clone())))
        .collect()
    }
}

fn insert_break() -> Behavior {
    Behavior::on("insert.break")
        .named("core.insert-break")
        .action(|_, _, _| vec![ActionResult::Raise(EditorEvent::SplitBlock)])
}

fn insert_blocks() -> Behavior {
    Behavior::on("insert.blocks")
        .named("core.insert-blocks")
        .guard(|ctx, _| {
            let after_focus = ctx.focus_block_path().and_then(|p| p.last()).map(|i| i + 1);
            Some(after_focus.unwrap_or(ctx.document.len()))
        })
        .action(|_, ev, payload| {
            let EditorEvent::InsertBlocks { nodes } = ev else { return Vec::new() };
            let base = payload.and_then(|p| p.get::<usize>()).copied().unwrap_or(0);
            nodes
                .iter()
                .enumerate()
                .map(|(i, node)| {
                    ActionResult::Raise(EditorEvent::InsertBlock {
                        node:      node.clone(),
                        placement: Placement::At(base + i),
                    })
                })
                .collect()
        })
}

fn decorator_toggle() -> Behavior {
    Behavior::on("decorator.toggle")
        .named("core.decorator-toggle")
        .action(|ctx, ev, _| {
            let EditorEvent::DecoratorToggle { decorator } = ev else { return Vec::new() };
            let decorator = decorator.clone();
            let event = if ctx.all_marked(&decorator) {
                EditorEvent::DecoratorRemove { decorator }
            } else {
                EditorEvent::DecoratorAdd { decorator }
            };
            vec![ActionResult::Raise(event)]
        })
}

fn style_toggle() -> Behavior {
    Behavior::on("style.toggle")
        .named("core.style-toggle")
        .guard(|ctx, _| {
            let block = ctx.focus_block()?;
            let NodeKind::TextBlock { style, .. } = &block.kind else { return None };
            Some((KeyPath::top(block.key.clone()), style.clone()))
        })
        .action(|_, ev, payload| {
            let EditorEvent::StyleToggle { style } = ev else { return Vec::new() };
            let Some((at, current)) = payload.and_then(|p| p.get::<(KeyPath, SmolStr)>()) else {
                return Vec::new();
            };
            let next = if current == style { SmolStr::new("normal") } else { style.clone() };
            vec![ActionResult::Raise(EditorEvent::BlockSet {
                at:        at.clone(),
                style:     Some(next),
                list_item: None,
            })]
        })
}

fn move_block_up() -> Behavior {
    Behavior::on("move.block.up")
        .named("core.move-block-up")
        .guard(|ctx, ev| match ev {
            EditorEvent::MoveBlockUp { at } => ctx.block_index(at).filter(|&i| i > 0),
            _ => None,
        })
        .action(|_, ev, payload| {
            let (EditorEvent::MoveBlockUp { at }, Some(&i)) = (ev, payload.and_then(|p| p.get::<usize>())) else {
                return Vec::new();
            };
            vec![ActionResult::Raise(EditorEvent::MoveBlock { at: at.clone(), to: i - 1 })]
        })
}

fn move_block_down() -> Behavior {
    Behavior::on("move.block.down")
        .named("core.move-block-down")
        .guard(|ctx, ev| match ev {
            EditorEvent::MoveBlockDown { at } => {
                ctx.block_index(at).filter(|&i| i + 1 < ctx.document.len())
            }
            _ => None,
        })
        .action(|_, ev, payload| {
            let (EditorEvent::MoveBlockDown { at }, Some(&i)) = (ev, payload.and_then(|p| p.get::<usize>())) else {
                return Vec::new();
            };
            vec![ActionResult::Raise(EditorEvent::MoveBlock { at: at.clone(), to: i + 1 })]
        })
}

fn clipboard_paste() -> Behavior {
    Behavior::on("clipboard.paste")
        .named("core.clipboard-paste")
        .guard(|ctx, _| ctx.selection().is_some())
        .action(|_, ev, _| {
            let EditorEvent::ClipboardPaste { text } = ev else { return Vec::new() };
            let mut results = Vec::new();
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    results.push(ActionResult::Raise(EditorEvent::InsertBreak));
                }
                let line = line.strip_suffix('\r').unwrap_or(line);
                if !line.is_empty() {
                    results.push(ActionResult::Raise(EditorEvent::text(line)));
                }
            }
            results
        })
}

fn drag_drop() -> Behavior {
    Behavior::on("drag.drop")
        .named("core.drag-drop")
        .guard(|ctx, ev| matches!(ev, EditorEvent::DragDrop { at, .. } if ctx.block_index(at).is_some()))
        .action(|_, ev, _| match ev {
            EditorEvent::DragDrop { at, to } => {
                vec![ActionResult::Raise(EditorEvent::MoveBlock { at: at.clone(), to: *to })]
            }
            _ => Vec::new(),
        })
}
