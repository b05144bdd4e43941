//! Demo behaviors layered on top of the core set.

use std::sync::{Arc, Mutex};

use pte_behavior::{ActionResult, Behavior, EditorEvent, Effect};
use pte_core::{KeyPath, Node, Point, Selection};
use tracing::info;

/// `**word**` typed in one span, found when the final `*` arrives.
struct BoldRun {
    path:  KeyPath,
    start: usize,
    end:   usize,
    word:  String,
}

fn select(path: &KeyPath, anchor: usize, focus: usize) -> EditorEvent {
    EditorEvent::Select {
        selection: Some(Selection {
            anchor: Point::new(path.clone(), anchor),
            focus:  Point::new(path.clone(), focus),
        }),
    }
}

/// Markdown-style bold: typing the closing `*` of `**word**` replaces the
/// markers with `word` marked `strong`.
pub fn auto_bold() -> Behavior {
    Behavior::on("insert.text")
        .named("demo.auto-bold")
        .guard(|ctx, ev| {
            let EditorEvent::InsertText { text } = ev else { return None };
            if text != "*" {
                return None;
            }
            let sel = ctx.selection().filter(|s| s.is_collapsed())?;
            let before: String = ctx.focus_span()?.span_text()?.chars().take(sel.focus.offset).collect();
            let body = before.strip_suffix('*')?;
            let open = body.rfind("**")?;
            let word = &body[open + 2..];
            if word.is_empty() || word.contains('*') {
                return None;
            }
            Some(BoldRun {
                path:  sel.focus.path.clone(),
                start: body[..open].chars().count(),
                end:   sel.focus.offset,
                word:  word.to_owned(),
            })
        })
        .action(|_, _, payload| {
            let Some(run) = payload.and_then(|p| p.get::<BoldRun>()) else { return Vec::new() };
            let word_end = run.start + run.word.chars().count();
            vec![
                ActionResult::Raise(select(&run.path, run.start, run.end)),
                ActionResult::Raise(EditorEvent::text(run.word.clone())),
                ActionResult::Raise(select(&run.path, run.start, word_end)),
                ActionResult::Raise(EditorEvent::DecoratorAdd { decorator: "strong".into() }),
            ]
        })
        .action(|ctx, _, _| {
            // The decorator split the span; park the caret after the bold text.
            let Some(sel) = ctx.selection() else { return Vec::new() };
            vec![ActionResult::Raise(EditorEvent::Select {
                selection: Some(Selection::collapsed(sel.focus.clone())),
            })]
        })
}

/// Logs every event nobody else claimed and passes it on.
pub fn logger() -> Behavior {
    Behavior::on("*").named("demo.logger").action(|ctx, ev, _| {
        info!(event_type = ev.event_type(), depth = ctx.depth, "unclaimed event");
        vec![ActionResult::Forward(ev.clone())]
    })
}

/// `custom.save` snapshots the document text into `saved` once the cascade
/// is over, then announces `custom.saved`.
pub fn save(saved: Arc<Mutex<Vec<String>>>) -> Behavior {
    Behavior::on("custom.save").named("demo.save").action(move |_, _, _| {
        let saved = Arc::clone(&saved);
        let effect = Effect::new(move |ctx| {
            let text: Vec<String> = ctx.document().children.iter().map(Node::plain_text).collect();
            if let Ok(mut out) = saved.lock() {
                out.push(text.join("\n"));
            }
            ctx.send(EditorEvent::custom("saved", serde_json::json!({ "blocks": text.len() })));
        });
        vec![ActionResult::Effect(effect.named("save"))]
    })
}
