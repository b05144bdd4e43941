//! basic — scripted editing session for the pte behavior engine.
//!
//! Builds a three-block document, registers the core translations plus a
//! few demo behaviors, replays a fixed event script, and prints the
//! resulting document and path index.
//!
//! ```text
//! RUST_LOG=debug cargo run -p basic -- demos/basic/config.json
//! ```

mod behaviors;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use pte_behavior::{CoreBehaviors, EditorEvent};
use pte_core::{Document, EngineConfig, KeyPath, Node, Point, Selection};
use pte_engine::{EngineBuilder, RecordingObserver};
use pte_index::BlockPathIndex;
use pte_priority::Priority;

// ── Document and script ───────────────────────────────────────────────────────

fn initial_document() -> Document {
    Document::new(vec![
        Node::text_block("title", "h1").with_children(vec![Node::span("title-1", "Behavior engine demo")]),
        Node::paragraph("intro", "intro-1", "Hello"),
        Node::paragraph("body", "body-1", "Type here"),
    ])
}

fn caret(block: &str, span: &str, offset: usize) -> EditorEvent {
    let path: KeyPath = [block, span].into_iter().collect();
    EditorEvent::Select { selection: Some(Selection::collapsed(Point::new(path, offset))) }
}

fn script() -> Vec<EditorEvent> {
    vec![
        EditorEvent::Focus,
        caret("intro", "intro-1", 5),
        EditorEvent::text(" world, this is **bold*"),
        EditorEvent::text("*"),
        EditorEvent::text(" text"),
        EditorEvent::InsertBreak,
        EditorEvent::text("A fresh line"),
        EditorEvent::StyleToggle { style: "h2".into() },
        EditorEvent::MoveBlockDown { at: KeyPath::top("title") },
        EditorEvent::ClipboardPaste { text: "\npasted one\npasted two".into() },
        EditorEvent::custom("save", serde_json::Value::Null),
        EditorEvent::Blur,
    ]
}

// ── Config ────────────────────────────────────────────────────────────────────

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else { return Ok(EngineConfig::default()) };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_document(doc: &Document) {
    for block in &doc.children {
        print!("  {:<10} {:<7}", block.key.as_str(), block.style().unwrap_or("object"));
        for span in &block.children {
            let text = span.span_text().unwrap_or("");
            if span.marks().is_empty() {
                print!(" {text:?}");
            } else {
                let marks: Vec<&str> = span.marks().iter().map(|m| m.as_str()).collect();
                print!(" {text:?}[{}]", marks.join(","));
            }
        }
        println!();
    }
}

fn print_index(index: &BlockPathIndex) {
    let mut entries: Vec<_> = index.entries().collect();
    entries.sort_by(|a, b| a.1.cmp(b.1));
    for (keys, path) in entries {
        println!("  {path:<8} {keys}");
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;
    println!("=== basic — pte behavior engine ===");
    println!(
        "max depth: {}  |  max events: {}  |  key seed: {}",
        config.max_cascade_depth, config.max_cascade_events, config.key_seed
    );
    println!();

    // 1. Engine with core translations and the demo behaviors.
    let core = CoreBehaviors::new();
    let saved = Arc::new(Mutex::new(Vec::new()));
    let mut engine = EngineBuilder::new(initial_document())
        .config(config)
        .set(&core)
        .behavior(
            behaviors::auto_bold(),
            Some(Priority::named("demo.auto-bold").higher_than(core.priority())),
        )
        .behavior(behaviors::logger(), None)
        .behavior(behaviors::save(Arc::clone(&saved)), None)
        .build()
        .context("building engine")?;
    println!("Registered {} behaviors", engine.registry().len());

    // 2. Replay the script.
    let mut observer = RecordingObserver::new();
    for (i, event) in script().into_iter().enumerate() {
        let event_type = event.event_type().to_owned();
        engine
            .send_observed(event, &mut observer)
            .with_context(|| format!("event #{i} ({event_type}) failed"))?;
    }
    println!(
        "Dispatched {} events, {} commands, {} index errors",
        observer.dispatched().len(),
        observer.commands().len(),
        observer.index_errors()
    );
    println!();

    // 3. Results.
    println!("Document:");
    print_document(engine.document());
    println!();
    println!("Index:");
    print_index(engine.index());
    println!();

    if let Ok(saved) = saved.lock() {
        for (i, snapshot) in saved.iter().enumerate() {
            println!("Saved snapshot #{i}:");
            for line in snapshot.lines() {
                println!("  {line}");
            }
        }
    }

    anyhow::ensure!(
        *engine.index() == BlockPathIndex::from_document(engine.document()),
        "path index drifted from the document"
    );
    Ok(())
}
