//! Unit tests for pte-engine.

use std::sync::{Arc, Mutex};

use pte_behavior::{Behavior, CoreBehaviors, EditorEvent};
use pte_core::{Document, EngineConfig, KeyPath, Node, Point, Selection, SequentialKeys};
use pte_index::BlockPathIndex;

use crate::{Engine, EngineBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn caret(block: &str, span: &str, offset: usize) -> Point {
    Point::new([block, span].into_iter().collect(), offset)
}

/// `alpha` / `bravo` / `charlie`, caret at the end of `alpha`.
fn doc() -> Document {
    let mut d = Document::new(vec![
        Node::paragraph("a", "a1", "alpha"),
        Node::paragraph("b", "b1", "bravo"),
        Node::paragraph("c", "c1", "charlie"),
    ]);
    d.selection = Some(Selection::collapsed(caret("a", "a1", 5)));
    d
}

/// Core behaviors, sequential keys `k0`, `k1`, …
fn engine() -> Engine {
    EngineBuilder::new(doc())
        .key_generator(SequentialKeys::new("k"))
        .set(&CoreBehaviors::new())
        .build()
        .unwrap()
}

fn custom(name: &str) -> EditorEvent {
    EditorEvent::custom(name, serde_json::Value::Null)
}

fn texts(engine: &Engine) -> Vec<String> {
    engine.document().children.iter().map(Node::plain_text).collect()
}

fn keys(engine: &Engine) -> Vec<&str> {
    engine.document().children.iter().map(|n| n.key.as_str()).collect()
}

fn focus(engine: &Engine) -> Point {
    engine.document().selection.clone().unwrap().focus
}

fn select(engine: &mut Engine, anchor: Point, focus: Point) {
    engine.send(EditorEvent::Select { selection: Some(Selection { anchor, focus }) }).unwrap();
}

fn assert_index_consistent(engine: &Engine) {
    assert_eq!(*engine.index(), BlockPathIndex::from_document(engine.document()));
}

/// In-memory writer for `tracing_subscriber::fmt`.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Shared, thread-safe log the behaviors under test append to.
#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: &str) {
        self.0.lock().unwrap().push(entry.to_owned());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A behavior that always matches and only logs its name.
fn logging(pattern: &str, name: &'static str, log: &Log) -> Behavior {
    let log = log.clone();
    Behavior::on(pattern).named(name).action(move |_, _, _| {
        log.push(name);
        Vec::new()
    })
}

// ── Resolution ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod resolution_tests {
    use super::*;
    use pte_behavior::ActionResult;
    use pte_priority::Priority;

    use crate::RecordingObserver;

    /// A > B > C, registered in scrambled order.
    fn ranked(log: &Log, a_matches: bool) -> Engine {
        let a = Priority::named("a");
        let b = Priority::named("b").lower_than(&a);
        let c = Priority::named("c").lower_than(&b);
        let mut engine = Engine::new(doc());
        engine.register_behavior(logging("custom.x", "C", log), Some(c)).unwrap();
        engine
            .register_behavior(logging("custom.x", "A", log).guard(move |_, _| a_matches), Some(a))
            .unwrap();
        engine.register_behavior(logging("custom.x", "B", log), Some(b)).unwrap();
        engine
    }

    #[test]
    fn first_match_wins() {
        let log = Log::default();
        let mut engine = ranked(&log, true);
        engine.send(custom("x")).unwrap();
        assert_eq!(log.entries(), ["A"]);
    }

    #[test]
    fn skipped_guard_passes_to_next_candidate() {
        let log = Log::default();
        let mut engine = ranked(&log, false);
        engine.send(custom("x")).unwrap();
        assert_eq!(log.entries(), ["B"]);
    }

    #[test]
    fn forward_runs_the_next_match_too() {
        let log = Log::default();
        let high = Priority::named("high");
        let mut engine = Engine::new(doc());
        engine.register_behavior(logging("custom.x", "B", &log), None).unwrap();
        let forward_log = log.clone();
        engine
            .register_behavior(
                Behavior::on("custom.x").named("A").action(move |_, ev, _| {
                    forward_log.push("A");
                    vec![ActionResult::Forward(ev.clone())]
                }),
                Some(high),
            )
            .unwrap();
        engine.register_behavior(logging("custom.x", "C", &log), None).unwrap();

        engine.send(custom("x")).unwrap();
        assert_eq!(log.entries(), ["A", "B"]);
    }

    #[test]
    fn forwarding_past_every_behavior_falls_through_to_the_command() {
        let log = Log::default();
        let mut engine = Engine::new(doc());
        let pass_log = log.clone();
        engine
            .register_behavior(
                Behavior::on("insert.text").action(move |_, ev, _| {
                    pass_log.push("seen");
                    vec![ActionResult::Forward(ev.clone())]
                }),
                None,
            )
            .unwrap();

        engine.send(EditorEvent::text("!")).unwrap();
        assert_eq!(log.entries(), ["seen"]);
        assert_eq!(texts(&engine)[0], "alpha!");
    }

    #[test]
    fn exact_subscribers_run_before_wildcards() {
        let log = Log::default();
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                logging("*", "all", &log).action(|_, ev, _| vec![ActionResult::Forward(ev.clone())]),
                None,
            )
            .unwrap();
        engine
            .register_behavior(
                logging("custom.*", "prefix", &log).action(|_, ev, _| vec![ActionResult::Forward(ev.clone())]),
                None,
            )
            .unwrap();
        engine
            .register_behavior(
                logging("custom.x", "exact", &log).action(|_, ev, _| vec![ActionResult::Forward(ev.clone())]),
                None,
            )
            .unwrap();

        engine.send(custom("x")).unwrap();
        assert_eq!(log.entries(), ["exact", "prefix", "all"]);
    }

    #[test]
    fn raise_is_resolved_depth_first() {
        let log = Log::default();
        let mut engine = Engine::new(doc());
        let (first, second) = (log.clone(), log.clone());
        engine
            .register_behavior(
                Behavior::on("custom.outer")
                    .action(move |_, _, _| {
                        first.push("outer-0");
                        vec![ActionResult::Raise(custom("inner"))]
                    })
                    .action(move |_, _, _| {
                        second.push("outer-1");
                        Vec::new()
                    }),
                None,
            )
            .unwrap();
        engine.register_behavior(logging("custom.inner", "inner", &log), None).unwrap();

        let mut rec = RecordingObserver::new();
        engine.send_observed(custom("outer"), &mut rec).unwrap();
        assert_eq!(log.entries(), ["outer-0", "inner", "outer-1"]);
        assert_eq!(rec.dispatched(), [("custom.outer", 0), ("custom.inner", 1)]);
    }

    #[test]
    fn later_actions_see_mutations_from_earlier_raises() {
        let seen = Log::default();
        let mut engine = Engine::new(doc());
        let log = seen.clone();
        engine
            .register_behavior(
                Behavior::on("custom.type")
                    .action(|_, _, _| vec![ActionResult::Raise(EditorEvent::text("!"))])
                    .action(move |ctx, _, _| {
                        log.push(&ctx.document.children[0].plain_text());
                        Vec::new()
                    }),
                None,
            )
            .unwrap();

        engine.send(custom("type")).unwrap();
        assert_eq!(seen.entries(), ["alpha!"]);
    }

    #[test]
    fn unregistered_behavior_no_longer_runs() {
        let mut engine = Engine::new(doc());
        let swallow = engine.register_behavior(Behavior::on("insert.text").named("swallow"), None).unwrap();

        engine.send(EditorEvent::text("!")).unwrap();
        assert_eq!(texts(&engine)[0], "alpha");

        assert!(engine.unregister_behavior(swallow));
        assert!(!engine.unregister_behavior(swallow));
        engine.send(EditorEvent::text("!")).unwrap();
        assert_eq!(texts(&engine)[0], "alpha!");
    }

    #[test]
    fn fall_through_can_be_disabled() {
        let config = EngineConfig { fall_through_unhandled: false, ..EngineConfig::default() };
        let mut engine = EngineBuilder::new(doc()).config(config).build().unwrap();
        engine.send(EditorEvent::text("!")).unwrap();
        assert_eq!(texts(&engine)[0], "alpha");
    }

    #[test]
    fn unhandled_custom_event_is_dropped() {
        let mut engine = engine();
        engine.send(custom("nobody-listens")).unwrap();
        assert_eq!(*engine.document(), doc());
    }

    #[test]
    fn dropped_events_are_logged_as_warnings() {
        let out = Captured::default();
        let sink = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();

        let mut engine = engine();
        tracing::subscriber::with_default(subscriber, || engine.send(custom("nobody-listens")).unwrap());

        let logged = out.text();
        assert!(logged.contains("WARN"), "{logged}");
        assert!(logged.contains("event dropped"), "{logged}");
        assert!(logged.contains("custom.nobody-listens"), "{logged}");
    }

    #[test]
    fn command_result_runs_a_command_by_name() {
        let mut engine = Engine::new(doc());
        engine.commands_mut().insert("shout", |doc, ev, _| doc.insert_text(&caret("a", "a1", 0), ev.event_type()));
        engine
            .register_behavior(
                Behavior::on("custom.x").action(|_, _, _| vec![pte_behavior::ActionResult::command("shout")]),
                None,
            )
            .unwrap();

        engine.send(custom("x")).unwrap();
        assert_eq!(texts(&engine)[0], "custom.xalpha");
        assert_index_consistent(&engine);
    }

    #[test]
    fn command_result_with_unknown_name_fails() {
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                Behavior::on("custom.x").action(|_, _, _| vec![pte_behavior::ActionResult::command("nope")]),
                None,
            )
            .unwrap();

        let err = engine.dispatch(custom("x")).unwrap_err();
        assert!(matches!(&err, crate::EngineError::UnknownCommand(name) if name == "nope"));
    }

    #[test]
    fn custom_commands_run_on_fall_through() {
        let mut engine = Engine::new(doc());
        engine.commands_mut().insert("custom.shout", |doc, _, _| {
            doc.insert_text(&caret("a", "a1", 0), "HEY ")
        });
        engine.send(custom("shout")).unwrap();
        assert_eq!(texts(&engine)[0], "HEY alpha");
    }
}

// ── Effects ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod effect_tests {
    use super::*;
    use pte_behavior::ActionResult;

    use crate::RecordingObserver;

    #[test]
    fn effects_wait_for_the_cascade_and_see_its_result() {
        let log = Log::default();
        let mut engine = Engine::new(doc());
        let effect_log = log.clone();
        engine
            .register_behavior(
                Behavior::on("insert.text").action(move |_, ev, _| {
                    let log = effect_log.clone();
                    vec![
                        ActionResult::effect(move |ctx| log.push(&ctx.document().children[0].plain_text())),
                        ActionResult::Execute(ev.clone()),
                    ]
                }),
                None,
            )
            .unwrap();

        let queue = engine.dispatch(EditorEvent::text("!")).unwrap();
        assert_eq!(queue.len(), 1);
        assert!(log.entries().is_empty());
        assert_eq!(texts(&engine)[0], "alpha!");

        engine.flush(queue).unwrap();
        assert_eq!(log.entries(), ["alpha!"]);
    }

    #[test]
    fn effects_run_in_enqueue_order() {
        let log = Log::default();
        let mut engine = Engine::new(doc());
        let (one, two) = (log.clone(), log.clone());
        engine
            .register_behavior(
                Behavior::on("custom.go")
                    .action(move |_, _, _| {
                        let log = one.clone();
                        vec![ActionResult::Effect(pte_behavior::Effect::new(move |_| log.push("one")).named("one"))]
                    })
                    .action(move |_, _, _| {
                        let log = two.clone();
                        vec![ActionResult::Effect(pte_behavior::Effect::new(move |_| log.push("two")).named("two"))]
                    }),
                None,
            )
            .unwrap();

        let queue = engine.dispatch(custom("go")).unwrap();
        assert_eq!(queue.labels(), [Some("one"), Some("two")]);
        engine.flush(queue).unwrap();
        assert_eq!(log.entries(), ["one", "two"]);
    }

    #[test]
    fn effects_can_send_follow_up_events() {
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                Behavior::on("custom.ping")
                    .action(|_, _, _| vec![ActionResult::effect(|ctx| ctx.send(EditorEvent::text("?")))]),
                None,
            )
            .unwrap();

        let mut rec = RecordingObserver::new();
        engine.send_observed(custom("ping"), &mut rec).unwrap();
        assert_eq!(texts(&engine)[0], "alpha?");
        assert_eq!(rec.dispatched(), [("custom.ping", 0), ("insert.text", 0)]);
    }

    #[test]
    fn effects_that_keep_sending_hit_the_limit() {
        let config = EngineConfig { max_cascade_events: 5, ..EngineConfig::default() };
        let mut engine = EngineBuilder::new(doc())
            .config(config)
            .behavior(
                Behavior::on("custom.echo").action(|_, ev, _| {
                    let again = ev.clone();
                    vec![ActionResult::effect(move |ctx| ctx.send(again))]
                }),
                None,
            )
            .build()
            .unwrap();

        let err = engine.send(custom("echo")).unwrap_err();
        assert!(matches!(err, crate::EngineError::CascadeLimitExceeded { limit: 5 }));
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failure_tests {
    use super::*;
    use pte_behavior::{ActionResult, BehaviorError};
    use pte_core::PriorityId;
    use pte_priority::Priority;

    use crate::{DispatchPhase, EngineError};

    #[test]
    fn guard_error_aborts_the_cascade() {
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                Behavior::on("insert.text").named("broken").try_guard(|_, _| Err(BehaviorError::guard("boom"))),
                None,
            )
            .unwrap();

        let err = engine.dispatch(EditorEvent::text("!")).unwrap_err();
        assert!(matches!(&err, EngineError::Guard { behavior, .. } if behavior.starts_with("broken")));
        assert_eq!(texts(&engine)[0], "alpha");
        assert_eq!(engine.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn committed_mutations_survive_a_later_failure() {
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                Behavior::on("custom.mixed")
                    .action(|_, _, _| vec![ActionResult::Execute(EditorEvent::text("X"))])
                    .try_action(|_, _, _| Err(BehaviorError::action("nope"))),
                None,
            )
            .unwrap();

        let err = engine.dispatch(custom("mixed")).unwrap_err();
        assert!(matches!(err, EngineError::Action { .. }));
        assert_eq!(texts(&engine)[0], "alphaX");
        assert_index_consistent(&engine);
    }

    #[test]
    fn errors_in_nested_raises_unwind_to_dispatch() {
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                Behavior::on("custom.outer").action(|_, _, _| vec![ActionResult::Raise(custom("inner"))]),
                None,
            )
            .unwrap();
        engine
            .register_behavior(
                Behavior::on("custom.inner").try_action(|_, _, _| Err(BehaviorError::action("deep"))),
                None,
            )
            .unwrap();

        assert!(matches!(engine.dispatch(custom("outer")), Err(EngineError::Action { .. })));
    }

    #[test]
    fn runaway_raise_hits_the_depth_cap() {
        let config = EngineConfig { max_cascade_depth: 8, ..EngineConfig::default() };
        let mut engine = EngineBuilder::new(doc())
            .config(config)
            .behavior(Behavior::on("custom.loop").action(|_, ev, _| vec![ActionResult::Raise(ev.clone())]), None)
            .build()
            .unwrap();

        let err = engine.dispatch(custom("loop")).unwrap_err();
        assert!(matches!(err, EngineError::CascadeDepthExceeded { depth: 9, limit: 8, .. }));
        assert_eq!(engine.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn wide_cascade_hits_the_event_cap() {
        let config = EngineConfig { max_cascade_events: 10, ..EngineConfig::default() };
        let mut engine = EngineBuilder::new(doc())
            .config(config)
            .behavior(
                Behavior::on("custom.wide")
                    .action(|_, _, _| (0..20).map(|_| ActionResult::Raise(custom("leaf"))).collect()),
                None,
            )
            .build()
            .unwrap();

        let err = engine.dispatch(custom("wide")).unwrap_err();
        assert!(matches!(err, EngineError::CascadeLimitExceeded { limit: 10 }));
    }

    #[test]
    fn execute_without_a_command_fails() {
        let mut engine = Engine::new(doc());
        engine
            .register_behavior(
                Behavior::on("custom.run").action(|_, _, _| vec![ActionResult::Execute(custom("missing"))]),
                None,
            )
            .unwrap();

        let err = engine.dispatch(custom("run")).unwrap_err();
        assert!(matches!(&err, EngineError::UnknownCommand(name) if name == "custom.missing"));
    }

    #[test]
    fn command_errors_name_the_command() {
        let mut engine = Engine::new(doc());
        let err = engine
            .dispatch(EditorEvent::Select { selection: Some(Selection::collapsed(caret("a", "a1", 99))) })
            .unwrap_err();
        assert!(matches!(&err, EngineError::Command { command, .. } if command == "select"));
    }

    #[test]
    fn priority_cycle_is_rejected_at_registration() {
        let one = Priority::with_id(PriorityId(4_000_001));
        let two = Priority::with_id(PriorityId(4_000_002));
        let mut engine = Engine::new(doc());
        engine.register_behavior(Behavior::on("custom.x"), Some(one.clone().higher_than(&two))).unwrap();

        let err = engine.register_behavior(Behavior::on("custom.x"), Some(two.higher_than(&one))).unwrap_err();
        assert!(matches!(err, EngineError::Priority(_)));
        assert_eq!(engine.registry().len(), 1);
    }

    #[test]
    fn builder_rejects_zero_limits() {
        let config = EngineConfig { max_cascade_depth: 0, ..EngineConfig::default() };
        assert!(matches!(EngineBuilder::new(doc()).config(config).build(), Err(EngineError::Config(_))));
    }
}

// ── Standard commands via the core behaviors ──────────────────────────────────

#[cfg(test)]
mod command_tests {
    use super::*;
    use pte_behavior::Placement;

    #[test]
    fn typing_moves_the_caret() {
        let mut engine = engine();
        engine.send(EditorEvent::text("!")).unwrap();
        engine.send(EditorEvent::text("?")).unwrap();
        assert_eq!(texts(&engine)[0], "alpha!?");
        assert_eq!(focus(&engine), caret("a", "a1", 7));
    }

    #[test]
    fn typing_replaces_a_selection_inside_one_span() {
        let mut engine = engine();
        select(&mut engine, caret("a", "a1", 1), caret("a", "a1", 4));
        engine.send(EditorEvent::text("-")).unwrap();
        assert_eq!(texts(&engine)[0], "a-a");
        assert_eq!(focus(&engine), caret("a", "a1", 2));
    }

    #[test]
    fn delete_backward_removes_one_char() {
        let mut engine = engine();
        engine.send(EditorEvent::DeleteBackward).unwrap();
        assert_eq!(texts(&engine)[0], "alph");
    }

    #[test]
    fn delete_backward_at_block_start_merges_blocks() {
        let mut engine = engine();
        select(&mut engine, caret("b", "b1", 0), caret("b", "b1", 0));
        engine.send(EditorEvent::DeleteBackward).unwrap();
        assert_eq!(texts(&engine), ["alphabravo", "charlie"]);
        assert_eq!(focus(&engine), caret("a", "b1", 0));
        assert_index_consistent(&engine);
    }

    #[test]
    fn delete_backward_at_document_start_does_nothing() {
        let mut engine = engine();
        select(&mut engine, caret("a", "a1", 0), caret("a", "a1", 0));
        engine.send(EditorEvent::DeleteBackward).unwrap();
        assert_eq!(texts(&engine), ["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn delete_forward_at_block_end_merges_the_next_block() {
        let mut engine = engine();
        engine.send(EditorEvent::DeleteForward).unwrap();
        assert_eq!(texts(&engine), ["alphabravo", "charlie"]);
        assert_eq!(keys(&engine), ["a", "c"]);
        assert_index_consistent(&engine);
    }

    #[test]
    fn insert_break_at_block_end_opens_an_empty_block() {
        let mut engine = engine();
        engine.send(EditorEvent::InsertBreak).unwrap();
        assert_eq!(keys(&engine), ["a", "k0", "b", "c"]);
        assert_eq!(texts(&engine), ["alpha", "", "bravo", "charlie"]);
        assert_eq!(focus(&engine), caret("k0", "k1", 0));

        engine.send(EditorEvent::text("x")).unwrap();
        assert_eq!(texts(&engine)[1], "x");
        assert_index_consistent(&engine);
    }

    #[test]
    fn insert_break_mid_span_splits_span_and_block() {
        let mut engine = engine();
        select(&mut engine, caret("a", "a1", 2), caret("a", "a1", 2));
        engine.send(EditorEvent::InsertBreak).unwrap();
        assert_eq!(texts(&engine), ["al", "pha", "bravo", "charlie"]);
        assert_eq!(keys(&engine), ["a", "k1", "b", "c"]);
        assert_eq!(focus(&engine), caret("k1", "k0", 0));
        assert_index_consistent(&engine);
    }

    #[test]
    fn insert_break_at_block_start_keeps_a_span_in_both_halves() {
        let mut engine = engine();
        select(&mut engine, caret("b", "b1", 0), caret("b", "b1", 0));
        engine.send(EditorEvent::InsertBreak).unwrap();
        assert_eq!(texts(&engine), ["alpha", "", "bravo", "charlie"]);
        assert_eq!(engine.document().children[1].children.len(), 1);
        assert_eq!(focus(&engine), caret("k0", "b1", 0));
        assert_index_consistent(&engine);
    }

    #[test]
    fn paste_splits_lines_into_blocks() {
        let mut engine = engine();
        engine.send(EditorEvent::ClipboardPaste { text: "one\r\ntwo".into() }).unwrap();
        assert_eq!(texts(&engine), ["alphaone", "two", "bravo", "charlie"]);
        assert_index_consistent(&engine);
    }

    #[test]
    fn decorator_toggle_splits_and_marks_then_unmarks() {
        let mut engine = engine();
        select(&mut engine, caret("a", "a1", 1), caret("a", "a1", 3));
        engine.send(EditorEvent::DecoratorToggle { decorator: "strong".into() }).unwrap();

        let block = &engine.document().children[0];
        let spans: Vec<(&str, &str, bool)> = block
            .children
            .iter()
            .map(|s| (s.key.as_str(), s.span_text().unwrap(), s.marks().iter().any(|m| m == "strong")))
            .collect();
        assert_eq!(spans, [("a1", "a", false), ("k1", "lp", true), ("k0", "ha", false)]);
        let sel = engine.document().selection.clone().unwrap();
        assert_eq!(sel.anchor, caret("a", "k1", 0));
        assert_eq!(sel.focus, caret("a", "k1", 2));
        assert_index_consistent(&engine);

        engine.send(EditorEvent::DecoratorToggle { decorator: "strong".into() }).unwrap();
        assert!(engine.document().children[0].children.iter().all(|s| s.marks().is_empty()));
    }

    #[test]
    fn backward_selection_keeps_its_direction() {
        let mut engine = engine();
        select(&mut engine, caret("a", "a1", 5), caret("a", "a1", 0));
        engine.send(EditorEvent::DecoratorAdd { decorator: "em".into() }).unwrap();
        let sel = engine.document().selection.clone().unwrap();
        assert_eq!(sel.anchor, caret("a", "a1", 5));
        assert_eq!(sel.focus, caret("a", "a1", 0));
        assert_eq!(engine.document().children[0].children[0].marks(), ["em"]);
    }

    #[test]
    fn decorator_across_blocks_is_rejected() {
        let mut engine = engine();
        select(&mut engine, caret("a", "a1", 1), caret("b", "b1", 1));
        assert!(engine.send(EditorEvent::DecoratorAdd { decorator: "em".into() }).is_err());
    }

    #[test]
    fn style_toggle_sets_and_resets_the_style() {
        let mut engine = engine();
        engine.send(EditorEvent::StyleToggle { style: "h1".into() }).unwrap();
        assert_eq!(engine.document().children[0].style(), Some("h1"));
        engine.send(EditorEvent::StyleToggle { style: "h1".into() }).unwrap();
        assert_eq!(engine.document().children[0].style(), Some("normal"));
    }

    #[test]
    fn move_block_up_and_down() {
        let mut engine = engine();
        engine.send(EditorEvent::MoveBlockDown { at: KeyPath::top("a") }).unwrap();
        assert_eq!(keys(&engine), ["b", "a", "c"]);
        engine.send(EditorEvent::MoveBlockUp { at: KeyPath::top("c") }).unwrap();
        assert_eq!(keys(&engine), ["b", "c", "a"]);

        // Already first: the guard skips and the abstract event is dropped.
        engine.send(EditorEvent::MoveBlockUp { at: KeyPath::top("b") }).unwrap();
        assert_eq!(keys(&engine), ["b", "c", "a"]);
        assert_index_consistent(&engine);
    }

    #[test]
    fn drag_drop_moves_the_block() {
        let mut engine = engine();
        engine.send(EditorEvent::DragDrop { at: KeyPath::top("c"), to: 0 }).unwrap();
        assert_eq!(keys(&engine), ["c", "a", "b"]);
    }

    #[test]
    fn insert_blocks_lands_after_the_focus_block() {
        let mut engine = engine();
        let nodes = vec![Node::paragraph("n1", "n1s", "new"), Node::paragraph("n2", "n2s", "newer")];
        engine.send(EditorEvent::InsertBlocks { nodes }).unwrap();
        assert_eq!(keys(&engine), ["a", "n1", "n2", "b", "c"]);
        assert_index_consistent(&engine);
    }

    #[test]
    fn insert_block_at_fixed_index() {
        let mut engine = engine();
        engine
            .send(EditorEvent::InsertBlock { node: Node::object("img", "image"), placement: Placement::At(3) })
            .unwrap();
        assert_eq!(keys(&engine), ["a", "b", "c", "img"]);
    }

    #[test]
    fn delete_and_rekey_blocks() {
        let mut engine = engine();
        engine.send(EditorEvent::DeleteBlock { at: KeyPath::top("b") }).unwrap();
        engine.send(EditorEvent::BlockRekey { at: KeyPath::top("c"), key: "z".into() }).unwrap();
        assert_eq!(keys(&engine), ["a", "z"]);
        assert_eq!(engine.index().get(&KeyPath::top("z")), Some(&pte_core::BlockPath::from([1])));
        assert!(!engine.index().has(&KeyPath::top("b")));
        assert_index_consistent(&engine);
    }

    #[test]
    fn focus_and_blur_toggle_the_flag() {
        let mut engine = engine();
        engine.send(EditorEvent::Focus).unwrap();
        assert!(engine.document().focused);
        engine.send(EditorEvent::Blur).unwrap();
        assert!(!engine.document().focused);
    }
}

// ── Index synchronisation and observers ───────────────────────────────────────

#[cfg(test)]
mod index_tests {
    use super::*;
    use pte_core::{BlockPath, Operation};

    use crate::{DispatchPhase, RecordingObserver};

    /// Inserts a block but reports an operation the index cannot apply.
    fn lying_engine(rebuild: bool) -> Engine {
        let config = EngineConfig { rebuild_index_on_error: rebuild, ..EngineConfig::default() };
        let mut engine = EngineBuilder::new(doc()).config(config).build().unwrap();
        engine.commands_mut().insert("custom.lie", |doc, _, _| {
            doc.insert_node(&BlockPath::from([0]), Node::paragraph("new", "new1", "x"))?;
            Ok(vec![Operation::RemoveNode { path: BlockPath::from([42]) }])
        });
        engine
    }

    #[test]
    fn rejected_operation_leaves_index_as_is() {
        let mut engine = lying_engine(false);
        let mut rec = RecordingObserver::new();
        engine.send_observed(custom("lie"), &mut rec).unwrap();
        assert_eq!(rec.index_errors(), 1);
        assert!(!engine.index().has(&KeyPath::top("new")));

        engine.reindex();
        assert!(engine.index().has(&KeyPath::top("new")));
    }

    #[test]
    fn rejected_operation_can_trigger_rebuild() {
        let mut engine = lying_engine(true);
        let mut rec = RecordingObserver::new();
        engine.send_observed(custom("lie"), &mut rec).unwrap();
        assert_eq!(rec.index_errors(), 1);
        assert_index_consistent(&engine);
    }

    #[test]
    fn scripted_session_keeps_index_in_step() {
        let mut engine = engine();
        let script = [
            EditorEvent::text(" one"),
            EditorEvent::InsertBreak,
            EditorEvent::text("two"),
            EditorEvent::MoveBlockUp { at: KeyPath::top("b") },
            EditorEvent::InsertBreak,
            EditorEvent::DeleteBackward,
            EditorEvent::DeleteBackward,
            EditorEvent::DragDrop { at: KeyPath::top("c"), to: 0 },
        ];
        for event in script {
            engine.send(event).unwrap();
            assert_index_consistent(&engine);
        }
    }

    #[test]
    fn direct_edits_keep_index_in_step() {
        let mut engine = engine();
        engine.edit(|doc| doc.remove_node(&BlockPath::from([1]))).unwrap();
        assert_eq!(keys(&engine), ["a", "c"]);
        assert_index_consistent(&engine);
    }

    #[test]
    fn phases_of_a_plain_send() {
        let mut engine = Engine::new(doc());
        let mut rec = RecordingObserver::new();
        engine.send_observed(EditorEvent::text("!"), &mut rec).unwrap();
        assert_eq!(
            rec.phases(),
            [
                DispatchPhase::Resolving,
                DispatchPhase::Executing,
                DispatchPhase::Idle,
                DispatchPhase::Flushing,
                DispatchPhase::Idle,
            ]
        );
        assert_eq!(rec.commands(), ["insert.text"]);
        assert_eq!(engine.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn recorder_sees_core_translation() {
        let mut engine = engine();
        let mut rec = RecordingObserver::new();
        engine.send_observed(EditorEvent::InsertBreak, &mut rec).unwrap();
        assert_eq!(rec.matched(), ["core.insert-break"]);
        assert_eq!(rec.dispatched(), [("insert.break", 0), ("split.block", 1)]);
        assert_eq!(rec.commands(), ["split.block"]);
    }
}
