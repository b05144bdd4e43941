//! Unit tests for pte-index.

use pte_core::{BlockKey, BlockPath, Document, KeyPath, Node};

use crate::BlockPathIndex;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn abc() -> Document {
    Document::new(vec![
        Node::paragraph("a", "a1", "alpha"),
        Node::paragraph("b", "b1", "bravo"),
        Node::paragraph("c", "c1", "charlie"),
    ])
}

fn top(key: &str) -> KeyPath {
    KeyPath::top(key)
}

fn keys(segments: &[&str]) -> KeyPath {
    segments.iter().copied().collect()
}

fn at<const N: usize>(indices: [usize; N]) -> BlockPath {
    BlockPath::from(indices)
}

/// Wide flat document: `n` top-level paragraphs, one span each.
fn wide(n: usize) -> Document {
    Document::new(
        (0..n)
            .map(|i| Node::paragraph(format!("b{i}").as_str(), format!("s{i}").as_str(), "text"))
            .collect(),
    )
}

// ── Rebuild and lookups ───────────────────────────────────────────────────────

#[cfg(test)]
mod lookup_tests {
    use super::*;

    #[test]
    fn rebuild_indexes_every_depth() {
        let index = BlockPathIndex::from_document(&abc());
        assert_eq!(index.len(), 6);
        assert_eq!(index.get(&top("b")), Some(&at([1])));
        assert_eq!(index.get(&keys(&["c", "c1"])), Some(&at([2, 0])));
        assert!(!index.has(&top("zz")));
    }

    #[test]
    fn key_path_at_is_the_inverse_of_get() {
        let index = BlockPathIndex::from_document(&abc());
        for (k, p) in index.entries() {
            assert_eq!(index.key_path_at(p).as_ref(), Some(k));
            assert_eq!(k.depth(), p.depth());
        }
        assert_eq!(index.key_path_at(&at([3])), None);
        assert_eq!(index.key_path_at(&BlockPath::default()), None);
    }

    #[test]
    fn rebuild_clears_prior_state() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.rebuild(&Document::default());
        assert!(index.is_empty());
        assert_eq!(index, BlockPathIndex::new());
    }

    #[test]
    fn entries_can_be_walked_twice() {
        let index = BlockPathIndex::from_document(&abc());
        assert_eq!(index.entries().count(), index.entries().count());
    }
}

// ── Incremental updates ───────────────────────────────────────────────────────

#[cfg(test)]
mod update_tests {
    use super::*;
    use crate::IndexError;

    #[test]
    fn insert_at_front_shifts_all_siblings() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.on_insert(&at([0]), BlockKey::new("x")).unwrap();
        assert_eq!(index.get(&top("x")), Some(&at([0])));
        assert_eq!(index.get(&top("a")), Some(&at([1])));
        assert_eq!(index.get(&top("b")), Some(&at([2])));
        assert_eq!(index.get(&top("c")), Some(&at([3])));
        // Descendants move with their parent.
        assert_eq!(index.get(&keys(&["c", "c1"])), Some(&at([3, 0])));
    }

    #[test]
    fn remove_middle_shifts_later_siblings_back() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.on_remove(&at([1])).unwrap();
        assert_eq!(index.get(&top("a")), Some(&at([0])));
        assert_eq!(index.get(&top("c")), Some(&at([1])));
        assert!(!index.has(&top("b")));
        assert!(!index.has(&keys(&["b", "b1"])));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn append_and_remove_last_do_not_shift() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.on_insert(&at([3]), BlockKey::new("d")).unwrap();
        assert_eq!(index.get(&top("c")), Some(&at([2])));
        index.on_remove(&at([3])).unwrap();
        assert_eq!(index, BlockPathIndex::from_document(&abc()));
    }

    #[test]
    fn insert_then_remove_restores() {
        let original = BlockPathIndex::from_document(&abc());
        for path in [at([0]), at([2]), at([1, 0]), at([1, 1])] {
            let mut index = original.clone();
            index.on_insert(&path, BlockKey::new("x")).unwrap();
            index.on_remove(&path).unwrap();
            assert_eq!(index, original, "inverse law failed at {path}");
        }
    }

    #[test]
    fn split_inserts_right_after() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.on_split(&at([0]), BlockKey::new("a2")).unwrap();
        assert_eq!(index.get(&top("a2")), Some(&at([1])));
        assert_eq!(index.get(&top("b")), Some(&at([2])));
    }

    #[test]
    fn move_to_own_position_is_noop() {
        let original = BlockPathIndex::from_document(&abc());
        for path in [at([0]), at([1]), at([2]), at([1, 0])] {
            let mut index = original.clone();
            index.on_move(&path, &path).unwrap();
            assert_eq!(index, original);
        }
    }

    #[test]
    fn adjacent_swap() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.on_move(&at([0]), &at([1])).unwrap();
        assert_eq!(index.get(&top("b")), Some(&at([0])));
        assert_eq!(index.get(&top("a")), Some(&at([1])));
        assert_eq!(index.get(&keys(&["a", "a1"])), Some(&at([1, 0])));
    }

    #[test]
    fn move_into_another_parent_carries_subtree() {
        let mut index = BlockPathIndex::from_document(&abc());
        // `b` is at [0] once `a` has been taken out.
        index.on_move(&at([0]), &at([0, 1])).unwrap();
        assert_eq!(index.get(&keys(&["b", "a"])), Some(&at([0, 1])));
        assert_eq!(index.get(&keys(&["b", "a", "a1"])), Some(&at([0, 1, 0])));
        assert_eq!(index.get(&top("c")), Some(&at([1])));
        assert!(!index.has(&top("a")));
    }

    #[test]
    fn rename_rekeys_descendants() {
        let mut index = BlockPathIndex::from_document(&abc());
        index.on_rename(&at([1]), &BlockKey::new("b"), &BlockKey::new("bb")).unwrap();
        assert_eq!(index.get(&top("bb")), Some(&at([1])));
        assert_eq!(index.get(&keys(&["bb", "b1"])), Some(&at([1, 0])));
        assert!(!index.has(&keys(&["b", "b1"])));
        assert_eq!(index.key_path_at(&at([1, 0])), Some(keys(&["bb", "b1"])));
    }

    #[test]
    fn failures_leave_index_untouched() {
        let original = BlockPathIndex::from_document(&abc());
        let mut index = original.clone();

        assert_eq!(index.on_remove(&at([9])), Err(IndexError::PathNotFound(at([9]))));
        assert!(matches!(
            index.on_insert(&at([5]), BlockKey::new("x")),
            Err(IndexError::PositionOutOfBounds { len: 3, .. })
        ));
        assert_eq!(
            index.on_insert(&at([0]), BlockKey::new("c")),
            Err(IndexError::DuplicateKey(top("c")))
        );
        assert!(index.on_move(&at([0]), &at([7])).is_err());
        assert!(matches!(
            index.on_rename(&at([0]), &BlockKey::new("nope"), &BlockKey::new("z")),
            Err(IndexError::KeyNotFound(_))
        ));
        assert!(matches!(
            index.on_rename(&at([0]), &BlockKey::new("a"), &BlockKey::new("b")),
            Err(IndexError::DuplicateKey(_))
        ));
        assert_eq!(index, original);
    }
}

// ── Replaying document operations ─────────────────────────────────────────────

#[cfg(test)]
mod replay_tests {
    use super::*;
    use pte_core::{Operation, Point, Selection};

    fn replay(doc: &Document, index: &mut BlockPathIndex, ops: Vec<Operation>) {
        index.apply_operations(&ops).unwrap();
        assert_eq!(*index, BlockPathIndex::from_document(doc));
    }

    #[test]
    fn structural_mutators_stay_equivalent() {
        let mut doc = abc();
        let mut index = BlockPathIndex::from_document(&doc);

        let ops = doc.split_node(&at([0, 0]), 2, BlockKey::new("a2")).unwrap();
        replay(&doc, &mut index, ops);
        let ops = doc.split_node(&at([0]), 1, BlockKey::new("n")).unwrap();
        replay(&doc, &mut index, ops);
        let ops = doc.merge_node(&at([2])).unwrap();
        replay(&doc, &mut index, ops);
        let ops = doc.move_node(&at([0]), &at([2])).unwrap();
        replay(&doc, &mut index, ops);
        let ops = doc.set_key(&at([1]), BlockKey::new("renamed")).unwrap();
        replay(&doc, &mut index, ops);
        let ops = doc.insert_node(&at([0]), Node::paragraph("z", "z1", "zulu")).unwrap();
        replay(&doc, &mut index, ops);
        let ops = doc.remove_node(&at([3])).unwrap();
        replay(&doc, &mut index, ops);
    }

    #[test]
    fn text_operations_are_ignored() {
        let mut doc = abc();
        let before = BlockPathIndex::from_document(&doc);
        let mut index = before.clone();
        let span = keys(&["a", "a1"]);
        let mut ops = doc.insert_text(&Point::new(span.clone(), 0), "x").unwrap();
        ops.extend(doc.set_marks(&span, vec!["em".into()]).unwrap());
        ops.extend(doc.set_selection(Some(Selection::collapsed(Point::new(span, 1)))));
        index.apply_operations(&ops).unwrap();
        assert_eq!(index, before);
    }
}

// ── Timing ────────────────────────────────────────────────────────────────────
//
// Thresholds are generous so debug builds on slow CI still pass; the
// criterion bench in `benches/index_ops.rs` has the real numbers.

#[cfg(test)]
mod timing_tests {
    use std::time::{Duration, Instant};

    use super::*;
    use pte_core::Operation;

    #[test]
    fn rebuild_ten_thousand_blocks() {
        let doc = wide(10_000);
        let start = Instant::now();
        let index = BlockPathIndex::from_document(&doc);
        let elapsed = start.elapsed();
        assert_eq!(index.len(), 20_000);
        assert!(elapsed < Duration::from_millis(500), "rebuild took {elapsed:?}");
    }

    #[test]
    fn single_insert_on_large_document() {
        let mut index = BlockPathIndex::from_document(&wide(10_000));
        let start = Instant::now();
        index.on_insert(&at([0]), BlockKey::new("front")).unwrap();
        let elapsed = start.elapsed();
        assert_eq!(index.get(&top("b9999")), Some(&at([10_000])));
        assert!(elapsed < Duration::from_millis(250), "insert took {elapsed:?}");
    }

    #[test]
    fn text_operations_are_constant_time() {
        let mut index = BlockPathIndex::from_document(&wide(10_000));
        let op = Operation::InsertText { path: keys(&["b0", "s0"]), offset: 0, text: "x".into() };
        let start = Instant::now();
        for _ in 0..100_000 {
            index.apply_operation(&op).unwrap();
        }
        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_millis(200), "100k text ops took {elapsed:?}");
    }
}
