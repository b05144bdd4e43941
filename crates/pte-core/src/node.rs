//! Document tree nodes.

use smol_str::SmolStr;

use crate::BlockKey;

/// What a node is.  Only text blocks hold spans; spans never hold children.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// A paragraph-like block whose children are spans.
    TextBlock {
        style:     SmolStr,
        list_item: Option<SmolStr>,
        level:     Option<u8>,
    },

    /// A run of text sharing one set of marks (decorators and annotations).
    Span {
        text:  String,
        marks: Vec<SmolStr>,
    },

    /// Any non-text node (image, break, embed, container).  May nest.
    Object {
        type_name: SmolStr,
    },
}

/// A node in the document tree.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub key:      BlockKey,
    pub kind:     NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    /// Text block with the given style and no children.
    pub fn text_block(key: impl Into<BlockKey>, style: &str) -> Self {
        Self {
            key:      key.into(),
            kind:     NodeKind::TextBlock {
                style:     SmolStr::new(style),
                list_item: None,
                level:     None,
            },
            children: Vec::new(),
        }
    }

    /// Shorthand for a `"normal"` text block holding a single unmarked span.
    pub fn paragraph(key: impl Into<BlockKey>, span_key: impl Into<BlockKey>, text: &str) -> Self {
        Self::text_block(key, "normal").with_children(vec![Node::span(span_key, text)])
    }

    pub fn span(key: impl Into<BlockKey>, text: &str) -> Self {
        Self {
            key:      key.into(),
            kind:     NodeKind::Span { text: text.to_owned(), marks: Vec::new() },
            children: Vec::new(),
        }
    }

    pub fn object(key: impl Into<BlockKey>, type_name: &str) -> Self {
        Self {
            key:      key.into(),
            kind:     NodeKind::Object { type_name: SmolStr::new(type_name) },
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Replace the marks of a span.  No effect on other kinds.
    pub fn with_marks<I, S>(mut self, new_marks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let NodeKind::Span { marks, .. } = &mut self.kind {
            *marks = new_marks.into_iter().map(SmolStr::new).collect();
        }
        self
    }

    #[inline]
    pub fn is_text_block(&self) -> bool {
        matches!(self.kind, NodeKind::TextBlock { .. })
    }

    #[inline]
    pub fn is_span(&self) -> bool {
        matches!(self.kind, NodeKind::Span { .. })
    }

    /// Span text, `None` for other kinds.
    pub fn span_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Span { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Span marks, empty for other kinds.
    pub fn marks(&self) -> &[SmolStr] {
        match &self.kind {
            NodeKind::Span { marks, .. } => marks,
            _ => &[],
        }
    }

    /// Text block style, `None` for other kinds.
    pub fn style(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::TextBlock { style, .. } => Some(style),
            _ => None,
        }
    }

    /// Span length in chars (0 for other kinds).
    pub fn text_len(&self) -> usize {
        self.span_text().map_or(0, |t| t.chars().count())
    }

    /// Concatenated text of this node and all descendant spans.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(t) = self.span_text() {
            out.push_str(t);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }

    /// A copy of this node's kind with empty text (spans keep their marks).
    ///
    /// Used when splitting: the new sibling inherits style and marks.
    pub(crate) fn empty_like(&self, key: BlockKey) -> Node {
        let kind = match &self.kind {
            NodeKind::Span { marks, .. } => NodeKind::Span { text: String::new(), marks: marks.clone() },
            other => other.clone(),
        };
        Node { key, kind, children: Vec::new() }
    }
}

/// Byte offset of the `chars`-th char in `s`, or `s.len()` when `chars` is
/// exactly the char count.  `None` when past the end.
pub(crate) fn byte_offset(s: &str, chars: usize) -> Option<usize> {
    match s.char_indices().nth(chars) {
        Some((byte, _)) => Some(byte),
        None if s.chars().count() == chars => Some(s.len()),
        None => None,
    }
}
