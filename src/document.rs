use std::sync::atomic::{AtomicU64, Ordering};

use ahash::HashSet;

use crate::error::ParseError;
use crate::pool::{BlockPool, PoolId, PoolStats};
use crate::xmlvalue::{AttributeData, Value, ValueType};

/// How whitespace in text is treated while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Whitespace {
    /// Keep text as written. Whitespace-only runs between tags are dropped.
    #[default]
    Preserve,
    /// Collapse each whitespace run in text to one space and trim the ends.
    Collapse,
}

/// Parse configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Decode entities and character references in text and attribute
    /// values. When off, they are kept (and printed) verbatim.
    pub process_entities: bool,
    /// Whitespace handling for text.
    pub whitespace: Whitespace,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            process_entities: true,
            whitespace: Whitespace::Preserve,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        DocumentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which pool a node lives in. Declarations and unknowns share the comment
/// pool, CDATA shares the text pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NodeSlot {
    Document,
    Element(PoolId),
    Text(PoolId),
    Comment(PoolId),
}

/// A node in a [`Document`].
///
/// This is a lightweight handle and can be copied. It is only meaningful
/// together with the document that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    pub(crate) document: DocumentId,
    pub(crate) slot: NodeSlot,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<Node>,
    pub(crate) first_child: Option<Node>,
    pub(crate) last_child: Option<Node>,
    pub(crate) prev: Option<Node>,
    pub(crate) next: Option<Node>,
    pub(crate) line: usize,
    pub(crate) user_data: Option<usize>,
    pub(crate) value: Value,
}

impl NodeData {
    pub(crate) fn new(value: Value, line: usize) -> Self {
        NodeData {
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
            line,
            user_data: None,
            value,
        }
    }
}

/// Allocation counters for each of a document's pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentPoolStats {
    /// Element nodes.
    pub element: PoolStats,
    /// Attributes.
    pub attribute: PoolStats,
    /// Text and CDATA nodes.
    pub text: PoolStats,
    /// Comment, declaration and unknown nodes.
    pub comment: PoolStats,
}

impl DocumentPoolStats {
    /// Sum of live allocations over all pools.
    pub fn current_allocs(&self) -> usize {
        self.element.current_allocs
            + self.attribute.current_allocs
            + self.text.current_allocs
            + self.comment.current_allocs
    }
}

/// An XML document: the parse buffer, the node tree and all node storage.
///
/// Nodes are addressed through [`Node`] handles and all access goes through
/// the document, which is the sole owner of node memory. Every node is
/// either linked into the tree below the document node, or unlinked scratch
/// that was created but not (yet) inserted.
///
/// ```rust
/// use tinydom::Document;
///
/// let mut doc = Document::new();
/// doc.parse("<p>Example</p>")?;
/// let p = doc.root_element().unwrap();
/// assert_eq!(doc.name(p), Some("p"));
/// assert_eq!(doc.text(p), Some("Example"));
/// # Ok::<(), tinydom::ParseError>(())
/// ```
#[derive(Debug)]
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) buffer: String,
    pub(crate) root: NodeData,
    pub(crate) element_pool: BlockPool<NodeData>,
    pub(crate) text_pool: BlockPool<NodeData>,
    pub(crate) comment_pool: BlockPool<NodeData>,
    pub(crate) attribute_pool: BlockPool<AttributeData>,
    pub(crate) unlinked: HashSet<Node>,
    pub(crate) options: ParseOptions,
    pub(crate) has_bom: bool,
    pub(crate) error: Option<ParseError>,
}

impl Document {
    /// Create an empty document with default options.
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    /// Create an empty document with the given parse options.
    pub fn with_options(options: ParseOptions) -> Self {
        Document {
            id: DocumentId::next(),
            buffer: String::new(),
            root: NodeData::new(Value::Document, 0),
            element_pool: BlockPool::new(),
            text_pool: BlockPool::new(),
            comment_pool: BlockPool::new(),
            attribute_pool: BlockPool::new(),
            unlinked: HashSet::default(),
            options,
            has_bom: false,
            error: None,
        }
    }

    /// The document node. It is the parent of all top-level nodes.
    pub fn document_node(&self) -> Node {
        Node {
            document: self.id,
            slot: NodeSlot::Document,
        }
    }

    /// The parse options of this document.
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Whether entities are decoded while parsing.
    pub fn process_entities(&self) -> bool {
        self.options.process_entities
    }

    /// The whitespace mode used while parsing.
    pub fn whitespace_mode(&self) -> Whitespace {
        self.options.whitespace
    }

    /// Whether the parsed input started with a UTF-8 byte order mark. The
    /// printer writes one back if set.
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Set whether a byte order mark is written when printing.
    pub fn set_bom(&mut self, bom: bool) {
        self.has_bom = bom;
    }

    /// The error recorded by the last failed parse or load.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Whether an error is recorded.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Line of the recorded error, or 0.
    pub fn error_line(&self) -> usize {
        self.error.as_ref().map_or(0, |e| e.line())
    }

    /// The recorded error rendered as text, or an empty string.
    pub fn error_str(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }

    /// Forget the recorded error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Delete all nodes and release all node storage.
    ///
    /// Handles to nodes of this document become stale.
    pub fn clear(&mut self) {
        self.free_children(self.document_node());
        for node in std::mem::take(&mut self.unlinked) {
            self.free_subtree(node);
        }
        self.element_pool.clear();
        self.text_pool.clear();
        self.comment_pool.clear();
        self.attribute_pool.clear();
        self.buffer.clear();
        self.has_bom = false;
        self.error = None;
    }

    /// Allocation counters of the node and attribute pools.
    pub fn pool_stats(&self) -> DocumentPoolStats {
        DocumentPoolStats {
            element: self.element_pool.stats(),
            attribute: self.attribute_pool.stats(),
            text: self.text_pool.stats(),
            comment: self.comment_pool.stats(),
        }
    }

    /// Check whether a node has been deleted (or belongs to another
    /// document).
    pub fn is_removed(&self, node: Node) -> bool {
        self.try_data(node).is_none()
    }

    /// Nodes that were created but are not part of the tree.
    pub fn unlinked_count(&self) -> usize {
        self.unlinked.len()
    }

    pub(crate) fn try_data(&self, node: Node) -> Option<&NodeData> {
        if node.document != self.id {
            return None;
        }
        match node.slot {
            NodeSlot::Document => Some(&self.root),
            NodeSlot::Element(id) => self.element_pool.get(id),
            NodeSlot::Text(id) => self.text_pool.get(id),
            NodeSlot::Comment(id) => self.comment_pool.get(id),
        }
    }

    pub(crate) fn try_data_mut(&mut self, node: Node) -> Option<&mut NodeData> {
        if node.document != self.id {
            return None;
        }
        match node.slot {
            NodeSlot::Document => Some(&mut self.root),
            NodeSlot::Element(id) => self.element_pool.get_mut(id),
            NodeSlot::Text(id) => self.text_pool.get_mut(id),
            NodeSlot::Comment(id) => self.comment_pool.get_mut(id),
        }
    }

    #[inline]
    pub(crate) fn data(&self, node: Node) -> &NodeData {
        match self.try_data(node) {
            Some(data) => data,
            None => panic!("node {:?} is removed or belongs to another document", node),
        }
    }

    #[inline]
    pub(crate) fn data_mut(&mut self, node: Node) -> &mut NodeData {
        match self.try_data_mut(node) {
            Some(data) => data,
            None => panic!("node {:?} is removed or belongs to another document", node),
        }
    }

    pub(crate) fn attribute_data(&self, id: PoolId) -> &AttributeData {
        &self.attribute_pool[id]
    }

    /// Allocate a node from the pool matching its kind. The node starts out
    /// unlinked.
    pub(crate) fn create_unlinked(&mut self, value: Value, line: usize) -> Node {
        let value_type = value.value_type();
        let data = NodeData::new(value, line);
        let slot = match value_type {
            ValueType::Element => NodeSlot::Element(self.element_pool.alloc(data)),
            ValueType::Text => NodeSlot::Text(self.text_pool.alloc(data)),
            ValueType::Comment | ValueType::Declaration | ValueType::Unknown => {
                NodeSlot::Comment(self.comment_pool.alloc(data))
            }
            ValueType::Document => unreachable!("the document node is never allocated"),
        };
        let node = Node {
            document: self.id,
            slot,
        };
        self.unlinked.insert(node);
        node
    }

    /// Record that an unlinked node is now part of the tree, or has been
    /// released.
    pub(crate) fn mark_in_use(&mut self, node: Node) {
        if self.unlinked.remove(&node) {
            match node.slot {
                NodeSlot::Document => {}
                NodeSlot::Element(_) => self.element_pool.set_tracked(),
                NodeSlot::Text(_) => self.text_pool.set_tracked(),
                NodeSlot::Comment(_) => self.comment_pool.set_tracked(),
            }
        }
    }

    /// Record that a node taken out of the tree is unlinked scratch again.
    pub(crate) fn mark_unlinked(&mut self, node: Node) {
        if self.unlinked.insert(node) {
            match node.slot {
                NodeSlot::Document => {}
                NodeSlot::Element(_) => self.element_pool.set_untracked(),
                NodeSlot::Text(_) => self.text_pool.set_untracked(),
                NodeSlot::Comment(_) => self.comment_pool.set_untracked(),
            }
        }
    }

    /// Release a node and all of its descendants and attributes. The node
    /// must already be detached from its parent.
    pub(crate) fn free_subtree(&mut self, node: Node) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            self.mark_in_use(current);
            let data = match current.slot {
                NodeSlot::Document => continue,
                NodeSlot::Element(id) => self.element_pool.free(id),
                NodeSlot::Text(id) => self.text_pool.free(id),
                NodeSlot::Comment(id) => self.comment_pool.free(id),
            };
            let Some(data) = data else { continue };
            let mut child = data.first_child;
            while let Some(c) = child {
                child = self.try_data(c).and_then(|d| d.next);
                stack.push(c);
            }
            if let Value::Element(element) = data.value {
                self.free_attributes(element.first_attribute);
            }
        }
    }

    pub(crate) fn free_attributes(&mut self, first: Option<PoolId>) {
        let mut attribute = first;
        while let Some(id) = attribute {
            attribute = self.attribute_pool.free(id).and_then(|a| a.next);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
