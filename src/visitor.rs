use crate::access::Attributes;
use crate::document::{Document, Node};
use crate::xmlvalue::ValueType;

/// A visitor over a document tree, driven by [`Document::accept`].
///
/// The `enter_*` methods return whether to descend into the children of a
/// node. Every other method returns whether to continue with the next
/// sibling. All methods default to `true`, so a visitor only implements what
/// it needs.
///
/// ```rust
/// use tinydom::{Attributes, Document, Node, Visitor};
///
/// #[derive(Default)]
/// struct Names(Vec<String>);
///
/// impl Visitor for Names {
///     fn enter_element(&mut self, doc: &Document, node: Node, _: Attributes<'_>) -> bool {
///         self.0.push(doc.name(node).unwrap().to_string());
///         true
///     }
/// }
///
/// let doc = tinydom::parse("<a><b/><c><d/></c></a>").unwrap();
/// let mut names = Names::default();
/// doc.accept(doc.document_node(), &mut names);
/// assert_eq!(names.0, ["a", "b", "c", "d"]);
/// ```
pub trait Visitor {
    /// Called before the children of the document node.
    fn enter_document(&mut self, _doc: &Document) -> bool {
        true
    }
    /// Called after the children of the document node.
    fn exit_document(&mut self, _doc: &Document) -> bool {
        true
    }
    /// Called before the children of an element.
    fn enter_element(&mut self, _doc: &Document, _element: Node, _attributes: Attributes<'_>) -> bool {
        true
    }
    /// Called after the children of an element.
    fn exit_element(&mut self, _doc: &Document, _element: Node) -> bool {
        true
    }
    /// Called for a text node, including CDATA.
    fn visit_text(&mut self, _doc: &Document, _text: Node) -> bool {
        true
    }
    /// Called for a comment.
    fn visit_comment(&mut self, _doc: &Document, _comment: Node) -> bool {
        true
    }
    /// Called for a declaration.
    fn visit_declaration(&mut self, _doc: &Document, _declaration: Node) -> bool {
        true
    }
    /// Called for an unknown node.
    fn visit_unknown(&mut self, _doc: &Document, _unknown: Node) -> bool {
        true
    }
}

/// ## Visiting
impl Document {
    /// Walk `node` and its descendants in document order with a visitor.
    ///
    /// Children of a container are visited until one returns `false`. The
    /// result is that of `exit_*` for containers and `visit_*` for leaves.
    pub fn accept<V: Visitor + ?Sized>(&self, node: Node, visitor: &mut V) -> bool {
        match self.value_type(node) {
            ValueType::Document => {
                if visitor.enter_document(self) {
                    self.accept_children(node, visitor);
                }
                visitor.exit_document(self)
            }
            ValueType::Element => {
                if visitor.enter_element(self, node, self.attributes(node)) {
                    self.accept_children(node, visitor);
                }
                visitor.exit_element(self, node)
            }
            ValueType::Text => visitor.visit_text(self, node),
            ValueType::Comment => visitor.visit_comment(self, node),
            ValueType::Declaration => visitor.visit_declaration(self, node),
            ValueType::Unknown => visitor.visit_unknown(self, node),
        }
    }

    fn accept_children<V: Visitor + ?Sized>(&self, node: Node, visitor: &mut V) {
        for child in self.children(node) {
            if !self.accept(child, visitor) {
                break;
            }
        }
    }
}
