use genawaiter::rc::gen;
use genawaiter::yield_;

use crate::document::{Document, Node};
use crate::pool::PoolId;
use crate::xmlvalue::{ClosingType, Value, ValueType};

/// Node edges.
///
/// Used by [`Document::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEdge {
    /// The start edge of a node. For an element this is the start tag, for
    /// the document node the start of the document.
    Start(Node),
    /// The end edge of a node. For nodes other than the document and
    /// elements it immediately follows the start edge.
    End(Node),
}

/// An attribute of an element, as seen through [`Document::attributes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    name: &'a str,
    value: &'a str,
    line: usize,
}

impl<'a> Attribute<'a> {
    /// The attribute name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The attribute value, with entities decoded.
    pub fn value(&self) -> &'a str {
        self.value
    }

    /// Line on which the attribute starts in the parsed input, or 0.
    pub fn line_number(&self) -> usize {
        self.line
    }
}

/// Iterator over the attributes of an element in document order.
#[derive(Debug, Clone)]
pub struct Attributes<'a> {
    doc: &'a Document,
    next: Option<PoolId>,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        let data = self.doc.attribute_pool.get(self.next?)?;
        self.next = data.next;
        Some(Attribute {
            name: data.name.get(&self.doc.buffer),
            value: data.value.get(&self.doc.buffer),
            line: data.line,
        })
    }
}

/// ## Read-only access
impl Document {
    /// The first element child of the document node.
    ///
    /// ```rust
    /// let doc = tinydom::parse("<?xml version=\"1.0\"?><!-- c --><root/>").unwrap();
    /// let root = doc.root_element().unwrap();
    /// assert_eq!(doc.name(root), Some("root"));
    /// ```
    pub fn root_element(&self) -> Option<Node> {
        self.first_child_element(self.document_node(), None)
    }

    /// Get parent node.
    ///
    /// Returns [`None`] for the document node and for unlinked nodes.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.data(node).parent
    }

    /// Get first child.
    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.data(node).first_child
    }

    /// Get last child.
    pub fn last_child(&self, node: Node) -> Option<Node> {
        self.data(node).last_child
    }

    /// Get next sibling.
    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        self.data(node).next
    }

    /// Get previous sibling.
    pub fn previous_sibling(&self, node: Node) -> Option<Node> {
        self.data(node).prev
    }

    /// Whether the node has no children.
    pub fn no_children(&self, node: Node) -> bool {
        self.data(node).first_child.is_none()
    }

    fn element_named(&self, node: Node, name: Option<&str>) -> bool {
        match &self.data(node).value {
            Value::Element(element) => {
                name.map_or(true, |name| element.name.get(&self.buffer) == name)
            }
            _ => false,
        }
    }

    /// First child that is an element, optionally with the given name.
    ///
    /// ```rust
    /// let doc = tinydom::parse("<p>text<a/><b/><a id=\"2\"/></p>").unwrap();
    /// let p = doc.root_element().unwrap();
    /// let a = doc.first_child_element(p, None).unwrap();
    /// assert_eq!(doc.name(a), Some("a"));
    /// let b = doc.first_child_element(p, Some("b")).unwrap();
    /// assert_eq!(doc.name(b), Some("b"));
    /// ```
    pub fn first_child_element(&self, node: Node, name: Option<&str>) -> Option<Node> {
        self.children(node)
            .find(|child| self.element_named(*child, name))
    }

    /// Last child that is an element, optionally with the given name.
    pub fn last_child_element(&self, node: Node, name: Option<&str>) -> Option<Node> {
        let mut current = self.last_child(node);
        while let Some(child) = current {
            if self.element_named(child, name) {
                return Some(child);
            }
            current = self.previous_sibling(child);
        }
        None
    }

    /// Next sibling that is an element, optionally with the given name.
    pub fn next_sibling_element(&self, node: Node, name: Option<&str>) -> Option<Node> {
        let mut current = self.next_sibling(node);
        while let Some(sibling) = current {
            if self.element_named(sibling, name) {
                return Some(sibling);
            }
            current = self.next_sibling(sibling);
        }
        None
    }

    /// Previous sibling that is an element, optionally with the given name.
    pub fn previous_sibling_element(&self, node: Node, name: Option<&str>) -> Option<Node> {
        let mut current = self.previous_sibling(node);
        while let Some(sibling) = current {
            if self.element_named(sibling, name) {
                return Some(sibling);
            }
            current = self.previous_sibling(sibling);
        }
        None
    }

    /// Iterator over the child nodes of this node.
    ///
    /// ```rust
    /// let doc = tinydom::parse("<p><a/>text<b/></p>").unwrap();
    /// let p = doc.root_element().unwrap();
    /// let values = doc.children(p).map(|n| doc.value(n).unwrap()).collect::<Vec<_>>();
    /// assert_eq!(values, vec!["a", "text", "b"]);
    /// ```
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        std::iter::successors(self.first_child(node), move |child| {
            self.next_sibling(*child)
        })
    }

    /// Iterator over ancestor nodes, including this one.
    pub fn ancestors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        std::iter::successors(Some(node), move |n| self.parent(*n))
    }

    /// Iterator over this node and its descendants in document order.
    pub fn descendants(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.traverse(node).filter_map(|edge| match edge {
            NodeEdge::Start(node) => Some(node),
            NodeEdge::End(_) => None,
        })
    }

    /// Traverse over node edges.
    ///
    /// This walks the tree in document order without recursion, while
    /// keeping structure information.
    ///
    /// ```rust
    /// use tinydom::NodeEdge;
    ///
    /// let doc = tinydom::parse("<a><b>Text</b></a>").unwrap();
    /// let a = doc.root_element().unwrap();
    /// let b = doc.first_child(a).unwrap();
    /// let text = doc.first_child(b).unwrap();
    /// let edges = doc.traverse(a).collect::<Vec<_>>();
    /// assert_eq!(edges, vec![
    ///     NodeEdge::Start(a),
    ///     NodeEdge::Start(b),
    ///     NodeEdge::Start(text),
    ///     NodeEdge::End(text),
    ///     NodeEdge::End(b),
    ///     NodeEdge::End(a),
    /// ]);
    /// ```
    pub fn traverse(&self, node: Node) -> impl Iterator<Item = NodeEdge> + '_ {
        gen!({
            let mut current = node;
            'walk: loop {
                yield_!(NodeEdge::Start(current));
                if let Some(child) = self.first_child(current) {
                    current = child;
                    continue;
                }
                loop {
                    yield_!(NodeEdge::End(current));
                    if current == node {
                        break 'walk;
                    }
                    if let Some(next) = self.next_sibling(current) {
                        current = next;
                        continue 'walk;
                    }
                    match self.parent(current) {
                        Some(parent) => current = parent,
                        None => break 'walk,
                    }
                }
            }
        })
        .into_iter()
    }

    /// Get the [`ValueType`] of a node.
    pub fn value_type(&self, node: Node) -> ValueType {
        self.data(node).value.value_type()
    }

    /// Return true if node is the document node.
    pub fn is_document(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Document
    }

    /// Return true if node is an element.
    pub fn is_element(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Element
    }

    /// Return true if node is text, including CDATA.
    pub fn is_text(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Text
    }

    /// Return true if node is a comment.
    pub fn is_comment(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Comment
    }

    /// Return true if node is a declaration.
    pub fn is_declaration(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Declaration
    }

    /// Return true if node is an unknown construct.
    pub fn is_unknown(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Unknown
    }

    /// The value of a node: the name of an element, the content of the
    /// other kinds. The document node has no value.
    ///
    /// Text is normalized on first access.
    pub fn value(&self, node: Node) -> Option<&str> {
        self.data(node)
            .value
            .span()
            .map(|span| span.get(&self.buffer))
    }

    /// The name of an element, or [`None`] for other nodes.
    pub fn name(&self, node: Node) -> Option<&str> {
        match &self.data(node).value {
            Value::Element(element) => Some(element.name.get(&self.buffer)),
            _ => None,
        }
    }

    /// Whether this is a text node written as CDATA.
    pub fn is_cdata(&self, node: Node) -> bool {
        matches!(&self.data(node).value, Value::Text(text) if text.cdata)
    }

    /// How the tag of an element was closed when parsed.
    pub fn closing_type(&self, node: Node) -> Option<ClosingType> {
        match &self.data(node).value {
            Value::Element(element) => Some(element.closing_type),
            _ => None,
        }
    }

    /// Line on which the node starts in the parsed input. Nodes created
    /// through the API report 0.
    pub fn line_number(&self, node: Node) -> usize {
        self.data(node).line
    }

    /// Opaque data attached with [`Document::set_user_data`].
    pub fn user_data(&self, node: Node) -> Option<usize> {
        self.data(node).user_data
    }

    pub(crate) fn first_attribute_id(&self, node: Node) -> Option<PoolId> {
        match &self.data(node).value {
            Value::Element(element) => element.first_attribute,
            _ => None,
        }
    }

    pub(crate) fn find_attribute(&self, node: Node, name: &str) -> Option<PoolId> {
        let mut current = self.first_attribute_id(node);
        while let Some(id) = current {
            let attribute = self.attribute_data(id);
            if attribute.name.get(&self.buffer) == name {
                return Some(id);
            }
            current = attribute.next;
        }
        None
    }

    /// Iterator over the attributes of an element, in document order. Other
    /// nodes have no attributes.
    ///
    /// ```rust
    /// let doc = tinydom::parse(r#"<a x="1" y="2"/>"#).unwrap();
    /// let a = doc.root_element().unwrap();
    /// let attributes = doc
    ///     .attributes(a)
    ///     .map(|a| (a.name(), a.value()))
    ///     .collect::<Vec<_>>();
    /// assert_eq!(attributes, vec![("x", "1"), ("y", "2")]);
    /// ```
    pub fn attributes(&self, node: Node) -> Attributes<'_> {
        Attributes {
            doc: self,
            next: self.first_attribute_id(node),
        }
    }

    /// The value of the named attribute.
    pub fn attribute(&self, node: Node, name: &str) -> Option<&str> {
        self.find_attribute(node, name)
            .map(|id| self.attribute_data(id).value.get(&self.buffer))
    }

    /// Whether the named attribute exists and has the given value.
    pub fn attribute_eq(&self, node: Node, name: &str, value: &str) -> bool {
        self.attribute(node, name) == Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation() {
        let doc = crate::parse("<r><a/>t<b/><!--c--><a/></r>").unwrap();
        let r = doc.root_element().unwrap();
        let a0 = doc.first_child(r).unwrap();
        let t = doc.next_sibling(a0).unwrap();
        let b = doc.next_sibling(t).unwrap();
        let c = doc.next_sibling(b).unwrap();
        let a1 = doc.last_child(r).unwrap();
        assert_eq!(doc.previous_sibling(a1), Some(c));
        assert_eq!(doc.previous_sibling(a0), None);
        assert_eq!(doc.next_sibling(a1), None);
        assert_eq!(doc.parent(t), Some(r));
        assert_eq!(doc.parent(r), Some(doc.document_node()));
        assert_eq!(doc.parent(doc.document_node()), None);

        assert_eq!(doc.next_sibling_element(a0, None), Some(b));
        assert_eq!(doc.next_sibling_element(a0, Some("a")), Some(a1));
        assert_eq!(doc.previous_sibling_element(a1, None), Some(b));
        assert_eq!(doc.previous_sibling_element(a1, Some("a")), Some(a0));
        assert_eq!(doc.last_child_element(r, Some("b")), Some(b));
        assert_eq!(doc.last_child_element(r, Some("z")), None);
        assert_eq!(doc.children(r).count(), 5);
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let doc = crate::parse("<a><b><c/></b><d/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let c = doc.first_child(b).unwrap();
        let d = doc.next_sibling(b).unwrap();
        assert_eq!(
            doc.ancestors(c).collect::<Vec<_>>(),
            vec![c, b, a, doc.document_node()]
        );
        assert_eq!(doc.descendants(a).collect::<Vec<_>>(), vec![a, b, c, d]);
        assert_eq!(doc.descendants(b).collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn test_traverse_leaf() {
        let doc = crate::parse("<a/>").unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(
            doc.traverse(a).collect::<Vec<_>>(),
            vec![NodeEdge::Start(a), NodeEdge::End(a)]
        );
    }

    #[test]
    fn test_value_and_name() {
        let doc = crate::parse("<a>text<!--c--></a>").unwrap();
        let a = doc.root_element().unwrap();
        let text = doc.first_child(a).unwrap();
        let comment = doc.last_child(a).unwrap();
        assert_eq!(doc.value(doc.document_node()), None);
        assert_eq!(doc.value(a), Some("a"));
        assert_eq!(doc.name(a), Some("a"));
        assert_eq!(doc.value(text), Some("text"));
        assert_eq!(doc.name(text), None);
        assert_eq!(doc.value(comment), Some("c"));
        assert!(doc.is_comment(comment));
        assert_eq!(doc.closing_type(a), Some(ClosingType::Open));
    }

    #[test]
    fn test_attribute_lookup() {
        let doc = crate::parse(r#"<a x="1" y='two'/>"#).unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.attribute(a, "x"), Some("1"));
        assert_eq!(doc.attribute(a, "y"), Some("two"));
        assert_eq!(doc.attribute(a, "z"), None);
        assert!(doc.attribute_eq(a, "y", "two"));
        assert!(!doc.attribute_eq(a, "y", "2"));
        assert_eq!(doc.closing_type(a), Some(ClosingType::Closed));
    }

    #[test]
    fn test_line_numbers() {
        let doc = crate::parse("<a>\n  <b\n  x='1'/>\n  text\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let text = doc.next_sibling(b).unwrap();
        assert_eq!(doc.line_number(a), 1);
        assert_eq!(doc.line_number(b), 2);
        assert_eq!(doc.attributes(b).next().unwrap().line_number(), 3);
        assert_eq!(doc.line_number(text), 4);
    }
}
