use crate::document::{Document, Node};
use crate::span::TextSpan;
use crate::xmlvalue::{Element, Text, Value};

const DEFAULT_DECLARATION: &str = "xml version=\"1.0\" encoding=\"UTF-8\"";

fn owned(s: &str) -> TextSpan {
    let mut span = TextSpan::new();
    span.set_owned(s);
    span
}

/// ## Creation
///
/// New nodes start out unlinked: they belong to the document but are not
/// part of the tree until inserted with
/// [`Document::insert_end_child`] and friends. Unlinked nodes are released
/// when the document is cleared or dropped.
impl Document {
    /// Create a new element with the given name.
    ///
    /// ```rust
    /// let mut doc = tinydom::Document::new();
    /// let el = doc.new_element("item");
    /// doc.insert_end_child(doc.document_node(), el).unwrap();
    /// assert_eq!(doc.print(true), "<item/>");
    /// ```
    pub fn new_element(&mut self, name: &str) -> Node {
        let mut element = Element::new();
        element.name = owned(name);
        self.create_unlinked(Value::Element(element), 0)
    }

    /// Create a new text node.
    pub fn new_text(&mut self, text: &str) -> Node {
        let mut value = Text::new(false);
        value.text = owned(text);
        self.create_unlinked(Value::Text(value), 0)
    }

    /// Create a new text node that is printed as a CDATA section.
    pub fn new_cdata(&mut self, text: &str) -> Node {
        let mut value = Text::new(true);
        value.text = owned(text);
        self.create_unlinked(Value::Text(value), 0)
    }

    /// Create a new comment. The text excludes the `<!--` and `-->`
    /// delimiters.
    pub fn new_comment(&mut self, comment: &str) -> Node {
        self.create_unlinked(Value::Comment(owned(comment)), 0)
    }

    /// Create a new declaration. Without text this is
    /// `xml version="1.0" encoding="UTF-8"`.
    pub fn new_declaration(&mut self, text: Option<&str>) -> Node {
        let text = text.unwrap_or(DEFAULT_DECLARATION);
        self.create_unlinked(Value::Declaration(owned(text)), 0)
    }

    /// Create a new unknown node, printed as `<!text>`.
    pub fn new_unknown(&mut self, text: &str) -> Node {
        self.create_unlinked(Value::Unknown(owned(text)), 0)
    }
}
