//! A fixed representation of a tree of nodes.
//!
//! Document trees are mutable and their nodes only make sense together with
//! the document that owns them. The types here describe a subtree as plain
//! owned data that you can create, compare and store separately. Turn it
//! into nodes by calling `build` with the document that should own them.
//!
//! Example:
//!
//! ```rust
//! use tinydom::fixed;
//!
//! let fixed_element = fixed::Element {
//!     name: "foo".to_string(),
//!     attributes: vec![("id".to_string(), "1".to_string())],
//!     children: vec![fixed::Content::Text("Example".to_string())],
//! };
//!
//! let mut doc = tinydom::Document::new();
//! let node = fixed_element.build(&mut doc);
//! doc.insert_end_child(doc.document_node(), node).unwrap();
//! assert_eq!(doc.print(true), r#"<foo id="1">Example</foo>"#);
//! ```

use crate::document::{Document as Dom, Node};
use crate::xmlvalue::Value;

/// A fixed representation of a whole document: its top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Document {
    /// Nodes directly under the document node.
    pub children: Vec<Content>,
}

/// A fixed representation of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    /// Name of element
    pub name: String,
    /// Attributes in order
    pub attributes: Vec<(String, String)>,
    /// Children
    pub children: Vec<Content>,
}

/// A fixed representation of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    /// An element node
    Element(Element),
    /// A text node
    Text(String),
    /// A text node printed as CDATA
    CData(String),
    /// A comment node
    Comment(String),
    /// A declaration node
    Declaration(String),
    /// An unknown node
    Unknown(String),
}

impl Document {
    /// Append the fixed nodes to the document node of `doc`.
    pub fn build(&self, doc: &mut Dom) {
        let document_node = doc.document_node();
        for content in &self.children {
            let node = content.build(doc);
            doc.append_unchecked(document_node, node);
        }
    }
}

impl Element {
    /// Turn a fixed element into an unlinked node of `doc`.
    pub fn build(&self, doc: &mut Dom) -> Node {
        let node = doc.new_element(&self.name);
        for (name, value) in &self.attributes {
            doc.push_attribute(node, name, value);
        }
        for child in &self.children {
            let child = child.build(doc);
            doc.append_unchecked(node, child);
        }
        node
    }
}

impl Content {
    /// Turn fixed content into an unlinked node of `doc`.
    pub fn build(&self, doc: &mut Dom) -> Node {
        match self {
            Content::Element(element) => element.build(doc),
            Content::Text(text) => doc.new_text(text),
            Content::CData(text) => doc.new_cdata(text),
            Content::Comment(comment) => doc.new_comment(comment),
            Content::Declaration(declaration) => doc.new_declaration(Some(declaration)),
            Content::Unknown(unknown) => doc.new_unknown(unknown),
        }
    }
}

impl Dom {
    /// Snapshot a node, with or without its descendants. Returns [`None`]
    /// for the document node; use [`Dom::to_fixed_document`] for that.
    pub fn to_fixed(&self, node: Node, deep: bool) -> Option<Content> {
        let value = self.value(node)?.to_string();
        Some(match &self.data(node).value {
            Value::Document => return None,
            Value::Element(_) => Content::Element(Element {
                name: value,
                attributes: self
                    .attributes(node)
                    .map(|a| (a.name().to_string(), a.value().to_string()))
                    .collect(),
                children: if deep {
                    self.children(node)
                        .filter_map(|child| self.to_fixed(child, true))
                        .collect()
                } else {
                    Vec::new()
                },
            }),
            Value::Text(text) if text.cdata => Content::CData(value),
            Value::Text(_) => Content::Text(value),
            Value::Comment(_) => Content::Comment(value),
            Value::Declaration(_) => Content::Declaration(value),
            Value::Unknown(_) => Content::Unknown(value),
        })
    }

    /// Snapshot all nodes of the document.
    pub fn to_fixed_document(&self) -> Document {
        Document {
            children: self
                .children(self.document_node())
                .filter_map(|child| self.to_fixed(child, true))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let mut doc = Dom::new();
        let fixed = Document {
            children: vec![
                Content::Declaration("xml version=\"1.0\"".to_string()),
                Content::Element(Element {
                    name: "foo".to_string(),
                    attributes: vec![],
                    children: vec![
                        Content::Text("Example".to_string()),
                        Content::CData("<x>".to_string()),
                    ],
                }),
            ],
        };
        fixed.build(&mut doc);
        assert_eq!(
            doc.print(true),
            "<?xml version=\"1.0\"?><foo>Example<![CDATA[<x>]]></foo>"
        );
        assert_eq!(doc.unlinked_count(), 0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let doc = crate::parse(r#"<a x="1"><b>t</b><!--c--><![CDATA[d]]></a>"#).unwrap();
        let fixed = doc.to_fixed_document();
        let mut copy = Dom::new();
        fixed.build(&mut copy);
        assert_eq!(copy.to_fixed_document(), fixed);
    }

    #[test]
    fn test_shallow_snapshot() {
        let doc = crate::parse(r#"<a x="1"><b/></a>"#).unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(
            doc.to_fixed(a, false),
            Some(Content::Element(Element {
                name: "a".to_string(),
                attributes: vec![("x".to_string(), "1".to_string())],
                children: vec![],
            }))
        );
        assert_eq!(doc.to_fixed(doc.document_node(), true), None);
    }
}
