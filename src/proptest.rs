//! Proptest support for tinydom
//!
//! Proptests check *properties* of code that must hold for arbitrary data.
//! The strategies here generate arbitrary documents as [`fixed`](crate::fixed)
//! descriptions, which you turn into nodes with `build`.
//!
//! Enable this with the `proptest` feature:
//!
//! ```toml
//! [dependencies]
//! tinydom = { version = "0.1", features = ["proptest"] }
//! ```
//!
//! Generated documents print to XML that parses back into an equal tree:
//! text is never empty or whitespace only, no two text nodes are adjacent,
//! and comments, declarations and unknown nodes only contain text their
//! terminators cannot occur in.

use ahash::HashSet;
use proptest::prelude::*;

use crate::fixed::{Content, Document, Element};

const ELEMENT_NAMES: &[&str] = &["a", "b", "c", "d", "e", "item", "x:y", "_z.1"];
const ATTRIBUTE_NAMES: &[&str] = &["q", "r", "s", "id", "data-v"];
const DECLARATIONS: &[&str] = &[
    "xml version=\"1.0\"",
    "xml version=\"1.0\" encoding=\"UTF-8\"",
    "xml-stylesheet href=\"style.css\"",
];
const UNKNOWNS: &[&str] = &["DOCTYPE html", "ELEMENT a ANY", "ENTITY x \"y\""];
const TEXT: &str = "[a-z0-9 \t\n&<>\"'=;#\u{e9}\u{4e2d}]{1,12}";
const ATTRIBUTE_VALUE: &str = "[a-z0-9 \t\n&<>\"'=;#\u{e9}]{0,8}";
const COMMENT: &str = "[a-z0-9 \n&<>\"'!?]{0,12}";

fn non_blank(s: &str) -> bool {
    s.chars().any(|c| !matches!(c, ' ' | '\t' | '\n'))
}

fn arb_text() -> impl Strategy<Value = String> {
    TEXT.prop_filter("text must not be blank", |s| non_blank(s))
}

fn arb_attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((prop::sample::select(ATTRIBUTE_NAMES), ATTRIBUTE_VALUE), 0..4)
        .prop_map(|attributes| {
            let mut seen = HashSet::default();
            attributes
                .into_iter()
                .filter(|(name, _)| seen.insert(*name))
                .map(|(name, value)| (name.to_string(), value))
                .collect()
        })
}

fn arb_misc() -> impl Strategy<Value = Content> {
    prop_oneof![
        COMMENT.prop_map(Content::Comment),
        prop::sample::select(UNKNOWNS).prop_map(|s| Content::Unknown(s.to_string())),
    ]
}

/// Text nodes next to each other would be parsed as one.
fn separate_text(children: Vec<Content>) -> Vec<Content> {
    let mut result: Vec<Content> = Vec::with_capacity(children.len());
    for child in children {
        let follows_text = matches!(result.last(), Some(Content::Text(_)));
        if follows_text && matches!(child, Content::Text(_)) {
            continue;
        }
        result.push(child);
    }
    result
}

/// Generate arbitrary content that can occur inside an element.
pub fn arb_content() -> impl Strategy<Value = Content> {
    let leaf = prop_oneof![
        3 => arb_text().prop_map(Content::Text),
        1 => arb_text().prop_map(|s| Content::CData(s.replace(']', ""))),
        1 => arb_misc(),
    ];

    leaf.prop_recursive(
        8,   // levels deep
        128, // maximum number of nodes
        8,   // items per collection
        |inner| {
            (
                prop::sample::select(ELEMENT_NAMES),
                arb_attributes(),
                prop::collection::vec(inner, 0..8),
            )
                .prop_map(|(name, attributes, children)| {
                    Content::Element(Element {
                        name: name.to_string(),
                        attributes,
                        children: separate_text(children),
                    })
                })
        },
    )
}

prop_compose! {
    /// Generate an arbitrary element with arbitrary content.
    pub fn arb_element()(name in prop::sample::select(ELEMENT_NAMES),
                         attributes in arb_attributes(),
                         children in prop::collection::vec(arb_content(), 0..6)) -> Element {
        Element {
            name: name.to_string(),
            attributes,
            children: separate_text(children),
        }
    }
}

/// Generate an arbitrary document: optional declarations, then comments and
/// unknown nodes around a single root element.
///
/// ```notrust
/// use proptest::prelude::*;
/// use tinydom::proptest::arb_document;
///
/// proptest! {
///     #[test]
///     fn test_printed_document_parses(fixed in arb_document()) {
///         let mut doc = tinydom::Document::new();
///         fixed.build(&mut doc);
///         prop_assert!(tinydom::parse(doc.print(false)).is_ok());
///     }
/// }
/// ```
pub fn arb_document() -> impl Strategy<Value = Document> {
    (
        prop::collection::vec(prop::sample::select(DECLARATIONS), 0..2),
        prop::collection::vec(arb_misc(), 0..3),
        arb_element(),
        prop::collection::vec(arb_misc(), 0..3),
    )
        .prop_map(|(declarations, before, root, after)| {
            let mut children: Vec<Content> = declarations
                .into_iter()
                .map(|d| Content::Declaration(d.to_string()))
                .collect();
            children.extend(before);
            children.push(Content::Element(root));
            children.extend(after);
            Document { children }
        })
}
