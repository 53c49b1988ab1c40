#![forbid(unsafe_code)]
//! A small, fast XML document model.
//!
//! [`parse`] turns bytes into a [`Document`]: a tree of nodes stored in
//! per-kind block pools and addressed through copyable [`Node`] handles.
//! Text is not copied while parsing; names and values point into the parse
//! buffer and are normalized the first time they are read. The tree can be
//! navigated, queried and changed, and printed back to XML with
//! [`Document::print`] or any [`Printer`].
//!
//! ```rust
//! let mut doc = tinydom::parse(r#"<list><item n="1">one</item></list>"#)?;
//! let list = doc.root_element().unwrap();
//! let item = doc.first_child_element(list, Some("item")).unwrap();
//! assert_eq!(doc.query_attribute::<i32>(item, "n")?, 1);
//!
//! let two = doc.new_element("item");
//! doc.set_attribute_value(two, "n", 2)?;
//! doc.set_text(two, "two")?;
//! doc.insert_end_child(list, two)?;
//!
//! assert_eq!(
//!     doc.print(true),
//!     r#"<list><item n="1">one</item><item n="2">two</item></list>"#
//! );
//! # Ok::<(), tinydom::Error>(())
//! ```
//!
//! Nodes belong to the document that created them. Moving nodes between
//! documents goes through [`Document::deep_clone_into`], or through the
//! owned [`fixed`] representation.

mod access;
mod creation;
mod document;
mod encoding;
mod entity;
mod error;
mod file;
pub mod fixed;
mod manipulation;
mod parse;
mod pool;
mod printer;
mod span;
mod valueaccess;
mod visitor;
mod xmlvalue;

#[cfg(feature = "proptest")]
pub mod proptest;

pub use access::{Attribute, Attributes, NodeEdge};
pub use document::{Document, DocumentPoolStats, Node, ParseOptions, Whitespace};
pub use error::{Error, ErrorKind, ParseError};
pub use parse::{parse, parse_with_options, MAX_ELEMENT_DEPTH};
pub use pool::PoolStats;
pub use printer::{PrintOptions, Printer};
pub use valueaccess::XmlScalar;
pub use visitor::Visitor;
pub use xmlvalue::{ClosingType, ValueType};
