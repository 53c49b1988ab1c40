//! Turn a document, or a sequence of push calls, into XML text.
//!
//! The [`Printer`] is a [`Visitor`], so any document or subtree can be
//! printed with [`Document::accept`]. It can also be driven directly to
//! write XML without building a document first:
//!
//! ```rust
//! use tinydom::Printer;
//!
//! let mut printer = Printer::new(false);
//! printer.open_element("list");
//! printer.push_attribute("count", "2");
//! for item in ["a & b", "c"] {
//!     printer.open_element("item");
//!     printer.push_text(item, false);
//!     printer.close_element();
//! }
//! printer.close_element();
//! assert_eq!(
//!     printer.as_str(),
//!     "<list count=\"2\">\n    <item>a &amp; b</item>\n    <item>c</item>\n</list>\n"
//! );
//! ```

use std::fmt;
use std::io::{self, Write};

use tracing::debug;

use crate::access::Attributes;
use crate::document::{Document, Node};
use crate::entity::{escape_attribute, escape_text};
use crate::error::Error;
use crate::valueaccess::XmlScalar;
use crate::visitor::Visitor;

const INDENT: &str = "    ";

/// Options for printing a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrintOptions {
    /// No newlines or indentation.
    pub compact: bool,
    /// Write a UTF-8 byte order mark. `None` writes one if the parsed
    /// input had one.
    pub write_bom: Option<bool>,
    /// Write `<?xml version="1.0"?>` before the content.
    pub write_declaration: bool,
}

/// Writes XML to an [`io::Write`], by default an in-memory buffer.
///
/// In pretty mode every element starts on a new line indented four spaces
/// per level. Inside an element that contains text no whitespace is added,
/// since it would change the text.
///
/// Text directly inside the document is treated the same way: once the
/// document holds text, no whitespace is added between its top-level nodes.
///
/// Write errors are kept: the first one stops further output and is
/// returned by [`Printer::into_inner`].
pub struct Printer<W: Write = Vec<u8>> {
    writer: W,
    error: Option<io::Error>,
    stack: Vec<String>,
    text_depth: Option<usize>,
    document_text: bool,
    first_element: bool,
    element_just_opened: bool,
    compact: bool,
    process_entities: bool,
    write_bom: Option<bool>,
    write_declaration: bool,
    indent: String,
    compact_element: Option<Box<dyn Fn(&str) -> bool>>,
}

impl Printer<Vec<u8>> {
    /// A printer that collects output in memory.
    pub fn new(compact: bool) -> Self {
        Self::from_writer(Vec::new(), compact)
    }

    /// The output written so far.
    pub fn as_str(&self) -> &str {
        // only ever fed with str data and the UTF-8 BOM
        std::str::from_utf8(&self.writer).unwrap_or_default()
    }

    /// Discard the output so far. The next node is printed as if it were
    /// the first.
    pub fn clear_buffer(&mut self) {
        self.writer.clear();
        self.first_element = true;
        self.document_text = false;
    }

    /// The output as an owned string.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.writer) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

impl Default for Printer<Vec<u8>> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<W: Write> Printer<W> {
    /// A printer that writes to `writer`.
    pub fn from_writer(writer: W, compact: bool) -> Self {
        Self {
            writer,
            error: None,
            stack: Vec::new(),
            text_depth: None,
            document_text: false,
            first_element: true,
            element_just_opened: false,
            compact,
            process_entities: true,
            write_bom: None,
            write_declaration: false,
            indent: INDENT.to_string(),
            compact_element: None,
        }
    }

    /// A printer that writes to `writer` with document options.
    pub fn with_options(writer: W, options: &PrintOptions) -> Self {
        let mut printer = Self::from_writer(writer, options.compact);
        printer.write_bom = options.write_bom;
        printer.write_declaration = options.write_declaration;
        printer
    }

    /// Whether output is compact.
    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Whether text and attribute values are escaped. When printing a
    /// document this follows its parse options.
    pub fn set_process_entities(&mut self, process_entities: bool) {
        self.process_entities = process_entities;
    }

    /// The whitespace written once per level of depth in pretty mode.
    /// Four spaces unless changed.
    pub fn set_indent(&mut self, indent: impl Into<String>) {
        self.indent = indent.into();
    }

    /// Print the named elements compactly even in pretty mode: no newline
    /// or indentation before their start and end tags.
    ///
    /// ```rust
    /// use tinydom::Printer;
    ///
    /// let doc = tinydom::parse("<a><b><c/></b><d/></a>").unwrap();
    /// let mut printer = Printer::new(false);
    /// printer.set_compact_elements(|name| name == "b" || name == "c");
    /// doc.accept(doc.document_node(), &mut printer);
    /// assert_eq!(printer.as_str(), "<a><b><c/></b>\n    <d/>\n</a>\n");
    /// ```
    pub fn set_compact_elements(&mut self, is_compact: impl Fn(&str) -> bool + 'static) {
        self.compact_element = Some(Box::new(is_compact));
    }

    fn is_compact_element(&self, name: &str) -> bool {
        self.compact
            || self
                .compact_element
                .as_ref()
                .is_some_and(|is_compact| is_compact(name))
    }

    /// The number of currently open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Flush and return the writer, or the first write error.
    pub fn into_inner(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_all(s.as_bytes()) {
            debug!(error = %e, "printer write failed");
            self.error = Some(e);
        }
    }

    fn write_indent(&mut self) {
        if self.error.is_some() {
            return;
        }
        for _ in 0..self.stack.len() {
            if let Err(e) = self.writer.write_all(self.indent.as_bytes()) {
                debug!(error = %e, "printer write failed");
                self.error = Some(e);
                return;
            }
        }
    }

    fn seal_element_if_just_opened(&mut self) {
        if self.element_just_opened {
            self.element_just_opened = false;
            self.write(">");
        }
    }

    fn prepare_for_new_node(&mut self, compact: bool) {
        self.seal_element_if_just_opened();
        let beside_document_text = self.document_text && self.stack.is_empty();
        if self.text_depth.is_none() && !self.first_element && !compact && !beside_document_text
        {
            self.write("\n");
            self.write_indent();
        }
        self.first_element = false;
    }

    /// Write the byte order mark and/or the XML declaration.
    pub fn push_header(&mut self, write_bom: bool, write_declaration: bool) {
        if write_bom {
            self.write("\u{feff}");
        }
        if write_declaration {
            self.push_declaration("xml version=\"1.0\"");
        }
    }

    /// Start an element. Attributes can be pushed until the next node.
    pub fn open_element(&mut self, name: &str) {
        self.prepare_for_new_node(self.is_compact_element(name));
        self.write("<");
        self.write(name);
        self.stack.push(name.to_string());
        self.element_just_opened = true;
    }

    /// Add an attribute to the element just opened.
    pub fn push_attribute(&mut self, name: &str, value: &str) {
        debug_assert!(self.element_just_opened, "attribute outside of a start tag");
        self.write(" ");
        self.write(name);
        self.write("=\"");
        if self.process_entities {
            let escaped = escape_attribute(value);
            self.write(&escaped);
        } else {
            self.write(value);
        }
        self.write("\"");
    }

    /// Add a formatted scalar attribute to the element just opened.
    pub fn push_attribute_value<T: XmlScalar>(&mut self, name: &str, value: T) {
        self.push_attribute(name, &value.to_xml());
    }

    /// End the innermost open element. An element without content is
    /// written as an empty-element tag.
    pub fn close_element(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        let depth = self.stack.len();
        let compact = self.is_compact_element(&name);
        if self.element_just_opened {
            self.write("/>");
        } else {
            if self.text_depth.is_none() && !compact {
                self.write("\n");
                self.write_indent();
            }
            self.write("</");
            self.write(&name);
            self.write(">");
        }
        if self.text_depth == Some(depth) {
            self.text_depth = None;
        }
        if depth == 0 && !compact && !self.document_text {
            self.write("\n");
        }
        self.element_just_opened = false;
    }

    /// Write text, escaped or as a CDATA section.
    pub fn push_text(&mut self, text: &str, cdata: bool) {
        self.text_depth = self.stack.len().checked_sub(1);
        if self.stack.is_empty() {
            self.document_text = true;
        }
        self.seal_element_if_just_opened();
        if cdata {
            self.write("<![CDATA[");
            self.write(text);
            self.write("]]>");
        } else if self.process_entities {
            let escaped = escape_text(text);
            self.write(&escaped);
        } else {
            self.write(text);
        }
    }

    /// Write a formatted scalar as text.
    pub fn push_value<T: XmlScalar>(&mut self, value: T) {
        self.push_text(&value.to_xml(), false);
    }

    /// Write a comment.
    pub fn push_comment(&mut self, comment: &str) {
        self.prepare_for_new_node(self.compact);
        self.write("<!--");
        self.write(comment);
        self.write("-->");
    }

    /// Write a declaration; `value` is what goes between `<?` and `?>`.
    pub fn push_declaration(&mut self, value: &str) {
        self.prepare_for_new_node(self.compact);
        self.write("<?");
        self.write(value);
        self.write("?>");
    }

    /// Write an unknown node; `value` is what goes between `<!` and `>`.
    pub fn push_unknown(&mut self, value: &str) {
        self.prepare_for_new_node(self.compact);
        self.write("<!");
        self.write(value);
        self.write(">");
    }
}

impl<W: Write> Visitor for Printer<W> {
    fn enter_document(&mut self, doc: &Document) -> bool {
        self.process_entities = doc.process_entities();
        self.document_text = doc
            .children(doc.document_node())
            .any(|node| doc.is_text(node));
        let write_bom = self.write_bom.unwrap_or(doc.has_bom());
        if write_bom || self.write_declaration {
            self.push_header(write_bom, self.write_declaration);
        }
        true
    }

    fn enter_element(&mut self, doc: &Document, element: Node, attributes: Attributes<'_>) -> bool {
        self.open_element(doc.name(element).unwrap_or_default());
        for attribute in attributes {
            self.push_attribute(attribute.name(), attribute.value());
        }
        true
    }

    fn exit_element(&mut self, _doc: &Document, _element: Node) -> bool {
        self.close_element();
        true
    }

    fn visit_text(&mut self, doc: &Document, text: Node) -> bool {
        self.push_text(doc.value(text).unwrap_or_default(), doc.is_cdata(text));
        true
    }

    fn visit_comment(&mut self, doc: &Document, comment: Node) -> bool {
        self.push_comment(doc.value(comment).unwrap_or_default());
        true
    }

    fn visit_declaration(&mut self, doc: &Document, declaration: Node) -> bool {
        self.push_declaration(doc.value(declaration).unwrap_or_default());
        true
    }

    fn visit_unknown(&mut self, doc: &Document, unknown: Node) -> bool {
        self.push_unknown(doc.value(unknown).unwrap_or_default());
        true
    }
}

/// ## Printing
impl Document {
    /// Print the document to a string, pretty or compact.
    ///
    /// ```rust
    /// let doc = tinydom::parse("<a><b>x</b></a>").unwrap();
    /// assert_eq!(doc.print(true), "<a><b>x</b></a>");
    /// assert_eq!(doc.print(false), "<a>\n    <b>x</b>\n</a>\n");
    /// ```
    pub fn print(&self, compact: bool) -> String {
        self.to_string_with(&PrintOptions {
            compact,
            ..Default::default()
        })
    }

    /// Print the document to a string.
    ///
    /// ```rust
    /// use tinydom::PrintOptions;
    ///
    /// let doc = tinydom::parse("<a/>").unwrap();
    /// let options = PrintOptions {
    ///     compact: true,
    ///     write_declaration: true,
    ///     ..Default::default()
    /// };
    /// assert_eq!(doc.to_string_with(&options), "<?xml version=\"1.0\"?><a/>");
    /// ```
    pub fn to_string_with(&self, options: &PrintOptions) -> String {
        let mut printer = Printer::with_options(Vec::new(), options);
        self.accept(self.document_node(), &mut printer);
        printer.into_string()
    }

    /// Print a node and its descendants to a string.
    pub fn node_to_string(&self, node: Node, compact: bool) -> String {
        let mut printer = Printer::new(compact);
        printer.set_process_entities(self.process_entities());
        self.accept(node, &mut printer);
        printer.into_string()
    }

    /// Write the document to `writer`.
    pub fn write_with<W: Write>(&self, writer: W, options: &PrintOptions) -> Result<(), Error> {
        let mut printer = Printer::with_options(writer, options);
        self.accept(self.document_node(), &mut printer);
        printer.into_inner()?;
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print(false))
    }
}
