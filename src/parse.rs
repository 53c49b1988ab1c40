use tracing::debug;

use crate::document::{Document, Node, ParseOptions, Whitespace};
use crate::encoding;
use crate::entity::has_malformed_character_reference;
use crate::error::{ErrorKind, ParseError};
use crate::pool::PoolId;
use crate::span::{is_name_start_char, is_whitespace, SpanFlags, TextSpan};
use crate::xmlvalue::{AttributeData, ClosingType, Element, Text, Value, ValueType};

/// Elements may not be nested deeper than this.
pub const MAX_ELEMENT_DEPTH: usize = 100;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

struct Parser<'d, 'b> {
    doc: &'d mut Document,
    text: &'b str,
    buf: &'b [u8],
    line: usize,
    depth: usize,
}

impl<'d, 'b> Parser<'d, 'b> {
    fn new(doc: &'d mut Document, text: &'b str) -> Self {
        Parser {
            doc,
            text,
            buf: text.as_bytes(),
            line: 1,
            depth: 0,
        }
    }

    fn skip_whitespace(&mut self, mut p: usize) -> usize {
        while let Some(&b) = self.buf.get(p) {
            if !is_whitespace(b) {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            p += 1;
        }
        p
    }

    fn parse_document(&mut self) -> Result<(), ParseError> {
        let mut p = self.skip_whitespace(0);
        if self.buf[p..].starts_with(UTF8_BOM) {
            self.doc.has_bom = true;
            p = self.skip_whitespace(p + UTF8_BOM.len());
        }
        if p >= self.buf.len() {
            return Err(ParseError::new(ErrorKind::EmptyDocument, 0));
        }
        let document_node = self.doc.document_node();
        self.parse_children(document_node, p, None)?;
        Ok(())
    }

    /// Classify the token at `p` by its prefix and allocate a node for it.
    /// Returns the node and the position just past the prefix, or `None` if
    /// only whitespace is left.
    fn identify(&mut self, p: usize) -> Option<(Node, usize)> {
        let start = p;
        let start_line = self.line;
        let p = self.skip_whitespace(p);
        let rest = self.buf.get(p..).filter(|rest| !rest.is_empty())?;
        let line = self.line;
        let (value, p) = if rest.starts_with(b"<?") {
            (Value::Declaration(TextSpan::new()), p + 2)
        } else if rest.starts_with(b"<!--") {
            (Value::Comment(TextSpan::new()), p + 4)
        } else if rest.starts_with(b"<![CDATA[") {
            (Value::Text(Text::new(true)), p + 9)
        } else if rest.starts_with(b"<!") {
            (Value::Unknown(TextSpan::new()), p + 2)
        } else if rest.starts_with(b"<") {
            (Value::Element(Element::new()), p + 1)
        } else {
            // leading whitespace belongs to the text
            self.line = start_line;
            (Value::Text(Text::new(false)), start)
        };
        Some((self.doc.create_unlinked(value, line), p))
    }

    /// Parse nodes into `parent` until the input ends or a closing tag is
    /// found. A closing tag's name is handed to `end_tag`.
    fn parse_children(
        &mut self,
        parent: Node,
        mut p: usize,
        mut end_tag: Option<&mut TextSpan>,
    ) -> Result<usize, ParseError> {
        while p < self.buf.len() {
            let Some((node, after)) = self.identify(p) else {
                break;
            };
            let mut child_end_tag = TextSpan::new();
            p = match self.parse_node(node, after, &mut child_end_tag) {
                Ok(p) => p,
                Err(err) => {
                    self.doc.free_subtree(node);
                    return Err(err);
                }
            };
            if let Err(err) = self.check_child(parent, node, &child_end_tag) {
                self.doc.free_subtree(node);
                return Err(err);
            }
            if self.closing_type(node) == Some(ClosingType::Closing) {
                let line = self.doc.data(node).line;
                let name = match &mut self.doc.data_mut(node).value {
                    Value::Element(element) => std::mem::take(&mut element.name),
                    _ => TextSpan::new(),
                };
                self.doc.free_subtree(node);
                return match end_tag.as_deref_mut() {
                    Some(end_tag) => {
                        let mut name = name;
                        name.transfer_to(end_tag);
                        Ok(p)
                    }
                    None => Err(ParseError::with_context(
                        ErrorKind::MismatchedElement,
                        line,
                        format!("XMLElement name={}", name.get(self.text)),
                    )),
                };
            }
            self.doc.append_unchecked(parent, node);
        }
        Ok(p)
    }

    fn closing_type(&self, node: Node) -> Option<ClosingType> {
        match &self.doc.data(node).value {
            Value::Element(element) => Some(element.closing_type),
            _ => None,
        }
    }

    /// Placement rules applied to a freshly parsed child before it is
    /// linked.
    fn check_child(
        &self,
        parent: Node,
        node: Node,
        end_tag: &TextSpan,
    ) -> Result<(), ParseError> {
        let data = self.doc.data(node);
        match &data.value {
            Value::Declaration(value) => {
                let parent_data = self.doc.data(parent);
                let well_located = parent_data.value.value_type() == ValueType::Document
                    && match (parent_data.first_child, parent_data.last_child) {
                        (Some(first), Some(last)) => {
                            self.doc.value_type(first) == ValueType::Declaration
                                && self.doc.value_type(last) == ValueType::Declaration
                        }
                        _ => true,
                    };
                if !well_located {
                    return Err(ParseError::with_context(
                        ErrorKind::ParsingDeclaration,
                        data.line,
                        format!("XMLDeclaration value={}", value.get(self.text)),
                    ));
                }
            }
            Value::Element(element) => {
                let mismatch = match element.closing_type {
                    ClosingType::Closing => false,
                    ClosingType::Open => {
                        end_tag.is_empty() || end_tag.get(self.text) != element.name.get(self.text)
                    }
                    ClosingType::Closed => !end_tag.is_empty(),
                };
                if mismatch {
                    return Err(ParseError::with_context(
                        ErrorKind::MismatchedElement,
                        data.line,
                        format!("XMLElement name={}", element.name.get(self.text)),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn parse_node(
        &mut self,
        node: Node,
        p: usize,
        end_tag: &mut TextSpan,
    ) -> Result<usize, ParseError> {
        let line = self.doc.data(node).line;
        let (end, flags, kind): (&[u8], SpanFlags, ErrorKind) = match self.doc.value_type(node) {
            ValueType::Element => return self.parse_element(node, p, end_tag),
            ValueType::Text if !self.doc.is_cdata(node) => return self.parse_text(node, p),
            ValueType::Text => (
                &b"]]>"[..],
                SpanFlags::NEEDS_NEWLINE_NORMALIZATION,
                ErrorKind::ParsingCData,
            ),
            ValueType::Comment => (&b"-->"[..], SpanFlags::COMMENT, ErrorKind::ParsingComment),
            ValueType::Declaration => (
                &b"?>"[..],
                SpanFlags::NEEDS_NEWLINE_NORMALIZATION,
                ErrorKind::ParsingDeclaration,
            ),
            ValueType::Unknown => (
                &b">"[..],
                SpanFlags::NEEDS_NEWLINE_NORMALIZATION,
                ErrorKind::ParsingUnknown,
            ),
            ValueType::Document => unreachable!("the document node is never parsed as a child"),
        };
        let mut span = TextSpan::new();
        let p = span
            .parse_text(self.buf, p, end, flags, &mut self.line)
            .ok_or_else(|| ParseError::new(kind, line))?;
        self.set_span(node, span);
        Ok(p)
    }

    fn set_span(&mut self, node: Node, span: TextSpan) {
        if let Some(target) = self.doc.data_mut(node).value.span_mut() {
            *target = span;
        }
    }

    fn parse_text(&mut self, node: Node, p: usize) -> Result<usize, ParseError> {
        let line = self.doc.data(node).line;
        let options = self.doc.options;
        let mut flags = text_flags(options);
        if options.whitespace == Whitespace::Collapse {
            flags |= SpanFlags::NEEDS_WHITESPACE_COLLAPSING;
        }
        let mut span = TextSpan::new();
        let after = span
            .parse_text(self.buf, p, b"<", flags, &mut self.line)
            .ok_or_else(|| ParseError::new(ErrorKind::ParsingText, line))?;
        // the `<` starts the next node
        let end = after - 1;
        if options.process_entities && has_malformed_character_reference(&self.buf[p..end]) {
            return Err(ParseError::new(ErrorKind::ParsingText, line));
        }
        self.set_span(node, span);
        Ok(end)
    }

    fn parse_element(
        &mut self,
        node: Node,
        p: usize,
        end_tag: &mut TextSpan,
    ) -> Result<usize, ParseError> {
        let line = self.doc.data(node).line;
        let mut p = self.skip_whitespace(p);
        let closing = self.buf.get(p) == Some(&b'/');
        if closing {
            p += 1;
        }
        let mut name = TextSpan::new();
        let p = name
            .parse_name(self.buf, p)
            .ok_or_else(|| ParseError::new(ErrorKind::Parsing, line))?;
        if let Value::Element(element) = &mut self.doc.data_mut(node).value {
            element.name = name;
            if closing {
                element.closing_type = ClosingType::Closing;
            }
        }

        let p = self.parse_attributes(node, p)?;
        if p >= self.buf.len() || self.closing_type(node) != Some(ClosingType::Open) {
            return Ok(p);
        }

        self.depth += 1;
        if self.depth > MAX_ELEMENT_DEPTH {
            return Err(ParseError::with_context(
                ErrorKind::ElementDepthExceeded,
                self.line,
                "Element nesting is too deep.".to_string(),
            ));
        }
        let result = self.parse_children(node, p, Some(end_tag));
        self.depth -= 1;
        result
    }

    fn element_context(&self, node: Node) -> String {
        let name = match &self.doc.data(node).value {
            Value::Element(element) => element.name.get(self.text),
            _ => "",
        };
        format!("XMLElement name={}", name)
    }

    fn parse_attributes(&mut self, node: Node, mut p: usize) -> Result<usize, ParseError> {
        let line = self.doc.data(node).line;
        let mut last: Option<PoolId> = None;
        loop {
            p = self.skip_whitespace(p);
            let Some(&b) = self.buf.get(p) else {
                return Err(ParseError::with_context(
                    ErrorKind::ParsingElement,
                    line,
                    self.element_context(node),
                ));
            };
            if is_name_start_char(b) {
                let attribute_line = self.line;
                let mut attribute = AttributeData::new(attribute_line);
                let parsed = self
                    .parse_attribute(&mut attribute, p)
                    .filter(|_| !self.has_attribute(node, attribute.name.get(self.text)));
                let Some(after) = parsed else {
                    return Err(ParseError::with_context(
                        ErrorKind::ParsingAttribute,
                        attribute_line,
                        self.element_context(node),
                    ));
                };
                p = after;
                let id = self.doc.attribute_pool.alloc(attribute);
                self.doc.attribute_pool.set_tracked();
                match last {
                    Some(last) => self.doc.attribute_pool[last].next = Some(id),
                    None => {
                        if let Value::Element(element) = &mut self.doc.data_mut(node).value {
                            element.first_attribute = Some(id);
                        }
                    }
                }
                last = Some(id);
            } else if b == b'>' {
                return Ok(p + 1);
            } else if b == b'/' && self.buf.get(p + 1) == Some(&b'>') {
                if let Value::Element(element) = &mut self.doc.data_mut(node).value {
                    element.closing_type = ClosingType::Closed;
                }
                return Ok(p + 2);
            } else {
                return Err(ParseError::new(ErrorKind::ParsingElement, line));
            }
        }
    }

    fn has_attribute(&self, node: Node, name: &str) -> bool {
        let mut current = match &self.doc.data(node).value {
            Value::Element(element) => element.first_attribute,
            _ => None,
        };
        while let Some(id) = current {
            let attribute = self.doc.attribute_data(id);
            if attribute.name.get(self.text) == name {
                return true;
            }
            current = attribute.next;
        }
        false
    }

    /// `name = "value"`. Returns the position after the closing quote.
    fn parse_attribute(&mut self, attribute: &mut AttributeData, p: usize) -> Option<usize> {
        let p = attribute.name.parse_name(self.buf, p)?;
        let p = self.skip_whitespace(p);
        if self.buf.get(p) != Some(&b'=') {
            return None;
        }
        let p = self.skip_whitespace(p + 1);
        let quote = *self.buf.get(p)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let start = p + 1;
        let process_entities = self.doc.options.process_entities;
        let flags = if process_entities {
            SpanFlags::ATTRIBUTE_VALUE
        } else {
            SpanFlags::ATTRIBUTE_VALUE_LEAVE_ENTITIES
        };
        let after = attribute
            .value
            .parse_text(self.buf, start, &[quote], flags, &mut self.line)?;
        if process_entities && has_malformed_character_reference(&self.buf[start..after - 1]) {
            return None;
        }
        Some(after)
    }
}

fn text_flags(options: ParseOptions) -> SpanFlags {
    if options.process_entities {
        SpanFlags::TEXT_ELEMENT
    } else {
        SpanFlags::TEXT_ELEMENT_LEAVE_ENTITIES
    }
}

/// ## Parsing
impl Document {
    /// Parse XML into this document, replacing its content.
    ///
    /// Input is read up to the first NUL byte. A leading UTF-8 byte order
    /// mark is stripped and remembered. Input in another encoding is
    /// transcoded to UTF-8 first if its declaration says so.
    ///
    /// On failure the error is also recorded on the document (see
    /// [`Document::error`]) and the document is left empty.
    ///
    /// ```rust
    /// use tinydom::{Document, ErrorKind};
    ///
    /// let mut doc = Document::new();
    /// let err = doc.parse("<a><b></a></b>").unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::MismatchedElement);
    /// assert_eq!(doc.error_line(), 1);
    /// assert!(doc.root_element().is_none());
    /// ```
    pub fn parse(&mut self, xml: impl AsRef<[u8]>) -> Result<(), ParseError> {
        self.clear();
        let xml = xml.as_ref();
        let xml = match memchr::memchr(0, xml) {
            Some(end) => &xml[..end],
            None => xml,
        };
        if xml.is_empty() {
            return Err(self.fail(ParseError::new(ErrorKind::EmptyDocument, 0)));
        }
        let text = encoding::decode(xml).into_owned();
        debug!(bytes = text.len(), "parsing document");
        let result = Parser::new(self, &text).parse_document();
        self.buffer = text;
        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Discard all content and record `error`.
    pub(crate) fn fail(&mut self, error: ParseError) -> ParseError {
        debug!(kind = error.kind().name(), line = error.line(), "parse failed");
        self.clear();
        self.error = Some(error.clone());
        error
    }
}

/// Parse XML into a new document with default options.
///
/// ```rust
/// let doc = tinydom::parse("<p>Example</p>").unwrap();
/// assert_eq!(doc.print(true), "<p>Example</p>");
/// ```
pub fn parse(xml: impl AsRef<[u8]>) -> Result<Document, ParseError> {
    parse_with_options(xml, ParseOptions::default())
}

/// Parse XML into a new document with the given options.
pub fn parse_with_options(
    xml: impl AsRef<[u8]>,
    options: ParseOptions,
) -> Result<Document, ParseError> {
    let mut doc = Document::with_options(options);
    doc.parse(xml)?;
    Ok(doc)
}
