use crate::pool::PoolId;
use crate::span::TextSpan;

/// The type of an XML node.
///
/// Access it using [`Document::value_type`](crate::Document::value_type).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// The document itself. It holds the top-level nodes and has no value.
    Document,
    /// Element; it has a name, attributes and children.
    Element,
    /// Text, possibly a CDATA section.
    Text,
    /// Comment, e.g. `<!-- note -->`.
    Comment,
    /// Declaration, e.g. `<?xml version="1.0"?>`.
    Declaration,
    /// Anything else in `<!...>`, such as a DOCTYPE. Kept verbatim.
    Unknown,
}

/// How an element's tag was closed.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ClosingType {
    /// `<foo>`
    Open,
    /// `<foo/>`
    Closed,
    /// `</foo>`
    Closing,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) name: TextSpan,
    pub(crate) closing_type: ClosingType,
    pub(crate) first_attribute: Option<PoolId>,
}

impl Element {
    pub(crate) fn new() -> Self {
        Element {
            name: TextSpan::new(),
            closing_type: ClosingType::Open,
            first_attribute: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Text {
    pub(crate) text: TextSpan,
    pub(crate) cdata: bool,
}

impl Text {
    pub(crate) fn new(cdata: bool) -> Self {
        Text {
            text: TextSpan::new(),
            cdata,
        }
    }
}

/// The payload of a node.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    Document,
    Element(Element),
    Text(Text),
    Comment(TextSpan),
    Declaration(TextSpan),
    Unknown(TextSpan),
}

impl Value {
    pub(crate) fn value_type(&self) -> ValueType {
        match self {
            Value::Document => ValueType::Document,
            Value::Element(_) => ValueType::Element,
            Value::Text(_) => ValueType::Text,
            Value::Comment(_) => ValueType::Comment,
            Value::Declaration(_) => ValueType::Declaration,
            Value::Unknown(_) => ValueType::Unknown,
        }
    }

    /// The span holding the node's value: an element's name, the text of
    /// the others.
    pub(crate) fn span(&self) -> Option<&TextSpan> {
        match self {
            Value::Document => None,
            Value::Element(element) => Some(&element.name),
            Value::Text(text) => Some(&text.text),
            Value::Comment(span) | Value::Declaration(span) | Value::Unknown(span) => Some(span),
        }
    }

    pub(crate) fn span_mut(&mut self) -> Option<&mut TextSpan> {
        match self {
            Value::Document => None,
            Value::Element(element) => Some(&mut element.name),
            Value::Text(text) => Some(&mut text.text),
            Value::Comment(span) | Value::Declaration(span) | Value::Unknown(span) => Some(span),
        }
    }
}

/// An attribute in an element's attribute list.
#[derive(Debug, Clone)]
pub(crate) struct AttributeData {
    pub(crate) name: TextSpan,
    pub(crate) value: TextSpan,
    pub(crate) next: Option<PoolId>,
    pub(crate) line: usize,
}

impl AttributeData {
    pub(crate) fn new(line: usize) -> Self {
        AttributeData {
            name: TextSpan::new(),
            value: TextSpan::new(),
            next: None,
            line,
        }
    }
}
