use std::fmt;

use thiserror::Error;

/// The kind of failure recorded on a document.
///
/// The numeric ids follow the classic TinyXML-2 error codes, with `0`
/// reserved for success (which is not a kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An attribute was requested that does not exist.
    NoAttribute,
    /// An attribute value could not be converted to the requested type.
    WrongAttributeType,
    /// The file to load does not exist.
    FileNotFound,
    /// The file to load or save could not be opened.
    FileCouldNotBeOpened,
    /// Reading the file failed.
    FileReadError,
    /// Malformed start or end tag.
    ParsingElement,
    /// Malformed or duplicate attribute.
    ParsingAttribute,
    /// Unterminated or malformed text.
    ParsingText,
    /// Unterminated CDATA section.
    ParsingCData,
    /// Unterminated comment.
    ParsingComment,
    /// Unterminated or misplaced declaration.
    ParsingDeclaration,
    /// Unterminated `<!...>` construct.
    ParsingUnknown,
    /// The input had no content.
    EmptyDocument,
    /// An end tag did not match its start tag, or an element was never
    /// closed.
    MismatchedElement,
    /// Generic parse failure.
    Parsing,
    /// Text could not be converted to the requested type.
    CanNotConvertText,
    /// An element had no text child.
    NoTextNode,
    /// Elements were nested deeper than the parser allows.
    ElementDepthExceeded,
}

impl ErrorKind {
    /// The stable code name, e.g. `XML_ERROR_PARSING_ELEMENT`.
    pub fn name(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            NoAttribute => "XML_NO_ATTRIBUTE",
            WrongAttributeType => "XML_WRONG_ATTRIBUTE_TYPE",
            FileNotFound => "XML_ERROR_FILE_NOT_FOUND",
            FileCouldNotBeOpened => "XML_ERROR_FILE_COULD_NOT_BE_OPENED",
            FileReadError => "XML_ERROR_FILE_READ_ERROR",
            ParsingElement => "XML_ERROR_PARSING_ELEMENT",
            ParsingAttribute => "XML_ERROR_PARSING_ATTRIBUTE",
            ParsingText => "XML_ERROR_PARSING_TEXT",
            ParsingCData => "XML_ERROR_PARSING_CDATA",
            ParsingComment => "XML_ERROR_PARSING_COMMENT",
            ParsingDeclaration => "XML_ERROR_PARSING_DECLARATION",
            ParsingUnknown => "XML_ERROR_PARSING_UNKNOWN",
            EmptyDocument => "XML_ERROR_EMPTY_DOCUMENT",
            MismatchedElement => "XML_ERROR_MISMATCHED_ELEMENT",
            Parsing => "XML_ERROR_PARSING",
            CanNotConvertText => "XML_CAN_NOT_CONVERT_TEXT",
            NoTextNode => "XML_NO_TEXT_NODE",
            ElementDepthExceeded => "XML_ELEMENT_DEPTH_EXCEEDED",
        }
    }

    /// The numeric error id.
    pub fn id(&self) -> u32 {
        use ErrorKind::*;
        match self {
            NoAttribute => 1,
            WrongAttributeType => 2,
            FileNotFound => 3,
            FileCouldNotBeOpened => 4,
            FileReadError => 5,
            ParsingElement => 6,
            ParsingAttribute => 7,
            ParsingText => 8,
            ParsingCData => 9,
            ParsingComment => 10,
            ParsingDeclaration => 11,
            ParsingUnknown => 12,
            EmptyDocument => 13,
            MismatchedElement => 14,
            Parsing => 15,
            CanNotConvertText => 16,
            NoTextNode => 17,
            ElementDepthExceeded => 18,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The error recorded on a document when parsing or loading fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ErrorKind,
    line: usize,
    context: Option<String>,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, line: usize) -> Self {
        ParseError {
            kind,
            line,
            context: None,
        }
    }

    pub(crate) fn with_context(kind: ErrorKind, line: usize, context: String) -> Self {
        ParseError {
            kind,
            line,
            context: Some(context),
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The 1-based line where the failing construct starts, or 0 if the
    /// error has no position.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Extra information, such as the name of the offending element.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.kind.id();
        write!(
            f,
            "Error={} ErrorID={} (0x{:x}) Line number={}",
            self.kind.name(),
            id,
            id,
            self.line
        )?;
        if let Some(context) = &self.context {
            write!(f, ": {}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Errors returned by document operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Parsing or loading failed.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// Writing or reading failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The node belongs to a different document.
    #[error("node belongs to a different document")]
    WrongDocument,
    /// The node is not a child of the given parent.
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// The operation requires an element node.
    #[error("node is not an element")]
    NotAnElement,
    /// The node has been deleted.
    #[error("node has been removed")]
    Removed,
    /// The operation would break the tree structure.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The named attribute does not exist.
    #[error("no attribute named {0:?}")]
    NoAttribute(String),
    /// The named attribute could not be converted.
    #[error("attribute {0:?} cannot be converted to the requested type")]
    WrongAttributeType(String),
    /// The element has no text child.
    #[error("element has no text node")]
    NoTextNode,
    /// The text could not be converted.
    #[error("text cannot be converted to the requested type")]
    CanNotConvertText,
}

impl Error {
    /// The matching [`ErrorKind`], if this error has one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Parse(e) => Some(e.kind()),
            Error::NoAttribute(_) => Some(ErrorKind::NoAttribute),
            Error::WrongAttributeType(_) => Some(ErrorKind::WrongAttributeType),
            Error::NoTextNode => Some(ErrorKind::NoTextNode),
            Error::CanNotConvertText => Some(ErrorKind::CanNotConvertText),
            Error::Io(_)
            | Error::WrongDocument
            | Error::NotAChild
            | Error::NotAnElement
            | Error::Removed
            | Error::InvalidOperation(_) => None,
        }
    }
}
