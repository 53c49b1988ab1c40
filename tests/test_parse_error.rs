use rstest::rstest;
use tinydom::{Document, ErrorKind};

#[rstest]
#[case("", ErrorKind::EmptyDocument, 0)]
#[case("  \n\t ", ErrorKind::EmptyDocument, 0)]
#[case("<a>", ErrorKind::MismatchedElement, 1)]
#[case("<a>\n<b>", ErrorKind::MismatchedElement, 2)]
#[case("<a><b></a></b>", ErrorKind::MismatchedElement, 1)]
#[case("<a>\n</b>", ErrorKind::MismatchedElement, 1)]
#[case("</a>", ErrorKind::MismatchedElement, 1)]
#[case("<a>\n  <b x=1/>\n</a>", ErrorKind::ParsingAttribute, 2)]
#[case("<a\n  x='1'\n  x='2'/>", ErrorKind::ParsingAttribute, 3)]
#[case("<a x='&#;'/>", ErrorKind::ParsingAttribute, 1)]
#[case("<a>&#xZZ;</a>", ErrorKind::ParsingText, 1)]
#[case("<a>&#65</a>", ErrorKind::ParsingText, 1)]
#[case("<a>&#x110000;</a>", ErrorKind::ParsingText, 1)]
#[case("<a", ErrorKind::ParsingElement, 1)]
#[case("<a b>", ErrorKind::ParsingAttribute, 1)]
#[case("<a !>", ErrorKind::ParsingElement, 1)]
#[case("\n\n<!-- x", ErrorKind::ParsingComment, 3)]
#[case("<a><![CDATA[x", ErrorKind::ParsingCData, 1)]
#[case("<?xml", ErrorKind::ParsingDeclaration, 1)]
#[case("<!DOCTYPE", ErrorKind::ParsingUnknown, 1)]
#[case("<a/>\ntrailing", ErrorKind::ParsingText, 2)]
#[case("<>", ErrorKind::Parsing, 1)]
fn test_parse_errors(#[case] xml: &str, #[case] kind: ErrorKind, #[case] line: usize) {
    let mut doc = Document::new();
    let err = doc.parse(xml).unwrap_err();
    assert_eq!(err.kind(), kind, "{:?}", xml);
    assert_eq!(err.line(), line, "{:?}", xml);
    assert_eq!(doc.error(), Some(&err));
    assert_eq!(doc.error_line(), line);
}

#[test]
fn test_mismatch_and_match() {
    assert!(tinydom::parse("<a><b></b></a>").is_ok());
    let err = tinydom::parse("<a><b></a></b>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MismatchedElement);
    assert_eq!(err.context(), Some("XMLElement name=b"));
}

#[test]
fn test_error_str() {
    let mut doc = Document::new();
    assert_eq!(doc.error_str(), "");
    let _ = doc.parse("<a>\n<b x=1/></a>");
    assert_eq!(
        doc.error_str(),
        "Error=XML_ERROR_PARSING_ATTRIBUTE ErrorID=7 (0x7) Line number=2: XMLElement name=b"
    );
    doc.clear_error();
    assert!(!doc.is_error());
    assert_eq!(doc.error_line(), 0);
}

#[test]
fn test_error_kind_names() {
    assert_eq!(ErrorKind::EmptyDocument.name(), "XML_ERROR_EMPTY_DOCUMENT");
    assert_eq!(ErrorKind::EmptyDocument.id(), 13);
    assert_eq!(
        ErrorKind::ElementDepthExceeded.to_string(),
        "XML_ELEMENT_DEPTH_EXCEEDED"
    );
}

#[test]
fn test_error_discards_partial_tree() {
    let mut doc = Document::new();
    doc.parse("<keep/>").unwrap();
    let err = doc.parse("<a><b/><c>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MismatchedElement);
    assert!(doc.root_element().is_none());
    assert_eq!(doc.pool_stats().current_allocs(), 0);
}

#[test]
fn test_error_converts() {
    let err: tinydom::Error = tinydom::parse("").unwrap_err().into();
    assert_eq!(err.kind(), Some(ErrorKind::EmptyDocument));
    assert!(err.to_string().starts_with("Error=XML_ERROR_EMPTY_DOCUMENT"));
}
