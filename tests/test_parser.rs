use rstest::rstest;
use tinydom::{ClosingType, Document, ParseOptions, ValueType, Whitespace};

#[test]
fn test_parse_simple() {
    let doc = tinydom::parse(r#"<root><a>1</a><b>2</b></root>"#).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.name(root), Some("root"));
    let names: Vec<_> = doc
        .children(root)
        .map(|child| doc.name(child).unwrap())
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(doc.print(true), r#"<root><a>1</a><b>2</b></root>"#);
}

#[test]
fn test_parse_all_node_kinds() {
    let xml = "<?xml version=\"1.0\"?><!DOCTYPE r><r><!--c-->t<![CDATA[<d>]]><e/></r>";
    let doc = tinydom::parse(xml).unwrap();
    let kinds: Vec<_> = doc
        .descendants(doc.document_node())
        .map(|node| doc.value_type(node))
        .collect();
    assert_eq!(
        kinds,
        [
            ValueType::Document,
            ValueType::Declaration,
            ValueType::Unknown,
            ValueType::Element,
            ValueType::Comment,
            ValueType::Text,
            ValueType::Text,
            ValueType::Element,
        ]
    );
    let r = doc.root_element().unwrap();
    let cdata = doc.children(r).find(|&n| doc.is_cdata(n)).unwrap();
    assert_eq!(doc.value(cdata), Some("<d>"));
    let declaration = doc.first_child(doc.document_node()).unwrap();
    assert_eq!(doc.value(declaration), Some("xml version=\"1.0\""));
    assert_eq!(doc.print(true), xml);
}

#[test]
fn test_closing_types() {
    let doc = tinydom::parse("<a><b/></a>").unwrap();
    let a = doc.root_element().unwrap();
    let b = doc.first_child(a).unwrap();
    assert_eq!(doc.closing_type(a), Some(ClosingType::Open));
    assert_eq!(doc.closing_type(b), Some(ClosingType::Closed));
    assert_eq!(doc.closing_type(doc.document_node()), None);
}

#[test]
fn test_attributes_in_order() {
    let doc = tinydom::parse(r#"<a z="1" y='2' x = "3"/>"#).unwrap();
    let a = doc.root_element().unwrap();
    let attributes: Vec<_> = doc
        .attributes(a)
        .map(|attribute| (attribute.name(), attribute.value()))
        .collect();
    assert_eq!(attributes, [("z", "1"), ("y", "2"), ("x", "3")]);
}

#[rstest]
#[case("&lt;&gt;&amp;&quot;&apos;", "<>&\"'")]
#[case("&#65;&#x41;&#x42;", "AAB")]
#[case("&#xe9;&#x4E2D;&#x1F600;", "\u{e9}\u{4e2d}\u{1F600}")]
#[case("a &unknown; b", "a &unknown; b")]
#[case("AT&T", "AT&T")]
#[case("line\r\nnext\rlast", "line\nnext\nlast")]
fn test_text_entities(#[case] text: &str, #[case] expected: &str) {
    let doc = tinydom::parse(format!("<a>{}</a>", text)).unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.text(a), Some(expected));
}

#[test]
fn test_attribute_entities() {
    let doc = tinydom::parse(r#"<a v="5 &gt; 3 &amp; true" w="&#65;"/>"#).unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.attribute(a, "v"), Some("5 > 3 & true"));
    assert_eq!(doc.attribute(a, "w"), Some("A"));
    let printed = doc.print(true);
    assert_eq!(printed, r#"<a v="5 &gt; 3 &amp; true" w="A"/>"#);
    let reparsed = tinydom::parse(&printed).unwrap();
    let a = reparsed.root_element().unwrap();
    assert_eq!(reparsed.attribute(a, "v"), Some("5 > 3 & true"));
}

#[test]
fn test_cdata_passthrough() {
    let doc = tinydom::parse("<a><![CDATA[&amp; <b> ]]]></a>").unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.text(a), Some("&amp; <b> ]"));
    assert_eq!(doc.print(true), "<a><![CDATA[&amp; <b> ]]]></a>");
}

#[test]
fn test_collapse_whitespace() {
    let options = ParseOptions {
        whitespace: Whitespace::Collapse,
        ..Default::default()
    };
    let doc = tinydom::parse_with_options("<a>  a \n b  </a>", options).unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.text(a), Some("a b"));
    assert_eq!(doc.whitespace_mode(), Whitespace::Collapse);
}

#[test]
fn test_preserve_whitespace() {
    let doc = tinydom::parse("<a>  a \n b  </a>").unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.text(a), Some("  a \n b  "));
}

#[test]
fn test_line_numbers() {
    let xml = "<?xml version=\"1.0\"?>\n<a\n  x=\"1\">\n  text\n  <!--c-->\n  <b/>\n</a>";
    let doc = tinydom::parse(xml).unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.line_number(doc.first_child(doc.document_node()).unwrap()), 1);
    assert_eq!(doc.line_number(a), 2);
    assert_eq!(doc.attributes(a).next().unwrap().line_number(), 3);
    let children: Vec<_> = doc.children(a).map(|n| doc.line_number(n)).collect();
    assert_eq!(children, [4, 5, 6]);
}

#[test]
fn test_depth_limit() {
    let nested = |depth: usize| {
        let mut xml = String::new();
        for _ in 0..depth {
            xml.push_str("<e>");
        }
        for _ in 0..depth {
            xml.push_str("</e>");
        }
        xml
    };
    assert!(tinydom::parse(nested(tinydom::MAX_ELEMENT_DEPTH)).is_ok());
    let err = tinydom::parse(nested(tinydom::MAX_ELEMENT_DEPTH + 1)).unwrap_err();
    assert_eq!(err.kind(), tinydom::ErrorKind::ElementDepthExceeded);
    assert_eq!(err.context(), Some("Element nesting is too deep."));
}

#[test]
fn test_reuse_document() {
    let mut doc = Document::new();
    doc.parse("<a><b/></a>").unwrap();
    let a = doc.root_element().unwrap();
    doc.parse("<c/>").unwrap();
    assert!(doc.is_removed(a));
    assert_eq!(doc.name(doc.root_element().unwrap()), Some("c"));
    assert_eq!(doc.pool_stats().element.current_allocs, 1);
}

#[test]
fn test_latin1_input() {
    let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xe9</a>";
    let doc = tinydom::parse(xml).unwrap();
    let a = doc.root_element().unwrap();
    assert_eq!(doc.text(a), Some("caf\u{e9}"));
}
