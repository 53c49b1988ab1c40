use tinydom::{Error, NodeEdge, ValueType};

const XML: &str = r#"<doc><a n="1">one</a><!--c--><b/><a n="2">two</a>tail</doc>"#;

#[test]
fn test_element_navigation() {
    let doc = tinydom::parse(XML).unwrap();
    let root = doc.root_element().unwrap();
    let first_a = doc.first_child_element(root, Some("a")).unwrap();
    let last_a = doc.last_child_element(root, Some("a")).unwrap();
    assert_ne!(first_a, last_a);
    assert_eq!(doc.attribute(first_a, "n"), Some("1"));
    assert_eq!(doc.attribute(last_a, "n"), Some("2"));

    let b = doc.next_sibling_element(first_a, None).unwrap();
    assert_eq!(doc.name(b), Some("b"));
    assert_eq!(doc.next_sibling_element(first_a, Some("a")), Some(last_a));
    assert_eq!(doc.previous_sibling_element(last_a, Some("a")), Some(first_a));
    assert_eq!(doc.previous_sibling_element(first_a, None), None);
    assert_eq!(doc.first_child_element(root, Some("missing")), None);
    assert_eq!(doc.last_child_element(root, None), Some(last_a));
}

#[test]
fn test_raw_navigation() {
    let doc = tinydom::parse(XML).unwrap();
    let root = doc.root_element().unwrap();
    let first = doc.first_child(root).unwrap();
    let comment = doc.next_sibling(first).unwrap();
    assert!(doc.is_comment(comment));
    assert_eq!(doc.previous_sibling(comment), Some(first));
    let tail = doc.last_child(root).unwrap();
    assert!(doc.is_text(tail));
    assert_eq!(doc.value(tail), Some("tail"));
    assert_eq!(doc.parent(tail), Some(root));
    assert_eq!(doc.parent(root), Some(doc.document_node()));
    assert_eq!(doc.parent(doc.document_node()), None);
    assert!(!doc.no_children(root));
    assert!(doc.no_children(comment));
    let ancestors: Vec<_> = doc.ancestors(tail).collect();
    assert_eq!(ancestors, [tail, root, doc.document_node()]);
}

#[test]
fn test_traverse() {
    let doc = tinydom::parse("<a><b/>t</a>").unwrap();
    let a = doc.root_element().unwrap();
    let b = doc.first_child(a).unwrap();
    let t = doc.last_child(a).unwrap();
    let edges: Vec<_> = doc.traverse(a).collect();
    assert_eq!(
        edges,
        [
            NodeEdge::Start(a),
            NodeEdge::Start(b),
            NodeEdge::End(b),
            NodeEdge::Start(t),
            NodeEdge::End(t),
            NodeEdge::End(a),
        ]
    );
    let types: Vec<_> = doc
        .descendants(doc.document_node())
        .map(|n| doc.value_type(n))
        .collect();
    assert_eq!(
        types,
        [
            ValueType::Document,
            ValueType::Element,
            ValueType::Element,
            ValueType::Text
        ]
    );
}

#[test]
fn test_typed_values() {
    let mut doc = tinydom::parse(XML).unwrap();
    let root = doc.root_element().unwrap();
    let total: i64 = doc
        .children(root)
        .filter(|&n| doc.is_element(n))
        .map(|n| doc.attribute_or(n, "n", 0i64))
        .sum();
    assert_eq!(total, 3);

    let b = doc.first_child_element(root, Some("b")).unwrap();
    assert!(matches!(
        doc.query_attribute::<u32>(b, "n"),
        Err(Error::NoAttribute(name)) if name == "n"
    ));
    doc.set_text_value(b, 2.5f64).unwrap();
    assert_eq!(doc.query_text::<f64>(b).unwrap(), 2.5);
    doc.set_attribute_value(b, "ok", true).unwrap();
    assert!(doc.query_attribute::<bool>(b, "ok").unwrap());
    assert!(doc.attribute_eq(b, "ok", "true"));
    assert_eq!(doc.text_or(root, -1i32), -1);
}

#[test]
fn test_values_of_kinds() {
    let doc = tinydom::parse("<?xml version=\"1.0\"?><a><![CDATA[x]]><!--y--><!z></a>").unwrap();
    assert_eq!(doc.value(doc.document_node()), None);
    assert!(doc.is_document(doc.document_node()));
    let declaration = doc.first_child(doc.document_node()).unwrap();
    assert!(doc.is_declaration(declaration));
    let a = doc.root_element().unwrap();
    let values: Vec<_> = doc.children(a).map(|n| doc.value(n).unwrap()).collect();
    assert_eq!(values, ["x", "y", "z"]);
    let unknown = doc.last_child(a).unwrap();
    assert!(doc.is_unknown(unknown));
    assert_eq!(doc.name(unknown), None);
}
