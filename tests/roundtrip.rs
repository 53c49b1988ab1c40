use proptest::prelude::*;
use rstest::rstest;
use tinydom::proptest::arb_document;
use tinydom::Document;

#[rstest]
#[case(r#"<root><a>1</a><b>2</b></root>"#)]
#[case(r#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE r><r x="&quot;" y="&lt;&amp;"/>"#)]
#[case("<p>Hello <em>world</em>!<![CDATA[ <raw> ]]></p><!--after-->")]
#[case("<a>\n  <b>text</b>\n  <c>\n    <d/>\n  </c>\n</a>")]
#[case("\u{feff}<a>caf\u{e9} \u{4e2d}</a>")]
#[case("<a/>x<b/>")]
#[case("<!--c-->x<a><b/></a>")]
#[case("<?xml version=\"1.0\"?>\n<r/>\n  loose text <!--c-->")]
fn test_print_is_idempotent(#[case] xml: &str, #[values(true, false)] compact: bool) {
    let doc = tinydom::parse(xml).unwrap();
    let printed = doc.print(compact);
    let reparsed = tinydom::parse(&printed).unwrap();
    assert_eq!(reparsed.print(compact), printed);
    assert!(doc.deep_equal(doc.document_node(), &reparsed, reparsed.document_node()));
}

#[test]
fn test_pretty_and_compact_agree() {
    let xml = r#"<r><a k="v"><b/>t</a><c><!--x--></c></r>"#;
    let doc = tinydom::parse(xml).unwrap();
    let from_pretty = tinydom::parse(doc.print(false)).unwrap();
    assert_eq!(from_pretty.print(true), xml);
}

proptest! {
    #[test]
    fn test_constructed_roundtrip_pretty(fixed in arb_document()) {
        let mut doc = Document::new();
        fixed.build(&mut doc);
        let printed = doc.print(false);
        let parsed = tinydom::parse(&printed);
        prop_assert!(parsed.is_ok(), "Cannot parse: {:?} {:?}", printed, parsed.err());
        let parsed = parsed.unwrap();
        prop_assert!(
            doc.deep_equal(doc.document_node(), &parsed, parsed.document_node()),
            "Not equal after roundtrip: {:?}",
            printed
        );
    }

    #[test]
    fn test_constructed_roundtrip_compact(fixed in arb_document()) {
        let mut doc = Document::new();
        fixed.build(&mut doc);
        let printed = doc.print(true);
        let parsed = tinydom::parse(&printed).unwrap();
        prop_assert_eq!(parsed.to_fixed_document(), fixed);
    }

    #[test]
    fn test_parsed_print_is_idempotent(fixed in arb_document(), compact in any::<bool>()) {
        let mut doc = Document::new();
        fixed.build(&mut doc);
        let first = tinydom::parse(doc.print(compact)).unwrap();
        let printed = first.print(compact);
        let second = tinydom::parse(&printed).unwrap();
        prop_assert_eq!(second.print(compact), printed);
    }
}
