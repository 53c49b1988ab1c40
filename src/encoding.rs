//! Input charsets. The parser works on UTF-8 only, so input whose byte order
//! mark or declaration names another charset is transcoded first.

use std::borrow::Cow;
use std::io::Cursor;

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;
use xhtmlchardet::detect;

/// Turn raw input into UTF-8 text.
///
/// UTF-8 input, and input that names no charset, is used as is and keeps its
/// byte order mark so the parser can record it. Bytes that cannot be decoded
/// become U+FFFD.
pub(crate) fn decode(data: &[u8]) -> Cow<'_, str> {
    match declared(data) {
        Some(encoding) if encoding != UTF_8 => {
            debug!(encoding = encoding.name(), "transcoding input to UTF-8");
            let (text, _had_errors) = encoding.decode_with_bom_removal(data);
            text
        }
        _ => String::from_utf8_lossy(data),
    }
}

fn declared(data: &[u8]) -> Option<&'static Encoding> {
    let charsets = detect(&mut Cursor::new(data), None).ok()?;
    charsets
        .first()
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_input_is_borrowed() {
        assert!(matches!(decode(b"<a>x</a>"), Cow::Borrowed("<a>x</a>")));
        let data = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>caf\u{e9}</a>".as_bytes();
        assert!(matches!(decode(data), Cow::Borrowed(_)));
    }

    #[test]
    fn test_latin1_is_transcoded() {
        let data = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>caf\xe9</a>";
        let text = decode(data);
        assert!(matches!(text, Cow::Owned(_)));
        assert!(text.ends_with("<a>caf\u{e9}</a>"));
    }

    #[test]
    fn test_latin1_label_uses_windows_1252() {
        // 0x80 is unassigned in ISO-8859-1 but the euro sign in windows-1252
        let data = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><p>\x80 5</p>";
        assert!(decode(data).ends_with("<p>\u{20ac} 5</p>"));
    }

    #[test]
    fn test_utf8_bom_is_kept() {
        let text = decode(b"\xEF\xBB\xBF<a/>");
        assert_eq!(text, "\u{feff}<a/>");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        assert_eq!(decode(b"<a>\xff</a>"), "<a>\u{fffd}</a>");
    }
}
