//! Text spans: lazily normalized views into the parse buffer.
//!
//! The parser never copies token text. Every name and value is recorded as a
//! [`TextSpan`]: a byte range into the document buffer plus flags describing
//! the normalization the text still needs. The normalized string is computed
//! on first access and cached, so the work happens at most once per span and
//! only for the spans that are actually read.

use std::cell::OnceCell;

use bitflags::bitflags;

use crate::entity::{character_reference, predefined_entity, utf32_to_utf8};

bitflags! {
    /// What still has to happen to a span's raw bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub(crate) struct SpanFlags: u8 {
        const NEEDS_ENTITY_PROCESSING = 0x01;
        const NEEDS_NEWLINE_NORMALIZATION = 0x02;
        const NEEDS_WHITESPACE_COLLAPSING = 0x04;
        const NEEDS_FLUSH = 0x08;
        const OWNS_MEMORY = 0x10;

        const TEXT_ELEMENT = Self::NEEDS_ENTITY_PROCESSING.bits()
            | Self::NEEDS_NEWLINE_NORMALIZATION.bits();
        const TEXT_ELEMENT_LEAVE_ENTITIES = Self::NEEDS_NEWLINE_NORMALIZATION.bits();
        const ATTRIBUTE_VALUE = Self::NEEDS_ENTITY_PROCESSING.bits()
            | Self::NEEDS_NEWLINE_NORMALIZATION.bits();
        const ATTRIBUTE_VALUE_LEAVE_ENTITIES = Self::NEEDS_NEWLINE_NORMALIZATION.bits();
        const COMMENT = Self::NEEDS_NEWLINE_NORMALIZATION.bits();
    }
}

const LF: u8 = b'\n';
const CR: u8 = b'\r';

#[derive(Debug, Clone, Default)]
enum Repr {
    #[default]
    Empty,
    Borrowed {
        start: usize,
        end: usize,
    },
    Owned(String),
}

/// A name or value: either a range of the document buffer awaiting
/// normalization, or a string the span owns.
#[derive(Debug, Clone, Default)]
pub(crate) struct TextSpan {
    repr: Repr,
    flags: SpanFlags,
    normalized: OnceCell<String>,
}

/// XML whitespace as the parser sees it: ASCII whitespace, never a byte of a
/// multi-byte sequence.
#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    b < 0x80 && (b.is_ascii_whitespace() || b == 0x0B)
}

#[inline]
pub(crate) fn is_name_start_char(b: u8) -> bool {
    b >= 0x80 || b.is_ascii_alphabetic() || b == b':' || b == b'_'
}

#[inline]
pub(crate) fn is_name_char(b: u8) -> bool {
    is_name_start_char(b) || b.is_ascii_digit() || b == b'.' || b == b'-'
}

impl TextSpan {
    pub(crate) fn new() -> Self {
        TextSpan::default()
    }

    /// Point the span at `buffer[start..end]`, to be normalized according
    /// to `flags` when first read.
    pub(crate) fn set(&mut self, start: usize, end: usize, flags: SpanFlags) {
        debug_assert!(start <= end);
        self.reset();
        self.repr = Repr::Borrowed { start, end };
        self.flags = flags | SpanFlags::NEEDS_FLUSH;
    }

    /// Replace the span with a copy of `s`. Owned text is never normalized.
    pub(crate) fn set_owned(&mut self, s: &str) {
        self.reset();
        self.repr = Repr::Owned(s.to_string());
        self.flags = SpanFlags::OWNS_MEMORY;
    }

    pub(crate) fn reset(&mut self) {
        self.repr = Repr::Empty;
        self.flags = SpanFlags::empty();
        self.normalized = OnceCell::new();
    }

    pub(crate) fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Empty => true,
            Repr::Borrowed { start, end } => start == end,
            Repr::Owned(s) => s.is_empty(),
        }
    }

    pub(crate) fn owns_memory(&self) -> bool {
        self.flags.contains(SpanFlags::OWNS_MEMORY)
    }

    /// Has the lazy normalization pass already run?
    #[cfg(test)]
    pub(crate) fn is_flushed(&self) -> bool {
        !self.flags.contains(SpanFlags::NEEDS_FLUSH) || self.normalized.get().is_some()
    }

    /// The normalized text. `buffer` must be the buffer the span was set
    /// against.
    pub(crate) fn get<'a>(&'a self, buffer: &'a str) -> &'a str {
        match &self.repr {
            Repr::Empty => "",
            Repr::Owned(s) => s,
            Repr::Borrowed { start, end } => {
                let raw = &buffer[*start..*end];
                let work = self.flags
                    & (SpanFlags::NEEDS_ENTITY_PROCESSING
                        | SpanFlags::NEEDS_NEWLINE_NORMALIZATION
                        | SpanFlags::NEEDS_WHITESPACE_COLLAPSING);
                if !self.flags.contains(SpanFlags::NEEDS_FLUSH) || work.is_empty() {
                    return raw;
                }
                self.normalized.get_or_init(|| normalize(raw, work))
            }
        }
    }

    /// Move the contents and flags of this span into `other`, leaving this
    /// span empty.
    pub(crate) fn transfer_to(&mut self, other: &mut TextSpan) {
        other.reset();
        std::mem::swap(self, other);
    }

    /// Scan `buffer` from `start` for `end_tag`, counting newlines into
    /// `line`. On success the span covers `[start, match)` and the position
    /// just after the terminator is returned.
    pub(crate) fn parse_text(
        &mut self,
        buffer: &[u8],
        start: usize,
        end_tag: &[u8],
        flags: SpanFlags,
        line: &mut usize,
    ) -> Option<usize> {
        debug_assert!(!end_tag.is_empty());
        let found = memchr::memmem::find(&buffer[start..], end_tag);
        let scanned = match found {
            Some(offset) => &buffer[start..start + offset],
            None => &buffer[start..],
        };
        *line += memchr::memchr_iter(LF, scanned).count();
        let offset = found?;
        self.set(start, start + offset, flags);
        Some(start + offset + end_tag.len())
    }

    /// Capture the name starting at `start`. Returns the position after the
    /// name, or `None` if no name starts there.
    pub(crate) fn parse_name(&mut self, buffer: &[u8], start: usize) -> Option<usize> {
        match buffer.get(start) {
            Some(b) if is_name_start_char(*b) => {}
            _ => return None,
        }
        let end = buffer[start + 1..]
            .iter()
            .position(|b| !is_name_char(*b))
            .map_or(buffer.len(), |offset| start + 1 + offset);
        self.set(start, end, SpanFlags::empty());
        Some(end)
    }
}

/// One left-to-right pass over `raw` applying newline normalization and
/// entity decoding, followed by whitespace collapsing if requested. The
/// output never grows past the input.
fn normalize(raw: &str, flags: SpanFlags) -> String {
    let bytes = raw.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let newlines = flags.contains(SpanFlags::NEEDS_NEWLINE_NORMALIZATION);
    let entities = flags.contains(SpanFlags::NEEDS_ENTITY_PROCESSING);
    let mut p = 0;
    while p < bytes.len() {
        let b = bytes[p];
        if newlines && b == CR {
            p += if bytes.get(p + 1) == Some(&LF) { 2 } else { 1 };
            out.push(LF);
        } else if newlines && b == LF {
            p += if bytes.get(p + 1) == Some(&CR) { 2 } else { 1 };
            out.push(LF);
        } else if entities && b == b'&' {
            let rest = &bytes[p..];
            if rest.get(1) == Some(&b'#') {
                let mut buf = [0u8; 4];
                match character_reference(rest) {
                    Some((ucs, len)) => {
                        let n = utf32_to_utf8(ucs, &mut buf);
                        out.extend_from_slice(&buf[..n]);
                        p += len;
                    }
                    None => {
                        out.push(b);
                        p += 1;
                    }
                }
            } else if let Some((value, len)) = predefined_entity(rest) {
                out.push(value);
                p += len;
            } else {
                out.push(b);
                p += 1;
            }
        } else {
            out.push(b);
            p += 1;
        }
    }
    if flags.contains(SpanFlags::NEEDS_WHITESPACE_COLLAPSING) {
        out = collapse_whitespace(&out);
    }
    // only complete UTF-8 sequences and ASCII replacements were written
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Collapse each run of whitespace to a single space and drop leading and
/// trailing whitespace.
fn collapse_whitespace(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut p = bytes.iter().position(|b| !is_whitespace(*b)).unwrap_or(bytes.len());
    while p < bytes.len() {
        if is_whitespace(bytes[p]) {
            while p < bytes.len() && is_whitespace(bytes[p]) {
                p += 1;
            }
            if p == bytes.len() {
                break;
            }
            out.push(b' ');
        }
        out.push(bytes[p]);
        p += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(buffer: &str, flags: SpanFlags) -> TextSpan {
        let mut span = TextSpan::new();
        span.set(0, buffer.len(), flags);
        span
    }

    #[test]
    fn test_default_is_empty() {
        let span = TextSpan::default();
        assert!(span.is_empty());
        assert_eq!(span.flags, SpanFlags::default());
        assert!(span.flags.is_empty());
        assert_eq!(span.get("ignored"), "");
    }

    #[test]
    fn test_plain_is_borrowed() {
        let buffer = "hello";
        let span = span(buffer, SpanFlags::TEXT_ELEMENT);
        assert_eq!(span.get(buffer), "hello");
    }

    #[test]
    fn test_newline_normalization() {
        let buffer = "a\r\nb\rc\n\rd\ne";
        let span = span(buffer, SpanFlags::COMMENT);
        assert_eq!(span.get(buffer), "a\nb\nc\nd\ne");
    }

    #[test]
    fn test_entities() {
        let buffer = "&lt;a&gt; &amp; &quot;&apos; &#65;&#x42; &unknown; &";
        let span = span(buffer, SpanFlags::TEXT_ELEMENT);
        assert_eq!(span.get(buffer), "<a> & \"' AB &unknown; &");
    }

    #[test]
    fn test_entities_left_alone() {
        let buffer = "&lt;&#65;";
        let span = span(buffer, SpanFlags::TEXT_ELEMENT_LEAVE_ENTITIES);
        assert_eq!(span.get(buffer), "&lt;&#65;");
    }

    #[test]
    fn test_malformed_reference_is_copied() {
        let buffer = "&#xZZ;";
        let span = span(buffer, SpanFlags::TEXT_ELEMENT);
        assert_eq!(span.get(buffer), "&#xZZ;");
    }

    #[test]
    fn test_multibyte_reference() {
        let buffer = "&#x4e2d;&#20013;";
        let span = span(buffer, SpanFlags::TEXT_ELEMENT);
        assert_eq!(span.get(buffer), "中中");
    }

    #[test]
    fn test_collapse_whitespace() {
        let buffer = "  a \n b  ";
        let span = span(
            buffer,
            SpanFlags::TEXT_ELEMENT | SpanFlags::NEEDS_WHITESPACE_COLLAPSING,
        );
        assert_eq!(span.get(buffer), "a b");
    }

    #[test]
    fn test_collapse_only_whitespace() {
        let buffer = " \t\n ";
        let span = span(buffer, SpanFlags::NEEDS_WHITESPACE_COLLAPSING);
        assert_eq!(span.get(buffer), "");
    }

    #[test]
    fn test_normalized_once() {
        let buffer = "a&amp;b";
        let span = span(buffer, SpanFlags::TEXT_ELEMENT);
        assert!(!span.is_flushed());
        let first = span.get(buffer).as_ptr();
        assert!(span.is_flushed());
        let second = span.get(buffer).as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_owned() {
        let mut span = TextSpan::new();
        span.set_owned("a&amp;b");
        assert!(span.owns_memory());
        assert_eq!(span.get(""), "a&amp;b");
        span.reset();
        assert!(span.is_empty());
        assert!(!span.owns_memory());
    }

    #[test]
    fn test_parse_text() {
        let buffer = b"line\nnext-->rest";
        let mut span = TextSpan::new();
        let mut line = 1;
        let p = span
            .parse_text(buffer, 0, b"-->", SpanFlags::COMMENT, &mut line)
            .unwrap();
        assert_eq!(p, 12);
        assert_eq!(line, 2);
        assert_eq!(span.get("line\nnext-->rest"), "line\nnext");
    }

    #[test]
    fn test_parse_text_not_found() {
        let buffer = b"a\nb\nc";
        let mut span = TextSpan::new();
        let mut line = 1;
        assert!(span
            .parse_text(buffer, 0, b"]]>", SpanFlags::COMMENT, &mut line)
            .is_none());
        assert_eq!(line, 3);
        assert!(span.is_empty());
    }

    #[test]
    fn test_parse_name() {
        let buffer = "ns:el-1.x_y rest";
        let mut span = TextSpan::new();
        let p = span.parse_name(buffer.as_bytes(), 0).unwrap();
        assert_eq!(p, 11);
        assert_eq!(span.get(buffer), "ns:el-1.x_y");
    }

    #[test]
    fn test_parse_name_multibyte() {
        let buffer = "élan>";
        let mut span = TextSpan::new();
        let p = span.parse_name(buffer.as_bytes(), 0).unwrap();
        assert_eq!(span.get(buffer), "élan");
        assert_eq!(p, "élan".len());
    }

    #[test]
    fn test_parse_name_rejects_digit() {
        let mut span = TextSpan::new();
        assert!(span.parse_name(b"1abc", 0).is_none());
        assert!(span.parse_name(b"", 0).is_none());
    }

    #[test]
    fn test_transfer() {
        let buffer = "name";
        let mut a = TextSpan::new();
        a.set(0, 4, SpanFlags::empty());
        let mut b = TextSpan::new();
        a.transfer_to(&mut b);
        assert!(a.is_empty());
        assert_eq!(b.get(buffer), "name");
    }
}
