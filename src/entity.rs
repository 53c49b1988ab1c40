use std::borrow::Cow;

/// The predefined XML entities, in the order they are matched.
pub(crate) const PREDEFINED_ENTITIES: [(&str, u8); 5] = [
    ("quot", b'"'),
    ("amp", b'&'),
    ("apos", b'\''),
    ("lt", b'<'),
    ("gt", b'>'),
];

// a `;` further away than this does not terminate a character reference
const MAX_CHARACTER_REF_LEN: usize = 200;

/// Match a predefined entity at the start of `bytes`, which must begin with
/// `&`. Returns the replacement byte and the length of the reference.
pub(crate) fn predefined_entity(bytes: &[u8]) -> Option<(u8, usize)> {
    let rest = bytes.get(1..)?;
    PREDEFINED_ENTITIES.iter().find_map(|(pattern, value)| {
        let pattern = pattern.as_bytes();
        if rest.starts_with(pattern) && rest.get(pattern.len()) == Some(&b';') {
            Some((*value, pattern.len() + 2))
        } else {
            None
        }
    })
}

/// Decode a numeric character reference (`&#65;` or `&#x41;`) at the start
/// of `bytes`.
///
/// Returns the code point and the length of the reference including the
/// terminating `;`. Returns `None` if the reference is malformed: no
/// digits, a non-digit, no `;` close enough, overflow, or not a Unicode
/// scalar value.
pub(crate) fn character_reference(bytes: &[u8]) -> Option<(u32, usize)> {
    if bytes.len() < 3 || bytes[0] != b'&' || bytes[1] != b'#' {
        return None;
    }
    let (radix, digits_start) = if bytes[2] == b'x' { (16, 3) } else { (10, 2) };
    let window = &bytes[digits_start..bytes.len().min(MAX_CHARACTER_REF_LEN)];
    let semicolon = memchr::memchr(b';', window)?;
    let digits = &window[..semicolon];
    if digits.is_empty() {
        return None;
    }
    let mut ucs: u32 = 0;
    for digit in digits {
        let value = (*digit as char).to_digit(radix)?;
        ucs = ucs.checked_mul(radix)?.checked_add(value)?;
    }
    char::from_u32(ucs)?;
    Some((ucs, digits_start + semicolon + 1))
}

/// Encode a code point as UTF-8 into `output`, returning the number of
/// bytes written. Code points at or above 0x200000 yield 0.
pub(crate) fn utf32_to_utf8(input: u32, output: &mut [u8; 4]) -> usize {
    const BYTE_MASK: u32 = 0xBF;
    const BYTE_MARK: u32 = 0x80;
    const FIRST_BYTE_MARK: [u32; 5] = [0x00, 0x00, 0xC0, 0xE0, 0xF0];

    let length = match input {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x10000..=0x1F_FFFF => 4,
        _ => return 0,
    };
    let mut input = input;
    for i in (1..length).rev() {
        output[i] = ((input | BYTE_MARK) & BYTE_MASK) as u8;
        input >>= 6;
    }
    output[0] = (input | FIRST_BYTE_MARK[length]) as u8;
    length
}

/// Returns true if `bytes` contains a `&#` reference that cannot be decoded.
pub(crate) fn has_malformed_character_reference(bytes: &[u8]) -> bool {
    memchr::memchr_iter(b'&', bytes).any(|i| {
        let rest = &bytes[i..];
        rest.get(1) == Some(&b'#') && character_reference(rest).is_none()
    })
}

fn escape<'a>(content: &'a str, is_special: impl Fn(u8) -> bool) -> Cow<'a, str> {
    let bytes = content.as_bytes();
    if !bytes.iter().any(|b| is_special(*b)) {
        return Cow::Borrowed(content);
    }
    let mut result = String::with_capacity(content.len() + 8);
    let mut last = 0;
    for (i, b) in bytes.iter().enumerate() {
        if !is_special(*b) {
            continue;
        }
        result.push_str(&content[last..i]);
        result.push('&');
        if let Some((pattern, _)) = PREDEFINED_ENTITIES.iter().find(|(_, v)| v == b) {
            result.push_str(pattern);
        }
        result.push(';');
        last = i + 1;
    }
    result.push_str(&content[last..]);
    Cow::Owned(result)
}

/// Escape text content. Only `&`, `<` and `>` are replaced.
pub(crate) fn escape_text(content: &str) -> Cow<str> {
    escape(content, |b| matches!(b, b'&' | b'<' | b'>'))
}

/// Escape an attribute value. All five predefined entities are replaced.
pub(crate) fn escape_attribute(content: &str) -> Cow<str> {
    escape(content, |b| PREDEFINED_ENTITIES.iter().any(|(_, v)| *v == b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined() {
        assert_eq!(predefined_entity(b"&amp; rest"), Some((b'&', 5)));
        assert_eq!(predefined_entity(b"&quot;"), Some((b'"', 6)));
        assert_eq!(predefined_entity(b"&amp rest"), None);
        assert_eq!(predefined_entity(b"&unknown;"), None);
    }

    #[test]
    fn test_decimal_reference() {
        assert_eq!(character_reference(b"&#65;"), Some((65, 5)));
    }

    #[test]
    fn test_hex_reference() {
        assert_eq!(character_reference(b"&#x41;tail"), Some((0x41, 6)));
        assert_eq!(character_reference(b"&#x4e2D;"), Some((0x4e2d, 8)));
    }

    #[test]
    fn test_malformed_references() {
        assert_eq!(character_reference(b"&#xZZ;"), None);
        assert_eq!(character_reference(b"&#12a;"), None);
        assert_eq!(character_reference(b"&#;"), None);
        assert_eq!(character_reference(b"&#x;"), None);
        assert_eq!(character_reference(b"&#65"), None);
        assert_eq!(character_reference(b"&#xD800;"), None);
        assert_eq!(character_reference(b"&#99999999999;"), None);
    }

    #[test]
    fn test_far_semicolon() {
        let mut reference = b"&#".to_vec();
        reference.extend(std::iter::repeat(b'1').take(250));
        reference.push(b';');
        assert_eq!(character_reference(&reference), None);
    }

    #[test]
    fn test_utf8_lengths() {
        let mut buf = [0u8; 4];
        assert_eq!(utf32_to_utf8(0x41, &mut buf), 1);
        assert_eq!(&buf[..1], b"A");
        assert_eq!(utf32_to_utf8(0xE9, &mut buf), 2);
        assert_eq!(&buf[..2], "é".as_bytes());
        assert_eq!(utf32_to_utf8(0x4E2D, &mut buf), 3);
        assert_eq!(&buf[..3], "中".as_bytes());
        assert_eq!(utf32_to_utf8(0x1F600, &mut buf), 4);
        assert_eq!(&buf[..4], "😀".as_bytes());
        assert_eq!(utf32_to_utf8(0x200000, &mut buf), 0);
    }

    #[test]
    fn test_has_malformed() {
        assert!(!has_malformed_character_reference(b"a &#65; &amp; & b"));
        assert!(has_malformed_character_reference(b"a &#xZZ; b"));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("5 > 3 & \"q\""), "5 &gt; 3 &amp; \"q\"");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(
            escape_attribute("&'><\""),
            "&amp;&apos;&gt;&lt;&quot;"
        );
    }

    #[test]
    fn test_escape_no_entities() {
        let text = "hello";
        let result = escape_text(text);
        // this is the same slice
        assert!(std::ptr::eq(text, result.as_ref()));
    }
}
