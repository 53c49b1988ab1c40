use crate::document::{Document, Node};
use crate::error::Error;

/// A scalar that can be stored as attribute value or element text.
///
/// Parsing trims surrounding whitespace and must consume the whole string.
/// Integers also accept a `0x` hexadecimal prefix. Booleans accept an
/// integer (non-zero is true) or `true`/`false` in lower, title or upper
/// case.
pub trait XmlScalar: Sized {
    /// Parse the scalar from XML text.
    fn from_xml(s: &str) -> Option<Self>;
    /// Format the scalar as XML text.
    fn to_xml(&self) -> String;
}

fn hex_digits(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

macro_rules! xml_integer {
    ($($t:ty),*) => {
        $(
            impl XmlScalar for $t {
                fn from_xml(s: &str) -> Option<Self> {
                    let s = s.trim();
                    match hex_digits(s) {
                        Some(digits) => <$t>::from_str_radix(digits, 16).ok(),
                        None => s.parse().ok(),
                    }
                }

                fn to_xml(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

xml_integer!(i32, u32, i64, u64);

macro_rules! xml_float {
    ($($t:ty),*) => {
        $(
            impl XmlScalar for $t {
                fn from_xml(s: &str) -> Option<Self> {
                    s.trim().parse().ok()
                }

                fn to_xml(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

xml_float!(f32, f64);

impl XmlScalar for bool {
    fn from_xml(s: &str) -> Option<Self> {
        if let Some(i) = i64::from_xml(s) {
            return Some(i != 0);
        }
        match s.trim() {
            "true" | "True" | "TRUE" => Some(true),
            "false" | "False" | "FALSE" => Some(false),
            _ => None,
        }
    }

    fn to_xml(&self) -> String {
        self.to_string()
    }
}

/// ## Typed values
impl Document {
    /// Read an attribute as a scalar.
    ///
    /// Returns [`Error::NoAttribute`] if the attribute does not exist and
    /// [`Error::WrongAttributeType`] if it cannot be converted.
    ///
    /// ```rust
    /// let doc = tinydom::parse(r#"<a n="42" f="x"/>"#).unwrap();
    /// let a = doc.root_element().unwrap();
    /// assert_eq!(doc.query_attribute::<i32>(a, "n").unwrap(), 42);
    /// assert!(doc.query_attribute::<i32>(a, "f").is_err());
    /// assert_eq!(doc.attribute_or(a, "missing", 7u32), 7);
    /// ```
    pub fn query_attribute<T: XmlScalar>(&self, node: Node, name: &str) -> Result<T, Error> {
        let value = self
            .attribute(node, name)
            .ok_or_else(|| Error::NoAttribute(name.to_string()))?;
        T::from_xml(value).ok_or_else(|| Error::WrongAttributeType(name.to_string()))
    }

    /// Read an attribute as a scalar, falling back to `default`.
    pub fn attribute_or<T: XmlScalar>(&self, node: Node, name: &str, default: T) -> T {
        self.query_attribute(node, name).unwrap_or(default)
    }

    /// Set an attribute to a formatted scalar.
    pub fn set_attribute_value<T: XmlScalar>(
        &mut self,
        node: Node,
        name: &str,
        value: T,
    ) -> Result<(), Error> {
        self.set_attribute(node, name, &value.to_xml())
    }

    /// The text of an element: the value of its first child, if that is a
    /// text node.
    ///
    /// ```rust
    /// let doc = tinydom::parse("<a>Hello<b/></a>").unwrap();
    /// let a = doc.root_element().unwrap();
    /// assert_eq!(doc.text(a), Some("Hello"));
    /// let b = doc.first_child_element(a, None).unwrap();
    /// assert_eq!(doc.text(b), None);
    /// ```
    pub fn text(&self, node: Node) -> Option<&str> {
        let first = self.first_child(node)?;
        if self.is_text(first) {
            self.value(first)
        } else {
            None
        }
    }

    /// Set the text of an element. This replaces the value of a leading
    /// text child, or inserts a new text node as first child.
    pub fn set_text(&mut self, node: Node, text: &str) -> Result<(), Error> {
        self.check_node(node)?;
        if !self.is_element(node) {
            return Err(Error::NotAnElement);
        }
        match self.first_child(node) {
            Some(first) if self.is_text(first) => self.set_value(first, text),
            _ => {
                let text = self.new_text(text);
                self.insert_first_child(node, text)?;
                Ok(())
            }
        }
    }

    /// Read the text of an element as a scalar.
    ///
    /// Returns [`Error::NoTextNode`] if the element has no text and
    /// [`Error::CanNotConvertText`] if it cannot be converted.
    pub fn query_text<T: XmlScalar>(&self, node: Node) -> Result<T, Error> {
        let text = self.text(node).ok_or(Error::NoTextNode)?;
        T::from_xml(text).ok_or(Error::CanNotConvertText)
    }

    /// Read the text of an element as a scalar, falling back to `default`.
    pub fn text_or<T: XmlScalar>(&self, node: Node, default: T) -> T {
        self.query_text(node).unwrap_or(default)
    }

    /// Set the text of an element to a formatted scalar.
    pub fn set_text_value<T: XmlScalar>(&mut self, node: Node, value: T) -> Result<(), Error> {
        self.set_text(node, &value.to_xml())
    }
}
