//! Turn text format into the binary protobuf wire format.
//!
//! The text is parsed against a [`SchemaIntrospector`](crate::schema::SchemaIntrospector) into a
//! schema-less [`DynamicMessage`] which is then encoded with the primitives of `prost`:
//! ```
//! let message = parse_text_format(&pool, "pkg.Request", "id: 5\nname: \"x\"")?;
//! let payload = message.encode_to_vec();
//! ```

mod encoder;
mod lexer;
mod parser;

pub use parser::parse_text_format;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed 32-bit integer
    Int32(i32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// Number of an enum value
    Enum(i32),
    /// Nested message
    Message(DynamicMessage),
}

/// A message whose fields are only known at runtime.
/// Fields are kept in the order in which they appeared in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicMessage {
    message: String,
    fields: Vec<(u32, Value)>,
}

impl DynamicMessage {
    /// An empty message of type `message`.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }
    
    /// The type name of the message.
    pub fn message(&self) -> &str {
        &self.message
    }
    
    /// All fields as `(number, value)` pairs.
    pub fn fields(&self) -> &[(u32, Value)] {
        &self.fields
    }
    
    /// Append a value for field `number`.
    pub fn push(&mut self, number: u32, value: Value) {
        self.fields.push((number, value));
    }
    
    /// All values of field `number`.
    pub fn get(&self, number: u32) -> impl Iterator<Item = &Value> {
        self.fields.iter().filter(move |(n, _)| *n == number).map(|(_, value)| value)
    }
}

/// Render `bytes` as the content of a double-quoted text-format literal.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len());
    
    for &c in bytes {
        match c {
            b'\n' => escaped.push_str("\\n"),
            b'\r' => escaped.push_str("\\r"),
            b'\t' => escaped.push_str("\\t"),
            b'\\' => escaped.push_str("\\\\"),
            b'"' => escaped.push_str("\\\""),
            b'\'' => escaped.push_str("\\'"),
            0x20..=0x7e => escaped.push(c as char),
            _ => escaped.push_str(&format!("\\{:03o}", c)),
        }
    }
    
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"plain"), "plain");
        assert_eq!(escape_bytes(b"a\"b\n"), "a\\\"b\\n");
        assert_eq!(escape_bytes("ü".as_bytes()), "\\303\\274");
        assert_eq!(escape_bytes(&[0]), "\\000");
    }
}
