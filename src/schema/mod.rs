//! Schema introspection.
//!
//! The grammar compiler and the text-format parser only ever ask one question about a schema:
//! which fields does a message have? Everything that can answer it implements [`SchemaIntrospector`].
//!
//! Two implementations ship with this crate:
//! - [`DescriptorPool`] reads a `FileDescriptorSet` produced by `protoc --descriptor_set_out`
//! - a plain `IndexMap<String, Vec<Field>>` which is handy for small, hand-written schemas:
//! ```
//! let mut schema = IndexMap::new();
//! schema.insert("Request".to_string(), vec![
//!     Field::new("id", 1, Cardinality::Required, FieldKind::Int32),
//! ]);
//! let fields = schema.fields("Request").unwrap();
//! ```

mod compile;
mod pool;

pub use compile::{compile_protos, descriptor_path};
pub use pool::DescriptorPool;

#[cfg(test)]
pub(crate) use pool::tests::demo_set;

use indexmap::IndexMap;

use crate::error::SchemaError;

/// How often a field may appear in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Zero or one time
    Optional,
    /// Exactly once
    Required,
    /// Any number of times
    Repeated,
}

/// A named value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Literal name as it appears in text format
    pub name: String,
    /// Number on the wire
    pub number: i32,
}

impl EnumValue {
    /// Create a new enum value.
    pub fn new<S: Into<String>>(name: S, number: i32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

/// The type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A nested message, identified by its (fully qualified) type name
    Message(String),
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Boolean
    Bool,
    /// UTF-8 string
    String,
    /// Opaque bytes
    Bytes,
    /// Enumeration with its values in declaration order
    Enum(Vec<EnumValue>),
    /// Anything else, carrying the name of the schema type
    Unsupported(String),
}

/// A single field of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field number on the wire
    pub number: u32,
    /// How often the field may appear
    pub cardinality: Cardinality,
    /// The type of the field
    pub kind: FieldKind,
}

impl Field {
    /// Create a new field.
    pub fn new<S: Into<String>>(name: S, number: u32, cardinality: Cardinality, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number,
            cardinality,
            kind,
        }
    }
}

/// Access to the fields of the messages of a schema.
pub trait SchemaIntrospector {
    /// Return the fields of `message` in declaration order.
    fn fields(&self, message: &str) -> Result<Vec<Field>, SchemaError>;
}

impl SchemaIntrospector for IndexMap<String, Vec<Field>> {
    fn fields(&self, message: &str) -> Result<Vec<Field>, SchemaError> {
        self.get(message).cloned().ok_or_else(|| SchemaError::UnknownMessage(message.to_string()))
    }
}

/// The unqualified name of a message: `pkg.Outer.Inner` becomes `Inner`.
pub fn short_name(message: &str) -> &str {
    message.rsplit('.').next().unwrap_or(message)
}
