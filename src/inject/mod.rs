//! Turns the placeholder tokens of a serialized tree into adversarial values.
//!
//! The compiled grammar never produces concrete scalars. Every integer, bool, string and bytes
//! field derives one of the [`Placeholder`] tokens instead. After serialization a [`Template`]
//! goes through a fixed pipeline:
//! 1. [`Template::delete`] removes configured fields
//! 2. [`Template::set`] forces configured values into fields that still hold a placeholder
//! 3. [`Injector::fill_all`] replaces the remaining placeholders one occurrence at a time
//!
//! ```
//! let mut template = Template::new(text);
//! template.delete("session");
//! template.set("version", "3");
//! Injector::new(Wordlists::default()).fill_all(&mut template, &mut rng)?;
//! ```

mod injector;
mod template;
mod wordlist;

pub use injector::{Injector, StringSource};
pub use template::Template;
pub use wordlist::{Wordlist, Wordlists};

/// A typed stand-in for a scalar value that is chosen late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
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
}

impl Placeholder {
    /// All placeholders in substitution order.
    pub const ALL: [Placeholder; 5] = [
        Placeholder::Int32,
        Placeholder::Int64,
        Placeholder::Bool,
        Placeholder::String,
        Placeholder::Bytes,
    ];

    /// The literal token that appears in grammars and templates.
    pub const fn token(self) -> &'static str {
        match self {
            Placeholder::Int32 => ":::INT32:::",
            Placeholder::Int64 => ":::INT64:::",
            Placeholder::Bool => ":::BOOL:::",
            Placeholder::String => ":::STRING:::",
            Placeholder::Bytes => ":::BYTES:::",
        }
    }

    /// The placeholder whose token is exactly `token`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|placeholder| placeholder.token() == token)
    }

    /// String and bytes values must be quoted in text format.
    pub const fn is_quoted(self) -> bool {
        matches!(self, Placeholder::String | Placeholder::Bytes)
    }
}
