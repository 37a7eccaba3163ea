//! Backends consume grammars and derivation trees.
//!
//! - `text`: serialize a derivation tree into protobuf text format
//! - `wire`: parse text format against a schema and encode it into the binary wire format
//! - `json`: write a compiled grammar back to disk

pub mod json;
pub mod text;
pub mod wire;
