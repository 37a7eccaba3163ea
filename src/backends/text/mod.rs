//! Serialize derivation trees into protobuf text format.
//!
//! Use it like so:
//! ```
//! let tree = DerivationEngine::new(&grammar).fuzz_tree(&mut rng)?;
//! let text = TextSerializer::new(&grammar).serialize(&tree);
//! ```
//! Every non-terminal that is not a helper symbol becomes a field. Fields whose node derives
//! a single terminal are written as `name: value`, all others as a `name { ... }` block.

mod formatter;
mod serializer;

pub use serializer::TextSerializer;
