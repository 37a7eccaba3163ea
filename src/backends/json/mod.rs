//! Write a compiled grammar to disk.
//! 
//! Use it like so:
//! ```
//! // First, derive a grammar from a schema
//! let grammar = Grammar::builder()
//!     .schema(&pool, "Request").unwrap()
//!     .build().unwrap();
//! 
//! // Then, dump its BNF rules. The output can be loaded again with `ebnf_grammar()`.
//! JsonGenerator::new().generate("request-grammar.json", &grammar)?;
//! ```

mod generator;

pub use generator::JsonGenerator;
