//! This library contains everything you need to fuzz protobuf endpoints with grammars.
//! 
//! It consists of
//! - __schema__: Load message definitions from compiled descriptor sets.
//! - __frontend__: Derive a context-free grammar from a message type, or load a hand-written one.
//! - __engine__: Expand derivation trees over a grammar in three cost-driven phases.
//! - __backends__: Serialize trees into text format, encode text format into wire format
//!   or dump the grammar as JSON.
//! - __inject__: Replace the placeholder tokens of a serialized tree with adversarial values.
//! - __fuzzer__: Tie everything together and send the messages to the target.
//! 
//! ## Getting Started
//! The first step always is to create a grammar. To do this use the [`Grammar::builder()`](grammar::Grammar::builder) method
//! that will give you access to a [`GrammarBuilder`](grammar::GrammarBuilder) like this:
//! ```
//! let pool = DescriptorPool::load("compiled/user.desc").unwrap();
//! let grammar = Grammar::builder()
//!     .schema(&pool, "CreateUser").unwrap()
//!     .build().unwrap();
//! ```
//! Then, derive a message from it and fill in values:
//! ```
//! let tree = DerivationEngine::new(&grammar).fuzz_tree(&mut rng)?;
//! let mut template = Template::new(TextSerializer::new(&grammar).serialize(&tree));
//! Injector::default().fill_all(&mut template, &mut rng)?;
//! let payload = parse_text_format(&pool, "CreateUser", template.text())?.encode_to_vec();
//! ```
//! Or let the [`ProtoFuzzer`](fuzzer::ProtoFuzzer) do all of that for the services of a configuration file:
//! ```
//! let mut fuzzer = ProtoFuzzer::from_config(Config::load("config.json")?)?;
//! fuzzer.run(&HttpRunner::new(None)?)?;
//! ```

#![deny(missing_docs)]

pub(crate) mod parser;

pub mod error;
pub mod schema;
pub mod grammar;
pub mod engine;
pub mod backends;
pub mod inject;
pub mod config;
pub mod transport;
pub mod fuzzer;
