//! This is the frontend that turns schemas into grammars.
//!
//! Use it like so:
//! ```
//! // Compile the message "Request" of a schema into a grammar:
//! let grammar = Grammar::builder()
//!     .schema(&pool, "Request").unwrap()
//!     .build().unwrap();
//!
//! // Or load a hand-written grammar in extended BNF
//! let grammar = Grammar::builder()
//!     .ebnf_grammar("my-grammar.json").unwrap()
//!     .entrypoint("<start>")
//!     .build().unwrap();
//! ```
//! A grammar maps every non-terminal `<name>` to a list of alternative expansions.
//! An expansion is a string of terminal text interleaved with references to non-terminals:
//! ```
//! for (symbol, expansions) in grammar.rules() {
//!     for expansion in expansions {
//!         println!("{} -> {:?} uses {:?}", symbol, expansion, nonterminals(expansion));
//!     }
//! }
//! ```
//! [`GrammarBuilder::build`] lowers extended BNF (`( ... )?`, `<x>*`, ...) into plain BNF and validates
//! the result, so every [`Grammar`] handed out by this module is closed, reachable and productive.

mod builder;
mod ebnf;
mod normalize;
mod symbol;
mod validate;

pub use builder::*;
pub use ebnf::schema_to_ebnf;
pub use symbol::{field_name, is_nonterminal, nonterminals, symbol_name, HELPER_SYMBOL};
pub use validate::{defects, reachable_nonterminals, validate};

pub(crate) use symbol::split_expansion;

use std::fmt::{Display, Formatter, Result as FmtResult};
use ahash::AHashSet;
use indexmap::IndexMap;

/// Rules of a grammar: non-terminal -> alternative expansions, in definition order.
pub type Rules = IndexMap<String, Vec<String>>;

/// A validated context-free grammar in plain BNF.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Rules,
    start: String,
    helpers: AHashSet<String>,
}

impl Grammar {
    /// Start building a grammar.
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub(crate) fn new(rules: Rules, start: String, helpers: AHashSet<String>) -> Self {
        Self {
            rules,
            start,
            helpers,
        }
    }

    /// The symbol where every derivation starts.
    pub fn start_symbol(&self) -> &str {
        &self.start
    }

    /// All rules of the grammar.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// The alternatives of `symbol` or `None` if it is not defined.
    pub fn expansions(&self, symbol: &str) -> Option<&[String]> {
        self.rules.get(symbol).map(Vec::as_slice)
    }

    /// Whether `symbol` was introduced while lowering extended BNF.
    pub fn is_helper(&self, symbol: &str) -> bool {
        self.helpers.contains(symbol)
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        writeln!(f, "Entrypoint: {}", self.start)?;
        writeln!(f, "Rules:")?;

        for (symbol, expansions) in &self.rules {
            write!(f, "  {} ->", symbol)?;

            for (i, expansion) in expansions.iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }

                write!(f, " {:?}", expansion)?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}
