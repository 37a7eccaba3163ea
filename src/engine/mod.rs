//! The derivation engine turns a [`Grammar`](crate::grammar::Grammar) into concrete derivation trees.
//!
//! Expansion runs in three phases, each driven by an [`ExpansionStrategy`]:
//! 1. [`MaxCostExpansion`] grows the tree until it has `min_nonterminals` open nodes
//! 2. [`RandomExpansion`] picks alternatives uniformly until `max_nonterminals` open nodes exist
//! 3. [`MinCostExpansion`] closes every remaining node as cheaply as possible
//!
//! ```
//! let engine = DerivationEngine::new(&grammar)
//!     .min_nonterminals(0)
//!     .max_nonterminals(10);
//! let tree = engine.fuzz_tree(&mut rng)?;
//! assert_eq!(tree.possible_expansions(), 0);
//! ```

mod cost;
mod expand;
mod strategy;
mod tree;

pub use cost::{Cost, CostEvaluator};
pub use expand::{DerivationEngine, DEFAULT_MAX_NONTERMINALS, DEFAULT_MIN_NONTERMINALS};
pub use strategy::{ExpansionStrategy, MaxCostExpansion, MinCostExpansion, RandomExpansion};
pub use tree::DerivationTree;
