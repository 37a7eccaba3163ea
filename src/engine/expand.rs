use rand::RngCore;

use crate::{
    engine::{
        strategy::{ExpansionStrategy, MaxCostExpansion, MinCostExpansion, RandomExpansion},
        tree::DerivationTree,
    },
    error::EngineError,
    grammar::Grammar,
};

/// Default lower bound of open non-terminals for the growing phase
pub const DEFAULT_MIN_NONTERMINALS: usize = 0;
/// Default upper bound of open non-terminals for the random phase
pub const DEFAULT_MAX_NONTERMINALS: usize = 10;

/// Expands derivation trees over a fixed grammar.
pub struct DerivationEngine<'g> {
    grammar: &'g Grammar,
    min_nonterminals: usize,
    max_nonterminals: usize,
}

impl<'g> DerivationEngine<'g> {
    /// Create an engine with the default phase limits.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            min_nonterminals: DEFAULT_MIN_NONTERMINALS,
            max_nonterminals: DEFAULT_MAX_NONTERMINALS,
        }
    }
    
    /// Grow the tree at maximum cost while it has fewer than `min` open non-terminals.
    pub fn min_nonterminals(mut self, min: usize) -> Self {
        self.min_nonterminals = min;
        self
    }
    
    /// Expand randomly while the tree has fewer than `max` open non-terminals.
    pub fn max_nonterminals(mut self, max: usize) -> Self {
        self.max_nonterminals = max;
        self
    }
    
    /// The grammar this engine expands.
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }
    
    /// A tree consisting only of the unexpanded start symbol.
    pub fn init_tree(&self) -> DerivationTree {
        DerivationTree::new(self.grammar.start_symbol())
    }
    
    /// Derive a complete tree from the start symbol.
    pub fn fuzz_tree(&self, rng: &mut dyn RngCore) -> Result<DerivationTree, EngineError> {
        let mut tree = self.init_tree();
        self.expand(&mut tree, rng)?;
        log::trace!("Final tree: {:#?}", tree);
        Ok(tree)
    }
    
    /// Run all three phases on `tree`. Afterwards no node is left unexpanded.
    pub fn expand(&self, tree: &mut DerivationTree, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        self.expand_with_strategy(tree, &MaxCostExpansion::new(self.grammar), Some(self.min_nonterminals), rng)?;
        self.expand_with_strategy(tree, &RandomExpansion, Some(self.max_nonterminals), rng)?;
        self.expand_with_strategy(tree, &MinCostExpansion::new(self.grammar), None, rng)?;
        
        debug_assert_eq!(tree.possible_expansions(), 0);
        Ok(())
    }
    
    /// Expand `tree` with `strategy` until it has `limit` open non-terminals or none at all.
    pub fn expand_with_strategy(
        &self,
        tree: &mut DerivationTree,
        strategy: &dyn ExpansionStrategy,
        limit: Option<usize>,
        rng: &mut dyn RngCore,
    ) -> Result<(), EngineError> {
        let mut open = tree.possible_expansions();
        
        while open > 0 && limit.map_or(true, |limit| open < limit) {
            // One node gets expanded, its unexpanded children are new
            open = open - 1 + self.expand_tree_once(tree, strategy, rng)?;
            log::trace!("{} possible expansion(s) left", open);
        }
        
        Ok(())
    }
    
    /// Descend into a random child with open nodes until an unexpanded node is found and expand it.
    /// Returns the number of unexpanded children the new expansion introduced.
    fn expand_tree_once(&self, tree: &mut DerivationTree, strategy: &dyn ExpansionStrategy, rng: &mut dyn RngCore) -> Result<usize, EngineError> {
        let children = match tree.children_mut() {
            Some(children) => children,
            None => return self.expand_node(tree, strategy, rng),
        };
        
        let expandable: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.any_possible_expansions())
            .map(|(i, _)| i)
            .collect();
        
        let index = expandable[strategy.choose_tree_expansion(&expandable, rng)];
        self.expand_tree_once(&mut children[index], strategy, rng)
    }
    
    fn expand_node(&self, node: &mut DerivationTree, strategy: &dyn ExpansionStrategy, rng: &mut dyn RngCore) -> Result<usize, EngineError> {
        let alternatives = self
            .grammar
            .expansions(node.symbol())
            .ok_or_else(|| EngineError::UndefinedSymbol(node.symbol().to_string()))?;
        
        let index = strategy.choose_node_expansion(node.symbol(), alternatives, rng)?;
        let expansion = &alternatives[index];
        
        log::debug!("Expanding {} with {:?} ({})", node.symbol(), expansion, strategy.name());
        
        let children = strategy.process_chosen_children(DerivationTree::expansion_to_children(expansion), expansion);
        let added = children.iter().filter(|child| child.children().is_none()).count();
        node.set_children(children);
        Ok(added)
    }
}
