use rand::{Rng, RngCore};

use crate::{
    engine::{cost::{Cost, CostEvaluator}, tree::DerivationTree},
    error::EngineError,
    grammar::Grammar,
};

/// The hooks of one expansion phase.
pub trait ExpansionStrategy {
    /// Name of the phase for logging.
    fn name(&self) -> &'static str;
    
    /// Pick one of `expandable` children to descend into and return its position in `expandable`.
    fn choose_tree_expansion(&self, expandable: &[usize], rng: &mut dyn RngCore) -> usize {
        rng.gen_range(0..expandable.len())
    }
    
    /// Pick the alternative of `symbol` that the node is expanded with.
    fn choose_node_expansion(&self, symbol: &str, alternatives: &[String], rng: &mut dyn RngCore) -> Result<usize, EngineError>;
    
    /// Post-process the children of the chosen alternative.
    fn process_chosen_children(&self, children: Vec<DerivationTree>, _expansion: &str) -> Vec<DerivationTree> {
        children
    }
}

/// Choose uniformly among the alternatives.
pub struct RandomExpansion;

impl ExpansionStrategy for RandomExpansion {
    fn name(&self) -> &'static str {
        "random"
    }
    
    fn choose_node_expansion(&self, symbol: &str, alternatives: &[String], rng: &mut dyn RngCore) -> Result<usize, EngineError> {
        if alternatives.is_empty() {
            return Err(EngineError::NonTerminating(symbol.to_string()));
        }
        
        Ok(rng.gen_range(0..alternatives.len()))
    }
}

/// Pick uniformly among the alternatives whose cost equals `target`.
fn choose_with_cost(costs: &[Cost], target: Cost, rng: &mut dyn RngCore) -> usize {
    let candidates: Vec<usize> = costs
        .iter()
        .enumerate()
        .filter(|(_, cost)| **cost == target)
        .map(|(i, _)| i)
        .collect();
    
    candidates[rng.gen_range(0..candidates.len())]
}

/// Choose an alternative of maximal cost to grow the tree.
pub struct MaxCostExpansion<'g> {
    costs: CostEvaluator<'g>,
}

impl<'g> MaxCostExpansion<'g> {
    /// Create the strategy for `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            costs: CostEvaluator::new(grammar),
        }
    }
}

impl<'g> ExpansionStrategy for MaxCostExpansion<'g> {
    fn name(&self) -> &'static str {
        "max-cost"
    }
    
    fn choose_node_expansion(&self, symbol: &str, alternatives: &[String], rng: &mut dyn RngCore) -> Result<usize, EngineError> {
        let costs = self.costs.alternative_costs(symbol, alternatives);
        
        match costs.iter().max() {
            Some(max) => Ok(choose_with_cost(&costs, *max, rng)),
            None => Err(EngineError::NonTerminating(symbol.to_string())),
        }
    }
}

/// Choose an alternative of minimal cost to close the tree.
pub struct MinCostExpansion<'g> {
    costs: CostEvaluator<'g>,
}

impl<'g> MinCostExpansion<'g> {
    /// Create the strategy for `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            costs: CostEvaluator::new(grammar),
        }
    }
}

impl<'g> ExpansionStrategy for MinCostExpansion<'g> {
    fn name(&self) -> &'static str {
        "min-cost"
    }
    
    fn choose_node_expansion(&self, symbol: &str, alternatives: &[String], rng: &mut dyn RngCore) -> Result<usize, EngineError> {
        let costs = self.costs.alternative_costs(symbol, alternatives);
        
        match costs.iter().min() {
            Some(min) if min.is_finite() => Ok(choose_with_cost(&costs, *min, rng)),
            _ => Err(EngineError::NonTerminating(symbol.to_string())),
        }
    }
}
