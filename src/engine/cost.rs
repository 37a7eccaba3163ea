use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Add;
use ahash::AHashSet;
use itertools::Itertools;

use crate::grammar::{nonterminals, Grammar};

/// Number of expansion steps needed to terminalize a symbol.
/// `Infinite` marks a derivation that revisits a symbol on its own path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    /// A finite number of steps
    Finite(usize),
    /// Unbounded recursion
    Infinite,
}

impl Cost {
    /// Whether the cost is finite.
    pub fn is_finite(self) -> bool {
        matches!(self, Cost::Finite(_))
    }
}

impl Add for Cost {
    type Output = Cost;
    
    fn add(self, other: Cost) -> Cost {
        match (self, other) {
            (Cost::Finite(a), Cost::Finite(b)) => Cost::Finite(a.saturating_add(b)),
            _ => Cost::Infinite,
        }
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Cost::Finite(cost) => write!(f, "{}", cost),
            Cost::Infinite => write!(f, "inf"),
        }
    }
}

/// Computes expansion costs over a grammar.
///
/// Nothing is cached, every call walks the grammar with a fresh path-scoped `seen` set.
#[derive(Clone, Copy)]
pub struct CostEvaluator<'g> {
    grammar: &'g Grammar,
}

impl<'g> CostEvaluator<'g> {
    /// Create an evaluator for `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
        }
    }
    
    /// Minimum cost over all alternatives of `symbol`, where `symbol` joins the `seen` set.
    pub fn symbol_cost<'s>(&self, symbol: &str, seen: &AHashSet<&'s str>) -> Cost
    where
        'g: 's,
    {
        let (symbol, expansions) = match self.grammar.rules().get_key_value(symbol) {
            Some(entry) => entry,
            None => return Cost::Infinite,
        };
        
        let mut seen = seen.clone();
        seen.insert(symbol.as_str());
        
        expansions
            .iter()
            .map(|expansion| self.expansion_cost(expansion, &seen))
            .min()
            .unwrap_or(Cost::Infinite)
    }
    
    /// Cost of a single alternative: one step for the alternative itself plus the
    /// cost of every distinct non-terminal it references.
    pub fn expansion_cost<'s>(&self, expansion: &'s str, seen: &AHashSet<&'s str>) -> Cost
    where
        'g: 's,
    {
        let symbols: Vec<&str> = nonterminals(expansion).into_iter().unique().collect();
        
        if symbols.is_empty() {
            return Cost::Finite(1);
        }
        
        if symbols.iter().any(|symbol| seen.contains(symbol)) {
            return Cost::Infinite;
        }
        
        symbols
            .into_iter()
            .fold(Cost::Finite(1), |total, symbol| total + self.symbol_cost(symbol, seen))
    }
    
    /// Costs of all alternatives of `symbol` when `symbol` itself is being expanded.
    pub fn alternative_costs<'s>(&self, symbol: &'s str, alternatives: &'s [String]) -> Vec<Cost>
    where
        'g: 's,
    {
        let mut seen = AHashSet::new();
        seen.insert(symbol);
        
        alternatives
            .iter()
            .map(|alternative| self.expansion_cost(alternative, &seen))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rules;
    
    fn grammar(entries: &[(&str, &[&str])]) -> Grammar {
        let rules: Rules = entries
            .iter()
            .map(|(symbol, expansions)| (symbol.to_string(), expansions.iter().map(|e| e.to_string()).collect()))
            .collect();
        Grammar::builder().rules(rules).build().unwrap()
    }
    
    #[test]
    fn test_ordering() {
        assert!(Cost::Finite(3) < Cost::Finite(4));
        assert!(Cost::Finite(usize::MAX) < Cost::Infinite);
        assert_eq!(Cost::Finite(1) + Cost::Finite(2), Cost::Finite(3));
        assert_eq!(Cost::Finite(1) + Cost::Infinite, Cost::Infinite);
    }
    
    #[test]
    fn test_recursive_alternative() {
        let grammar = grammar(&[
            ("<start>", &["<expr>"]),
            ("<expr>", &["<digit>", "<digit>+<expr>"]),
            ("<digit>", &["0", "1"]),
        ]);
        let costs = CostEvaluator::new(&grammar);
        
        let mut seen = AHashSet::new();
        seen.insert("<expr>");
        
        assert_eq!(costs.expansion_cost("<digit>+<expr>", &seen), Cost::Infinite);
        assert_eq!(costs.expansion_cost("<digit>", &seen), Cost::Finite(1) + costs.symbol_cost("<digit>", &seen));
        assert_eq!(costs.expansion_cost("<digit>", &seen), Cost::Finite(2));
        assert_eq!(costs.symbol_cost("<start>", &AHashSet::new()), Cost::Finite(3));
        
        let expansions = grammar.expansions("<expr>").unwrap();
        assert_eq!(costs.alternative_costs("<expr>", expansions), vec![Cost::Finite(2), Cost::Infinite]);
    }
    
    #[test]
    fn test_distinct_references() {
        let grammar = grammar(&[
            ("<start>", &["<pair>"]),
            ("<pair>", &["<a><a>"]),
            ("<a>", &["<b>"]),
            ("<b>", &["b"]),
        ]);
        let costs = CostEvaluator::new(&grammar);
        
        assert_eq!(costs.symbol_cost("<b>", &AHashSet::new()), Cost::Finite(1));
        assert_eq!(costs.symbol_cost("<a>", &AHashSet::new()), Cost::Finite(2));
        assert_eq!(costs.symbol_cost("<pair>", &AHashSet::new()), Cost::Finite(3));
    }
    
    #[test]
    fn test_terminal_alternatives() {
        let grammar = grammar(&[("<start>", &["", "x"])]);
        let costs = CostEvaluator::new(&grammar);
        
        assert_eq!(costs.expansion_cost("", &AHashSet::new()), Cost::Finite(1));
        assert_eq!(costs.symbol_cost("<start>", &AHashSet::new()), Cost::Finite(1));
    }
    
    #[test]
    fn test_seen_never_lowers_cost() {
        let grammar = grammar(&[
            ("<start>", &["<list>"]),
            ("<list>", &["<item>", "<item>,<list>"]),
            ("<item>", &["<digit>", "(<list>)"]),
            ("<digit>", &["0", "1"]),
        ]);
        let costs = CostEvaluator::new(&grammar);
        
        for symbol in grammar.rules().keys() {
            let base = costs.symbol_cost(symbol, &AHashSet::new());
            assert!(base.is_finite(), "{}", symbol);
            
            for other in grammar.rules().keys() {
                let mut seen = AHashSet::new();
                seen.insert(other.as_str());
                assert!(costs.symbol_cost(symbol, &seen) >= base, "{} with {}", symbol, other);
            }
        }
    }
}
