use ahash::AHashSet;
use petgraph::{graphmap::DiGraphMap, visit::Dfs};

use crate::{
    error::{GrammarDefect, GrammarError},
    grammar::{symbol::nonterminals, Rules},
};

fn reference_graph(rules: &Rules) -> DiGraphMap<&str, ()> {
    let mut graph = DiGraphMap::new();

    for (symbol, expansions) in rules {
        graph.add_node(symbol.as_str());

        for expansion in expansions {
            for nonterm in nonterminals(expansion) {
                graph.add_edge(symbol.as_str(), nonterm, ());
            }
        }
    }

    graph
}

/// All non-terminals that can be reached from `start`, including `start` itself.
pub fn reachable_nonterminals<'a>(rules: &'a Rules, start: &'a str) -> AHashSet<&'a str> {
    let mut graph = reference_graph(rules);
    let mut reachable = AHashSet::new();

    graph.add_node(start);
    let mut dfs = Dfs::new(&graph, start);

    while let Some(symbol) = dfs.next(&graph) {
        reachable.insert(symbol);
    }

    reachable
}

/// Symbols that have at least one finite derivation.
fn productive_nonterminals(rules: &Rules) -> AHashSet<&str> {
    let mut productive = AHashSet::new();

    loop {
        let mut changed = false;

        for (symbol, expansions) in rules {
            if productive.contains(symbol.as_str()) {
                continue;
            }

            let terminates = expansions
                .iter()
                .any(|expansion| nonterminals(expansion).into_iter().all(|nonterm| productive.contains(nonterm)));

            if terminates {
                productive.insert(symbol.as_str());
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    productive
}

/// Collect every defect of the grammar `rules` with respect to the start symbol `start`.
pub fn defects(rules: &Rules, start: &str) -> Vec<GrammarDefect> {
    let mut defects = Vec::new();
    let mut used = AHashSet::new();
    let mut undefined = AHashSet::new();

    for (symbol, expansions) in rules {
        if expansions.is_empty() {
            defects.push(GrammarDefect::EmptyExpansions(symbol.clone()));
        }

        for expansion in expansions {
            for nonterm in nonterminals(expansion) {
                used.insert(nonterm);

                if !rules.contains_key(nonterm) && undefined.insert(nonterm) {
                    defects.push(GrammarDefect::Undefined(nonterm.to_string()));
                }
            }
        }
    }

    for symbol in rules.keys() {
        if symbol != start && !used.contains(symbol.as_str()) {
            defects.push(GrammarDefect::Unused(symbol.clone()));
        }
    }

    let reachable = reachable_nonterminals(rules, start);

    for symbol in rules.keys() {
        if !reachable.contains(symbol.as_str()) {
            defects.push(GrammarDefect::Unreachable {
                symbol: symbol.clone(),
                start: start.to_string(),
            });
        }
    }

    let productive = productive_nonterminals(rules);

    for (symbol, expansions) in rules {
        if !expansions.is_empty() && !productive.contains(symbol.as_str()) {
            defects.push(GrammarDefect::Unproductive(symbol.clone()));
        }
    }

    defects
}

/// Check that the grammar is closed, reachable and productive.
pub fn validate(rules: &Rules, start: &str) -> Result<(), GrammarError> {
    let defects = defects(rules, start);

    if defects.is_empty() {
        Ok(())
    } else {
        for defect in &defects {
            log::debug!("Grammar defect: {}", defect);
        }

        Err(GrammarError::Invalid(defects))
    }
}
