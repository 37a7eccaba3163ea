use ahash::AHashSet;

use crate::grammar::{
    symbol::{extended_nonterminals, new_symbol, parenthesized_expressions, HELPER_SYMBOL},
    Rules,
};

fn fresh_helper(rules: &Rules, helpers: &mut AHashSet<String>) -> String {
    let symbol = new_symbol(rules, HELPER_SYMBOL);
    helpers.insert(symbol.clone());
    symbol
}

/// Replace every `( ... )q` with `<helper>q`, innermost groups first.
fn convert_ebnf_parentheses(rules: &mut Rules, helpers: &mut AHashSet<String>) {
    loop {
        let mut changed = false;
        let symbols: Vec<String> = rules.keys().cloned().collect();

        for symbol in symbols {
            let num_expansions = rules[&symbol].len();

            for i in 0..num_expansions {
                let expansion = rules[&symbol][i].clone();
                let groups: Vec<String> = parenthesized_expressions(&expansion).into_iter().map(str::to_string).collect();

                if groups.is_empty() {
                    continue;
                }

                let mut rewritten = expansion;

                for group in groups {
                    let (inner, operator) = group.split_at(group.len() - 1);
                    let inner = &inner[1..inner.len() - 1];
                    let helper = fresh_helper(rules, helpers);

                    rewritten = rewritten.replacen(&group, &format!("{}{}", helper, operator), 1);
                    rules.insert(helper, vec![inner.to_string()]);
                }

                rules[&symbol][i] = rewritten;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

/// Replace every `<x>?`, `<x>*` and `<x>+` with a helper symbol.
fn convert_ebnf_operators(rules: &mut Rules, helpers: &mut AHashSet<String>) {
    let symbols: Vec<String> = rules.keys().cloned().collect();

    for symbol in symbols {
        let num_expansions = rules[&symbol].len();

        for i in 0..num_expansions {
            let expansion = rules[&symbol][i].clone();
            let extended: Vec<String> = extended_nonterminals(&expansion).into_iter().map(str::to_string).collect();

            if extended.is_empty() {
                continue;
            }

            let mut rewritten = expansion;

            for reference in extended {
                let (original, operator) = reference.split_at(reference.len() - 1);
                let helper = fresh_helper(rules, helpers);

                let alternatives = match operator {
                    "?" => vec![String::new(), original.to_string()],
                    "*" => vec![String::new(), format!("{}{}", original, helper)],
                    "+" => vec![original.to_string(), format!("{}{}", original, helper)],
                    _ => unreachable!(),
                };

                rewritten = rewritten.replacen(&reference, &helper, 1);
                rules.insert(helper, alternatives);
            }

            rules[&symbol][i] = rewritten;
        }
    }
}

/// Lower extended BNF into plain BNF.
/// Every symbol that is introduced in the process is recorded in `helpers`.
pub(crate) fn convert_ebnf_grammar(rules: &mut Rules, helpers: &mut AHashSet<String>) {
    convert_ebnf_parentheses(rules, helpers);
    convert_ebnf_operators(rules, helpers);
}
