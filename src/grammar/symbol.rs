use once_cell::sync::Lazy;
use regex::Regex;

use crate::grammar::Rules;

/// Canonical name of the helper symbols that are introduced while lowering extended BNF.
/// Further helpers are numbered: `<symbol-1>`, `<symbol-2>`, ...
pub const HELPER_SYMBOL: &str = "<symbol>";

static RE_PARENTHESIZED_EXPR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^()]*\)[?+*]").unwrap());
static RE_EXTENDED_NONTERMINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<> ]*>[?+*]").unwrap());
static RE_NONTERMINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<> ]*>").unwrap());

/// All non-terminal references in `expansion`, in order of appearance.
pub fn nonterminals(expansion: &str) -> Vec<&str> {
    RE_NONTERMINAL.find_iter(expansion).map(|m| m.as_str()).collect()
}

/// Whether `s` consists of exactly one non-terminal reference.
pub fn is_nonterminal(s: &str) -> bool {
    RE_NONTERMINAL.find(s).map_or(false, |m| m.start() == 0 && m.end() == s.len())
}

/// The name inside the angle brackets of a non-terminal.
pub fn symbol_name(symbol: &str) -> &str {
    symbol.strip_prefix('<').and_then(|s| s.strip_suffix('>')).unwrap_or(symbol)
}

/// The protobuf field a non-terminal stands for: its name without a `-N` suffix.
pub fn field_name(symbol: &str) -> &str {
    let name = symbol_name(symbol);
    
    match name.rsplit_once('-') {
        Some((base, n)) if !base.is_empty() && !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => name,
    }
}

/// Quantified references like `<x>?`, `<x>*` or `<x>+`.
pub(crate) fn extended_nonterminals(expansion: &str) -> Vec<&str> {
    RE_EXTENDED_NONTERMINAL.find_iter(expansion).map(|m| m.as_str()).collect()
}

/// Innermost quantified groups like `(<a><b>)?`.
pub(crate) fn parenthesized_expressions(expansion: &str) -> Vec<&str> {
    RE_PARENTHESIZED_EXPR.find_iter(expansion).map(|m| m.as_str()).collect()
}

/// Split `expansion` into terminal text and non-terminal references.
/// Empty text between two references is dropped.
pub(crate) fn split_expansion(expansion: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for m in RE_NONTERMINAL.find_iter(expansion) {
        if m.start() > last {
            pieces.push(&expansion[last..m.start()]);
        }

        pieces.push(m.as_str());
        last = m.end();
    }

    if last < expansion.len() {
        pieces.push(&expansion[last..]);
    }

    pieces
}

/// A symbol derived from `base` that is not yet defined in `rules`.
pub(crate) fn new_symbol(rules: &Rules, base: &str) -> String {
    if !rules.contains_key(base) {
        return base.to_string();
    }

    let stem = base.strip_suffix('>').unwrap_or(base);
    let mut count = 1;

    loop {
        let candidate = format!("{}-{}>", stem, count);

        if !rules.contains_key(&candidate) {
            return candidate;
        }

        count += 1;
    }
}
