use crate::{
    backends::text::formatter::TextFormatter,
    engine::DerivationTree,
    grammar::{field_name, is_nonterminal, Grammar},
};

/// Writes derivation trees of a grammar as text format.
pub struct TextSerializer<'g> {
    grammar: &'g Grammar,
}

impl<'g> TextSerializer<'g> {
    /// Create a serializer for trees of `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
        }
    }
    
    /// Serialize the fields below the root of `tree`.
    pub fn serialize(&self, tree: &DerivationTree) -> String {
        let mut fmt = TextFormatter::new();
        self.traverse(tree, &mut fmt);
        fmt.finish()
    }
    
    fn traverse(&self, node: &DerivationTree, fmt: &mut TextFormatter) {
        for child in node.children().unwrap_or_default() {
            if !is_nonterminal(child.symbol()) {
                continue;
            }
            
            // Helpers are transparent
            if self.grammar.is_helper(child.symbol()) {
                self.traverse(child, fmt);
                continue;
            }
            
            let name = field_name(child.symbol());
            
            match child.children() {
                Some([leaf]) if leaf.is_leaf() && !leaf.symbol().is_empty() => {
                    fmt.write(format!("{}: {}", name, leaf.symbol()));
                },
                _ => {
                    fmt.write(format!("{} {{", name));
                    fmt.indent();
                    self.traverse(child, fmt);
                    fmt.unindent();
                    fmt.write("}");
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;
    use crate::grammar::Rules;
    
    fn leaf_node(symbol: &str, value: &str) -> DerivationTree {
        DerivationTree::with_children(symbol, vec![DerivationTree::leaf(value)])
    }
    
    fn grammar() -> Grammar {
        let mut helpers = AHashSet::new();
        helpers.insert("<symbol>".to_string());
        helpers.insert("<symbol-1>".to_string());
        Grammar::new(Rules::new(), "<Request>".to_string(), helpers)
    }
    
    #[test]
    fn test_scalar_and_block() {
        let grammar = grammar();
        let tree = DerivationTree::with_children("<Request>", vec![
            leaf_node("<id>", ":::INT32:::"),
            DerivationTree::with_children("<symbol>", vec![
                DerivationTree::with_children("<inner>", vec![
                    DerivationTree::with_children("<symbol-1>", vec![DerivationTree::leaf("")]),
                    leaf_node("<big>", ":::INT64:::"),
                ]),
            ]),
        ]);
        
        assert_eq!(
            TextSerializer::new(&grammar).serialize(&tree),
            "id: :::INT32:::\ninner {\n  big: :::INT64:::\n}\n"
        );
    }
    
    #[test]
    fn test_empty_message() {
        let grammar = grammar();
        let tree = DerivationTree::with_children("<Request>", vec![
            leaf_node("<empty>", ""),
            DerivationTree::with_children("<symbol>", vec![DerivationTree::leaf("")]),
        ]);
        
        assert_eq!(TextSerializer::new(&grammar).serialize(&tree), "empty {\n}\n");
    }
    
    #[test]
    fn test_repeated_enum() {
        let grammar = grammar();
        let tree = DerivationTree::with_children("<Request>", vec![
            DerivationTree::with_children("<symbol-1>", vec![
                DerivationTree::with_children("<symbol>", vec![leaf_node("<tags>", "A")]),
                DerivationTree::with_children("<symbol-1>", vec![
                    DerivationTree::with_children("<symbol>", vec![leaf_node("<tags>", "B")]),
                ]),
            ]),
        ]);
        
        assert_eq!(TextSerializer::new(&grammar).serialize(&tree), "tags: A\ntags: B\n");
    }
    
    #[test]
    fn test_numbered_symbols_use_field_name() {
        let grammar = grammar();
        let tree = DerivationTree::with_children("<Req>", vec![
            DerivationTree::with_children("<a>", vec![
                DerivationTree::with_children("<x>", vec![leaf_node("<v>", ":::INT32:::")]),
            ]),
            DerivationTree::with_children("<b>", vec![
                DerivationTree::with_children("<x-1>", vec![leaf_node("<v-1>", ":::STRING:::")]),
            ]),
        ]);
        
        assert_eq!(
            TextSerializer::new(&grammar).serialize(&tree),
            "a {\n  x {\n    v: :::INT32:::\n  }\n}\nb {\n  x {\n    v: :::STRING:::\n  }\n}\n"
        );
    }
}
