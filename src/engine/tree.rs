use crate::grammar::{is_nonterminal, split_expansion};

/// A node of a derivation tree.
///
/// A node without children is an unexpanded non-terminal. A node with an empty
/// list of children is a terminal leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationTree {
    symbol: String,
    children: Option<Vec<DerivationTree>>,
}

impl DerivationTree {
    /// An unexpanded node for the non-terminal `symbol`.
    pub fn new<S: Into<String>>(symbol: S) -> Self {
        Self {
            symbol: symbol.into(),
            children: None,
        }
    }
    
    /// A terminal leaf.
    pub fn leaf<S: Into<String>>(content: S) -> Self {
        Self {
            symbol: content.into(),
            children: Some(Vec::new()),
        }
    }
    
    /// An expanded node.
    pub fn with_children<S: Into<String>>(symbol: S, children: Vec<DerivationTree>) -> Self {
        Self {
            symbol: symbol.into(),
            children: Some(children),
        }
    }
    
    /// Build the children for `expansion`. The empty expansion becomes a single empty leaf.
    pub fn expansion_to_children(expansion: &str) -> Vec<DerivationTree> {
        if expansion.is_empty() {
            return vec![DerivationTree::leaf("")];
        }
        
        split_expansion(expansion)
            .into_iter()
            .map(|piece| if is_nonterminal(piece) {
                DerivationTree::new(piece)
            } else {
                DerivationTree::leaf(piece)
            })
            .collect()
    }
    
    /// The non-terminal or the terminal text of this node.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
    
    /// The children or `None` if the node is not expanded yet.
    pub fn children(&self) -> Option<&[DerivationTree]> {
        self.children.as_deref()
    }
    
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<DerivationTree>> {
        self.children.as_mut()
    }
    
    pub(crate) fn set_children(&mut self, children: Vec<DerivationTree>) {
        debug_assert!(self.children.is_none());
        self.children = Some(children);
    }
    
    /// Whether this node is a terminal leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(&self.children, Some(children) if children.is_empty())
    }
    
    /// Number of unexpanded nodes in this tree.
    pub fn possible_expansions(&self) -> usize {
        match &self.children {
            None => 1,
            Some(children) => children.iter().map(DerivationTree::possible_expansions).sum(),
        }
    }
    
    /// Whether at least one node of the tree is unexpanded.
    pub fn any_possible_expansions(&self) -> bool {
        match &self.children {
            None => true,
            Some(children) => children.iter().any(DerivationTree::any_possible_expansions),
        }
    }
    
    /// Concatenation of all leaves. Unexpanded nodes contribute their symbol.
    pub fn all_terminals(&self) -> String {
        let mut output = String::new();
        self.collect_terminals(&mut output);
        output
    }
    
    fn collect_terminals(&self, output: &mut String) {
        match &self.children {
            None => output.push_str(&self.symbol),
            Some(children) if children.is_empty() => output.push_str(&self.symbol),
            Some(children) => {
                for child in children {
                    child.collect_terminals(output);
                }
            },
        }
    }
}
