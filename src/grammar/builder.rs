use std::path::Path;
use ahash::AHashSet;

use crate::{
    error::{GrammarError, ParsingError, SchemaError},
    grammar::{ebnf::schema_to_ebnf, normalize::convert_ebnf_grammar, validate::validate, Grammar, Rules},
    parser,
    schema::{short_name, SchemaIntrospector},
};

/// The default non-terminal that is used as an entrypoint to the grammar
pub const DEFAULT_ENTRYPOINT: &str = "<start>";

/// The GrammarBuilder collects extended BNF rules from schemas and grammar files
/// and returns a validated [`Grammar`] in plain BNF.
///
/// Use it like so:
/// ```
/// // Derive the grammar of a message from a schema
/// let grammar = Grammar::builder()
///     .schema(&pool, "Request").unwrap()
///     .build().unwrap();
///
/// // Or load hand-written grammars by joining their rules
/// let grammar = Grammar::builder()
///     .ebnf_grammar("my-grammar.json").unwrap()
///     .ebnf_grammar("common-definitions.json").unwrap()
///     .entrypoint("<start>")
///     .build().unwrap();
/// ```
pub struct GrammarBuilder {
    rules: Rules,
    entrypoint: String,
}

impl GrammarBuilder {
    pub(crate) fn new() -> Self {
        Self {
            rules: Rules::new(),
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
        }
    }

    /// Join `new_rules` into the collected rules.
    /// Returns the first symbol that is already defined with different expansions.
    fn merge(&mut self, new_rules: Rules) -> Option<String> {
        for (symbol, expansions) in new_rules {
            match self.rules.get(&symbol) {
                Some(existing) if *existing != expansions => return Some(symbol),
                Some(_) => {},
                None => {
                    self.rules.insert(symbol, expansions);
                },
            }
        }

        None
    }
}

impl GrammarBuilder {
    /// Derive the grammar of `message` from `schema`. This also makes `<Message>` the entrypoint.
    pub fn schema<S: SchemaIntrospector + ?Sized>(mut self, schema: &S, message: &str) -> Result<Self, SchemaError> {
        let new_rules = schema_to_ebnf(schema, message)?;

        if let Some(symbol) = self.merge(new_rules) {
            return Err(SchemaError::ConflictingField(symbol));
        }

        self.entrypoint = format!("<{}>", short_name(message));
        Ok(self)
    }

    /// Load a grammar in extended BNF from a JSON file. The file maps non-terminals to
    /// a list of alternative expansions and may contain C-style comments.
    pub fn ebnf_grammar<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ParsingError> {
        let path = path.as_ref();
        let new_rules = parser::parse_json(path)?;

        if let Some(symbol) = self.merge(new_rules) {
            return Err(ParsingError::new(path, format!("'{}' is already defined with different expansions", symbol)));
        }

        Ok(self)
    }

    /// Add rules that were created programmatically. Existing symbols are overwritten.
    pub fn rules(mut self, rules: Rules) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Set the entrypoint of all loaded grammars to be the given non-terminal `entrypoint`.
    /// The angle brackets are optional.
    pub fn entrypoint<S: Into<String>>(mut self, entrypoint: S) -> Self {
        let entrypoint = entrypoint.into();

        self.entrypoint = if entrypoint.starts_with('<') && entrypoint.ends_with('>') {
            entrypoint
        } else {
            format!("<{}>", entrypoint)
        };

        self
    }

    /// Lower the collected rules to plain BNF, validate them and create a [`Grammar`].
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut rules = self.rules;

        if !rules.contains_key(&self.entrypoint) {
            return Err(GrammarError::MissingEntrypoint(self.entrypoint));
        }

        let mut helpers = AHashSet::new();
        convert_ebnf_grammar(&mut rules, &mut helpers);
        validate(&rules, &self.entrypoint)?;

        log::debug!("Built grammar with {} rules ({} helpers) for {}", rules.len(), helpers.len(), self.entrypoint);

        Ok(Grammar::new(rules, self.entrypoint, helpers))
    }
}
