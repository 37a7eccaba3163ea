use std::path::Path;
use std::fs::File;
use std::io::BufReader;
use json_comments::{CommentSettings, StripComments};
use serde_json as json;

use crate::{
    grammar::{is_nonterminal, Rules},
    error::ParsingError,
};

fn parse_grammar(value: json::Value) -> Result<Rules, String> {
    let mut rules = Rules::new();
    
    let object = match value {
        json::Value::Object(object) => object,
        _ => return Err("Grammar must be specified as an object".to_string()),
    };
    
    for (key, value) in object {
        // LHS must be a non-terminal
        if !is_nonterminal(&key) {
            return Err(format!("'{}' is not a valid non-terminal", key));
        }
        
        // RHS must be an array of expansion strings
        let rhs = match value {
            json::Value::Array(rhs) => rhs,
            _ => return Err(format!("Right-hand-side of '{}' must be an array", key)),
        };
        
        if rhs.is_empty() {
            return Err(format!("Invalid production rule '{}': Must not be empty", key));
        }
        
        let mut expansions = Vec::with_capacity(rhs.len());
        
        for expansion in rhs {
            match expansion {
                json::Value::String(expansion) => expansions.push(expansion),
                _ => return Err(format!("Right-hand-side of '{}' must be an array of strings", key)),
            }
        }
        
        rules.insert(key, expansions);
    }
    
    Ok(rules)
}

/// Load a grammar in extended BNF from a JSON file that may contain C-style comments.
pub(crate) fn parse_json(path: &Path) -> Result<Rules, ParsingError> {
    let file = File::open(path).map_err(|e| ParsingError::new(path, format!("Could not open file: {}", e)))?;
    let reader = BufReader::new(file);
    let reader = StripComments::with_settings(CommentSettings::c_style(), reader);

    let value: json::Value = match json::from_reader(reader) {
        Ok(value) => value,
        Err(e) => {
            return Err(ParsingError::new(
                path,
                format!("Invalid JSON syntax: {}", e)
            ));
        },
    };
    
    parse_grammar(value).map_err(|e| ParsingError::new(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    
    #[test]
    fn test_parse_file() {
        let rules = parse_json(Path::new("test-data/grammars/digits.json")).unwrap();
        assert_eq!(rules.keys().next().map(String::as_str), Some("<start>"));
        assert_eq!(rules["<nonzero>"].len(), 9);
        assert_eq!(rules["<number>"], vec!["0", "<nonzero>(<digit>)*"]);
    }
    
    #[test]
    fn test_invalid_grammars() {
        assert!(parse_grammar(json!([])).is_err());
        assert!(parse_grammar(json!({"start": ["a"]})).is_err());
        assert!(parse_grammar(json!({"<start>": []})).is_err());
        assert!(parse_grammar(json!({"<start>": [["a"]]})).is_err());
        assert!(parse_json(Path::new("test-data/grammars/does-not-exist.json")).is_err());
    }
}
