use serde::ser::Serialize;
use serde_json::{
    ser::PrettyFormatter,
    Map,
    Serializer,
    Value,
};
use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use crate::grammar::Grammar;

/// This is the main struct of the [`json`](crate::backends::json) backend that writes the rules of a grammar as JSON.
pub struct JsonGenerator {}

impl JsonGenerator {
    /// Create a new JsonGenerator.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {}
    }
    
    /// Render the rules of `grammar` as a JSON object, entrypoint first.
    pub fn to_value(&self, grammar: &Grammar) -> Value {
        let mut object = Map::new();
        
        if let Some(expansions) = grammar.expansions(grammar.start_symbol()) {
            object.insert(grammar.start_symbol().to_string(), Value::from(expansions.to_vec()));
        }
        
        for (symbol, expansions) in grammar.rules() {
            if !object.contains_key(symbol) {
                object.insert(symbol.clone(), Value::from(expansions.clone()));
            }
        }
        
        Value::Object(object)
    }

    /// Write the production rules of the supplied `grammar` into the output file `path`.
    pub fn generate<P: AsRef<Path>>(self, path: P, grammar: &Grammar) -> io::Result<()> {
        let json = self.to_value(grammar);

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        json.serialize(&mut ser)?;
        buf.push(b'\n');

        let mut file = File::create(path)?;
        file.write_all(&buf)
    }
}
