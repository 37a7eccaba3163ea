use ahash::AHashMap;

use crate::{
    error::SchemaError,
    grammar::Rules,
    inject::Placeholder,
    schema::{short_name, Cardinality, Field, FieldKind, SchemaIntrospector},
};

/// Walks a message schema and emits one rule per distinct field.
///
/// A field is identified by its name and its kind. Fields that share a name but
/// differ in kind get numbered symbols (`<id>`, `<id-1>`, ...). Protobuf identifiers
/// never contain a `-`, so the suffix can be stripped again when serializing.
struct EbnfCompiler<'s, S: ?Sized> {
    schema: &'s S,
    rules: Rules,
    symbols: AHashMap<String, Vec<(FieldKind, String)>>,
}

impl<'s, S: SchemaIntrospector + ?Sized> EbnfCompiler<'s, S> {
    fn new(schema: &'s S) -> Self {
        Self {
            schema,
            rules: Rules::new(),
            symbols: AHashMap::new(),
        }
    }
    
    /// The symbol of the field `name` with type `kind` and whether it was just allocated.
    fn symbol(&mut self, name: &str, kind: &FieldKind) -> (String, bool) {
        let known = self.symbols.entry(name.to_string()).or_default();
        
        if let Some((_, symbol)) = known.iter().find(|(other, _)| other == kind) {
            return (symbol.clone(), false);
        }
        
        let symbol = match known.len() {
            0 => format!("<{}>", name),
            n => format!("<{}-{}>", name, n),
        };
        
        if known.len() == 1 {
            log::debug!("Field name '{}' is used with different types, numbering its symbols", name);
        }
        
        known.push((kind.clone(), symbol.clone()));
        (symbol, true)
    }
    
    fn traverse_message(&mut self, message: &str, key: String) -> Result<(), SchemaError> {
        let fields = self.schema.fields(message)?;
        let mut expansion = String::new();
        let mut pending = Vec::new();
        
        for field in &fields {
            let (symbol, new) = self.symbol(&field.name, &field.kind);
            
            match field.cardinality {
                Cardinality::Optional => expansion.push_str(&format!("({})?", symbol)),
                Cardinality::Required => expansion.push_str(&symbol),
                Cardinality::Repeated => expansion.push_str(&format!("({})+", symbol)),
            }
            
            // Known (name, type) pairs are already defined, this ends recursive types
            if new {
                pending.push((field, symbol));
            }
        }
        
        self.rules.insert(key, vec![expansion]);
        
        for (field, symbol) in pending {
            self.traverse_field(message, field, symbol)?;
        }
        
        Ok(())
    }
    
    fn traverse_field(&mut self, message: &str, field: &Field, symbol: String) -> Result<(), SchemaError> {
        let placeholder = match &field.kind {
            FieldKind::Message(nested) => return self.traverse_message(nested, symbol),
            FieldKind::Enum(values) => {
                self.rules.insert(symbol, values.iter().map(|value| value.name.clone()).collect());
                return Ok(());
            },
            FieldKind::Int32 => Placeholder::Int32,
            FieldKind::Int64 => Placeholder::Int64,
            FieldKind::Bool => Placeholder::Bool,
            FieldKind::String => Placeholder::String,
            FieldKind::Bytes => Placeholder::Bytes,
            FieldKind::Unsupported(kind) => {
                return Err(SchemaError::UnsupportedField {
                    message: message.to_string(),
                    field: field.name.clone(),
                    kind: kind.clone(),
                });
            },
        };
        
        self.rules.insert(symbol, vec![placeholder.token().to_string()]);
        Ok(())
    }
}

/// Create an extended BNF grammar for `message`.
///
/// The start symbol is the short name of the message, e.g. `<Request>` for `pkg.Request`.
/// Nested messages are keyed by the name of the field that holds them.
pub fn schema_to_ebnf<S: SchemaIntrospector + ?Sized>(schema: &S, message: &str) -> Result<Rules, SchemaError> {
    let mut compiler = EbnfCompiler::new(schema);
    let (start, _) = compiler.symbol(short_name(message), &FieldKind::Message(message.to_string()));
    compiler.traverse_message(message, start)?;
    Ok(compiler.rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use crate::schema::{EnumValue, Field};

    pub(crate) fn demo_schema() -> IndexMap<String, Vec<Field>> {
        let mut schema = IndexMap::new();
        schema.insert("Request".to_string(), vec![
            Field::new("id", 1, Cardinality::Required, FieldKind::Int32),
            Field::new("name", 2, Cardinality::Optional, FieldKind::String),
            Field::new(
                "tags",
                3,
                Cardinality::Repeated,
                FieldKind::Enum(vec![EnumValue::new("A", 0), EnumValue::new("B", 1)]),
            ),
        ]);
        schema
    }

    #[test]
    fn test_scalar_fields() {
        let rules = schema_to_ebnf(&demo_schema(), "Request").unwrap();

        assert_eq!(rules["<Request>"], vec!["<id>(<name>)?(<tags>)+"]);
        assert_eq!(rules["<id>"], vec![":::INT32:::"]);
        assert_eq!(rules["<name>"], vec![":::STRING:::"]);
        assert_eq!(rules["<tags>"], vec!["A", "B"]);
    }

    #[test]
    fn test_nested_message() {
        let mut schema = demo_schema();
        schema.insert("pkg.Inner".to_string(), vec![
            Field::new("flag", 1, Cardinality::Optional, FieldKind::Bool),
            Field::new("big", 2, Cardinality::Required, FieldKind::Int64),
        ]);
        schema["Request"].push(Field::new("inner", 4, Cardinality::Optional, FieldKind::Message("pkg.Inner".to_string())));

        let rules = schema_to_ebnf(&schema, "Request").unwrap();
        assert_eq!(rules["<Request>"], vec!["<id>(<name>)?(<tags>)+(<inner>)?"]);
        assert_eq!(rules["<inner>"], vec!["(<flag>)?<big>"]);
        assert_eq!(rules["<flag>"], vec![":::BOOL:::"]);
        assert_eq!(rules["<big>"], vec![":::INT64:::"]);
    }

    #[test]
    fn test_recursive_message() {
        let mut schema = IndexMap::new();
        schema.insert("Node".to_string(), vec![
            Field::new("value", 1, Cardinality::Required, FieldKind::Bytes),
            Field::new("child", 2, Cardinality::Optional, FieldKind::Message("Child".to_string())),
        ]);
        schema.insert("Child".to_string(), vec![
            Field::new("child", 1, Cardinality::Optional, FieldKind::Message("Child".to_string())),
        ]);

        let rules = schema_to_ebnf(&schema, "Node").unwrap();
        assert_eq!(rules["<child>"], vec!["(<child>)?"]);
        assert_eq!(rules["<value>"], vec![":::BYTES:::"]);
    }

    #[test]
    fn test_unsupported_field() {
        let mut schema = demo_schema();
        schema["Request"].push(Field::new("ratio", 9, Cardinality::Optional, FieldKind::Unsupported("double".to_string())));

        match schema_to_ebnf(&schema, "Request") {
            Err(SchemaError::UnsupportedField { field, kind, .. }) => {
                assert_eq!(field, "ratio");
                assert_eq!(kind, "double");
            },
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_same_name_different_type() {
        let mut schema = IndexMap::new();
        schema.insert("Req".to_string(), vec![
            Field::new("user", 1, Cardinality::Required, FieldKind::Message("User".to_string())),
            Field::new("order", 2, Cardinality::Required, FieldKind::Message("Order".to_string())),
        ]);
        schema.insert("User".to_string(), vec![Field::new("id", 1, Cardinality::Required, FieldKind::Int32)]);
        schema.insert("Order".to_string(), vec![Field::new("id", 1, Cardinality::Required, FieldKind::String)]);
        
        let rules = schema_to_ebnf(&schema, "Req").unwrap();
        assert_eq!(rules["<user>"], vec!["<id>"]);
        assert_eq!(rules["<order>"], vec!["<id-1>"]);
        assert_eq!(rules["<id>"], vec![":::INT32:::"]);
        assert_eq!(rules["<id-1>"], vec![":::STRING:::"]);
    }
    
    #[test]
    fn test_distinct_types_with_equal_layout() {
        let mut schema = IndexMap::new();
        schema.insert("Req".to_string(), vec![
            Field::new("a", 1, Cardinality::Required, FieldKind::Message("A".to_string())),
            Field::new("b", 2, Cardinality::Required, FieldKind::Message("B".to_string())),
        ]);
        schema.insert("A".to_string(), vec![Field::new("x", 1, Cardinality::Required, FieldKind::Message("M1".to_string()))]);
        schema.insert("B".to_string(), vec![Field::new("x", 1, Cardinality::Required, FieldKind::Message("M2".to_string()))]);
        schema.insert("M1".to_string(), vec![Field::new("v", 1, Cardinality::Required, FieldKind::Int32)]);
        schema.insert("M2".to_string(), vec![Field::new("v", 1, Cardinality::Required, FieldKind::String)]);
        
        let rules = schema_to_ebnf(&schema, "Req").unwrap();
        assert_eq!(rules["<a>"], vec!["<x>"]);
        assert_eq!(rules["<b>"], vec!["<x-1>"]);
        assert_eq!(rules["<x>"], vec!["<v>"]);
        assert_eq!(rules["<x-1>"], vec!["<v-1>"]);
        assert_eq!(rules["<v>"], vec![":::INT32:::"]);
        assert_eq!(rules["<v-1>"], vec![":::STRING:::"]);
    }
    
    #[test]
    fn test_shared_field_type_is_defined_once() {
        let mut schema = IndexMap::new();
        schema.insert("Req".to_string(), vec![
            Field::new("a", 1, Cardinality::Optional, FieldKind::Message("A".to_string())),
            Field::new("b", 2, Cardinality::Optional, FieldKind::Message("B".to_string())),
        ]);
        schema.insert("A".to_string(), vec![Field::new("id", 1, Cardinality::Required, FieldKind::Int32)]);
        schema.insert("B".to_string(), vec![Field::new("id", 1, Cardinality::Repeated, FieldKind::Int32)]);
        
        let rules = schema_to_ebnf(&schema, "Req").unwrap();
        assert_eq!(rules["<a>"], vec!["<id>"]);
        assert_eq!(rules["<b>"], vec!["(<id>)+"]);
        assert!(!rules.contains_key("<id-1>"));
    }
}
