use ahash::AHashSet;

use crate::{
    backends::wire::{
        lexer::{tokenize, Spanned, Token},
        DynamicMessage, Value,
    },
    error::TextFormatError,
    schema::{Cardinality, Field, FieldKind, SchemaIntrospector},
};

struct TextParser<'a, S: SchemaIntrospector + ?Sized> {
    schema: &'a S,
    tokens: Vec<Spanned>,
    cursor: usize,
    end: (usize, usize),
}

impl<'a, S: SchemaIntrospector + ?Sized> TextParser<'a, S> {
    fn error_at<M: Into<String>>(&self, index: usize, msg: M) -> TextFormatError {
        let (line, column) = match self.tokens.get(index) {
            Some(spanned) => (spanned.line, spanned.column),
            None => self.end,
        };

        TextFormatError {
            line,
            column,
            msg: msg.into(),
        }
    }

    fn error<M: Into<String>>(&self, msg: M) -> TextFormatError {
        self.error_at(self.cursor, msg)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|spanned| &spanned.token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|spanned| spanned.token.clone());

        if token.is_some() {
            self.cursor += 1;
        }

        token
    }

    fn try_consume(&mut self, symbol: u8) -> bool {
        if self.peek() == Some(&Token::Symbol(symbol)) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: u8) -> Result<(), TextFormatError> {
        if self.try_consume(symbol) {
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", symbol as char)))
        }
    }

    fn parse_message(&mut self, message: &str, terminator: Option<u8>) -> Result<DynamicMessage, TextFormatError> {
        let fields = self.schema.fields(message).map_err(|e| self.error(e.to_string()))?;
        let mut result = DynamicMessage::new(message);
        let mut seen = AHashSet::new();

        loop {
            let start = self.cursor;

            let name = match self.next() {
                None => match terminator {
                    Some(terminator) => return Err(self.error(format!("Expected '{}'", terminator as char))),
                    None => break,
                },
                Some(Token::Symbol(c)) if Some(c) == terminator => break,
                Some(Token::Ident(name)) => name,
                Some(_) => return Err(self.error_at(start, "Expected field name")),
            };

            let field = match fields.iter().find(|field| field.name == name) {
                Some(field) => field,
                None => return Err(self.error_at(start, format!("Message type \"{}\" has no field named \"{}\"", message, name))),
            };

            if field.cardinality != Cardinality::Repeated && !seen.insert(field.number) {
                return Err(self.error_at(start, format!("Non-repeated field \"{}\" is specified multiple times", name)));
            }

            self.parse_field(field, &mut result)?;

            if !self.try_consume(b';') {
                self.try_consume(b',');
            }
        }

        Ok(result)
    }

    fn parse_field(&mut self, field: &Field, result: &mut DynamicMessage) -> Result<(), TextFormatError> {
        let is_message = matches!(field.kind, FieldKind::Message(_));

        // The colon is optional in front of message values
        if !self.try_consume(b':') && !is_message {
            return Err(self.error(format!("Expected ':' after field \"{}\"", field.name)));
        }

        if field.cardinality == Cardinality::Repeated && self.try_consume(b'[') {
            if self.try_consume(b']') {
                return Ok(());
            }

            loop {
                let value = self.parse_value(field)?;
                result.push(field.number, value);

                if self.try_consume(b']') {
                    return Ok(());
                }

                self.expect(b',')?;
            }
        }

        let value = self.parse_value(field)?;
        result.push(field.number, value);
        Ok(())
    }

    fn parse_value(&mut self, field: &Field) -> Result<Value, TextFormatError> {
        match &field.kind {
            FieldKind::Message(nested) => {
                let terminator = if self.try_consume(b'{') {
                    b'}'
                } else if self.try_consume(b'<') {
                    b'>'
                } else {
                    return Err(self.error(format!("Expected '{{' after field \"{}\"", field.name)));
                };

                Ok(Value::Message(self.parse_message(nested, Some(terminator))?))
            },
            FieldKind::Int32 => {
                let value = self.parse_integer(i32::MIN as i64, i32::MAX as i64)?;
                Ok(Value::Int32(value as i32))
            },
            FieldKind::Int64 => Ok(Value::Int64(self.parse_integer(i64::MIN, i64::MAX)?)),
            FieldKind::Bool => self.parse_bool(),
            FieldKind::String => {
                let start = self.cursor;
                let bytes = self.parse_bytes()?;

                match String::from_utf8(bytes) {
                    Ok(string) => Ok(Value::String(string)),
                    Err(_) => Err(self.error_at(start, format!("String field \"{}\" contains invalid UTF-8", field.name))),
                }
            },
            FieldKind::Bytes => Ok(Value::Bytes(self.parse_bytes()?)),
            FieldKind::Enum(values) => {
                let start = self.cursor;

                let found = match self.peek() {
                    Some(Token::Ident(name)) => {
                        let name = name.clone();
                        self.cursor += 1;
                        values.iter().find(|value| value.name == name)
                    },
                    Some(Token::Number(_)) | Some(Token::Symbol(b'-')) => {
                        let number = self.parse_integer(i32::MIN as i64, i32::MAX as i64)?;
                        values.iter().find(|value| value.number as i64 == number)
                    },
                    _ => return Err(self.error(format!("Expected enum value for field \"{}\"", field.name))),
                };

                match found {
                    Some(value) => Ok(Value::Enum(value.number)),
                    None => Err(self.error_at(start, format!("Unknown enumeration value for field \"{}\"", field.name))),
                }
            },
            FieldKind::Unsupported(kind) => Err(self.error(format!("Field \"{}\" has unsupported type {}", field.name, kind))),
        }
    }

    fn parse_integer(&mut self, min: i64, max: i64) -> Result<i64, TextFormatError> {
        let start = self.cursor;
        let negative = self.try_consume(b'-');

        let literal = match self.next() {
            Some(Token::Number(literal)) => literal,
            _ => return Err(self.error_at(start, "Expected integer")),
        };

        let magnitude = if let Some(hex) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if literal.len() > 1 && literal.starts_with('0') {
            u64::from_str_radix(&literal[1..], 8)
        } else {
            literal.parse::<u64>()
        };

        let magnitude = match magnitude {
            Ok(magnitude) => magnitude as i128,
            Err(_) => return Err(self.error_at(start, format!("Invalid integer \"{}\"", literal))),
        };
        let value = if negative { -magnitude } else { magnitude };

        if value < min as i128 || value > max as i128 {
            return Err(self.error_at(start, format!("Integer out of range: {}", value)));
        }

        Ok(value as i64)
    }

    fn parse_bool(&mut self) -> Result<Value, TextFormatError> {
        let start = self.cursor;

        let value = match self.next() {
            Some(Token::Ident(ident)) => match ident.as_str() {
                "true" | "True" | "t" => Some(true),
                "false" | "False" | "f" => Some(false),
                _ => None,
            },
            Some(Token::Number(number)) => match number.as_str() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            _ => None,
        };

        match value {
            Some(value) => Ok(Value::Bool(value)),
            None => Err(self.error_at(start, "Expected boolean")),
        }
    }

    /// One or more adjacent string literals.
    fn parse_bytes(&mut self) -> Result<Vec<u8>, TextFormatError> {
        let start = self.cursor;

        let mut content = match self.next() {
            Some(Token::Str(content)) => content,
            _ => return Err(self.error_at(start, "Expected string")),
        };

        while let Some(Token::Str(more)) = self.peek() {
            content.extend_from_slice(more);
            self.cursor += 1;
        }

        Ok(content)
    }
}

/// Parse `text` as a message of type `message`.
///
/// Required fields are not enforced since the generated text may be incomplete on purpose.
pub fn parse_text_format<S: SchemaIntrospector + ?Sized>(
    schema: &S,
    message: &str,
    text: &str,
) -> Result<DynamicMessage, TextFormatError> {
    let (tokens, end) = tokenize(text)?;
    let mut parser = TextParser {
        schema,
        tokens,
        cursor: 0,
        end,
    };

    parser.parse_message(message, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{demo_set, DescriptorPool};

    fn pool() -> DescriptorPool {
        DescriptorPool::new(demo_set())
    }

    #[test]
    fn test_scalars() {
        let message = parse_text_format(&pool(), "demo.Request", "id: -5\nname: \"a\" 'b'\ntags: B\ntags: 0").unwrap();

        assert_eq!(message.fields(), &[
            (1, Value::Int32(-5)),
            (2, Value::String("ab".to_string())),
            (3, Value::Enum(1)),
            (3, Value::Enum(0)),
        ]);
    }

    #[test]
    fn test_nested() {
        let text = "inner {\n  flag: true\n  blob: \"\\000\\377\"\n  big: 0x10\n}\nid: 017;";
        let message = parse_text_format(&pool(), "demo.Request", text).unwrap();

        let mut inner = DynamicMessage::new("demo.Request.Inner");
        inner.push(1, Value::Bool(true));
        inner.push(2, Value::Bytes(vec![0, 255]));
        inner.push(3, Value::Int64(16));

        assert_eq!(message.fields(), &[(4, Value::Message(inner)), (1, Value::Int32(15))]);
        assert!(parse_text_format(&pool(), "demo.Request", "inner: < >").is_ok());
        assert!(parse_text_format(&pool(), "demo.Request", "inner { }").is_ok());
    }

    #[test]
    fn test_list_syntax() {
        let message = parse_text_format(&pool(), "demo.Request", "tags: [A, B, A]").unwrap();
        assert_eq!(message.get(3).count(), 3);
    }

    #[test]
    fn test_errors() {
        let pool = pool();

        let err = parse_text_format(&pool, "demo.Request", "id: 1\nmissing: 2").unwrap_err();
        assert_eq!((err.line, err.column), (2, 1));

        assert!(parse_text_format(&pool, "demo.Request", "id: 1 id: 2").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "id: 2147483648").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "id: -2147483648").is_ok());
        assert!(parse_text_format(&pool, "demo.Request", "id: :::INT32:::").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "tags: C").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "tags: 7").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "name: \"\\377\"").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "inner {").is_err());
        assert!(parse_text_format(&pool, "demo.Request", "id 5").is_err());
    }

    #[test]
    fn test_missing_required_is_accepted() {
        assert_eq!(parse_text_format(&pool(), "demo.Request", "").unwrap().fields(), &[]);
    }
}
