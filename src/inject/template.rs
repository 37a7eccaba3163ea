use std::fmt::{Display, Formatter, Result as FmtResult};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{backends::wire::escape_bytes, inject::Placeholder};

static RE_SCALAR_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*)$").unwrap());
static RE_BLOCK_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:?\s*[{<]\s*$").unwrap());
static RE_BLOCK_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[}>]\s*$").unwrap());

/// The text-format rendering of one derivation tree that is edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    /// Wrap serialized text.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
        }
    }
    
    /// The current text.
    pub fn text(&self) -> &str {
        &self.text
    }
    
    /// Consume the template and return its text.
    pub fn into_text(self) -> String {
        self.text
    }
    
    fn rewrite_lines<F: FnMut(&str) -> Option<String>>(&mut self, mut func: F) {
        let mut output = String::with_capacity(self.text.len());
        
        for line in self.text.lines() {
            if let Some(line) = func(line) {
                output.push_str(&line);
                output.push('\n');
            }
        }
        
        self.text = output;
    }
    
    /// Remove every `field: value` line and every `field { ... }` block.
    pub fn delete(&mut self, field: &str) {
        if field.is_empty() {
            return;
        }
        
        let mut depth = 0usize;
        
        self.rewrite_lines(|line| {
            if depth > 0 {
                if RE_BLOCK_OPEN.is_match(line) {
                    depth += 1;
                } else if RE_BLOCK_CLOSE.is_match(line) {
                    depth -= 1;
                }
                
                return None;
            }
            
            if let Some(captures) = RE_BLOCK_OPEN.captures(line) {
                if &captures[1] == field {
                    depth = 1;
                    return None;
                }
            } else if let Some(captures) = RE_SCALAR_LINE.captures(line) {
                if &captures[2] == field {
                    return None;
                }
            }
            
            Some(line.to_string())
        });
    }
    
    /// Give every `field` whose value is still a placeholder the value `value`.
    /// String and bytes fields receive `value` as an escaped, quoted literal.
    pub fn set(&mut self, field: &str, value: &str) {
        self.rewrite_lines(|line| {
            let captures = match RE_SCALAR_LINE.captures(line) {
                Some(captures) if &captures[2] == field => captures,
                _ => return Some(line.to_string()),
            };
            
            let placeholder = match Placeholder::from_token(captures[3].trim_end()) {
                Some(placeholder) => placeholder,
                None => return Some(line.to_string()),
            };
            
            let value = if placeholder.is_quoted() {
                format!("\"{}\"", escape_bytes(value.as_bytes()))
            } else {
                value.to_string()
            };
            
            Some(format!("{}{}: {}", &captures[1], field, value))
        });
    }
    
    /// Replace the text with the output of `func`.
    pub fn fill<F, E>(&mut self, func: F) -> Result<(), E>
    where
        F: FnOnce(&str) -> Result<String, E>,
    {
        self.text = func(&self.text)?;
        Ok(())
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    const TEXT: &str = "id: :::INT32:::\nname: :::STRING:::\ninner {\n  id_hash: :::INT64:::\n  deeper {\n    flag: :::BOOL:::\n  }\n}\ntags: A\nid_x: :::INT32:::\n";
    
    #[test]
    fn test_delete_scalar() {
        let mut template = Template::new(TEXT);
        template.delete("id");
        
        assert!(!template.text().lines().any(|line| line.starts_with("id:")));
        assert!(template.text().contains("id_x: :::INT32:::"));
        assert!(template.text().contains("id_hash"));
    }
    
    #[test]
    fn test_delete_block() {
        let mut template = Template::new(TEXT);
        template.delete("inner");
        
        assert_eq!(template.text(), "id: :::INT32:::\nname: :::STRING:::\ntags: A\nid_x: :::INT32:::\n");
        
        template.delete("missing");
        template.delete("");
        assert_eq!(template.text().lines().count(), 4);
    }
    
    #[test]
    fn test_set() {
        let mut template = Template::new(TEXT);
        template.set("id", "42");
        template.set("name", "a \"b\"");
        template.set("flag", "1");
        template.set("tags", "B");
        
        assert!(template.text().starts_with("id: 42\nname: \"a \\\"b\\\"\"\n"));
        assert!(template.text().contains("    flag: 1\n"));
        assert!(template.text().contains("tags: A\n"));
        assert!(template.text().contains("id_x: :::INT32:::"));
    }
    
    #[test]
    fn test_fill() {
        let mut template = Template::new("a: 1\n");
        template.fill(|text| Ok::<_, ()>(text.replace('1', "2"))).unwrap();
        assert_eq!(template.to_string(), "a: 2\n");
        assert!(template.fill(|_| Err("nope")).is_err());
    }
}
