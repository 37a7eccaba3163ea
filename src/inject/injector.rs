use rand::{distributions::Alphanumeric, Rng, RngCore};
use serde::Deserialize;

use crate::{
    backends::wire::escape_bytes,
    error::InjectError,
    inject::{Placeholder, Template, Wordlists},
};

/// Maximum length of a random string value
pub const MAX_RANDOM_STRING: usize = 20;

/// Where string and bytes values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringSource {
    /// Random alphanumeric tokens
    #[default]
    Random,
    /// Entries of the string wordlist
    Wordlist,
}

/// Replace each occurrence of `token` with a fresh value from `value`.
/// Scanning resumes after the inserted value so that values containing `token` are left alone.
fn replace_each<F>(text: &str, token: &str, mut value: F) -> Result<String, InjectError>
where
    F: FnMut() -> Result<String, InjectError>,
{
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    
    while let Some(position) = rest.find(token) {
        output.push_str(&rest[..position]);
        output.push_str(&value()?);
        rest = &rest[position + token.len()..];
    }
    
    output.push_str(rest);
    Ok(output)
}

fn random_string(rng: &mut dyn RngCore) -> String {
    let len = rng.gen_range(0..=MAX_RANDOM_STRING);
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Fills placeholders with values.
#[derive(Debug, Default)]
pub struct Injector {
    wordlists: Wordlists,
    string_source: StringSource,
}

impl Injector {
    /// Create an injector that draws random strings.
    pub fn new(wordlists: Wordlists) -> Self {
        Self {
            wordlists,
            string_source: StringSource::default(),
        }
    }
    
    /// Choose where string and bytes values come from.
    pub fn string_source(mut self, string_source: StringSource) -> Self {
        self.string_source = string_source;
        self
    }
    
    /// Replace every 32-bit integer placeholder.
    pub fn inject_int32(&self, text: &str, rng: &mut dyn RngCore) -> Result<String, InjectError> {
        replace_each(text, Placeholder::Int32.token(), || match &self.wordlists.int32 {
            Some(wordlist) => Ok(wordlist.choose(rng)?.to_string()),
            None => Ok(rng.gen::<i32>().to_string()),
        })
    }
    
    /// Replace every 64-bit integer placeholder.
    pub fn inject_int64(&self, text: &str, rng: &mut dyn RngCore) -> Result<String, InjectError> {
        replace_each(text, Placeholder::Int64.token(), || match &self.wordlists.int64 {
            Some(wordlist) => Ok(wordlist.choose(rng)?.to_string()),
            None => Ok(rng.gen::<i64>().to_string()),
        })
    }
    
    /// Replace every boolean placeholder with `0` or `1`.
    pub fn inject_bool(&self, text: &str, rng: &mut dyn RngCore) -> Result<String, InjectError> {
        replace_each(text, Placeholder::Bool.token(), || Ok(rng.gen_range(0..=1u8).to_string()))
    }
    
    fn string_value(&self, rng: &mut dyn RngCore) -> Result<String, InjectError> {
        let value = match (&self.wordlists.string, self.string_source) {
            (Some(wordlist), StringSource::Wordlist) => escape_bytes(wordlist.choose(rng)?.as_bytes()),
            _ => random_string(rng),
        };
        
        Ok(format!("\"{}\"", value))
    }
    
    /// Replace every string placeholder with a quoted literal.
    pub fn inject_string(&self, text: &str, rng: &mut dyn RngCore) -> Result<String, InjectError> {
        replace_each(text, Placeholder::String.token(), || self.string_value(rng))
    }
    
    /// Replace every bytes placeholder with a quoted literal.
    pub fn inject_bytes(&self, text: &str, rng: &mut dyn RngCore) -> Result<String, InjectError> {
        replace_each(text, Placeholder::Bytes.token(), || self.string_value(rng))
    }
    
    /// Run all substitutions on `template` in order: int32, int64, bool, string, bytes.
    pub fn fill_all(&self, template: &mut Template, rng: &mut dyn RngCore) -> Result<(), InjectError> {
        template.fill(|text| self.inject_int32(text, rng))?;
        template.fill(|text| self.inject_int64(text, rng))?;
        template.fill(|text| self.inject_bool(text, rng))?;
        template.fill(|text| self.inject_string(text, rng))?;
        template.fill(|text| self.inject_bytes(text, rng))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;
    use rand::{rngs::StdRng, SeedableRng};
    use crate::inject::Wordlist;
    
    fn text() -> String {
        let mut text = String::new();
        
        for placeholder in Placeholder::ALL {
            for i in 0..8 {
                text.push_str(&format!("f{}: {}\n", i, placeholder.token()));
            }
        }
        
        text
    }
    
    fn values(template: &Template) -> Vec<&str> {
        template.text().lines().filter_map(|line| line.split_once(": ").map(|(_, value)| value)).collect()
    }
    
    #[test]
    fn test_exhaustive() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut template = Template::new(text());
        
        Injector::default().fill_all(&mut template, &mut rng).unwrap();
        
        for placeholder in Placeholder::ALL {
            assert!(!template.text().contains(placeholder.token()));
        }
        
        let values = values(&template);
        assert_eq!(values.len(), 40);
        
        for value in &values[..16] {
            assert!(value.parse::<i64>().is_ok(), "{}", value);
        }
        
        for value in &values[16..24] {
            assert!(*value == "0" || *value == "1");
        }
        
        for value in &values[24..] {
            assert!(value.starts_with('"') && value.ends_with('"') && value.len() >= 2);
            assert!(value[1..value.len() - 1].chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(value.len() - 2 <= MAX_RANDOM_STRING);
        }
    }
    
    #[test]
    fn test_independent_values() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut template = Template::new(text());
        
        Injector::default().fill_all(&mut template, &mut rng).unwrap();
        let values = values(&template);
        
        let ints: AHashSet<&str> = values[..8].iter().copied().collect();
        let strings: AHashSet<&str> = values[24..32].iter().copied().collect();
        assert!(ints.len() > 1);
        assert!(strings.len() > 1);
    }
    
    #[test]
    fn test_wordlists() {
        let wordlists = Wordlists {
            int32: Some(Wordlist::new("test-data/fuzzlist/int32.txt")),
            int64: Some(Wordlist::new("test-data/fuzzlist/int64.txt")),
            string: Some(Wordlist::new("test-data/fuzzlist/string.txt")),
        };
        let injector = Injector::new(wordlists).string_source(StringSource::Wordlist);
        let mut rng = StdRng::seed_from_u64(13);
        
        let int32 = injector.inject_int32("x: :::INT32:::", &mut rng).unwrap();
        let value = int32.strip_prefix("x: ").unwrap();
        assert!(injector.wordlists.int32.as_ref().unwrap().entries().unwrap().iter().any(|e| e == value));
        
        let string = injector.inject_string(":::STRING::: :::BYTES:::", &mut rng).unwrap();
        assert!(string.starts_with('"'));
        assert!(string.ends_with(":::BYTES:::"));
    }
    
    #[test]
    fn test_value_containing_token() {
        let text = replace_each("a b a", "a", || Ok("aa".to_string())).unwrap();
        assert_eq!(text, "aa b aa");
    }
}
