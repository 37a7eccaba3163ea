use std::path::{Path, PathBuf};
use once_cell::sync::OnceCell;
use rand::{seq::SliceRandom, RngCore};
use serde::Deserialize;

use crate::error::InjectError;

/// A line-delimited list of fuzzing values that is read on first use.
#[derive(Debug, Deserialize)]
#[serde(from = "PathBuf")]
pub struct Wordlist {
    path: PathBuf,
    entries: OnceCell<Vec<String>>,
}

impl From<PathBuf> for Wordlist {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl Wordlist {
    /// A wordlist backed by the file at `path`. Nothing is read yet.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            entries: OnceCell::new(),
        }
    }
    
    /// Where the entries come from.
    pub fn path(&self) -> &Path {
        &self.path
    }
    
    /// All non-empty lines of the file. The file is read only once.
    pub fn entries(&self) -> Result<&[String], InjectError> {
        let entries = self.entries.get_or_try_init(|| {
            let content = std::fs::read_to_string(&self.path).map_err(|source| InjectError::Wordlist {
                path: self.path.clone(),
                source,
            })?;
            let entries: Vec<String> = content
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            
            if entries.is_empty() {
                return Err(InjectError::EmptyWordlist(self.path.clone()));
            }
            
            log::debug!("Loaded {} entries from {}", entries.len(), self.path.display());
            Ok(entries)
        })?;
        
        Ok(entries.as_slice())
    }
    
    /// A random entry.
    pub fn choose(&self, rng: &mut dyn RngCore) -> Result<&str, InjectError> {
        let entries = self.entries()?;
        
        match entries.choose(rng) {
            Some(entry) => Ok(entry),
            None => Err(InjectError::EmptyWordlist(self.path.clone())),
        }
    }
}

/// The wordlists of the injector, one per value kind.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Wordlists {
    /// Values for 32-bit integers
    pub int32: Option<Wordlist>,
    /// Values for 64-bit integers
    pub int64: Option<Wordlist>,
    /// Values for strings and bytes
    pub string: Option<Wordlist>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    
    #[test]
    fn test_load_once() {
        let wordlist = Wordlist::new("test-data/fuzzlist/int32.txt");
        let first = wordlist.entries().unwrap().as_ptr();
        let second = wordlist.entries().unwrap().as_ptr();
        
        assert_eq!(first, second);
        assert!(wordlist.entries().unwrap().contains(&"-2147483648".to_string()));
        
        let mut rng = StdRng::seed_from_u64(3);
        let entry = wordlist.choose(&mut rng).unwrap();
        assert!(wordlist.entries().unwrap().iter().any(|e| e == entry));
    }
    
    #[test]
    fn test_missing_file() {
        let wordlist = Wordlist::new("test-data/fuzzlist/does-not-exist.txt");
        assert!(matches!(wordlist.entries(), Err(InjectError::Wordlist { .. })));
    }
    
    #[test]
    fn test_deserialize() {
        let wordlists: Wordlists = serde_json::from_str(r#"{"int32": "test-data/fuzzlist/int32.txt"}"#).unwrap();
        assert_eq!(wordlists.int32.unwrap().path(), Path::new("test-data/fuzzlist/int32.txt"));
        assert!(wordlists.string.is_none());
    }
}
