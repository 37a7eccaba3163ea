//! The configuration file of the fuzzer.
//!
//! It is a JSON file that may contain C-style comments:
//! ```json
//! {
//!     "proto_out": "compiled",
//!     "services": [
//!         {"url": "http://127.0.0.1:8080/user", "request": "CreateUser", "proto": "protos/user.proto"}
//!     ],
//!     // fields that never appear in generated messages
//!     "delete": ["session"],
//!     "replace": {"version": 3},
//!     "wordlists": {"int32": "fuzzlist/int32.txt", "int64": "fuzzlist/int64.txt", "string": "fuzzlist/string.txt"},
//!     "string_source": "random",
//!     "min_nonterminals": 0,
//!     "max_nonterminals": 10
//! }
//! ```
//! Relative paths are interpreted relative to the working directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use indexmap::IndexMap;
use itertools::Itertools;
use json_comments::{CommentSettings, StripComments};
use serde::Deserialize;
use serde_json as json;

use crate::{
    engine::{DEFAULT_MAX_NONTERMINALS, DEFAULT_MIN_NONTERMINALS},
    error::ParsingError,
    inject::{StringSource, Wordlists},
    schema::descriptor_path,
};

fn default_proto_out() -> PathBuf {
    PathBuf::from("compiled")
}

fn default_min_nonterminals() -> usize {
    DEFAULT_MIN_NONTERMINALS
}

fn default_max_nonterminals() -> usize {
    DEFAULT_MAX_NONTERMINALS
}

/// One endpoint under test.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    /// Where the messages are POSTed to
    pub url: String,
    /// Name of the request message type
    pub request: String,
    /// The `.proto` file that defines the request
    pub proto: PathBuf,
}

/// The deserialized configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory of the compiled descriptor sets
    #[serde(default = "default_proto_out")]
    pub proto_out: PathBuf,
    
    /// The endpoints under test
    pub services: Vec<Service>,
    
    /// Fields that are removed from every message
    #[serde(default)]
    pub delete: Vec<String>,
    
    /// Fields that get a fixed value
    #[serde(default)]
    pub replace: IndexMap<String, json::Value>,
    
    /// Sources of integer and string values
    #[serde(default)]
    pub wordlists: Wordlists,
    
    /// Whether strings are random or come from the string wordlist
    #[serde(default)]
    pub string_source: StringSource,
    
    /// Lower bound of open non-terminals for the growing phase
    #[serde(default = "default_min_nonterminals")]
    pub min_nonterminals: usize,
    
    /// Upper bound of open non-terminals for the random phase
    #[serde(default = "default_max_nonterminals")]
    pub max_nonterminals: usize,
    
    /// If set, every final message is written into this directory
    #[serde(default)]
    pub artifacts: Option<PathBuf>,
}

impl Config {
    /// Load the configuration from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ParsingError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ParsingError::new(path, format!("Could not open file: {}", e)))?;
        let reader = BufReader::new(file);
        let reader = StripComments::with_settings(CommentSettings::c_style(), reader);
        
        let config: Config = json::from_reader(reader).map_err(|e| ParsingError::new(path, format!("Invalid configuration: {}", e)))?;
        
        if config.min_nonterminals > config.max_nonterminals {
            return Err(ParsingError::new(path, "min_nonterminals must not exceed max_nonterminals"));
        }
        
        Ok(config)
    }
    
    /// The distinct `.proto` files of all services, in order of first use.
    pub fn proto_files(&self) -> Vec<&Path> {
        self.services.iter().map(|service| service.proto.as_path()).unique().collect()
    }
    
    /// Where the descriptor set of `service` is stored.
    pub fn descriptor(&self, service: &Service) -> PathBuf {
        descriptor_path(&service.proto, &self.proto_out)
    }
    
    /// The configured replacements as literal text. Strings are used verbatim, other JSON values are rendered.
    pub fn replacements(&self) -> impl Iterator<Item = (&str, String)> {
        self.replace.iter().map(|(field, value)| {
            let value = match value {
                json::Value::String(value) => value.clone(),
                other => other.to_string(),
            };
            (field.as_str(), value)
        })
    }
}
