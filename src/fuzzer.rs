//! The fuzzing loop: pick an endpoint, derive a message, inject values, encode and send it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use ahash::{AHashMap, RandomState};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    backends::{text::TextSerializer, wire::parse_text_format},
    config::Config,
    engine::{DerivationEngine, DEFAULT_MAX_NONTERMINALS, DEFAULT_MIN_NONTERMINALS},
    error::{FuzzError, GrammarError},
    grammar::Grammar,
    inject::{Injector, Template},
    schema::{DescriptorPool, SchemaIntrospector},
    transport::{Response, Runner},
};

/// A schema that can be shared between endpoints.
pub type SharedSchema = Arc<dyn SchemaIntrospector + Send + Sync>;

/// An endpoint together with the grammar of its request message.
pub struct Vector {
    url: String,
    request: String,
    schema: SharedSchema,
    grammar: Grammar,
}

impl Vector {
    /// Compile the grammar of `request` and bind it to `url`.
    pub fn new<U: Into<String>, R: Into<String>>(url: U, request: R, schema: SharedSchema) -> Result<Self, GrammarError> {
        let request = request.into();
        let grammar = Grammar::builder().schema(schema.as_ref(), &request)?.build()?;

        Ok(Self {
            url: url.into(),
            request,
            schema,
            grammar,
        })
    }

    /// The target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Name of the request message.
    pub fn request(&self) -> &str {
        &self.request
    }

    /// The compiled grammar of the request message.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }
}

/// The outcome of one fuzzing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzInput {
    /// Where the payload goes
    pub url: String,
    /// The encoded message, empty if the text did not parse
    pub payload: Vec<u8>,
    /// The final text-format message
    pub text: String,
}

/// Generates and sends messages for a set of endpoints.
pub struct ProtoFuzzer {
    vectors: Vec<Vector>,
    injector: Injector,
    delete: Vec<String>,
    replace: Vec<(String, String)>,
    min_nonterminals: usize,
    max_nonterminals: usize,
    artifacts: Option<PathBuf>,
    rng: StdRng,
}

impl ProtoFuzzer {
    /// Create a fuzzer for `vectors` that is seeded from entropy.
    pub fn new(vectors: Vec<Vector>, injector: Injector) -> Result<Self, FuzzError> {
        if vectors.is_empty() {
            return Err(FuzzError::NoVectors);
        }

        Ok(Self {
            vectors,
            injector,
            delete: Vec::new(),
            replace: Vec::new(),
            min_nonterminals: DEFAULT_MIN_NONTERMINALS,
            max_nonterminals: DEFAULT_MAX_NONTERMINALS,
            artifacts: None,
            rng: StdRng::from_entropy(),
        })
    }

    /// Load the descriptor sets of all services and compile one grammar per service.
    pub fn from_config(config: Config) -> Result<Self, FuzzError> {
        let mut pools: AHashMap<PathBuf, SharedSchema> = AHashMap::new();
        let mut vectors = Vec::with_capacity(config.services.len());

        log::info!("Creating grammars, please wait..");

        for service in &config.services {
            let descriptor = config.descriptor(service);

            let schema = match pools.get(&descriptor) {
                Some(schema) => schema.clone(),
                None => {
                    let schema: SharedSchema = Arc::new(DescriptorPool::load(&descriptor)?);
                    pools.insert(descriptor, schema.clone());
                    schema
                },
            };

            let vector = Vector::new(service.url.clone(), service.request.clone(), schema)?;
            log::debug!("Grammar of {}:\n{}", vector.request, vector.grammar);
            vectors.push(vector);
        }

        let replace = config.replacements().map(|(field, value)| (field.to_string(), value)).collect();

        let mut fuzzer = Self::new(vectors, Injector::new(config.wordlists).string_source(config.string_source))?
            .delete(config.delete)
            .replace(replace)
            .nonterminals(config.min_nonterminals, config.max_nonterminals);

        if let Some(artifacts) = config.artifacts {
            fuzzer = fuzzer.artifacts(artifacts)?;
        }

        Ok(fuzzer)
    }

    /// Make all random decisions reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Fields that are removed from every message.
    pub fn delete(mut self, delete: Vec<String>) -> Self {
        self.delete = delete;
        self
    }

    /// Fields that get a fixed value.
    pub fn replace(mut self, replace: Vec<(String, String)>) -> Self {
        self.replace = replace;
        self
    }

    /// Phase limits of the derivation engine.
    pub fn nonterminals(mut self, min: usize, max: usize) -> Self {
        self.min_nonterminals = min;
        self.max_nonterminals = max;
        self
    }

    /// Write every final message into `dir`.
    pub fn artifacts<P: Into<PathBuf>>(mut self, dir: P) -> Result<Self, FuzzError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| FuzzError::Io {
            path: dir.clone(),
            source,
        })?;
        self.artifacts = Some(dir);
        Ok(self)
    }

    /// All endpoints.
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// Generate one message for a random endpoint.
    ///
    /// If the final text does not parse against the request type the payload is empty.
    pub fn fuzz(&mut self) -> Result<FuzzInput, FuzzError> {
        let vector = &self.vectors[self.rng.gen_range(0..self.vectors.len())];
        log::info!("{} => {}", vector.request, vector.url);

        let engine = DerivationEngine::new(&vector.grammar)
            .min_nonterminals(self.min_nonterminals)
            .max_nonterminals(self.max_nonterminals);
        let tree = engine.fuzz_tree(&mut self.rng)?;

        let mut template = Template::new(TextSerializer::new(&vector.grammar).serialize(&tree));
        log::info!("Template:\n{}", template);

        for field in &self.delete {
            template.delete(field);
        }

        for (field, value) in &self.replace {
            template.set(field, value);
        }

        self.injector.fill_all(&mut template, &mut self.rng)?;
        log::info!("Sending:\n{}", template);

        if let Some(dir) = &self.artifacts {
            save_artifact(dir, template.text())?;
        }

        let payload = match parse_text_format(vector.schema.as_ref(), &vector.request, template.text()) {
            Ok(message) => message.encode_to_vec(),
            Err(e) => {
                log::warn!("Unable to deserialize the message: {}", e);
                Vec::new()
            },
        };

        Ok(FuzzInput {
            url: vector.url.clone(),
            payload,
            text: template.into_text(),
        })
    }

    /// Generate one message and hand it to `runner`. Transmission errors are logged and yield `None`.
    pub fn run(&mut self, runner: &dyn Runner) -> Result<Option<Response>, FuzzError> {
        let input = self.fuzz()?;

        match runner.run(&input.url, &input.payload) {
            Ok(response) => Ok(response),
            Err(e) => {
                log::warn!("{}", e);
                Ok(None)
            },
        }
    }
}

/// Name of the artifact file for `text`.
pub fn artifact_name(text: &str) -> String {
    let hash = RandomState::with_seeds(0, 0, 0, 0).hash_one(text);
    format!("ppfuzz-{:016x}.txt", hash)
}

fn save_artifact(dir: &Path, text: &str) -> Result<(), FuzzError> {
    let path = dir.join(artifact_name(text));

    std::fs::write(&path, text).map_err(|source| FuzzError::Io {
        path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{demo_set, Cardinality, Field, FieldKind};
    use indexmap::IndexMap;

    fn ping() -> SharedSchema {
        let mut schema = IndexMap::new();
        schema.insert("Ping".to_string(), vec![
            Field::new("seq", 1, Cardinality::Required, FieldKind::Int64),
            Field::new("flag", 2, Cardinality::Optional, FieldKind::Bool),
        ]);
        Arc::new(schema)
    }

    #[test]
    fn test_no_vectors() {
        assert!(matches!(ProtoFuzzer::new(Vec::new(), Injector::default()), Err(FuzzError::NoVectors)));
    }

    #[test]
    fn test_invalid_request() {
        let pool: SharedSchema = Arc::new(DescriptorPool::new(demo_set()));
        assert!(Vector::new("u", "demo.Missing", pool).is_err());
    }

    #[test]
    fn test_fuzz() {
        let vector = Vector::new("http://localhost/ping", "Ping", ping()).unwrap();
        assert_eq!(vector.grammar().start_symbol(), "<Ping>");

        let mut fuzzer = ProtoFuzzer::new(vec![vector], Injector::default()).unwrap().seed(3);

        for _ in 0..10 {
            let input = fuzzer.fuzz().unwrap();
            assert_eq!(input.url, "http://localhost/ping");
            assert!(input.text.starts_with("seq: "));
            assert!(!input.text.contains(":::"));
            // Field 1 as varint
            assert_eq!(input.payload[0], 0x08);
        }
    }

    #[test]
    fn test_artifacts() {
        let dir = std::env::temp_dir().join(format!("ppfuzz-artifacts-{}", std::process::id()));
        let vector = Vector::new("u", "Ping", ping()).unwrap();
        let mut fuzzer = ProtoFuzzer::new(vec![vector], Injector::default())
            .unwrap()
            .seed(5)
            .artifacts(&dir)
            .unwrap();

        let input = fuzzer.fuzz().unwrap();
        let saved = std::fs::read_to_string(dir.join(artifact_name(&input.text))).unwrap();
        assert_eq!(saved, input.text);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name("seq: 1\n"), artifact_name("seq: 1\n"));
        assert_ne!(artifact_name("seq: 1\n"), artifact_name("seq: 2\n"));
        assert!(artifact_name("").starts_with("ppfuzz-"));
        assert_eq!(artifact_name("").len(), "ppfuzz-".len() + 16 + ".txt".len());
    }
}
