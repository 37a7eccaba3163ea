//! Error types of every stage of the fuzzing pipeline.

use std::path::PathBuf;
use itertools::Itertools;
use thiserror::Error;

/// A file (grammar or configuration) could not be loaded.
#[derive(Debug, Error)]
pub struct ParsingError {
    path: PathBuf,
    msg: String,
}

impl ParsingError {
    pub(crate) fn new<P: Into<PathBuf>, S: Into<String>>(path: P, msg: S) -> Self {
        Self {
            path: path.into(),
            msg: msg.into(),
        }
    }
}

impl std::fmt::Display for ParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParsingError in {}: {}", self.path.display(), self.msg)
    }
}

/// Errors raised while introspecting a schema or compiling it into a grammar.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The descriptor set could not be read from disk
    #[error("Could not read descriptor set {}: {source}", .path.display())]
    Io {
        /// Path of the descriptor set
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The descriptor set is not a valid `FileDescriptorSet`
    #[error("Invalid descriptor set: {0}")]
    Decode(#[from] prost::DecodeError),

    /// No message with the given name exists
    #[error("Unknown message type '{0}'")]
    UnknownMessage(String),

    /// A short message name matches more than one message
    #[error("Message name '{0}' is ambiguous, use the fully qualified name")]
    AmbiguousMessage(String),

    /// An enum field references an enum that is not part of the schema
    #[error("Field '{field}' references unknown enum '{type_name}'")]
    UnknownEnum {
        /// Name of the field
        field: String,
        /// Referenced enum type
        type_name: String,
    },

    /// The field kind cannot be expressed in the grammar
    #[error("Field '{field}' of message '{message}' has unsupported type {kind}")]
    UnsupportedField {
        /// Message that contains the field
        message: String,
        /// Name of the field
        field: String,
        /// The unsupported kind
        kind: String,
    },

    /// Two merged schemas define the same symbol differently
    #[error("The field name '{0}' is used with different types")]
    ConflictingField(String),
}

/// A single defect found by the grammar validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarDefect {
    /// The symbol has no alternatives
    EmptyExpansions(String),

    /// The symbol is defined but never referenced
    Unused(String),

    /// The symbol is referenced but never defined
    Undefined(String),

    /// The symbol cannot be reached from the start symbol
    Unreachable {
        /// The unreachable symbol
        symbol: String,
        /// The start symbol
        start: String,
    },

    /// Every alternative of the symbol recurses without end
    Unproductive(String),
}

impl GrammarDefect {
    /// The offending symbol.
    pub fn symbol(&self) -> &str {
        match self {
            GrammarDefect::EmptyExpansions(symbol)
            | GrammarDefect::Unused(symbol)
            | GrammarDefect::Undefined(symbol)
            | GrammarDefect::Unproductive(symbol)
            | GrammarDefect::Unreachable { symbol, .. } => symbol,
        }
    }
}

impl std::fmt::Display for GrammarDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarDefect::EmptyExpansions(symbol) => write!(f, "'{}': expansion list empty", symbol),
            GrammarDefect::Unused(symbol) => write!(f, "'{}': defined, but not used", symbol),
            GrammarDefect::Undefined(symbol) => write!(f, "'{}': used, but not defined", symbol),
            GrammarDefect::Unreachable { symbol, start } => write!(f, "'{}': unreachable from {}", symbol, start),
            GrammarDefect::Unproductive(symbol) => write!(f, "'{}': never derives a terminal string", symbol),
        }
    }
}

/// Errors that abort grammar construction.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("The grammar does not contain an explicit entrypoint: {0}")]
    /// The start symbol is not defined
    MissingEntrypoint(String),

    /// The grammar failed validation
    #[error("The grammar is invalid:\n{}", .0.iter().join("\n"))]
    Invalid(Vec<GrammarDefect>),

    /// The schema could not be compiled
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A grammar file could not be loaded
    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

/// Errors of the derivation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An unexpanded node carries a symbol the grammar does not define
    #[error("The non-terminal '{0}' is referenced but never defined")]
    UndefinedSymbol(String),

    /// Every alternative of a symbol is infinitely recursive
    #[error("The non-terminal '{0}' cannot be expanded to a finite tree")]
    NonTerminating(String),
}

/// Errors of the injection layer.
#[derive(Debug, Error)]
pub enum InjectError {
    /// A wordlist could not be read
    #[error("Could not read wordlist {}: {source}", .path.display())]
    Wordlist {
        /// Path of the wordlist
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A wordlist has no entries
    #[error("Wordlist {} is empty", .0.display())]
    EmptyWordlist(PathBuf),
}

/// The injected text does not parse against the target message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}:{column}: {msg}")]
pub struct TextFormatError {
    /// 1-based line of the offending token
    pub line: usize,
    /// 1-based column of the offending token
    pub column: usize,
    /// What went wrong
    pub msg: String,
}

/// Errors while talking to the target.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response not read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Umbrella error of the fuzzer and the binaries.
#[derive(Debug, Error)]
pub enum FuzzError {
    /// Loading the configuration failed
    #[error(transparent)]
    Config(#[from] ParsingError),

    /// Loading a schema failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Building a grammar failed
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// Expanding a derivation tree failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Filling placeholders failed
    #[error(transparent)]
    Inject(#[from] InjectError),

    /// Parsing a text-format message failed
    #[error(transparent)]
    TextFormat(#[from] TextFormatError),

    /// Sending a message failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configuration does not name any service
    #[error("No services are configured")]
    NoVectors,

    /// The schema compiler failed
    #[error("Compiling {} failed: {msg}", .path.display())]
    Compile {
        /// The schema file
        path: PathBuf,
        /// Diagnostic of the compiler
        msg: String,
    },

    /// A file operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}
