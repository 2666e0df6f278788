//! Error types for analysis chains
//!
//! Errors are grouped by the moment they can occur:
//! - [`ConfigurationError`]: the chain definition is wrong. Raised while the
//!   analyzer is being built, before any input is read.
//! - [`ResolutionError`]: component libraries could not be fetched or loaded.
//! - [`StreamError`]: pulling tokens through a built chain failed.
//!
//! [`AnalysisError`] wraps all three for callers that drive the whole flow.

use crate::analysis::registry::ComponentRole;
use std::io;
use std::path::PathBuf;

/// The chain definition cannot be turned into an analyzer.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no tokenizer specified")]
    MissingTokenizer,

    #[error("only one tokenizer is allowed (got '{first}' and '{second}')")]
    DuplicateTokenizer { first: String, second: String },

    #[error("malformed option '{0}': expected key=value")]
    MalformedOption(String),

    #[error("option '{key}' given twice for '{component}'")]
    DuplicateOption { component: String, key: String },

    #[error("unknown {role} '{name}'")]
    UnknownComponent { role: ComponentRole, name: String },

    #[error("{component}: unknown option(s) {}", .keys.join(", "))]
    UnknownOptions { component: String, keys: Vec<String> },

    #[error("{component}: missing required option '{key}'")]
    MissingOption { component: String, key: String },

    #[error("{component}: invalid value '{value}' for option '{key}': {reason}")]
    InvalidOption {
        component: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("alias cycle while resolving {role} '{name}'")]
    AliasCycle { role: ComponentRole, name: String },

    #[error("'{flag}' must be followed by a component name")]
    MissingStageName { flag: String },

    #[error("unexpected argument '{0}' before any stage flag")]
    UnexpectedArgument(String),

    #[error("stage arguments cannot be combined with a pipeline file")]
    ConflictingPipelineSources,

    #[error("invalid pipeline file {path:?}: {message}")]
    InvalidPipelineFile { path: PathBuf, message: String },

    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Component libraries could not be fetched or loaded.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("invalid artifact coordinate '{coordinate}': {reason}")]
    InvalidCoordinate { coordinate: String, reason: String },

    #[error("invalid repository '{0}': expected id=url")]
    InvalidRepository(String),

    #[error("artifact {coordinate} not found (searched {})", display_paths(.searched))]
    ArtifactNotFound {
        coordinate: String,
        searched: Vec<PathBuf>,
    },

    #[error("repository '{id}' has unsupported url '{url}'")]
    UnsupportedRepository { id: String, url: String },

    #[error("invalid component library {path:?}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("I/O error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl ResolutionError {
    /// Wrap a `std::io::Error` with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Pulling tokens through a chain failed. The document must be abandoned.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed input at byte {offset}: {message}")]
    MalformedInput { offset: u64, message: String },

    #[error("{stage}: {message}")]
    Stage { stage: String, message: String },
}

impl StreamError {
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Any failure along the fetch / build / run flow.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
