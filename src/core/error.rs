//! SM-002: Error taxonomy for loading and running targets.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration or executing a target.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML parse error in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_yaml_ng::Error,
    },

    #[error("invalid discovery pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("cannot read {path} during discovery: {source}")]
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{kind} declaration must have exactly one name, found {count}")]
    MalformedDeclaration { kind: &'static str, count: usize },

    #[error("{kind} '{name}' is missing required property '{property}'")]
    MissingProperty {
        kind: &'static str,
        name: String,
        property: &'static str,
    },

    #[error("definition '{name}' is declared more than once")]
    DuplicateDefinition { name: String },

    #[error("target '{target}' role '{role}' references unknown build '{build}'")]
    DanglingBuild {
        target: String,
        role: String,
        build: String,
    },

    #[error("target '{target}' has no mode '{mode}' (known: {})", known.join(", "))]
    UnknownMode {
        target: String,
        mode: String,
        known: Vec<String>,
    },

    #[error("target '{target}' declares no modes")]
    NoModes { target: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("command exited with code {code}: {command}\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("build scheduler closed: {0}")]
    Scheduler(#[from] tokio::sync::AcquireError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Self {
        Self::Walk {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        }
    }
}
