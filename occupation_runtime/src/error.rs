//! Runtime error type.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use occupation_model::ModelError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("required file not found: {0}")]
    MissingFile(PathBuf),

    #[error("table error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is not a {expected} schema")]
    UnexpectedSchema {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("config error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("snapshot decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("snapshot integrity error: {0}")]
    Integrity(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RuntimeError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_is_transparent() {
        let err: RuntimeError = ModelError::not_found("element", "1.A.9").into();
        assert_eq!(err.to_string(), "unknown element id: 1.A.9");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = RuntimeError::MissingFile(PathBuf::from("/data/Abilities.txt"));
        assert!(err.to_string().contains("/data/Abilities.txt"));
    }
}
