use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid front matter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("no document found for slug '{0}'")]
    NotFound(String),

    #[error("slug '{slug}' is produced by both {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a number, got '{value}'")]
    NotANumber { key: &'static str, value: String },

    #[error("{key} must be between 0 and 1, got {value}")]
    OutOfRange { key: &'static str, value: f64 },

    #[error("{key} must be exactly one character, got '{value}'")]
    NotAChar { key: &'static str, value: String },
}
