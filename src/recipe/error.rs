//! Recipe error types
//!
//! Every failure a recipe can produce before any modifier runs.

use std::path::PathBuf;

/// Recipe parsing and validation error
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Failed to read recipe {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Front matter opened with '---' is never closed")]
    UnterminatedFrontMatter,

    #[error("Recipe front matter must be a mapping of variables and modifier stages")]
    NotAMapping,

    #[error("Top-level key must be a string, got {0}")]
    InvalidKey(String),

    #[error("Stage '{0}' must be a list of modifiers")]
    InvalidStage(String),

    #[error("Unresolved variable '{name}' referenced by {context}")]
    UnresolvedVariable { name: String, context: String },

    #[error("Invalid expression '{expr}': {reason}")]
    Expression { expr: String, reason: String },

    #[error("Unknown modifier type '{tag}' in stage '{stage}'")]
    UnknownModifier { tag: String, stage: String },

    #[error("Modifier #{index} in stage '{stage}' has no type tag (expected e.g. !GMPruningModifier)")]
    UntaggedModifier { stage: String, index: usize },

    #[error("Invalid {tag} in stage '{stage}': {reason}")]
    Schema {
        tag: String,
        stage: String,
        reason: String,
    },

    #[error("Out-of-range value in {tag} (stage '{stage}'): {reason}")]
    InvalidField {
        tag: String,
        stage: String,
        reason: String,
    },

    #[error("Override for unknown variable '{0}'")]
    UnknownOverride(String),

    #[error("Malformed override '{0}' (expected name=value)")]
    MalformedOverride(String),
}
