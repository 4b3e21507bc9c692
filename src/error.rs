//! Error types for Podar

use crate::recipe::RecipeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    #[error("Shape mismatch for {name}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Parameter selector {selector} matched nothing in the model")]
    UnmatchedSelector { selector: String },

    #[error("Invalid selector pattern {pattern}: {reason}")]
    InvalidSelector { pattern: String, reason: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Modifier used before initialize: {0}")]
    NotInitialized(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
