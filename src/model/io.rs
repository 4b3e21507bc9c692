//! Model file loading and saving

use super::Model;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Supported on-disk formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Yaml,
}

impl ModelFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ModelFormat::Json),
            "yaml" | "yml" => Some(ModelFormat::Yaml),
            _ => None,
        }
    }

    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Serialization("File has no extension".to_string()))?;
        Self::from_extension(ext)
            .ok_or_else(|| Error::Serialization(format!("Unsupported file extension: {ext}")))
    }
}

/// Load a model from a JSON or YAML file.
///
/// # Example
///
/// ```no_run
/// use podar::model::load_model;
///
/// let model = load_model("model.json").expect("failed to load model");
/// println!("{} parameters", model.num_elements());
/// ```
pub fn load_model(path: impl AsRef<Path>) -> Result<Model> {
    let path = path.as_ref();
    let format = ModelFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;

    let model = match format {
        ModelFormat::Json => serde_json::from_str(&content)
            .map_err(|e| Error::Serialization(format!("JSON deserialization failed: {e}")))?,
        ModelFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| Error::Serialization(format!("YAML deserialization failed: {e}")))?,
    };
    Ok(model)
}

/// Save a model, choosing the format from the file extension.
pub fn save_model(model: &Model, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let data = match ModelFormat::from_path(path)? {
        ModelFormat::Json => serde_json::to_string_pretty(model)
            .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?,
        ModelFormat::Yaml => serde_yaml::to_string(model)
            .map_err(|e| Error::Serialization(format!("YAML serialization failed: {e}")))?,
    };
    fs::write(path, data)?;
    Ok(())
}
