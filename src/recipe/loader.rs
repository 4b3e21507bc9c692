//! Recipe loading
//!
//! Parsing happens in four passes: split the document, read the YAML, resolve
//! variables, then turn each tagged stage entry into a [`ModifierSpec`].

use super::document::split_front_matter;
use super::spec::{ModifierSpec, MODIFIER_TAGS};
use super::variables::Variables;
use super::RecipeError;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;

/// Whether a top-level key names a modifier stage.
pub fn is_stage_key(key: &str) -> bool {
    key == "modifiers" || key.ends_with("_modifiers")
}

/// One named list of modifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub name: String,
    pub modifiers: Vec<ModifierSpec>,
}

/// A parsed, validated recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    variables: Variables,
    stages: Vec<Stage>,
    prose: String,
}

/// Serializable overview used by the `info` command.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub variables: Mapping,
    pub stages: Vec<Stage>,
    pub num_modifiers: usize,
    pub max_epochs: f64,
    pub has_pruning: bool,
    pub has_learning_rate: bool,
    pub has_prose: bool,
}

impl Recipe {
    /// Parse recipe text with no overrides.
    pub fn parse(text: &str) -> Result<Self, RecipeError> {
        Self::parse_with_overrides(text, &[])
    }

    /// Parse recipe text, replacing declared variables with `overrides`.
    ///
    /// # Errors
    ///
    /// Any [`RecipeError`]; nothing is partially applied on failure.
    pub fn parse_with_overrides(
        text: &str,
        overrides: &[(String, Value)],
    ) -> Result<Self, RecipeError> {
        let parts = split_front_matter(text)?;
        let root: Value = serde_yaml::from_str(parts.front_matter)?;
        let root = match root {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(RecipeError::NotAMapping),
        };

        let mut declared = Vec::new();
        let mut raw_stages = Vec::new();
        for (key, value) in root {
            let key = match key {
                Value::String(s) => s,
                other => return Err(RecipeError::InvalidKey(describe(&other))),
            };
            if is_stage_key(&key) {
                let entries = match value {
                    Value::Sequence(items) => items,
                    Value::Null => Vec::new(),
                    _ => return Err(RecipeError::InvalidStage(key)),
                };
                raw_stages.push((key, entries));
            } else {
                declared.push((key, value));
            }
        }

        let variables = Variables::resolve(declared, overrides)?;

        let mut stages = Vec::with_capacity(raw_stages.len());
        for (name, entries) in raw_stages {
            let modifiers = entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| build_modifier(&variables, &name, index, entry))
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(stage = %name, modifiers = modifiers.len(), "parsed stage");
            stages.push(Stage { name, modifiers });
        }

        Ok(Self {
            variables,
            stages,
            prose: parts.prose.to_string(),
        })
    }

    /// Read and parse a recipe file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        Self::load_with_overrides(path, &[])
    }

    pub fn load_with_overrides(
        path: impl AsRef<Path>,
        overrides: &[(String, Value)],
    ) -> Result<Self, RecipeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RecipeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading recipe");
        Self::parse_with_overrides(&text, overrides)
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn prose(&self) -> &str {
        &self.prose
    }

    /// All modifiers in stage order.
    pub fn modifiers(&self) -> impl Iterator<Item = &ModifierSpec> {
        self.stages.iter().flat_map(|s| s.modifiers.iter())
    }

    pub fn num_modifiers(&self) -> usize {
        self.stages.iter().map(|s| s.modifiers.len()).sum()
    }

    /// Last epoch any modifier touches; unbounded ends are ignored.
    pub fn max_epochs(&self) -> f64 {
        self.modifiers()
            .flat_map(|m| [m.start_epoch(), m.end_epoch()])
            .filter(|e| *e >= 0.0)
            .fold(0.0, f64::max)
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            variables: self.variables.to_mapping(),
            stages: self.stages.clone(),
            num_modifiers: self.num_modifiers(),
            max_epochs: self.max_epochs(),
            has_pruning: self.modifiers().any(ModifierSpec::is_pruning),
            has_learning_rate: self.modifiers().any(ModifierSpec::is_learning_rate),
            has_prose: !self.prose.trim().is_empty(),
        }
    }

    /// Resolved recipe as YAML: variables first, then stages.
    pub fn to_yaml(&self) -> Result<String, RecipeError> {
        let mut root = self.variables.to_mapping();
        for stage in &self.stages {
            let entries = stage
                .modifiers
                .iter()
                .map(serde_yaml::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            root.insert(Value::String(stage.name.clone()), Value::Sequence(entries));
        }
        Ok(serde_yaml::to_string(&Value::Mapping(root))?)
    }

    /// Resolved recipe as a markdown document with front matter.
    pub fn to_markdown(&self) -> Result<String, RecipeError> {
        let mut out = format!("---\n{}---\n", self.to_yaml()?);
        if !self.prose.is_empty() {
            out.push('\n');
            out.push_str(&self.prose);
        }
        Ok(out)
    }
}

impl std::str::FromStr for Recipe {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_markdown() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}

fn build_modifier(
    variables: &Variables,
    stage: &str,
    index: usize,
    entry: Value,
) -> Result<ModifierSpec, RecipeError> {
    let tag = match &entry {
        Value::Tagged(tagged) => {
            let full = tagged.tag.to_string();
            full.trim_start_matches('!').to_string()
        }
        _ => {
            return Err(RecipeError::UntaggedModifier {
                stage: stage.to_string(),
                index,
            })
        }
    };
    if !MODIFIER_TAGS.contains(&tag.as_str()) {
        return Err(RecipeError::UnknownModifier {
            tag,
            stage: stage.to_string(),
        });
    }

    let context = format!("{tag} in stage '{stage}'");
    let entry = variables.substitute(entry, &context)?;
    let spec: ModifierSpec =
        serde_yaml::from_value(entry).map_err(|e| RecipeError::Schema {
            tag: tag.clone(),
            stage: stage.to_string(),
            reason: e.to_string(),
        })?;
    spec.validate().map_err(|reason| RecipeError::InvalidField {
        tag: tag.clone(),
        stage: stage.to_string(),
        reason,
    })?;

    let ramp_frequency = spec
        .sparsity_schedule()
        .and(spec.update_frequency())
        .filter(|f| *f <= 0.0);
    if let Some(update_frequency) = ramp_frequency {
        tracing::warn!(
            modifier = %tag,
            stage = %stage,
            update_frequency,
            "update_frequency <= 0: sparsity is only set at start and end"
        );
    }
    if matches!(spec, ModifierSpec::LayerPruning(_)) && spec.start_epoch() < 0.0 {
        tracing::warn!(
            stage = %stage,
            "LayerPruningModifier with start_epoch -1 bypasses layers from the first step"
        );
    }
    tracing::debug!(modifier = %tag, stage = %stage, "parsed modifier");
    Ok(spec)
}
