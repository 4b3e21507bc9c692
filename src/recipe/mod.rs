//! Recipe documents
//!
//! A recipe is a markdown file whose YAML front matter declares global
//! variables and one or more modifier stages:
//!
//! ```yaml
//! ---
//! num_epochs: 30.0
//! pruning_end: eval(num_epochs - 5)
//!
//! pruning_modifiers:
//!   - !GMPruningModifier
//!     params: __ALL_PRUNABLE__
//!     init_sparsity: 0.05
//!     final_sparsity: 0.85
//!     start_epoch: 1.0
//!     end_epoch: eval(pruning_end)
//!     update_frequency: 0.5
//! ---
//! Prose that documents the recipe.
//! ```
//!
//! Any top-level key named `modifiers` or ending in `_modifiers` is a stage;
//! every other key is a variable.

mod document;
mod error;
mod expr;
mod loader;
mod spec;
mod variables;


pub use document::{split_front_matter, DocumentParts};
pub use error::RecipeError;
pub use expr::evaluate;
pub use loader::{is_stage_key, Recipe, RecipeSummary, Stage};
pub use spec::{
    ConstantPruningSpec, EpochRangeSpec, LayerPruningSpec, LearningRateFunctionSpec,
    LearningRateSpec, LrClass, LrFunc, LrKwargs, MagnitudePruningSpec, ModifierSpec,
    MovementPruningSpec, SetLearningRateSpec, MODIFIER_TAGS,
};
pub use variables::{parse_override, Variables};
