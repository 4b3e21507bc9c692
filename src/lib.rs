//! Podar: declarative pruning recipes
//!
//! A recipe is a markdown document whose YAML front matter declares
//! variables and stages of modifiers. Each modifier is a state machine over
//! training time (epochs and steps) that mutates model parameters (masks,
//! bypassed layers) or the optimizer learning rate.
//!
//! # Architecture
//!
//! - `recipe`: front matter parsing, variables and `eval()` expressions,
//!   tagged modifier records
//! - `modifier`: schedule tracking, pruning and learning-rate modifiers,
//!   the step-driven manager
//! - `prune`: magnitude masks, sparsity ramps, parameter selectors
//! - `optim`: optimizer trait, SGD, LR schedulers, the scheduled wrapper
//! - `model`: a minimal named-parameter model with JSON/YAML persistence
//! - `sensitivity`: approximate one-shot pruning sensitivity
//! - `cli` / `config`: the `podar` command line
//!
//! # Example
//!
//! ```no_run
//! use podar::model::load_model;
//! use podar::optim::apply_recipe;
//! use podar::recipe::Recipe;
//!
//! let recipe = Recipe::load("recipe.md")?;
//! let mut model = load_model("model.json")?;
//! apply_recipe(&recipe, &mut model, 100)?;
//! # Ok::<(), podar::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod modifier;
pub mod optim;
pub mod prune;
pub mod recipe;
pub mod sensitivity;

pub use error::{Error, Result};
pub use modifier::{Modifier, ModifierContext, ScheduledModifierManager};
pub use optim::{apply_recipe, ScheduledOptimizer};
pub use recipe::Recipe;
