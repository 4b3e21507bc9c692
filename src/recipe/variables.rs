//! Global recipe variables
//!
//! Every top-level key that is not a modifier stage is a variable. Variables
//! resolve in declaration order, so an `eval(...)` value may only reference
//! variables declared above it. YAML anchors (`&name` / `*name`) are expanded
//! by the YAML parser before this step and need no further work.

use super::expr::{as_eval, evaluate};
use super::RecipeError;
use serde_yaml::{Mapping, Number, Value};

/// Ordered, fully resolved global variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    entries: Vec<(String, Value)>,
}

/// Parse a `name=value` override; the value is read as YAML.
///
/// # Errors
///
/// Fails with [`RecipeError::MalformedOverride`] when there is no `=` or the
/// name is empty.
pub fn parse_override(raw: &str) -> Result<(String, Value), RecipeError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| RecipeError::MalformedOverride(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(RecipeError::MalformedOverride(raw.to_string()));
    }
    let value = serde_yaml::from_str(value.trim())
        .unwrap_or_else(|_| Value::String(value.trim().to_string()));
    Ok((name.to_string(), value))
}

fn numeric(name: &str, value: &Value, context: &str) -> Result<f64, RecipeError> {
    value.as_f64().ok_or_else(|| RecipeError::Expression {
        expr: context.to_string(),
        reason: format!("variable '{name}' is not numeric"),
    })
}

/// Whole results become integers so they can fill integer fields.
fn number_value(v: f64) -> Number {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Number::from(v as i64)
    } else {
        Number::from(v)
    }
}

impl Variables {
    /// Resolve declared variables in order, applying overrides first.
    ///
    /// # Errors
    ///
    /// - [`RecipeError::UnknownOverride`] when an override names no variable
    /// - [`RecipeError::UnresolvedVariable`] when an expression references a
    ///   variable that is not declared above it
    /// - [`RecipeError::Expression`] for malformed expressions
    pub fn resolve(
        declared: Vec<(String, Value)>,
        overrides: &[(String, Value)],
    ) -> Result<Self, RecipeError> {
        for (name, _) in overrides {
            if !declared.iter().any(|(n, _)| n == name) {
                return Err(RecipeError::UnknownOverride(name.clone()));
            }
        }

        let mut resolved = Self::default();
        for (name, value) in declared {
            let value = overrides
                .iter()
                .rev()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or(value);
            let context = format!("variable '{name}'");
            let value = resolved.substitute(value, &context)?;
            resolved.entries.push((name, value));
        }
        Ok(resolved)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Numeric value of a variable, if it has one.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Variables as a YAML mapping, in declaration order.
    pub fn to_mapping(&self) -> Mapping {
        self.entries
            .iter()
            .map(|(n, v)| (Value::String(n.clone()), v.clone()))
            .collect()
    }

    /// Evaluate one expression against the resolved variables.
    pub fn eval(&self, expr: &str, context: &str) -> Result<f64, RecipeError> {
        evaluate(expr, |name| match self.get(name) {
            Some(value) => numeric(name, value, expr),
            None => Err(RecipeError::UnresolvedVariable {
                name: name.to_string(),
                context: context.to_string(),
            }),
        })
    }

    /// Replace every `eval(...)` string inside `value` with its number.
    pub fn substitute(&self, value: Value, context: &str) -> Result<Value, RecipeError> {
        Ok(match value {
            Value::String(s) => match as_eval(&s) {
                Some(expr) => Value::Number(number_value(self.eval(expr, context)?)),
                None => Value::String(s),
            },
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|v| self.substitute(v, context))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| Ok((k, self.substitute(v, context)?)))
                    .collect::<Result<_, RecipeError>>()?,
            ),
            Value::Tagged(mut tagged) => {
                let inner = std::mem::take(&mut tagged.value);
                tagged.value = self.substitute(inner, context)?;
                Value::Tagged(tagged)
            }
            other => other,
        })
    }
}
