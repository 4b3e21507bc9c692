//! Parameter and layer selectors
//!
//! A recipe's `params` (or `layers`) field is a single string or a list of
//! strings. Each entry is one of:
//!
//! - `__ALL__`: every candidate
//! - `__ALL_PRUNABLE__`: every prunable candidate (linear/conv weights, or
//!   linear/conv layers)
//! - `re:<pattern>`: regex matched from the start of the name
//! - a glob containing `*` or `?`, matched against the whole name
//! - an exact name

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const ALL_TOKEN: &str = "__ALL__";
pub const ALL_PRUNABLE_TOKEN: &str = "__ALL_PRUNABLE__";

/// Ordered list of name patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectorRepr", into = "SelectorRepr")]
pub struct ParamSelector {
    patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    One(String),
    Many(Vec<String>),
}

impl From<SelectorRepr> for ParamSelector {
    fn from(repr: SelectorRepr) -> Self {
        match repr {
            SelectorRepr::One(p) => Self { patterns: vec![p] },
            SelectorRepr::Many(patterns) => Self { patterns },
        }
    }
}

impl From<ParamSelector> for SelectorRepr {
    fn from(sel: ParamSelector) -> Self {
        match sel.patterns.as_slice() {
            [single] if single.starts_with("__") => SelectorRepr::One(single.clone()),
            _ => SelectorRepr::Many(sel.patterns),
        }
    }
}

enum Matcher {
    All,
    AllPrunable,
    Pattern(Regex),
    Exact(String),
}

impl ParamSelector {
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Selector for `__ALL_PRUNABLE__`.
    pub fn all_prunable() -> Self {
        Self::new([ALL_PRUNABLE_TOKEN])
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check that every regex and glob compiles.
    pub fn validate(&self) -> Result<()> {
        for p in &self.patterns {
            Self::matcher(p)?;
        }
        Ok(())
    }

    fn matcher(pattern: &str) -> Result<Matcher> {
        let compile = |source: String| {
            Regex::new(&source).map_err(|e| Error::InvalidSelector {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(match pattern {
            ALL_TOKEN => Matcher::All,
            ALL_PRUNABLE_TOKEN => Matcher::AllPrunable,
            p if p.starts_with("re:") => Matcher::Pattern(compile(format!("^(?:{})", &p[3..]))?),
            p if p.contains('*') || p.contains('?') => Matcher::Pattern(compile(glob_to_regex(p))?),
            p => Matcher::Exact(p.to_string()),
        })
    }

    /// Resolve against candidate names, preserving candidate order.
    ///
    /// `prunable` is the subset `__ALL_PRUNABLE__` expands to.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnmatchedSelector`] when a pattern matches nothing,
    /// or [`Error::InvalidSelector`] when it does not compile.
    pub fn resolve(&self, candidates: &[String], prunable: &[String]) -> Result<Vec<String>> {
        let mut selected = vec![false; candidates.len()];
        for pattern in &self.patterns {
            let matcher = Self::matcher(pattern)?;
            let mut hit = false;
            for (i, name) in candidates.iter().enumerate() {
                let m = match &matcher {
                    Matcher::All => true,
                    Matcher::AllPrunable => prunable.contains(name),
                    Matcher::Pattern(re) => re.is_match(name),
                    Matcher::Exact(exact) => exact == name,
                };
                if m {
                    selected[i] = true;
                    hit = true;
                }
            }
            if !hit {
                return Err(Error::UnmatchedSelector {
                    selector: pattern.clone(),
                });
            }
        }
        Ok(candidates
            .iter()
            .zip(selected)
            .filter_map(|(n, s)| s.then(|| n.clone()))
            .collect())
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["seq.fc1.weight", "seq.fc1.bias", "seq.fc2.weight", "seq.fc2.bias", "norm.weight"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn prunable() -> Vec<String> {
        vec!["seq.fc1.weight".to_string(), "seq.fc2.weight".to_string()]
    }

    #[test]
    fn test_exact_names() {
        let sel = ParamSelector::new(["seq.fc2.weight", "seq.fc1.weight"]);
        // order follows the candidates, not the pattern list
        assert_eq!(
            sel.resolve(&names(), &prunable()).unwrap(),
            vec!["seq.fc1.weight", "seq.fc2.weight"]
        );
    }

    #[test]
    fn test_regex_matches_from_start() {
        let sel = ParamSelector::new(["re:.*weight"]);
        assert_eq!(
            sel.resolve(&names(), &prunable()).unwrap(),
            vec!["seq.fc1.weight", "seq.fc2.weight", "norm.weight"]
        );
        let sel = ParamSelector::new(["re:fc1"]);
        assert!(sel.resolve(&names(), &prunable()).is_err());
    }

    #[test]
    fn test_glob() {
        let sel = ParamSelector::new(["seq.*.bias"]);
        assert_eq!(
            sel.resolve(&names(), &prunable()).unwrap(),
            vec!["seq.fc1.bias", "seq.fc2.bias"]
        );
    }

    #[test]
    fn test_all_tokens() {
        assert_eq!(
            ParamSelector::new([ALL_TOKEN]).resolve(&names(), &prunable()).unwrap().len(),
            5
        );
        assert_eq!(
            ParamSelector::all_prunable().resolve(&names(), &prunable()).unwrap(),
            prunable()
        );
    }

    #[test]
    fn test_unmatched_name_errors() {
        let sel = ParamSelector::new(["seq.fc9.weight"]);
        match sel.resolve(&names(), &prunable()) {
            Err(Error::UnmatchedSelector { selector }) => assert_eq!(selector, "seq.fc9.weight"),
            other => panic!("expected UnmatchedSelector, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_regex() {
        let sel = ParamSelector::new(["re:(unclosed"]);
        assert!(matches!(sel.validate(), Err(Error::InvalidSelector { .. })));
    }

    #[test]
    fn test_deserialize_string_or_list() {
        let one: ParamSelector = serde_yaml::from_str("__ALL_PRUNABLE__").unwrap();
        assert_eq!(one, ParamSelector::all_prunable());
        let many: ParamSelector = serde_yaml::from_str("['re:.*weight', seq.fc1.bias]").unwrap();
        assert_eq!(many.patterns(), &["re:.*weight", "seq.fc1.bias"]);
    }
}
