//! strexpr_options: Parse options and their JSON configuration file.
//!
//! Every field is optional in JSON; the accessors apply the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Nesting limit applied when `maxNestingDepth` is not set.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 200;

/// Options controlling how an expression is bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Namespaces searched, in order, for type names that do not resolve as
    /// written (for example `System` for `Math.PI`).
    pub namespaces: Vec<String>,
    pub max_nesting_depth: Option<u32>,
    /// Convert the body to the declared return type where an implicit
    /// conversion exists. When false the body type must match exactly.
    pub implicit_return_conversion: Option<bool>,
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options searching the given namespaces.
    pub fn with_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse options from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_nesting_depth.unwrap_or(DEFAULT_MAX_NESTING_DEPTH)
    }

    pub fn implicit_return(&self) -> bool {
        self.implicit_return_conversion.unwrap_or(true)
    }

    /// Append a namespace unless it is already searched.
    pub fn add_namespace(&mut self, namespace: &str) -> &mut Self {
        if !self.namespaces.iter().any(|ns| ns == namespace) {
            self.namespaces.push(namespace.to_string());
        }
        self
    }

    /// Overlay the fields set in `other` onto these options. Namespaces are
    /// appended after the existing ones.
    pub fn merge(&mut self, other: &ParseOptions) -> &mut Self {
        for ns in &other.namespaces {
            self.add_namespace(ns);
        }
        if other.max_nesting_depth.is_some() {
            self.max_nesting_depth = other.max_nesting_depth;
        }
        if other.implicit_return_conversion.is_some() {
            self.implicit_return_conversion = other.implicit_return_conversion;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(options.namespaces.is_empty());
        assert_eq!(options.max_depth(), 200);
        assert!(options.implicit_return());
    }

    #[test]
    fn test_from_json_camel_case() {
        let options = ParseOptions::from_json(
            r#"{ "namespaces": ["System"], "maxNestingDepth": 16, "implicitReturnConversion": false }"#,
        )
        .unwrap();
        assert_eq!(options.namespaces, vec!["System"]);
        assert_eq!(options.max_depth(), 16);
        assert!(!options.implicit_return());
    }

    #[test]
    fn test_partial_json() {
        let options = ParseOptions::from_json(r#"{ "maxNestingDepth": 3 }"#).unwrap();
        assert!(options.namespaces.is_empty());
        assert!(options.implicit_return());
        assert!(ParseOptions::from_json("{ \"namespaces\": 1 }").is_err());
    }

    #[test]
    fn test_merge_appends_namespaces() {
        let mut options = ParseOptions::with_namespaces(["System"]);
        let overlay = ParseOptions {
            namespaces: vec!["System".into(), "System.Collections.Generic".into()],
            max_nesting_depth: Some(50),
            implicit_return_conversion: None,
        };
        options.merge(&overlay);
        assert_eq!(options.namespaces, vec!["System", "System.Collections.Generic"]);
        assert_eq!(options.max_depth(), 50);
        assert!(options.implicit_return());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ParseOptions::load("/nonexistent/strexpr.json").unwrap_err();
        assert!(matches!(err, OptionsError::Io { .. }));
    }
}
