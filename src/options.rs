use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{LibraryError, Result};

pub const DEFAULT_NAMESPACE: &str = "unnamed";

lazy_static! {
    static ref NAMESPACE_RE: Regex = Regex::new(r"^[A-Za-z0-9_$]+$").unwrap();
}

/// How descriptor keys and in-code references are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    /// Key and reference share one spelling. Private symbols become `_<ns>_<name>`.
    #[default]
    Flat,
    /// Emscripten library convention: private keys carry a `$` marker and are referenced
    /// without it, public symbols are referenced through their `_`-prefixed C name.
    Emscripten,
}

/// What happens to a top-level variable whose initializer is not a pure value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitializerPolicy {
    #[default]
    Reject,
    /// Emit `void 0` as the value and defer the initializer to a `__postset` entry.
    Postset,
}

impl FromStr for NamingConvention {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flat" => Ok(NamingConvention::Flat),
            "emscripten" => Ok(NamingConvention::Emscripten),
            other => Err(LibraryError::Config(format!(
                "unknown naming convention '{}', expected 'flat' or 'emscripten'",
                other
            ))),
        }
    }
}

impl FromStr for InitializerPolicy {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reject" => Ok(InitializerPolicy::Reject),
            "postset" => Ok(InitializerPolicy::Postset),
            other => Err(LibraryError::Config(format!(
                "unknown initializer policy '{}', expected 'reject' or 'postset'",
                other
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIBRARY OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration consumed once at the top of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryOptions {
    /// Prefix that keeps private symbols of independently compiled libraries apart.
    pub namespace: String,
    pub naming: NamingConvention,
    pub initializers: InitializerPolicy,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        LibraryOptions {
            namespace: DEFAULT_NAMESPACE.to_string(),
            naming: NamingConvention::default(),
            initializers: InitializerPolicy::default(),
        }
    }
}

impl LibraryOptions {
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        LibraryOptions {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    pub fn initializers(mut self, policy: InitializerPolicy) -> Self {
        self.initializers = policy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let options: LibraryOptions =
            serde_json::from_str(json).map_err(|e| LibraryError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !NAMESPACE_RE.is_match(&self.namespace) {
            return Err(LibraryError::InvalidNamespace {
                namespace: self.namespace.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LibraryOptions::default();
        assert_eq!(options.namespace, "unnamed");
        assert_eq!(options.naming, NamingConvention::Flat);
        assert_eq!(options.initializers, InitializerPolicy::Reject);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let options = LibraryOptions::from_json(r#"{ "namespace": "gl", "naming": "emscripten" }"#)
            .unwrap();
        assert_eq!(options.namespace, "gl");
        assert_eq!(options.naming, NamingConvention::Emscripten);
        assert_eq!(options.initializers, InitializerPolicy::Reject);
    }

    #[test]
    fn test_from_json_rejects_unknown_policy() {
        let err = LibraryOptions::from_json(r#"{ "initializers": "lazy" }"#).unwrap_err();
        assert!(matches!(err, LibraryError::Config(_)));
    }

    #[test]
    fn test_namespace_must_be_identifier_safe() {
        for bad in ["", "my-lib", "a b", "ns.x"] {
            let err = LibraryOptions::with_namespace(bad).validate().unwrap_err();
            assert!(matches!(err, LibraryError::InvalidNamespace { .. }), "{}", bad);
        }
        assert!(LibraryOptions::with_namespace("lib_2$").validate().is_ok());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "emscripten".parse::<NamingConvention>().unwrap(),
            NamingConvention::Emscripten
        );
        assert_eq!(
            "postset".parse::<InitializerPolicy>().unwrap(),
            InitializerPolicy::Postset
        );
        assert!("loose".parse::<NamingConvention>().is_err());
    }
}
