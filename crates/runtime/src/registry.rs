//! Program catalog
//!
//! An explicit registry object, threaded through loading and engine
//! construction: algorithm types keyed by case-insensitive name, plus
//! stateless scalar functions callable from expressions. Every entry
//! carries documentation metadata so downstream UIs can list the catalog
//! without parsing source.

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::ConfigError;
use crate::program::{Program, ProgramInit};
use crate::programs;

/// Documentation metadata attached to every catalog entry.
#[derive(Debug, Clone)]
pub struct DocEntry {
    pub english_name: String,
    pub chinese_name: String,
    /// Markdown description
    pub doc: String,
    /// Markdown parameter table
    pub params_table: String,
}

impl DocEntry {
    pub fn new(
        english_name: impl Into<String>,
        chinese_name: impl Into<String>,
        doc: impl Into<String>,
        params_table: impl Into<String>,
    ) -> Self {
        Self {
            english_name: english_name.into(),
            chinese_name: chinese_name.into(),
            doc: doc.into(),
            params_table: params_table.into(),
        }
    }
}

/// Failure inside a stateless function
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },

    #[error("{0}")]
    Domain(String),
}

/// A pure scalar function: input scalars, output scalar, no state.
pub type ScalarFn = fn(&[f64]) -> Result<f64, FunctionError>;

/// Builds an algorithm instance from its init configuration.
pub type BuildFn = fn(&ProgramInit) -> Result<Box<dyn Program>, ConfigError>;

pub struct AlgorithmEntry {
    pub build: BuildFn,
    pub docs: DocEntry,
}

pub struct FunctionEntry {
    pub call: ScalarFn,
    pub docs: DocEntry,
}

/// Catalog of algorithm types and stateless functions.
#[derive(Default)]
pub struct ProgramRegistry {
    algorithms: IndexMap<String, AlgorithmEntry>,
    functions: IndexMap<String, FunctionEntry>,
}

impl ProgramRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with the canonical algorithm suite and the builtin
    /// math functions registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        programs::register_builtins(&mut registry);
        registry
    }

    pub fn register_algorithm(&mut self, type_name: &str, build: BuildFn, docs: DocEntry) {
        self.algorithms
            .insert(type_name.to_ascii_uppercase(), AlgorithmEntry { build, docs });
    }

    pub fn algorithm(&self, type_name: &str) -> Option<&AlgorithmEntry> {
        self.algorithms.get(&type_name.to_ascii_uppercase())
    }

    pub fn register_function(&mut self, name: &str, call: ScalarFn, docs: DocEntry) {
        self.functions
            .insert(name.to_string(), FunctionEntry { call, docs });
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn algorithm_names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Documentation entries for the whole catalog, algorithms first.
    pub fn catalog(&self) -> impl Iterator<Item = (&str, &DocEntry)> {
        self.algorithms
            .iter()
            .map(|(name, e)| (name.as_str(), &e.docs))
            .chain(
                self.functions
                    .iter()
                    .map(|(name, e)| (name.as_str(), &e.docs)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_documented() {
        let registry = ProgramRegistry::builtin();
        assert!(registry.algorithm("PID").is_some());
        assert!(registry.algorithm("pid").is_some(), "type lookup is case-insensitive");
        assert!(registry.has_function("sqrt"));

        for (name, docs) in registry.catalog() {
            assert!(!docs.english_name.is_empty(), "{name} missing english name");
            assert!(!docs.chinese_name.is_empty(), "{name} missing chinese name");
            assert!(!docs.doc.is_empty(), "{name} missing doc");
            assert!(!docs.params_table.is_empty(), "{name} missing params table");
        }
    }

    #[test]
    fn test_function_dispatch() {
        let registry = ProgramRegistry::builtin();
        let sqrt = registry.function("sqrt").unwrap();
        assert_eq!((sqrt.call)(&[9.0]).unwrap(), 3.0);
        assert!((sqrt.call)(&[-1.0]).is_err());
        assert!((sqrt.call)(&[1.0, 2.0]).is_err());
    }
}
