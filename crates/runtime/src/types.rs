//! Core runtime types

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Store key: a plain variable name (`v1`) or a qualified attribute name
/// (`pid1.mv`). The dot has no further structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarKey(pub String);

impl VarKey {
    pub fn attribute(instance: &str, attr: &str) -> Self {
        Self(format!("{instance}.{attr}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VarKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VarKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for VarKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Clock pacing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockMode {
    /// Cycles paced to wall clock, one sleep per cycle
    Realtime,
    /// Cycles advanced as fast as possible
    Generator,
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockMode::Realtime => write!(f, "REALTIME"),
            ClockMode::Generator => write!(f, "GENERATOR"),
        }
    }
}

/// The flat per-cycle record emitted by the engine.
///
/// Reserved fields are typed; `values` holds one entry per persisted
/// store key in program order (variables under their raw name, algorithm
/// attributes under `instance.attribute`).
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub cycle_count: u64,
    pub sim_time: f64,
    pub need_sample: bool,
    pub time_str: String,
    pub values: IndexMap<VarKey, f64>,
}

impl Snapshot {
    /// Look up a persisted value by key.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}
