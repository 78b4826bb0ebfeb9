//! The shape all stateful program instances share
//!
//! Every algorithm is created once at engine construction with the
//! engine's cycle time injected, executes once per cycle in declared
//! order, and exposes the attributes the engine persists after each
//! `execute`.

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, ProgramError};

/// Resolved keyword arguments for one `execute` call, in argument order.
pub type Inputs = IndexMap<String, f64>;

/// Live algorithm instances keyed by item name, in declared order.
pub type InstanceMap = IndexMap<String, Box<dyn Program>>;

/// Construction context handed to an algorithm builder.
pub struct ProgramInit {
    /// Item name from the configuration (for error messages).
    pub name: String,
    /// Engine tick period in seconds.
    pub cycle_time: f64,
    /// Raw `init_args` mapping; overlays each type's defaults.
    pub init_args: serde_yaml::Mapping,
    /// Per-instance seed derived from the run seed.
    pub seed: u64,
}

impl ProgramInit {
    /// Deserialize `init_args` into a typed params struct, with the
    /// struct's `Default` supplying unset keys.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(self.init_args.clone())).map_err(|e| {
            ConfigError::InvalidInitArgs {
                name: self.name.clone(),
                message: e.to_string(),
            }
        })
    }
}

/// A stateful algorithm instance.
pub trait Program: fmt::Debug {
    /// Advance one cycle, mutating internal attributes. `inputs` holds
    /// the keyword arguments resolved from the item's expression.
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError>;

    /// Read a live attribute by name.
    fn attribute(&self, name: &str) -> Option<f64>;

    /// Attribute names the engine persists to the store after each
    /// `execute`, in order.
    fn stored_attributes(&self) -> &'static [&'static str];
}

/// Reject keyword arguments the algorithm does not understand.
pub(crate) fn reject_unknown_inputs(inputs: &Inputs, allowed: &[&str]) -> Result<(), ProgramError> {
    for key in inputs.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ProgramError::UnexpectedInput(key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn init_from_yaml(name: &str, cycle_time: f64, yaml: &str) -> ProgramInit {
    let init_args = if yaml.trim().is_empty() {
        serde_yaml::Mapping::new()
    } else {
        serde_yaml::from_str(yaml).unwrap()
    };
    ProgramInit {
        name: name.to_string(),
        cycle_time,
        init_args,
        seed: 0,
    }
}
