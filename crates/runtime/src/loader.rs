//! Program configuration loading
//!
//! Deserializes the declarative YAML document, validates every item
//! against the registry and the expression grammar, applies the
//! instance-name rewrite, extracts lag requirements and sizes per-key
//! history capacities. All of this happens before the engine is
//! constructed; a malformed document never produces an engine.

use std::collections::HashSet;
use std::path::Path;

use chrono::DateTime;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use procsim_dsl::{
    collect_lag_requirements, parse_statement, rewrite_instance_outputs, validate_value_expr,
    Callee, Expr, Stmt,
};

use crate::clock::ClockConfig;
use crate::error::ConfigError;
use crate::registry::ProgramRegistry;
use crate::types::{ClockMode, VarKey};

/// Capacity headroom over the deepest observed lag.
pub const LAG_SAFETY_MARGIN: f64 = 1.5;
/// Smallest history buffer allocated for any lagged key.
pub const MIN_RECORD_LENGTH: usize = 10;

const VARIABLE_TYPE: &str = "VARIABLE";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    clock: Option<RawClock>,
    record_length: Option<usize>,
    seed: Option<u64>,
    #[serde(default)]
    program: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClock {
    cycle_time: Option<f64>,
    mode: Option<ClockMode>,
    sample_interval: Option<f64>,
    time_format: Option<String>,
    start_time: Option<RawStartTime>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStartTime {
    Epoch(f64),
    Iso(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    init_args: serde_yaml::Mapping,
    expression: String,
}

/// What kind of node a program item becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Algorithm { type_name: String },
    Variable,
}

/// A validated program item, in declared order.
#[derive(Debug)]
pub struct ProgramItem {
    pub name: String,
    pub kind: ItemKind,
    pub init_args: serde_yaml::Mapping,
    pub expression: String,
    /// Parsed and instance-rewritten statement.
    pub(crate) stmt: Stmt,
}

/// Validated engine configuration.
#[derive(Debug)]
pub struct ProgramConfig {
    pub clock: ClockConfig,
    pub seed: Option<u64>,
    pub items: Vec<ProgramItem>,
    /// Deepest lag observed per store key.
    pub lag_requirements: IndexMap<VarKey, u32>,
    /// History capacity chosen per store key.
    pub lag_capacities: IndexMap<VarKey, usize>,
}

/// Load a program document from a file.
pub fn load_file(path: impl AsRef<Path>, registry: &ProgramRegistry) -> Result<ProgramConfig, ConfigError> {
    let source = std::fs::read_to_string(path)?;
    load_str(&source, registry)
}

/// Load a program document from a YAML string.
pub fn load_str(source: &str, registry: &ProgramRegistry) -> Result<ProgramConfig, ConfigError> {
    let raw: RawDocument = serde_yaml::from_str(source)?;

    let clock = parse_clock(raw.clock)?;
    clock.validate()?;

    let mut seen = HashSet::new();
    for item in &raw.program {
        if !seen.insert(item.name.clone()) {
            return Err(ConfigError::DuplicateName(item.name.clone()));
        }
    }

    // Instance names are the algorithm items, wherever they are declared;
    // names shadowed by a registered function are never rewritten.
    let instance_names: HashSet<String> = raw
        .program
        .iter()
        .filter(|item| !item.type_name.eq_ignore_ascii_case(VARIABLE_TYPE))
        .map(|item| item.name.clone())
        .collect();
    let is_instance = |name: &str| instance_names.contains(name) && !registry.has_function(name);

    let mut items = Vec::with_capacity(raw.program.len());
    for item in raw.program {
        let mut stmt = parse_statement(&item.expression).map_err(|source| {
            ConfigError::Expression {
                name: item.name.clone(),
                source,
            }
        })?;
        rewrite_instance_outputs(&mut stmt, &is_instance);

        let kind = if item.type_name.eq_ignore_ascii_case(VARIABLE_TYPE) {
            validate_variable_item(&item, &stmt)?;
            ItemKind::Variable
        } else {
            if registry.algorithm(&item.type_name).is_none() {
                return Err(ConfigError::UnknownType {
                    name: item.name,
                    type_name: item.type_name,
                });
            }
            validate_algorithm_item(&item, &stmt)?;
            ItemKind::Algorithm {
                type_name: item.type_name,
            }
        };

        items.push(ProgramItem {
            name: item.name,
            kind,
            init_args: item.init_args,
            expression: item.expression,
            stmt,
        });
    }

    let mut lag_requirements: IndexMap<String, u32> = IndexMap::new();
    for item in &items {
        collect_lag_requirements(&item.stmt, &mut lag_requirements);
    }
    let lag_requirements: IndexMap<VarKey, u32> = lag_requirements
        .into_iter()
        .map(|(key, lag)| (VarKey::from(key), lag))
        .collect();

    let mut lag_capacities = IndexMap::with_capacity(lag_requirements.len());
    for (key, &lag) in &lag_requirements {
        let capacity = match raw.record_length {
            Some(length) => length,
            None => ((lag as f64 * LAG_SAFETY_MARGIN).ceil() as usize).max(MIN_RECORD_LENGTH),
        };
        debug!(key = %key, lag, capacity, "history configured");
        lag_capacities.insert(key.clone(), capacity);
    }

    Ok(ProgramConfig {
        clock,
        seed: raw.seed,
        items,
        lag_requirements,
        lag_capacities,
    })
}

fn parse_clock(raw: Option<RawClock>) -> Result<ClockConfig, ConfigError> {
    let Some(raw) = raw else {
        return Ok(ClockConfig::default());
    };
    let start_time = match raw.start_time {
        None => 0.0,
        Some(RawStartTime::Epoch(secs)) => secs,
        Some(RawStartTime::Iso(text)) => DateTime::parse_from_rfc3339(&text)
            .map_err(|e| ConfigError::InvalidStartTime(format!("`{text}`: {e}")))?
            .timestamp_millis() as f64
            / 1000.0,
    };
    let defaults = ClockConfig::default();
    Ok(ClockConfig {
        cycle_time: raw.cycle_time.unwrap_or(defaults.cycle_time),
        start_time,
        mode: raw.mode.unwrap_or(defaults.mode),
        sample_interval: raw.sample_interval,
        time_format: raw.time_format,
    })
}

fn validate_variable_item(item: &RawItem, stmt: &Stmt) -> Result<(), ConfigError> {
    if !item.init_args.is_empty() {
        return Err(ConfigError::MalformedItem {
            name: item.name.clone(),
            message: "Variable items take no init_args".to_string(),
        });
    }
    match stmt {
        Stmt::Assign { target, value } if *target == item.name => {
            validate_value_expr(value, &item.expression).map_err(|source| {
                ConfigError::Expression {
                    name: item.name.clone(),
                    source,
                }
            })
        }
        Stmt::Assign { target, .. } => Err(ConfigError::MalformedItem {
            name: item.name.clone(),
            message: format!("assignment target `{target}` does not match the item name"),
        }),
        Stmt::Expr(_) => Err(ConfigError::MalformedItem {
            name: item.name.clone(),
            message: format!("expression must have the form `{} = <rhs>`", item.name),
        }),
    }
}

fn validate_algorithm_item(item: &RawItem, stmt: &Stmt) -> Result<(), ConfigError> {
    let call_args = match stmt {
        Stmt::Expr(Expr::Call {
            callee: Callee::Method { instance, method },
            args,
        }) if *instance == item.name && method == "execute" => args,
        _ => {
            return Err(ConfigError::MalformedItem {
                name: item.name.clone(),
                message: format!(
                    "expression must have the form `{}.execute(...)`",
                    item.name
                ),
            })
        }
    };

    let mut keywords = HashSet::new();
    for arg in call_args {
        let Some(keyword) = &arg.keyword else {
            return Err(ConfigError::MalformedItem {
                name: item.name.clone(),
                message: "execute() takes keyword arguments only".to_string(),
            });
        };
        if !keywords.insert(keyword.clone()) {
            return Err(ConfigError::MalformedItem {
                name: item.name.clone(),
                message: format!("duplicate keyword argument `{keyword}`"),
            });
        }
        validate_value_expr(&arg.value, &item.expression).map_err(|source| {
            ConfigError::Expression {
                name: item.name.clone(),
                source,
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use procsim_dsl::ExpressionErrorKind;

    fn load(source: &str) -> Result<ProgramConfig, ConfigError> {
        load_str(source, &ProgramRegistry::builtin())
    }

    #[test]
    fn test_minimal_program() {
        let config = load(
            r#"
clock:
  cycle_time: 1.0
  mode: GENERATOR
program:
  - name: sin1
    type: SINE_WAVE
    init_args: {amplitude: 1.0, period: 4.0}
    expression: sin1.execute()
  - name: x
    type: Variable
    expression: x = sin1
"#,
        )
        .unwrap();
        assert_eq!(config.items.len(), 2);
        assert_eq!(config.clock.cycle_time, 1.0);
        assert_eq!(
            config.items[0].kind,
            ItemKind::Algorithm {
                type_name: "SINE_WAVE".to_string()
            }
        );
        assert_eq!(config.items[1].kind, ItemKind::Variable);
    }

    #[test]
    fn test_lag_capacity_sizing() {
        let config = load(
            r#"
program:
  - name: r
    type: RANDOM
    init_args: {L: 0, H: 100, max_step: 0}
    expression: r.execute()
  - name: d
    type: Variable
    expression: d = r[-3]
  - name: deep
    type: Variable
    expression: deep = d[-40]
"#,
        )
        .unwrap();
        // The bare instance reference picks up the `.out` key.
        assert_eq!(config.lag_requirements.get("r.out"), Some(&3));
        // max(ceil(3 * 1.5), 10) = 10
        assert_eq!(config.lag_capacities.get("r.out"), Some(&10));
        // max(ceil(40 * 1.5), 10) = 60
        assert_eq!(config.lag_capacities.get("d"), Some(&60));
    }

    #[test]
    fn test_record_length_override() {
        let config = load(
            r#"
record_length: 7
program:
  - name: d
    type: Variable
    expression: d = d[-3]
"#,
        )
        .unwrap();
        assert_eq!(config.lag_capacities.get("d"), Some(&7));
    }

    #[test]
    fn test_unsafe_expression_fails_at_load() {
        let err = load(
            r#"
program:
  - name: y
    type: Variable
    expression: "y = __import__('os').system('x')"
"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Expression { source, .. } => {
                assert_eq!(source.kind, ExpressionErrorKind::Syntax);
            }
            other => panic!("expected expression error, got {other}"),
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = load(
            r#"
program:
  - name: x
    type: Variable
    expression: x = 1
  - name: x
    type: Variable
    expression: x = 2
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(name) if name == "x"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = load(
            r#"
program:
  - name: z
    type: WARP_DRIVE
    expression: z.execute()
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownType { .. }));
    }

    #[test]
    fn test_algorithm_expression_shape() {
        // Wrong instance in the call target
        let err = load(
            r#"
program:
  - name: a
    type: SINE_WAVE
    expression: b.execute()
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedItem { .. }));

        // Positional arguments are rejected
        let err = load(
            r#"
program:
  - name: v
    type: VALVE
    expression: v.execute(50.0)
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedItem { .. }));
    }

    #[test]
    fn test_variable_expression_shape() {
        let err = load(
            r#"
program:
  - name: d
    type: Variable
    expression: e = 1
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedItem { .. }));
    }

    #[test]
    fn test_iso_start_time() {
        let config = load(
            r#"
clock:
  cycle_time: 1.0
  start_time: "2024-12-02T00:00:00+00:00"
program: []
"#,
        )
        .unwrap();
        assert!(config.clock.start_time > 1.7e9);
    }

    #[test]
    fn test_sample_interval_below_cycle_time_rejected() {
        let err = load(
            r#"
clock:
  cycle_time: 1.0
  sample_interval: 0.5
program: []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidClock(_)));
    }
}
