//! Runtime errors

use thiserror::Error;

use procsim_dsl::ExpressionError;

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors escaping the engine while running
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("node `{node}` failed at cycle {cycle}: {source}")]
    Node {
        node: String,
        cycle: u64,
        #[source]
        source: ExpressionError,
    },
}

/// Errors raised while loading or validating a program document.
/// These abort startup; the engine is never constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read program file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse program YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate program item name `{0}`")]
    DuplicateName(String),

    #[error("unknown program type `{type_name}` for item `{name}`")]
    UnknownType { name: String, type_name: String },

    #[error("invalid expression for item `{name}`: {source}")]
    Expression {
        name: String,
        #[source]
        source: ExpressionError,
    },

    #[error("item `{name}`: {message}")]
    MalformedItem { name: String, message: String },

    #[error("invalid init_args for `{name}`: {message}")]
    InvalidInitArgs { name: String, message: String },

    #[error("invalid clock configuration: {0}")]
    InvalidClock(String),

    #[error("invalid start_time: {0}")]
    InvalidStartTime(String),

    #[error("generator cycle count must be positive")]
    InvalidCycleCount,
}

/// Failure inside an algorithm's `execute`
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("unexpected input `{0}`")]
    UnexpectedInput(String),
}
