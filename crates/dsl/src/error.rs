//! Expression error taxonomy

use std::fmt;

use thiserror::Error;

/// What went wrong while parsing, validating or evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    /// The text is outside the admitted grammar.
    Syntax,
    /// A referenced name (function, attribute) is not defined.
    Name,
    /// A value was used where its shape does not fit (function arity,
    /// keyword arguments to a plain function, function used as a value).
    Type,
    /// Division or modulo by zero.
    Arithmetic,
    /// Any other evaluation failure.
    Evaluation,
}

impl fmt::Display for ExpressionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpressionErrorKind::Syntax => "syntax",
            ExpressionErrorKind::Name => "name",
            ExpressionErrorKind::Type => "type",
            ExpressionErrorKind::Arithmetic => "arithmetic",
            ExpressionErrorKind::Evaluation => "evaluation",
        };
        write!(f, "{s}")
    }
}

/// An expression failure carrying the offending source text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error in `{expression}`: {message}")]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub expression: String,
    pub message: String,
}

impl ExpressionError {
    pub fn new(
        kind: ExpressionErrorKind,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            expression: expression.into(),
            message: message.into(),
        }
    }

    pub fn syntax(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Syntax, expression, message)
    }

    pub fn name(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Name, expression, message)
    }

    pub fn type_mismatch(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Type, expression, message)
    }

    pub fn arithmetic(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Arithmetic, expression, message)
    }

    pub fn evaluation(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Evaluation, expression, message)
    }
}
