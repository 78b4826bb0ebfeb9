//! Procsim expression language
//!
//! Parses the restricted expression sub-grammar used by program items:
//! arithmetic over current and historical values, attribute access,
//! `name.execute(...)` method calls and top-level `name = expr` assignment.
//! Nothing outside the whitelisted grammar parses, which is the only line
//! of defense the evaluator needs.

pub mod ast;
pub mod error;
pub mod lags;
pub mod parser;
pub mod rewrite;
pub mod validate;

pub use ast::{BinaryOp, CallArg, Callee, Expr, Stmt, UnaryOp};
pub use error::{ExpressionError, ExpressionErrorKind};
pub use lags::collect_lag_requirements;
pub use parser::parse_statement;
pub use rewrite::rewrite_instance_outputs;
pub use validate::validate_value_expr;
