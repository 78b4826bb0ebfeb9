//! Structural validation of parsed expressions
//!
//! The parser admits `instance.execute(...)` calls anywhere an expression
//! is legal, but a method call only makes sense as the root of an
//! algorithm item. Value positions (assignment right-hand sides, call
//! arguments) must reject it before evaluation.

use crate::ast::{Callee, Expr};
use crate::error::ExpressionError;

/// Reject method calls anywhere inside a value expression.
pub fn validate_value_expr(expr: &Expr, source: &str) -> Result<(), ExpressionError> {
    match expr {
        Expr::Call { callee, args } => {
            if let Callee::Method { instance, method } = callee {
                return Err(ExpressionError::syntax(
                    source,
                    format!("`{instance}.{method}(...)` is not allowed in a value expression"),
                ));
            }
            for arg in args {
                validate_value_expr(&arg.value, source)?;
            }
            Ok(())
        }
        Expr::Subscript { target, .. } => validate_value_expr(target, source),
        Expr::Unary { operand, .. } => validate_value_expr(operand, source),
        Expr::Binary { left, right, .. } => {
            validate_value_expr(left, source)?;
            validate_value_expr(right, source)
        }
        Expr::Number(_) | Expr::Name(_) | Expr::Attribute { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;
    use crate::error::ExpressionErrorKind;
    use crate::parser::parse_statement;

    #[test]
    fn test_nested_method_call_rejected() {
        let src = "y = pid1.execute(PV=1) + 2";
        let stmt = parse_statement(src).unwrap();
        let err = validate_value_expr(stmt.value(), src).unwrap_err();
        assert_eq!(err.kind, ExpressionErrorKind::Syntax);
    }

    #[test]
    fn test_method_call_inside_argument_rejected() {
        let src = "sqrt(pid1.execute())";
        let stmt = parse_statement(src).unwrap();
        assert!(validate_value_expr(stmt.value(), src).is_err());
    }

    #[test]
    fn test_plain_expression_passes() {
        let src = "y = sqrt(a[-2]) + tank1.level * 2";
        let stmt = parse_statement(src).unwrap();
        assert!(validate_value_expr(stmt.value(), src).is_ok());
    }
}
