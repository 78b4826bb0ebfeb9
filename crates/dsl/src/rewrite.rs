//! Instance-name rewrite
//!
//! Users write `sensor[-30]` or `x = sensor + 1` to mean the canonical
//! output of the `sensor` instance. This pass rewrites every bare
//! reference to a registered instance into `name.out`, at the AST level.
//!
//! Positions that are never rewritten:
//! - the base of an attribute access (`sensor.level`)
//! - the target of a call (`sensor.execute(...)`, `sqrt(...)`)
//! - the target of an assignment (`sensor = ...`)
//!
//! Those positions are plain identifiers in this AST, not `Name` nodes,
//! so the walk below cannot touch them by construction.

use crate::ast::{Expr, Stmt};

/// Rewrite bare instance references into `name.out` attribute reads.
///
/// `is_instance` decides which names refer to live instances; names that
/// collide with registered stateless functions must be excluded by the
/// caller's predicate.
pub fn rewrite_instance_outputs(stmt: &mut Stmt, is_instance: &dyn Fn(&str) -> bool) {
    rewrite_expr(stmt.value_mut(), is_instance);
}

fn rewrite_expr(expr: &mut Expr, is_instance: &dyn Fn(&str) -> bool) {
    match expr {
        Expr::Name(name) => {
            if is_instance(name) {
                let base = std::mem::take(name);
                *expr = Expr::Attribute {
                    base,
                    attr: "out".to_string(),
                };
            }
        }
        Expr::Subscript { target, .. } => rewrite_expr(target, is_instance),
        Expr::Unary { operand, .. } => rewrite_expr(operand, is_instance),
        Expr::Binary { left, right, .. } => {
            rewrite_expr(left, is_instance);
            rewrite_expr(right, is_instance);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                rewrite_expr(&mut arg.value, is_instance);
            }
        }
        Expr::Number(_) | Expr::Attribute { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Callee, Expr, Stmt};
    use crate::parser::parse_statement;

    fn rewritten(src: &str) -> Stmt {
        let mut stmt = parse_statement(src).unwrap();
        rewrite_instance_outputs(&mut stmt, &|n| n == "x" || n == "s");
        stmt
    }

    #[test]
    fn test_bare_name_is_rewritten() {
        let stmt = rewritten("x");
        assert_eq!(
            stmt,
            Stmt::Expr(Expr::Attribute {
                base: "x".into(),
                attr: "out".into(),
            })
        );
    }

    #[test]
    fn test_subscript_target_is_rewritten() {
        let stmt = rewritten("x[-1]");
        match stmt {
            Stmt::Expr(Expr::Subscript { target, index }) => {
                assert_eq!(
                    *target,
                    Expr::Attribute {
                        base: "x".into(),
                        attr: "out".into(),
                    }
                );
                assert_eq!(index, -1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_operand_is_rewritten() {
        let stmt = rewritten("x + 1");
        match stmt {
            Stmt::Expr(Expr::Binary { left, .. }) => {
                assert_eq!(
                    *left,
                    Expr::Attribute {
                        base: "x".into(),
                        attr: "out".into(),
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_call_target_is_not_rewritten() {
        let stmt = rewritten("x.execute()");
        match stmt {
            Stmt::Expr(Expr::Call { callee, .. }) => {
                assert_eq!(
                    callee,
                    Callee::Method {
                        instance: "x".into(),
                        method: "execute".into(),
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_attribute_base_is_not_rewritten() {
        let stmt = rewritten("y.x");
        assert_eq!(
            stmt,
            Stmt::Expr(Expr::Attribute {
                base: "y".into(),
                attr: "x".into(),
            })
        );
    }

    #[test]
    fn test_assignment_target_is_not_rewritten() {
        let stmt = rewritten("x = 1");
        match stmt {
            Stmt::Assign { target, .. } => assert_eq!(target, "x"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_kwarg_value_is_rewritten() {
        let stmt = rewritten("v.execute(target_opening=s)");
        match stmt {
            Stmt::Expr(Expr::Call { args, .. }) => {
                assert_eq!(
                    args[0].value,
                    Expr::Attribute {
                        base: "s".into(),
                        attr: "out".into(),
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_variable_untouched() {
        let stmt = rewritten("v1 + 2");
        match stmt {
            Stmt::Expr(Expr::Binary { left, .. }) => {
                assert_eq!(*left, Expr::Name("v1".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
