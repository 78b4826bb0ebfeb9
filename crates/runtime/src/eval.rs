//! Expression evaluation
//!
//! A tree interpreter over the parsed expression AST, bound to the
//! variable store, the live instance map and the function registry for
//! the duration of one evaluation. No ambient names exist: every name
//! resolves through the store, every attribute store-first then through
//! the live instance, every call through the registry.

use procsim_dsl::{BinaryOp, CallArg, Callee, Expr, ExpressionError, Stmt, UnaryOp};

use crate::program::InstanceMap;
use crate::registry::{FunctionError, ProgramRegistry};
use crate::storage::VariableStore;

/// Default for reads that precede start-of-time.
const LAG_DEFAULT: f64 = 0.0;

/// One-shot evaluator bound to the current cycle's state.
pub struct Evaluator<'a> {
    store: &'a VariableStore,
    instances: &'a InstanceMap,
    registry: &'a ProgramRegistry,
    /// Original expression text, carried into every error.
    source: &'a str,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        store: &'a VariableStore,
        instances: &'a InstanceMap,
        registry: &'a ProgramRegistry,
        source: &'a str,
    ) -> Self {
        Self {
            store,
            instances,
            registry,
            source,
        }
    }

    /// Evaluate a statement's value expression (the right-hand side of an
    /// assignment, or the expression itself).
    pub fn evaluate(&self, stmt: &Stmt) -> Result<f64, ExpressionError> {
        self.eval_expr(stmt.value())
    }

    pub fn eval_expr(&self, expr: &Expr) -> Result<f64, ExpressionError> {
        match expr {
            Expr::Number(n) => Ok(*n),
            Expr::Name(name) => self.eval_name(name),
            Expr::Attribute { base, attr } => self.eval_attribute(base, attr),
            Expr::Subscript { target, index } => self.eval_subscript(target, *index),
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Pos => value,
                })
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.eval_binary(*op, l, r)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
        }
    }

    fn eval_name(&self, name: &str) -> Result<f64, ExpressionError> {
        if self.registry.has_function(name) {
            return Err(ExpressionError::type_mismatch(
                self.source,
                format!("function `{name}` used as a value"),
            ));
        }
        Ok(self.store.get(name).unwrap_or(LAG_DEFAULT))
    }

    fn eval_attribute(&self, base: &str, attr: &str) -> Result<f64, ExpressionError> {
        let Some(instance) = self.instances.get(base) else {
            return Err(ExpressionError::evaluation(
                self.source,
                format!("`{base}` is not an instance, cannot read `.{attr}`"),
            ));
        };
        let key = format!("{base}.{attr}");
        if let Some(value) = self.store.get(&key) {
            return Ok(value);
        }
        instance.attribute(attr).ok_or_else(|| {
            ExpressionError::name(
                self.source,
                format!("instance `{base}` has no attribute `{attr}`"),
            )
        })
    }

    fn eval_subscript(&self, target: &Expr, index: i64) -> Result<f64, ExpressionError> {
        let lag = -index;
        if lag < 0 {
            return Err(ExpressionError::evaluation(
                self.source,
                format!("subscript [{index}] is not a lag access"),
            ));
        }
        let key = match target {
            Expr::Name(name) => name.clone(),
            Expr::Attribute { base, attr } => {
                if !self.instances.contains_key(base) {
                    return Err(ExpressionError::evaluation(
                        self.source,
                        format!("`{base}` is not an instance, cannot read `.{attr}`"),
                    ));
                }
                format!("{base}.{attr}")
            }
            _ => {
                return Err(ExpressionError::evaluation(
                    self.source,
                    "subscript target must be a name or attribute",
                ))
            }
        };
        Ok(self.store.get_with_lag(&key, lag as usize, LAG_DEFAULT))
    }

    fn eval_binary(&self, op: BinaryOp, l: f64, r: f64) -> Result<f64, ExpressionError> {
        match op {
            BinaryOp::Add => Ok(l + r),
            BinaryOp::Sub => Ok(l - r),
            BinaryOp::Mul => Ok(l * r),
            BinaryOp::Div => {
                if r == 0.0 {
                    Err(self.division_by_zero(op))
                } else {
                    Ok(l / r)
                }
            }
            BinaryOp::FloorDiv => {
                if r == 0.0 {
                    Err(self.division_by_zero(op))
                } else {
                    Ok((l / r).floor())
                }
            }
            BinaryOp::Mod => {
                if r == 0.0 {
                    Err(self.division_by_zero(op))
                } else {
                    Ok(l.rem_euclid(r))
                }
            }
            BinaryOp::Pow => Ok(l.powf(r)),
        }
    }

    fn division_by_zero(&self, op: BinaryOp) -> ExpressionError {
        ExpressionError::arithmetic(self.source, format!("division by zero in `{op}`"))
    }

    fn eval_call(&self, callee: &Callee, args: &[CallArg]) -> Result<f64, ExpressionError> {
        match callee {
            Callee::Function(name) => {
                let Some(entry) = self.registry.function(name) else {
                    return Err(ExpressionError::name(
                        self.source,
                        format!("unknown function `{name}`"),
                    ));
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    if let Some(keyword) = &arg.keyword {
                        return Err(ExpressionError::type_mismatch(
                            self.source,
                            format!("function `{name}` does not accept keyword argument `{keyword}`"),
                        ));
                    }
                    values.push(self.eval_expr(&arg.value)?);
                }
                (entry.call)(&values).map_err(|e| match e {
                    FunctionError::Arity { .. } => ExpressionError::type_mismatch(
                        self.source,
                        format!("function `{name}`: {e}"),
                    ),
                    FunctionError::Domain(_) => ExpressionError::evaluation(
                        self.source,
                        format!("function `{name}`: {e}"),
                    ),
                })
            }
            Callee::Method { instance, method } => Err(ExpressionError::evaluation(
                self.source,
                format!("`{instance}.{method}(...)` does not produce a value"),
            )),
        }
    }
}
