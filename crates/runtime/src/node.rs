//! Program nodes
//!
//! One node per program item, stepped in declared order each cycle.
//! Algorithm and variable items differ only in their per-cycle behavior,
//! so a node is a sum type dispatched by a single `step`.

use procsim_dsl::{Expr, ExpressionError};
use tracing::trace;

use crate::eval::Evaluator;
use crate::program::{Inputs, InstanceMap};
use crate::registry::ProgramRegistry;
use crate::storage::VariableStore;
use crate::types::VarKey;

/// A dependency-ordered program node.
#[derive(Debug)]
pub enum Node {
    Algorithm(AlgorithmNode),
    Expression(ExpressionNode),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Algorithm(n) => &n.instance_name,
            Node::Expression(n) => &n.name,
        }
    }

    /// Advance this node one cycle against the shared store.
    pub fn step(
        &self,
        store: &mut VariableStore,
        instances: &mut InstanceMap,
        registry: &ProgramRegistry,
    ) -> Result<(), ExpressionError> {
        match self {
            Node::Algorithm(n) => n.step(store, instances, registry),
            Node::Expression(n) => n.step(store, instances, registry),
        }
    }
}

/// Binds an algorithm instance to its `name.execute(...)` expression.
/// The keyword-argument sub-expressions are extracted at load time; the
/// per-cycle hot path only evaluates them.
#[derive(Debug)]
pub struct AlgorithmNode {
    pub(crate) instance_name: String,
    pub(crate) expression: String,
    pub(crate) kwargs: Vec<(String, Expr)>,
}

impl AlgorithmNode {
    pub fn new(instance_name: String, expression: String, kwargs: Vec<(String, Expr)>) -> Self {
        Self {
            instance_name,
            expression,
            kwargs,
        }
    }

    fn step(
        &self,
        store: &mut VariableStore,
        instances: &mut InstanceMap,
        registry: &ProgramRegistry,
    ) -> Result<(), ExpressionError> {
        let mut resolved = Inputs::with_capacity(self.kwargs.len());
        {
            let evaluator = Evaluator::new(store, instances, registry, &self.expression);
            for (keyword, expr) in &self.kwargs {
                resolved.insert(keyword.clone(), evaluator.eval_expr(expr)?);
            }
        }

        let instance = instances.get_mut(&self.instance_name).ok_or_else(|| {
            ExpressionError::name(
                &self.expression,
                format!("unknown instance `{}`", self.instance_name),
            )
        })?;

        instance
            .execute(&resolved)
            .map_err(|e| ExpressionError::type_mismatch(&self.expression, e.to_string()))?;

        for attr in instance.stored_attributes() {
            if let Some(value) = instance.attribute(attr) {
                let key = VarKey::attribute(&self.instance_name, attr);
                trace!(key = %key, value, "attribute persisted");
                store.set(key.as_str(), value);
            }
        }
        Ok(())
    }
}

/// Binds a pure-variable assignment; the right-hand side is evaluated and
/// the result persisted under the variable's name.
#[derive(Debug)]
pub struct ExpressionNode {
    pub(crate) name: String,
    pub(crate) expression: String,
    pub(crate) rhs: Expr,
}

impl ExpressionNode {
    pub fn new(name: String, expression: String, rhs: Expr) -> Self {
        Self {
            name,
            expression,
            rhs,
        }
    }

    fn step(
        &self,
        store: &mut VariableStore,
        instances: &mut InstanceMap,
        registry: &ProgramRegistry,
    ) -> Result<(), ExpressionError> {
        let value = {
            let evaluator = Evaluator::new(store, instances, registry, &self.expression);
            evaluator.eval_expr(&self.rhs)?
        };
        if !value.is_finite() {
            return Err(ExpressionError::evaluation(
                &self.expression,
                format!("non-finite result: {value}"),
            ));
        }
        trace!(name = %self.name, value, "variable resolved");
        store.set(&self.name, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procsim_dsl::parse_statement;

    fn rhs_of(src: &str) -> Expr {
        match parse_statement(src).unwrap() {
            procsim_dsl::Stmt::Assign { value, .. } => value,
            procsim_dsl::Stmt::Expr(e) => e,
        }
    }

    #[test]
    fn test_expression_node_persists() {
        let registry = ProgramRegistry::builtin();
        let mut store = VariableStore::new();
        let mut instances = InstanceMap::new();
        store.set("a", 4.0);

        let node = ExpressionNode::new("b".to_string(), "b = sqrt(a)".to_string(), rhs_of("b = sqrt(a)"));
        node.step(&mut store, &mut instances, &registry).unwrap();
        assert_eq!(store.get("b"), Some(2.0));
    }

    #[test]
    fn test_non_finite_result_rejected() {
        let registry = ProgramRegistry::builtin();
        let mut store = VariableStore::new();
        let mut instances = InstanceMap::new();

        let node = ExpressionNode::new(
            "b".to_string(),
            "b = 10 ** 400".to_string(),
            rhs_of("b = 10 ** 400"),
        );
        let err = node.step(&mut store, &mut instances, &registry).unwrap_err();
        assert_eq!(err.kind, procsim_dsl::ExpressionErrorKind::Evaluation);
        assert_eq!(store.get("b"), None);
    }
}
