//! Lag-requirement extraction
//!
//! Scans parsed statements for `x[-k]` subscripts and records, per store
//! key, the deepest history any expression reaches into. The loader sizes
//! the per-name ring buffers from this map. Run after the instance-name
//! rewrite so that `sensor[-30]` is seen as `sensor.out[-30]`.

use indexmap::IndexMap;

use crate::ast::{Expr, Stmt};

/// Record the maximum lag per store key found in `stmt` into `out`.
///
/// Only negative literal subscripts contribute; `x[0]` reads the current
/// value and needs no history.
pub fn collect_lag_requirements(stmt: &Stmt, out: &mut IndexMap<String, u32>) {
    walk(stmt.value(), out);
}

fn walk(expr: &Expr, out: &mut IndexMap<String, u32>) {
    match expr {
        Expr::Subscript { target, index } => {
            if *index < 0 {
                if let Some(key) = store_key(target) {
                    let lag = index.unsigned_abs().min(u32::MAX as u64) as u32;
                    let entry = out.entry(key).or_insert(0);
                    if lag > *entry {
                        *entry = lag;
                    }
                }
            }
        }
        Expr::Unary { operand, .. } => walk(operand, out),
        Expr::Binary { left, right, .. } => {
            walk(left, out);
            walk(right, out);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                walk(&arg.value, out);
            }
        }
        Expr::Number(_) | Expr::Name(_) | Expr::Attribute { .. } => {}
    }
}

fn store_key(target: &Expr) -> Option<String> {
    match target {
        Expr::Name(name) => Some(name.clone()),
        Expr::Attribute { base, attr } => Some(format!("{base}.{attr}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;
    use crate::rewrite::rewrite_instance_outputs;

    fn lags_of(src: &str, instances: &[&str]) -> IndexMap<String, u32> {
        let mut stmt = parse_statement(src).unwrap();
        let names: Vec<String> = instances.iter().map(|s| s.to_string()).collect();
        rewrite_instance_outputs(&mut stmt, &|n| names.iter().any(|i| i == n));
        let mut out = IndexMap::new();
        collect_lag_requirements(&stmt, &mut out);
        out
    }

    #[test]
    fn test_variable_lag() {
        let lags = lags_of("d = r[-3]", &[]);
        assert_eq!(lags.get("r"), Some(&3));
    }

    #[test]
    fn test_instance_lag_uses_out_key() {
        let lags = lags_of("d = r[-3]", &["r"]);
        assert_eq!(lags.get("r.out"), Some(&3));
        assert_eq!(lags.get("r"), None);
    }

    #[test]
    fn test_attribute_lag() {
        let lags = lags_of("y = pid1.mv[-10] + v1[-30]", &[]);
        assert_eq!(lags.get("pid1.mv"), Some(&10));
        assert_eq!(lags.get("v1"), Some(&30));
    }

    #[test]
    fn test_max_wins() {
        let lags = lags_of("y = a[-2] + a[-7] * a[-5]", &[]);
        assert_eq!(lags.get("a"), Some(&7));
    }

    #[test]
    fn test_kwarg_subexpressions_are_scanned() {
        let lags = lags_of("pid1.execute(PV=tank1.level[-4])", &[]);
        assert_eq!(lags.get("tank1.level"), Some(&4));
    }

    #[test]
    fn test_nonnegative_subscript_needs_no_history() {
        let lags = lags_of("y = a[0]", &[]);
        assert!(lags.is_empty());
    }
}
