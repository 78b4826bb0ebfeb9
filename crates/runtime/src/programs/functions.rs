//! Builtin stateless math functions
//!
//! Pure scalar functions callable from expressions: input scalars, output
//! scalar, no side effects, no hidden state.

use crate::registry::{DocEntry, FunctionError, ProgramRegistry};

fn expect_args(args: &[f64], expected: usize) -> Result<(), FunctionError> {
    if args.len() != expected {
        return Err(FunctionError::Arity {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn abs(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].abs())
}

fn sqrt(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    if args[0] < 0.0 {
        return Err(FunctionError::Domain(format!(
            "sqrt of negative number: {}",
            args[0]
        )));
    }
    Ok(args[0].sqrt())
}

fn sin(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].sin())
}

fn cos(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].cos())
}

fn tan(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].tan())
}

fn asin(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    if !(-1.0..=1.0).contains(&args[0]) {
        return Err(FunctionError::Domain(format!(
            "asin argument out of [-1, 1]: {}",
            args[0]
        )));
    }
    Ok(args[0].asin())
}

fn acos(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    if !(-1.0..=1.0).contains(&args[0]) {
        return Err(FunctionError::Domain(format!(
            "acos argument out of [-1, 1]: {}",
            args[0]
        )));
    }
    Ok(args[0].acos())
}

fn atan(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].atan())
}

fn log(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    if args[0] <= 0.0 {
        return Err(FunctionError::Domain(format!(
            "log of non-positive number: {}",
            args[0]
        )));
    }
    Ok(args[0].ln())
}

fn exp(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].exp())
}

fn floor(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].floor())
}

fn ceil(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 1)?;
    Ok(args[0].ceil())
}

fn min(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 2)?;
    Ok(args[0].min(args[1]))
}

fn max(args: &[f64]) -> Result<f64, FunctionError> {
    expect_args(args, 2)?;
    Ok(args[0].max(args[1]))
}

fn one_arg_table(meaning: &str) -> String {
    format!(
        "| 参数名 | 含义 | 类型 |\n|--------|------|------|\n| x | {meaning} | float |\n"
    )
}

fn two_arg_table(meaning: &str) -> String {
    format!(
        "| 参数名 | 含义 | 类型 |\n|--------|------|------|\n| a | {meaning} | float |\n| b | {meaning} | float |\n"
    )
}

/// Register the builtin function set with documentation entries.
pub fn register(registry: &mut ProgramRegistry) {
    registry.register_function(
        "abs",
        abs,
        DocEntry::new("abs", "绝对值", "# abs\n\n返回输入数值的绝对值。", one_arg_table("输入数值")),
    );
    registry.register_function(
        "sqrt",
        sqrt,
        DocEntry::new(
            "sqrt",
            "平方根",
            "# sqrt\n\n返回输入数值的平方根，输入必须 >= 0。",
            one_arg_table("输入数值（必须 >= 0）"),
        ),
    );
    registry.register_function(
        "sin",
        sin,
        DocEntry::new("sin", "正弦", "# sin\n\n正弦函数（弧度）。", one_arg_table("角度（弧度）")),
    );
    registry.register_function(
        "cos",
        cos,
        DocEntry::new("cos", "余弦", "# cos\n\n余弦函数（弧度）。", one_arg_table("角度（弧度）")),
    );
    registry.register_function(
        "tan",
        tan,
        DocEntry::new("tan", "正切", "# tan\n\n正切函数（弧度）。", one_arg_table("角度（弧度）")),
    );
    registry.register_function(
        "asin",
        asin,
        DocEntry::new(
            "asin",
            "反正弦",
            "# asin\n\n反正弦函数，输入范围 [-1, 1]。",
            one_arg_table("输入数值（[-1, 1]）"),
        ),
    );
    registry.register_function(
        "acos",
        acos,
        DocEntry::new(
            "acos",
            "反余弦",
            "# acos\n\n反余弦函数，输入范围 [-1, 1]。",
            one_arg_table("输入数值（[-1, 1]）"),
        ),
    );
    registry.register_function(
        "atan",
        atan,
        DocEntry::new("atan", "反正切", "# atan\n\n反正切函数。", one_arg_table("输入数值")),
    );
    registry.register_function(
        "log",
        log,
        DocEntry::new(
            "log",
            "自然对数",
            "# log\n\n自然对数，输入必须 > 0。",
            one_arg_table("输入数值（必须 > 0）"),
        ),
    );
    registry.register_function(
        "exp",
        exp,
        DocEntry::new("exp", "指数", "# exp\n\n自然指数函数 e^x。", one_arg_table("输入数值")),
    );
    registry.register_function(
        "floor",
        floor,
        DocEntry::new("floor", "向下取整", "# floor\n\n向下取整。", one_arg_table("输入数值")),
    );
    registry.register_function(
        "ceil",
        ceil,
        DocEntry::new("ceil", "向上取整", "# ceil\n\n向上取整。", one_arg_table("输入数值")),
    );
    registry.register_function(
        "min",
        min,
        DocEntry::new("min", "最小值", "# min\n\n返回两个数中较小的一个。", two_arg_table("输入数值")),
    );
    registry.register_function(
        "max",
        max,
        DocEntry::new("max", "最大值", "# max\n\n返回两个数中较大的一个。", two_arg_table("输入数值")),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains() {
        assert!(sqrt(&[-1.0]).is_err());
        assert!(log(&[0.0]).is_err());
        assert!(asin(&[1.5]).is_err());
        assert_eq!(abs(&[-3.0]).unwrap(), 3.0);
        assert_eq!(min(&[2.0, 5.0]).unwrap(), 2.0);
        assert_eq!(max(&[2.0, 5.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_arity() {
        assert!(sin(&[]).is_err());
        assert!(min(&[1.0]).is_err());
        assert!(abs(&[1.0, 2.0]).is_err());
    }
}
