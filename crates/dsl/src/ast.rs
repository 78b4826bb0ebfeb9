//! Abstract syntax tree for program expressions
//!
//! The grammar is deliberately flat: attribute bases, call targets and
//! assignment targets are plain identifiers, never nested expressions.
//! That shape makes the whitelist structural: anything the engine must
//! reject cannot be represented here in the first place.

use std::fmt;

/// A top-level statement: either a pure-variable assignment or a bare
/// expression (the `name.execute(...)` form of algorithm items parses as
/// a bare method-call expression).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`
    Assign { target: String, value: Expr },
    /// A bare expression.
    Expr(Expr),
}

impl Stmt {
    /// The value expression: the right-hand side of an assignment, or the
    /// expression itself.
    pub fn value(&self) -> &Expr {
        match self {
            Stmt::Assign { value, .. } => value,
            Stmt::Expr(expr) => expr,
        }
    }

    pub fn value_mut(&mut self) -> &mut Expr {
        match self {
            Stmt::Assign { value, .. } => value,
            Stmt::Expr(expr) => expr,
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// Bare name (variable or, before the rewrite pass, an instance)
    Name(String),

    /// Single-dot attribute access: `instance.attribute`
    Attribute { base: String, attr: String },

    /// Lag access: `x[-3]`, `tank.level[-10]`. The target is restricted
    /// to a name or attribute by the grammar; the index is the literal
    /// subscript as written (negative for lag access).
    Subscript { target: Box<Expr>, index: i64 },

    /// Unary operation: `-a`, `+a`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation: `a + b`, `a ** b`, ...
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Function or method call with positional and keyword arguments
    Call { callee: Callee, args: Vec<CallArg> },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// What a call dispatches on
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// `sqrt(...)`, a registered stateless function
    Function(String),
    /// `pid1.execute(...)`, the only admitted attribute call
    Method { instance: String, method: String },
}

/// One call argument, keyword or positional
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub keyword: Option<String>,
    pub value: Expr,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        };
        write!(f, "{s}")
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}
