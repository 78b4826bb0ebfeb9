//! Expression parser
//!
//! Chumsky combinators over the raw source string. Precedence, tightest
//! first: `**` (right-associative), unary `+ -`, `* / // %`, binary `+ -`.
//! Call and subscript trailers attach only to identifiers and single-dot
//! attributes, so the dot never gains further structure.

use chumsky::prelude::*;

use crate::ast::{BinaryOp, CallArg, Callee, Expr, Stmt, UnaryOp};
use crate::error::ExpressionError;

/// Parse error type
pub type ParseError<'src> = Rich<'src, char>;

/// Parse a single program statement: `name = expr` or a bare expression.
///
/// The whole input must be consumed; anything outside the admitted
/// grammar is a syntax error carrying the original text.
pub fn parse_statement(source: &str) -> Result<Stmt, ExpressionError> {
    statement().parse(source).into_result().map_err(|errors| {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        ExpressionError::syntax(source, message)
    })
}

/// Whitespace padding
fn ws<'src>() -> impl Parser<'src, &'src str, (), extra::Err<ParseError<'src>>> + Clone {
    text::whitespace().ignored()
}

/// Identifier
fn ident<'src>() -> impl Parser<'src, &'src str, String, extra::Err<ParseError<'src>>> + Clone {
    text::ascii::ident().map(|s: &str| s.to_string())
}

/// Numeric literal (integer, decimal, scientific notation)
fn number<'src>() -> impl Parser<'src, &'src str, f64, extra::Err<ParseError<'src>>> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .then(just('.').then(text::digits(10)).or_not())
        .then(
            one_of("eE")
                .then(one_of("+-").or_not())
                .then(text::digits(10))
                .or_not(),
        )
        .to_slice()
        .map(|s: &str| s.parse().unwrap_or(0.0))
}

/// Literal subscript index: a decimal integer with optional leading minus
fn subscript_index<'src>() -> impl Parser<'src, &'src str, i64, extra::Err<ParseError<'src>>> + Clone
{
    just('-')
        .or_not()
        .then(text::int(10))
        .to_slice()
        .map(|s: &str| s.parse().unwrap_or(0))
}

/// Trailer attached to a (possibly dotted) name
enum Trailer {
    Call(Vec<CallArg>),
    Subscript(i64),
}

/// Expression parser
fn expr<'src>() -> impl Parser<'src, &'src str, Expr, extra::Err<ParseError<'src>>> + Clone {
    recursive(|expr| {
        let kwarg = ident()
            .padded_by(ws())
            .then_ignore(just('='))
            .then(expr.clone())
            .map(|(keyword, value)| CallArg {
                keyword: Some(keyword),
                value,
            });

        let posarg = expr.clone().map(|value| CallArg {
            keyword: None,
            value,
        });

        let arg_list = just('(')
            .ignore_then(
                choice((kwarg, posarg))
                    .separated_by(just(','))
                    .collect::<Vec<_>>(),
            )
            .then_ignore(ws())
            .then_ignore(just(')'));

        let subscript = just('[')
            .ignore_then(subscript_index().padded_by(ws()))
            .then_ignore(just(']'));

        let name_term = ident()
            .then(just('.').padded_by(ws()).ignore_then(ident()).or_not())
            .then(
                ws().ignore_then(choice((
                    arg_list.map(Trailer::Call),
                    subscript.map(Trailer::Subscript),
                )))
                .or_not(),
            )
            .map(|((base, attr), trailer)| match (attr, trailer) {
                (None, None) => Expr::Name(base),
                (Some(attr), None) => Expr::Attribute { base, attr },
                (None, Some(Trailer::Call(args))) => Expr::Call {
                    callee: Callee::Function(base),
                    args,
                },
                (Some(method), Some(Trailer::Call(args))) => Expr::Call {
                    callee: Callee::Method {
                        instance: base,
                        method,
                    },
                    args,
                },
                (None, Some(Trailer::Subscript(index))) => Expr::Subscript {
                    target: Box::new(Expr::Name(base)),
                    index,
                },
                (Some(attr), Some(Trailer::Subscript(index))) => Expr::Subscript {
                    target: Box::new(Expr::Attribute { base, attr }),
                    index,
                },
            });

        let atom = choice((
            number().map(Expr::Number),
            expr.clone()
                .padded_by(ws())
                .delimited_by(just('('), just(')')),
            name_term,
        ))
        .padded_by(ws());

        // Exponent operand admits its own leading minus: 2 ** -3
        let exponent = just('-')
            .padded_by(ws())
            .repeated()
            .foldr(atom.clone(), |_, operand| Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });

        // Right-associative power chain: a ** b ** c = a ** (b ** c)
        let power = atom
            .clone()
            .then(
                just("**")
                    .padded_by(ws())
                    .ignore_then(exponent)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, mut rest)| match rest.pop() {
                None => first,
                Some(last) => {
                    let tail = rest
                        .into_iter()
                        .rev()
                        .fold(last, |acc, e| Expr::binary(BinaryOp::Pow, e, acc));
                    Expr::binary(BinaryOp::Pow, first, tail)
                }
            });

        let unary = choice((just('-').to(UnaryOp::Neg), just('+').to(UnaryOp::Pos)))
            .padded_by(ws())
            .repeated()
            .foldr(power, |op, operand| Expr::Unary {
                op,
                operand: Box::new(operand),
            });

        let product = unary.clone().foldl(
            choice((
                just("//").to(BinaryOp::FloorDiv),
                just('*').to(BinaryOp::Mul),
                just('/').to(BinaryOp::Div),
                just('%').to(BinaryOp::Mod),
            ))
            .padded_by(ws())
            .then(unary)
            .repeated(),
            |left, (op, right)| Expr::binary(op, left, right),
        );

        product.clone().foldl(
            choice((just('+').to(BinaryOp::Add), just('-').to(BinaryOp::Sub)))
                .padded_by(ws())
                .then(product)
                .repeated(),
            |left, (op, right)| Expr::binary(op, left, right),
        )
    })
}

/// Statement parser: assignment or bare expression, whole input
fn statement<'src>() -> impl Parser<'src, &'src str, Stmt, extra::Err<ParseError<'src>>> {
    let assign = ident()
        .padded_by(ws())
        .then_ignore(just('='))
        .then(expr())
        .map(|(target, value)| Stmt::Assign { target, value });

    choice((assign, expr().map(Stmt::Expr)))
        .padded_by(ws())
        .then_ignore(end())
}
