//! Abstract syntax tree produced by [`crate::parse`].
//!
//! Every node is wrapped in a [`Tagged`] carrying the span of source text it
//! was parsed from, so that evaluation errors can point back at the code.

use crate::error::Tagged;
use crate::types::{BinOp, Key};
use crate::wrappers::OrderedMap;


/// A numeric literal. The lexical form decides which variant is produced:
/// anything with a decimal point or an exponent is a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}


/// An expression: anything that may appear as a statement or as the operand
/// of another expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(Number),

    /// String literal with escapes already resolved.
    String(String),

    /// `list(a, b, ...)`
    Array(Vec<Tagged<Expr>>),

    /// `$[a: x, b: y, ...]`
    ///
    /// Duplicate keys are collapsed by the parser: the key keeps its first
    /// position and the last value.
    Dictionary(OrderedMap<Key, Tagged<Expr>>),

    /// Reference to a let-bound name.
    Variable(Key),

    /// `let name = value`, which evaluates to the bound value.
    Let {
        name: Tagged<Key>,
        value: Box<Tagged<Expr>>,
    },

    /// A binary operator applied to two operands.
    BinOp {
        left: Box<Tagged<Expr>>,
        op: Tagged<BinOp>,
        right: Box<Tagged<Expr>>,
    },

    /// A call to a builtin function.
    FunctionCall {
        name: Tagged<Key>,
        args: Vec<Tagged<Expr>>,
    },
}

impl Expr {
    pub fn integer(value: i64) -> Expr {
        Expr::Number(Number::Integer(value))
    }

    pub fn float(value: f64) -> Expr {
        Expr::Number(Number::Float(value))
    }
}


/// A whole source text: statements in program order.
///
/// The value of a program is the value of its last statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Tagged<Expr>>,
}
