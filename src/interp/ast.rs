//! AST types for interpreter scripts.

use crate::net::types::Operation;

/// A parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
}

/// One instruction with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line: usize,
    pub instruction: Instruction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `echo <text>`
    Echo(String),
    /// `calc <expr>`
    Calc(Expr),
    /// `solve <a> <op> <b>`
    Solve { a: f64, operation: Operation, b: f64 },
}

/// Arithmetic expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary { operation: Operation, lhs: Box<Expr>, rhs: Box<Expr> },
}
