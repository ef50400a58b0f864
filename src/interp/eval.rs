//! Evaluation of parsed scripts.

use std::fmt;

use super::InterpError;
use super::ast::{Expr, Instruction, Script};
use crate::net::types::Operation;

/// Output of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Number(f64),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Run every statement in order.
///
/// # Errors
///
/// Stops at the first statement that divides by zero or overflows.
pub fn run(script: &Script) -> Result<Vec<Output>, InterpError> {
    let mut outputs = Vec::with_capacity(script.statements.len());
    for statement in &script.statements {
        let line = statement.line;
        let output = match &statement.instruction {
            Instruction::Echo(text) => Output::Text(text.clone()),
            Instruction::Calc(expr) => Output::Number(eval(expr, line)?),
            Instruction::Solve { a, operation, b } => Output::Number(apply(*operation, *a, *b, line)?),
        };
        outputs.push(output);
    }
    Ok(outputs)
}

/// Evaluate an expression tree.
///
/// # Errors
///
/// [`InterpError::DivisionByZero`] and [`InterpError::NonFinite`].
pub fn eval(expr: &Expr, line: usize) -> Result<f64, InterpError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Neg(inner) => Ok(-eval(inner, line)?),
        Expr::Binary { operation, lhs, rhs } => apply(*operation, eval(lhs, line)?, eval(rhs, line)?, line),
    }
}

fn apply(operation: Operation, a: f64, b: f64, line: usize) -> Result<f64, InterpError> {
    let value = match operation {
        Operation::Add => a + b,
        Operation::Subtract => a - b,
        Operation::Multiply => a * b,
        Operation::Divide if b == 0.0 => return Err(InterpError::DivisionByZero { line }),
        Operation::Divide => a / b,
    };
    if !value.is_finite() {
        return Err(InterpError::NonFinite { line });
    }
    Ok(value)
}
