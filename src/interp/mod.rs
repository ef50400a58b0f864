//! Restricted interpreter for server-relayed messages.
//!
//! A script is a sequence of statements separated by newlines or `;`.
//! Blank statements and statements starting with `#` are ignored.
//!
//! ```text
//! echo <text>          print text
//! calc <expr>          evaluate + - * / with parentheses and unary minus
//! solve <a> <op> <b>   apply one task operation
//! ```
//!
//! The whole script is parsed and checked against the limits below before
//! the first statement runs, so a script is either rejected outright or run
//! until it finishes or hits an evaluation error.

pub mod ast;
pub mod eval;
pub mod parse;

pub use eval::{Output, run};
pub use parse::parse;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub const MAX_SCRIPT_BYTES: usize = 4096;
pub const MAX_INSTRUCTIONS: usize = 64;
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpError {
    #[error("script is {len} bytes, limit is {MAX_SCRIPT_BYTES}")]
    TooLong { len: usize },
    #[error("script has more than {MAX_INSTRUCTIONS} instructions")]
    TooManyInstructions,
    #[error("line {line}: unknown instruction `{name}`")]
    UnknownInstruction { line: usize, name: String },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: expression nested deeper than {MAX_DEPTH}")]
    TooDeep { line: usize },
    #[error("line {line}: division by zero")]
    DivisionByZero { line: usize },
    #[error("line {line}: result is not a finite number")]
    NonFinite { line: usize },
}

/// Parse `source`, then run it.
///
/// # Errors
///
/// Any parse error rejects the script before anything runs. Evaluation
/// errors stop the run at the failing statement.
pub fn interpret(source: &str) -> Result<Vec<Output>, InterpError> {
    let script = parse(source)?;
    run(&script)
}
