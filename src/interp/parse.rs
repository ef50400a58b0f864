//! Recursive descent parser for interpreter scripts.

use super::ast::{Expr, Instruction, Script, Statement};
use super::{InterpError, MAX_DEPTH, MAX_INSTRUCTIONS, MAX_SCRIPT_BYTES};
use crate::net::types::Operation;

/// Parse a whole script, enforcing size and instruction limits.
///
/// # Errors
///
/// Returns the first [`InterpError`] found. Nothing is partially accepted.
pub fn parse(source: &str) -> Result<Script, InterpError> {
    if source.len() > MAX_SCRIPT_BYTES {
        return Err(InterpError::TooLong { len: source.len() });
    }

    let mut statements = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        for text in raw_line.split(';').map(str::trim) {
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            if statements.len() == MAX_INSTRUCTIONS {
                return Err(InterpError::TooManyInstructions);
            }
            let instruction = parse_instruction(text, line)?;
            statements.push(Statement { line, instruction });
        }
    }

    Ok(Script { statements })
}

fn parse_instruction(text: &str, line: usize) -> Result<Instruction, InterpError> {
    let (name, rest) = text.split_once(char::is_whitespace).map_or((text, ""), |(n, r)| (n, r.trim()));

    match name.to_ascii_lowercase().as_str() {
        "echo" => Ok(Instruction::Echo(rest.to_owned())),
        "calc" => {
            if rest.is_empty() {
                return Err(syntax(line, "calc needs an expression"));
            }
            parse_expr(rest, line).map(Instruction::Calc)
        }
        "solve" => parse_solve(rest, line),
        _ => Err(InterpError::UnknownInstruction { line, name: name.to_owned() }),
    }
}

fn parse_solve(rest: &str, line: usize) -> Result<Instruction, InterpError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [a, op, b] = parts.as_slice() else {
        return Err(syntax(line, "expected `solve <a> <op> <b>`"));
    };
    let operation = Operation::from_symbol(op).ok_or_else(|| syntax(line, &format!("unknown operator `{op}`")))?;
    Ok(Instruction::Solve { a: parse_number(a, line)?, operation, b: parse_number(b, line)? })
}

fn parse_number(text: &str, line: usize) -> Result<f64, InterpError> {
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(syntax(line, &format!("invalid number `{text}`"))),
    }
}

fn syntax(line: usize, message: &str) -> InterpError {
    InterpError::Syntax { line, message: message.to_owned() }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(Operation),
    LParen,
    RParen,
}

/// Parse a `calc` expression.
///
/// # Errors
///
/// [`InterpError::Syntax`] for malformed input, [`InterpError::TooDeep`]
/// past the nesting limit.
pub fn parse_expr(text: &str, line: usize) -> Result<Expr, InterpError> {
    let tokens = tokenize(text, line)?;
    let mut parser = ExprParser { tokens: &tokens, pos: 0, line };
    let expr = parser.expr(0)?;
    if let Some(token) = parser.peek() {
        return Err(syntax(line, &format!("unexpected {token:?} after expression")));
    }
    Ok(expr)
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Token>, InterpError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '+' | '-' | '*' | '/' => {
                let op = Operation::from_symbol(&text[start..start + 1])
                    .ok_or_else(|| syntax(line, &format!("unexpected `{c}`")))?;
                tokens.push(Token::Op(op));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + 1;
                while let Some(&(idx, next)) = chars.peek() {
                    if !(next.is_ascii_digit() || next == '.') {
                        break;
                    }
                    end = idx + 1;
                    chars.next();
                }
                tokens.push(Token::Number(parse_number(&text[start..end], line)?));
            }
            other => return Err(syntax(line, &format!("unexpected `{other}`"))),
        }
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn enter(&self, depth: usize) -> Result<(), InterpError> {
        if depth > MAX_DEPTH {
            return Err(InterpError::TooDeep { line: self.line });
        }
        Ok(())
    }

    /// expr := term (('+' | '-') term)*
    fn expr(&mut self, depth: usize) -> Result<Expr, InterpError> {
        self.enter(depth)?;
        let mut lhs = self.term(depth)?;
        while let Some(Token::Op(operation @ (Operation::Add | Operation::Subtract))) = self.peek() {
            self.pos += 1;
            let rhs = self.term(depth)?;
            lhs = Expr::Binary { operation, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    /// term := unary (('*' | '/') unary)*
    fn term(&mut self, depth: usize) -> Result<Expr, InterpError> {
        let mut lhs = self.unary(depth)?;
        while let Some(Token::Op(operation @ (Operation::Multiply | Operation::Divide))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary(depth)?;
            lhs = Expr::Binary { operation, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    /// unary := '-' unary | primary
    fn unary(&mut self, depth: usize) -> Result<Expr, InterpError> {
        self.enter(depth)?;
        if self.peek() == Some(Token::Op(Operation::Subtract)) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary(depth + 1)?)));
        }
        self.primary(depth)
    }

    /// primary := number | '(' expr ')'
    fn primary(&mut self, depth: usize) -> Result<Expr, InterpError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.expr(depth + 1)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(syntax(self.line, "missing `)`")),
                }
            }
            Some(token) => Err(syntax(self.line, &format!("unexpected {token:?}"))),
            None => Err(syntax(self.line, "unexpected end of expression")),
        }
    }
}
