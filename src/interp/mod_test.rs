//! Tests for the message interpreter.

use super::ast::{Expr, Instruction};
use super::*;
use crate::net::types::Operation;

// =============================================================================
// PARSER TESTS
// =============================================================================

#[test]
fn parse_lines_semicolons_and_comments() {
    let script = parse(
        "# greeting\n\
         echo hello ; calc 1 + 2\n\
         \n\
         solve 12 / 3",
    )
    .unwrap();
    let lines: Vec<usize> = script.statements.iter().map(|s| s.line).collect();
    assert_eq!(lines, vec![2, 2, 4]);
    assert_eq!(script.statements[0].instruction, Instruction::Echo("hello".into()));
    assert_eq!(
        script.statements[2].instruction,
        Instruction::Solve { a: 12.0, operation: Operation::Divide, b: 3.0 }
    );
}

#[test]
fn parse_respects_precedence() {
    let script = parse("calc 1 + 2 * 3").unwrap();
    let Instruction::Calc(Expr::Binary { operation, rhs, .. }) = &script.statements[0].instruction else {
        panic!("expected binary calc");
    };
    assert_eq!(*operation, Operation::Add);
    assert!(matches!(**rhs, Expr::Binary { operation: Operation::Multiply, .. }));
}

#[test]
fn instruction_names_are_case_insensitive() {
    assert!(parse("ECHO hi\nCalc 1").is_ok());
}

#[test]
fn empty_script_parses_to_nothing() {
    assert!(parse("  \n# only a comment\n;;").unwrap().statements.is_empty());
}

#[test]
fn unknown_instruction_rejects_whole_script() {
    let err = parse("echo first\neval(alert(1))").unwrap_err();
    assert_eq!(err, InterpError::UnknownInstruction { line: 2, name: "eval(alert(1))".into() });
}

#[test]
fn calc_syntax_errors() {
    for source in ["calc", "calc 1 +", "calc (1 + 2", "calc 1 2", "calc 2 ^ 3", "calc 1..2", "calc )"] {
        assert!(matches!(parse(source), Err(InterpError::Syntax { line: 1, .. })), "{source}");
    }
}

#[test]
fn solve_syntax_errors() {
    for source in ["solve 1 +", "solve 1 % 2", "solve a + 2", "solve 1 + 2 + 3"] {
        assert!(matches!(parse(source), Err(InterpError::Syntax { .. })), "{source}");
    }
}

// =============================================================================
// LIMITS
// =============================================================================

#[test]
fn script_over_byte_limit_is_rejected() {
    let source = format!("echo {}", "a".repeat(MAX_SCRIPT_BYTES));
    assert_eq!(parse(&source), Err(InterpError::TooLong { len: source.len() }));
}

#[test]
fn instruction_limit_is_inclusive() {
    let at_limit = vec!["echo x"; MAX_INSTRUCTIONS].join("\n");
    assert_eq!(parse(&at_limit).unwrap().statements.len(), MAX_INSTRUCTIONS);

    let over = vec!["echo x"; MAX_INSTRUCTIONS + 1].join(";");
    assert_eq!(parse(&over), Err(InterpError::TooManyInstructions));
}

#[test]
fn nesting_limit() {
    let nested = |n: usize| format!("calc {}1{}", "(".repeat(n), ")".repeat(n));
    assert!(parse(&nested(MAX_DEPTH)).is_ok());
    assert_eq!(parse(&nested(MAX_DEPTH + 1)), Err(InterpError::TooDeep { line: 1 }));

    let negated = format!("calc {}1", "-".repeat(MAX_DEPTH + 1));
    assert_eq!(parse(&negated), Err(InterpError::TooDeep { line: 1 }));
}

// =============================================================================
// EVALUATION TESTS
// =============================================================================

#[test]
fn interpret_runs_every_instruction() {
    let outputs = interpret("echo task done; calc -(2 + 3) * 2; solve 7 - 10; calc 7 / 2").unwrap();
    assert_eq!(
        outputs,
        vec![Output::Text("task done".into()), Output::Number(-10.0), Output::Number(-3.0), Output::Number(3.5)]
    );
}

#[test]
fn division_by_zero_aborts_at_its_line() {
    assert_eq!(interpret("echo a\ncalc 1 / (2 - 2)"), Err(InterpError::DivisionByZero { line: 2 }));
    assert_eq!(interpret("solve 4 / 0"), Err(InterpError::DivisionByZero { line: 1 }));
}

#[test]
fn overflow_is_non_finite() {
    let huge = format!("calc {0} * {0} * {0}", "1".repeat(200));
    assert_eq!(interpret(&huge), Err(InterpError::NonFinite { line: 1 }));
}

#[test]
fn parse_error_runs_nothing() {
    // The first line is valid, but the bad second line rejects the script
    // before evaluation, so the division by zero on line 1 is never reached.
    assert!(matches!(interpret("calc 1/0\nrm -rf /"), Err(InterpError::UnknownInstruction { line: 2, .. })));
}

#[test]
fn output_display() {
    assert_eq!(Output::Number(5.0).to_string(), "5");
    assert_eq!(Output::Number(2.5).to_string(), "2.5");
    assert_eq!(Output::Text("hi".into()).to_string(), "hi");
}
