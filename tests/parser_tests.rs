// tests/parser_tests.rs

use matrix_expr::ast::{Token, TokenKind};
use matrix_expr::lexer::Lexer;
use matrix_expr::parser::{ParseError, Parser};
use matrix_expr::registry::FunctionRegistry;
use matrix_expr::store::BindingStore;

fn postfix(expr: &str) -> Result<Vec<Token>, ParseError> {
    let registry = FunctionRegistry::builtin().unwrap();
    let store = BindingStore::default();
    let tokens = Lexer::new(&registry, &store).tokenize(expr).unwrap();
    Parser::new().to_postfix(tokens)
}

/// Postfix order as text; function calls show their argument count.
fn rpn(expr: &str) -> String {
    postfix(expr)
        .unwrap()
        .iter()
        .map(|t| match t.kind {
            TokenKind::Function => format!("{}/{}", t.name, t.arg_count),
            TokenKind::Number => t.describe(),
            _ => t.symbol().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_products_before_sums() {
    assert_eq!(rpn("2 + 3 * 4"), "2 3 4 * +");
    assert_eq!(rpn("2 * 3 + 4"), "2 3 * 4 +");
    assert_eq!(rpn("A .* B + C"), "A B .* C +");
}

#[test]
fn test_parentheses() {
    assert_eq!(rpn("2 * (3 + 4)"), "2 3 4 + *");
    assert_eq!(rpn("((1))"), "1");
}

#[test]
fn test_left_associative_operators() {
    assert_eq!(rpn("10 - 4 - 3"), "10 4 - 3 -");
    assert_eq!(rpn("8 / 4 * 2"), "8 4 / 2 *");
}

#[test]
fn test_right_associative_operators() {
    assert_eq!(rpn("2 ^ 3 ^ 2"), "2 3 2 ^ ^");
}

#[test]
fn test_assignment_binds_loosest() {
    assert_eq!(rpn("A = B + 1"), "A B 1 + =");
    assert_eq!(rpn("A = -B"), "A B u- =");
}

#[test]
fn test_unary_binds_tightest() {
    assert_eq!(rpn("-3 + 4"), "3 u- 4 +");
    assert_eq!(rpn("4 - -3"), "4 3 u- -");
    assert_eq!(rpn("-2 ^ 2"), "2 u- 2 ^");
}

// ============================================================================
// Function calls
// ============================================================================

#[test]
fn test_argument_counting() {
    assert_eq!(rpn("!Fill(2, 3)"), "2 3 Fill/2");
    assert_eq!(rpn("!Fill(2, 3, 1 + 1)"), "2 3 1 1 + Fill/3");
    assert_eq!(rpn("!Identity(4)"), "4 Identity/1");
    assert_eq!(rpn("!Help()"), "Help/0");
}

#[test]
fn test_nested_calls_count_as_one_argument() {
    assert_eq!(
        rpn("!Fill(!Det(A), 2)"),
        "A Determinant/1 2 Fill/2"
    );
    assert_eq!(
        rpn("!Fill((1 + 1), !Trace(!Identity(2)))"),
        "1 1 + 2 Identity/1 Trace/1 Fill/2"
    );
}

#[test]
fn test_calls_inside_expressions() {
    assert_eq!(rpn("1 + !Det(A) * 2"), "1 A Determinant/1 2 * +");
    assert_eq!(rpn("-!Identity(2)"), "2 Identity/1 u-");
}

#[test]
fn test_named_arguments() {
    assert_eq!(rpn("!Fill(cols:3, rows:2)"), "cols 3 : rows 2 : Fill/2");
    assert_eq!(rpn("!Fill(2, value:-1, cols:3)"), "2 value 1 u- : cols 3 : Fill/3");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unmatched_parentheses() {
    assert_eq!(postfix("(1 + 2").unwrap_err(), ParseError::UnmatchedLeftBrace);
    assert_eq!(postfix("1 + 2)").unwrap_err(), ParseError::UnmatchedRightBrace);
    assert_eq!(postfix(")(").unwrap_err(), ParseError::UnmatchedRightBrace);
    assert_eq!(postfix("!Fill(2, 3").unwrap_err(), ParseError::UnmatchedLeftBrace);
}

#[test]
fn test_separator_outside_call() {
    assert_eq!(postfix("1, 2").unwrap_err(), ParseError::MisplacedSeparator);
    assert_eq!(postfix("(1, 2)").unwrap_err(), ParseError::MisplacedSeparator);
}

#[test]
fn test_separator_in_group_inside_call() {
    assert_eq!(postfix("!Identity((1, 2))").unwrap_err(), ParseError::MisplacedSeparator);
    assert_eq!(postfix("!Fill(2, (3, 4))").unwrap_err(), ParseError::MisplacedSeparator);
    // Groups without separators are still fine
    assert_eq!(rpn("!Fill((2), (1 + 2))"), "2 1 2 + Fill/2");
}

#[test]
fn test_error_messages_mention_parentheses() {
    let err = postfix("(1").unwrap_err();
    assert!(err.to_string().starts_with("Parenthesis mismatch"));
}
