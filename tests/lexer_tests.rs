// tests/lexer_tests.rs

use matrix_expr::ast::{Operator, Payload, Token, TokenKind};
use matrix_expr::lexer::{LexError, Lexer};
use matrix_expr::registry::FunctionRegistry;
use matrix_expr::store::BindingStore;

fn tokenize(expr: &str) -> Result<Vec<Token>, LexError> {
    let registry = FunctionRegistry::builtin().unwrap();
    let store = BindingStore::default();
    Lexer::new(&registry, &store).tokenize(expr)
}

fn kinds(expr: &str) -> Vec<TokenKind> {
    tokenize(expr).unwrap().iter().map(|t| t.kind).collect()
}

fn symbols(expr: &str) -> Vec<String> {
    tokenize(expr)
        .unwrap()
        .iter()
        .map(|t| match t.kind {
            TokenKind::Number => t.describe(),
            TokenKind::LeftBrace => "(".to_string(),
            TokenKind::RightBrace => ")".to_string(),
            TokenKind::ArgSeparator => ",".to_string(),
            _ => t.symbol().to_string(),
        })
        .collect()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_operator_glyphs() {
    let test_cases = vec![
        ("1 + 2", Operator::Add),
        ("1 - 2", Operator::Subtract),
        ("1 * 2", Operator::Multiply),
        ("1 / 2", Operator::Divide),
        ("1 % 2", Operator::Modulo),
        ("1 ^ 2", Operator::Power),
        ("A .* B", Operator::MatrixMultiply),
        ("A ./ B", Operator::MatrixDivide),
        ("A .^ 2", Operator::MatrixPower),
        ("a : 2", Operator::Hint),
        ("A = 2", Operator::Assign),
    ];

    for (input, expected) in test_cases {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 3, "Failed for input: {}", input);
        assert!(tokens[1].is_operator(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_operators_need_no_spaces() {
    assert_eq!(symbols("A.*B+2"), vec!["A", ".*", "B", "+", "2"]);
    assert_eq!(symbols("(1+2)*3"), vec!["(", "1", "+", "2", ")", "*", "3"]);
}

#[test]
fn test_priorities_and_associativity() {
    let tokens = tokenize("1 + 2 * 3 ^ 4").unwrap();
    assert_eq!(tokens[1].priority, 3);
    assert_eq!(tokens[3].priority, 4);
    assert_eq!(tokens[5].priority, 5);
    assert_eq!(tokens[5].associativity, matrix_expr::ast::Associativity::Right);
    assert_eq!(tokens[1].param_count, 2);
}

// ============================================================================
// Unary disambiguation
// ============================================================================

#[test]
fn test_leading_minus_is_unary() {
    let tokens = tokenize("-3 + 4").unwrap();
    assert!(tokens[0].is_operator(Operator::Negate));
    assert_eq!(tokens[0].symbol(), "u-");
    assert_eq!(tokens[0].priority, 200);
    assert_eq!(tokens[0].param_count, 1);
    assert!(tokens[2].is_operator(Operator::Add));
}

#[test]
fn test_minus_after_operator_is_unary() {
    assert_eq!(symbols("4 - -3"), vec!["4", "-", "u-", "3"]);
    assert_eq!(symbols("2 * +3"), vec!["2", "*", "u+", "3"]);
}

#[test]
fn test_minus_after_brace_or_separator_is_unary() {
    assert_eq!(symbols("(-3)"), vec!["(", "u-", "3", ")"]);
    assert_eq!(
        symbols("!Fill(2, -1)"),
        vec!["Fill", "(", "2", ",", "u-", "1", ")"]
    );
}

#[test]
fn test_minus_after_value_is_binary() {
    assert_eq!(symbols("A - 1"), vec!["A", "-", "1"]);
    assert_eq!(symbols("(1) - 1"), vec!["(", "1", ")", "-", "1"]);
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_numbers() {
    let test_cases = vec![("42", 42.0), ("3.14", 3.14), (".5", 0.5), ("1e-3", 0.001), ("2E2", 200.0)];

    for (input, expected) in test_cases {
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 1, "Failed for input: {}", input);
        assert_eq!(tokens[0].value, Payload::Number(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_names_are_matrix_refs() {
    let tokens = tokenize("data_2024 + _x").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::MatrixRef);
    assert_eq!(tokens[0].name, "data_2024");
    assert_eq!(tokens[0].value, Payload::Null);
    assert_eq!(tokens[2].name, "_x");
}

#[test]
fn test_function_tokens_carry_descriptor() {
    let tokens = tokenize("!Fill(2, 3)").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Function);
    assert_eq!(tokens[0].name, "Fill");
    assert_eq!(tokens[0].service(), Some("matrix"));
    assert_eq!(tokens[0].param_types().len(), 3);
}

#[test]
fn test_constants() {
    let tokens = tokenize("!pi").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].name, "pi");

    assert_eq!(kinds("!null"), vec![TokenKind::Null]);
}

#[test]
fn test_unknown_special_value() {
    assert_eq!(
        tokenize("!nope + 1"),
        Err(LexError::UnknownSpecial("nope".into()))
    );
}

#[test]
fn test_strings() {
    let tokens = tokenize("\"hello\"").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, Payload::Text("hello".into()));

    assert!(matches!(
        tokenize("\"open"),
        Err(LexError::UnterminatedString(_))
    ));
}

#[test]
fn test_unknown_glyph_is_null() {
    let tokens = tokenize("1 & 2").unwrap();
    assert_eq!(tokens[1].kind, TokenKind::Null);
    assert_eq!(tokens[1].name, "&");
}

#[test]
fn test_docs_queries() {
    let tokens = tokenize("?").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::DocsQuery);
    assert_eq!(tokens[0].name, "info");

    let tokens = tokenize("?Fill").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::DocsQuery);
    assert!(tokens[0].info.as_deref().unwrap().starts_with("!Fill("));

    let tokens = tokenize("?e").unwrap();
    assert!(tokens[0].info.as_deref().unwrap().starts_with("!e = 2.718"));
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assignment_splits_once() {
    assert_eq!(
        kinds("A = 1 + 2"),
        vec![
            TokenKind::MatrixRef,
            TokenKind::Operator,
            TokenKind::Number,
            TokenKind::Operator,
            TokenKind::Number
        ]
    );
    assert_eq!(tokenize("A = B = 1"), Err(LexError::MultipleAssignments(2)));
    assert!(matches!(tokenize("= 1"), Err(LexError::MalformedAssignment(_))));
}

#[test]
fn test_compound_assignment_is_expanded() {
    assert_eq!(
        symbols("A *= B - 1"),
        vec!["A", "=", "A", "*", "(", "B", "-", "1", ")"]
    );
    assert_eq!(symbols("A ^= 2"), vec!["A", "=", "A", "^", "(", "2", ")"]);
}

#[test]
fn test_whitespace_is_collapsed() {
    assert_eq!(symbols("  A\t+\n  1 "), vec!["A", "+", "1"]);
}
