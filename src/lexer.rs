//! Tokenizer: command text to a flat list of classified tokens.

use std::{fmt, sync::LazyLock};

use log::debug;
use regex::Regex;

use crate::{
    ast::{Operator, Token, TokenKind},
    constants::{self, ConstValue},
    docs,
    registry::FunctionRegistry,
    store::{self, BindingStore},
};

/// One atom per match: string, number, prefixed or bare word, two-character
/// matrix operator, or any other single character.
static ATOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""[^"]*"?|\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?|[!?]?[A-Za-z_][A-Za-z0-9_]*|\.[\^*/]|\S"#,
    )
    .expect("atom pattern is valid")
});

/// `NAME op= EXPR`
static COMPOUND_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*([-+*/%^])=(.*)$")
        .expect("compound assignment pattern is valid")
});

/// Errors found before parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// More than one `=` in a command
    MultipleAssignments(usize),

    /// One side of `=` (or `op=`) is empty
    MalformedAssignment(String),

    /// `!name` where `name` is neither a function nor a special value
    UnknownSpecial(String),

    /// A `"` without its closing quote
    UnterminatedString(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::MultipleAssignments(n) => write!(
                f,
                "Invalid assignment format: expected a single '=', found {}",
                n
            ),
            LexError::MalformedAssignment(expr) => write!(
                f,
                "Invalid assignment format in '{}': both sides of '=' need a value",
                expr
            ),
            LexError::UnknownSpecial(name) => {
                write!(f, "'{}' is not a function or special value", name)
            }
            LexError::UnterminatedString(s) => write!(f, "Unterminated string: {}", s),
        }
    }
}

impl std::error::Error for LexError {}

/// Trims and collapses runs of whitespace to single spaces.
pub fn clean(expression: &str) -> String {
    expression.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rewrites `NAME op= EXPR` to `NAME = NAME op (EXPR)`; anything else is
/// returned unchanged.
pub fn expand_compound_assignment(expression: &str) -> Result<String, LexError> {
    let Some(caps) = COMPOUND_ASSIGNMENT.captures(expression) else {
        return Ok(expression.to_string());
    };
    let name = &caps[1];
    let op = &caps[2];
    let rest = caps[3].trim();
    if rest.is_empty() {
        return Err(LexError::MalformedAssignment(expression.to_string()));
    }
    Ok(format!("{name} = {name} {op} ({rest})"))
}

/// Splits on a bare `=` into trimmed `(left, right)`; `None` without one.
pub fn split_assignment(expression: &str) -> Result<Option<(&str, &str)>, LexError> {
    let count = expression.matches('=').count();
    match count {
        0 => Ok(None),
        1 => {
            let (left, right) = expression
                .split_once('=')
                .ok_or_else(|| LexError::MalformedAssignment(expression.to_string()))?;
            let (left, right) = (left.trim(), right.trim());
            if left.is_empty() || right.is_empty() {
                return Err(LexError::MalformedAssignment(expression.to_string()));
            }
            Ok(Some((left, right)))
        }
        n => Err(LexError::MultipleAssignments(n)),
    }
}

/// Splits an expression into atoms, left to right.
pub fn atoms(expression: &str) -> Vec<&str> {
    ATOM.find_iter(expression).map(|m| m.as_str()).collect()
}

pub struct Lexer<'a> {
    registry: &'a FunctionRegistry,
    store: &'a BindingStore,
}

impl<'a> Lexer<'a> {
    /// The store is only read, to describe matrices in `?name` queries.
    pub fn new(registry: &'a FunctionRegistry, store: &'a BindingStore) -> Self {
        Lexer { registry, store }
    }

    pub fn tokenize(&self, expression: &str) -> Result<Vec<Token>, LexError> {
        let cleaned = clean(expression);
        let expanded = expand_compound_assignment(&cleaned)?;

        let mut tokens = Vec::new();
        match split_assignment(&expanded)? {
            Some((left, right)) => {
                self.classify_all(left, &mut tokens)?;
                tokens.push(Token::operator(Operator::Assign));
                self.classify_all(right, &mut tokens)?;
            }
            None => self.classify_all(&expanded, &mut tokens)?,
        }
        mark_unary(&mut tokens);

        debug!(
            "tokens: {}",
            tokens.iter().map(Token::describe).collect::<Vec<_>>().join(" ")
        );
        Ok(tokens)
    }

    fn classify_all(&self, expression: &str, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        for atom in atoms(expression) {
            tokens.push(self.classify(atom)?);
        }
        Ok(())
    }

    /// Classifies one atom; the order of the checks matters.
    pub fn classify(&self, atom: &str) -> Result<Token, LexError> {
        if let Some(n) = parse_number(atom) {
            return Ok(Token::number(n));
        }
        match atom {
            "(" => return Ok(Token::left_brace()),
            ")" => return Ok(Token::right_brace()),
            "?" => return Ok(Token::docs("info", docs::overview(self.registry))),
            "," => return Ok(Token::separator()),
            _ => {}
        }
        if atom.chars().count() > 1 && Operator::from_symbol(atom).is_none() {
            return self.special_value(atom);
        }
        if store::is_identifier(atom) {
            return Ok(Token::matrix_ref(atom));
        }
        Ok(match Operator::from_symbol(atom) {
            Some(op) => Token::operator(op),
            None => Token::unknown(atom),
        })
    }

    fn special_value(&self, atom: &str) -> Result<Token, LexError> {
        if let Some(name) = atom.strip_prefix('!') {
            if let Some(descriptor) = self.registry.find(name) {
                return Ok(Token::function(descriptor));
            }
            return match constants::get(name) {
                Some(c) => Ok(match c.value {
                    ConstValue::Number(n) => Token {
                        name: c.name.to_string(),
                        ..Token::number(n)
                    },
                    ConstValue::Null => Token::null(),
                }),
                None => Err(LexError::UnknownSpecial(name.to_string())),
            };
        }
        if let Some(name) = atom.strip_prefix('?') {
            let name = name.trim();
            let target = docs::resolve(name, self.registry, self.store);
            return Ok(Token::docs(name, docs::render(&target)));
        }
        if let Some(quoted) = atom.strip_prefix('"') {
            return match quoted.strip_suffix('"') {
                Some(text) => Ok(Token::text(text)),
                None => Err(LexError::UnterminatedString(atom.to_string())),
            };
        }
        if store::is_identifier(atom) {
            return Ok(Token::matrix_ref(atom));
        }
        Ok(Token::null())
    }
}

/// Literals only: words like `inf` or `nan` are names, not numbers.
fn parse_number(atom: &str) -> Option<f64> {
    let mut chars = atom.chars();
    let starts_numeric = match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    if starts_numeric { atom.parse().ok() } else { None }
}

/// Turns `+`/`-` into their unary forms at the start of the expression and
/// after `(`, `,` or another operator.
fn mark_unary(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        let follows_value = i > 0
            && !matches!(
                tokens[i - 1].kind,
                TokenKind::LeftBrace | TokenKind::Operator | TokenKind::ArgSeparator
            );
        if follows_value || tokens[i].kind != TokenKind::Operator {
            continue;
        }
        if let Some(unary) = tokens[i].operator.and_then(Operator::to_unary) {
            tokens[i] = Token::operator(unary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atoms_split_matrix_operators() {
        assert_eq!(atoms("A.*B"), vec!["A", ".*", "B"]);
        assert_eq!(atoms("2.5./C"), vec!["2.5", "./", "C"]);
        assert_eq!(atoms("!Identity(4)"), vec!["!Identity", "(", "4", ")"]);
        assert_eq!(atoms("x.^2"), vec!["x", ".^", "2"]);
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(expand_compound_assignment("x += y * 2").unwrap(), "x = x + (y * 2)");
        assert_eq!(expand_compound_assignment("x ^= 2").unwrap(), "x = x ^ (2)");
        assert!(expand_compound_assignment("x += ").is_err());
        assert_eq!(expand_compound_assignment("x + y").unwrap(), "x + y");
    }

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("A = 5").unwrap(), Some(("A", "5")));
        assert_eq!(split_assignment("A + 5").unwrap(), None);
        assert_eq!(split_assignment("A = B = 5"), Err(LexError::MultipleAssignments(2)));
        assert!(split_assignment("= 5").is_err());
    }
}
