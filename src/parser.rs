//! Shunting-yard: infix tokens to postfix order.

use std::fmt;

use log::debug;

use crate::ast::{Associativity, Token, TokenKind};

/// Errors raised while reordering tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A `)` without a matching `(`
    UnmatchedRightBrace,

    /// A `(` that is never closed
    UnmatchedLeftBrace,

    /// A `,` outside the parentheses of a function call
    MisplacedSeparator,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnmatchedRightBrace => {
                write!(f, "Parenthesis mismatch: ')' without a matching '('")
            }
            ParseError::UnmatchedLeftBrace => {
                write!(f, "Parenthesis mismatch: '(' is never closed")
            }
            ParseError::MisplacedSeparator => {
                write!(f, "Argument separator ',' used outside of a function call")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// State of one shunting-yard run.
///
/// `were_values` has one flag per open argument list (plus one for the top
/// level) telling whether the current argument has produced a value yet;
/// `arg_counts` has one counter per open function call.
pub struct Parser {
    output: Vec<Token>,
    stack: Vec<Token>,
    were_values: Vec<bool>,
    arg_counts: Vec<usize>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            output: Vec::new(),
            stack: Vec::new(),
            were_values: vec![false],
            arg_counts: Vec::new(),
        }
    }

    /// Reorders `tokens` into postfix order.
    pub fn to_postfix(mut self, tokens: Vec<Token>) -> Result<Vec<Token>, ParseError> {
        for token in tokens {
            match token.kind {
                TokenKind::Number
                | TokenKind::MatrixRef
                | TokenKind::DocsQuery
                | TokenKind::Null
                | TokenKind::String
                | TokenKind::Void
                | TokenKind::Output
                | TokenKind::ErrorMarker => {
                    self.mark_value();
                    self.output.push(token);
                }
                TokenKind::Function => {
                    // The call itself is a value in the enclosing argument.
                    self.mark_value();
                    self.stack.push(token);
                    self.arg_counts.push(0);
                    self.were_values.push(false);
                }
                TokenKind::ArgSeparator => self.separator()?,
                TokenKind::Operator => self.operator(token),
                TokenKind::LeftBrace => self.stack.push(token),
                TokenKind::RightBrace => self.right_brace()?,
            }
        }

        while let Some(token) = self.stack.pop() {
            match token.kind {
                TokenKind::LeftBrace | TokenKind::RightBrace => {
                    return Err(ParseError::UnmatchedLeftBrace);
                }
                TokenKind::Function => {
                    let mut token = token;
                    token.arg_count = self.arg_counts.pop().unwrap_or(0);
                    self.were_values.pop();
                    self.output.push(token);
                }
                _ => self.output.push(token),
            }
        }

        debug!(
            "postfix: {}",
            self.output
                .iter()
                .map(|t| match t.kind {
                    TokenKind::Function => format!("{}/{}", t.name, t.arg_count),
                    _ => t.describe(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        );
        Ok(self.output)
    }

    fn mark_value(&mut self) {
        if let Some(seen) = self.were_values.last_mut() {
            *seen = true;
        }
    }

    /// Pops operators until the top of the stack is a left brace.
    fn pop_to_left_brace(&mut self) -> bool {
        while let Some(top) = self.stack.last() {
            if top.kind == TokenKind::LeftBrace {
                return true;
            }
            if let Some(token) = self.stack.pop() {
                self.output.push(token);
            }
        }
        false
    }

    fn separator(&mut self) -> Result<(), ParseError> {
        if !self.pop_to_left_brace() || self.arg_counts.is_empty() {
            return Err(ParseError::MisplacedSeparator);
        }
        // The matched `(` must open a call, not a plain group inside one.
        let depth = self.stack.len();
        if depth < 2 || self.stack[depth - 2].kind != TokenKind::Function {
            return Err(ParseError::MisplacedSeparator);
        }
        let had_value = self.were_values.pop().unwrap_or(false);
        if had_value && let Some(count) = self.arg_counts.last_mut() {
            *count += 1;
        }
        self.were_values.push(false);
        Ok(())
    }

    fn operator(&mut self, token: Token) {
        while let Some(top) = self.stack.last() {
            let should_pop = top.kind == TokenKind::Operator
                && ((token.associativity == Associativity::Left && token.priority == top.priority)
                    || token.priority < top.priority);
            if !should_pop {
                break;
            }
            if let Some(top) = self.stack.pop() {
                self.output.push(top);
            }
        }
        self.stack.push(token);
    }

    fn right_brace(&mut self) -> Result<(), ParseError> {
        if !self.pop_to_left_brace() {
            return Err(ParseError::UnmatchedRightBrace);
        }
        self.stack.pop();

        if self
            .stack
            .last()
            .is_some_and(|t| t.kind == TokenKind::Function)
            && let Some(mut function) = self.stack.pop()
        {
            let mut count = self.arg_counts.pop().unwrap_or(0);
            if self.were_values.pop().unwrap_or(false) {
                count += 1;
            }
            function.arg_count = count;
            self.output.push(function);
        }
        Ok(())
    }
}

/// Convenience wrapper around a fresh [`Parser`].
pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, ParseError> {
    Parser::new().to_postfix(tokens)
}
