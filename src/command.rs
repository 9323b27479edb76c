//! Commands and the session that runs them.
//!
//! A [`Command`] is one line of user input. It is evaluated at most once:
//!
//! ```text
//! Idle -> Unavailable -> Success | Warning | Error
//! ```
//!
//! A [`Session`] keeps the registry, the binding store and the command
//! history. Each command runs against a working copy of the store that is
//! only kept when the command didn't fail.

use std::fmt;

use log::{debug, info, warn};

use crate::{
    ast::{Token, TokenKind},
    config::Limits,
    evaluator::{CLEANUP_FUNCTION, EvalError, Evaluator},
    lexer::{self, Lexer},
    output::Renderer,
    parser,
    registry::{FunctionRegistry, RegistryError},
    store::{self, BindingStore, StoreError},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    /// Evaluation has started
    Unavailable,
    Success,
    /// Evaluated, but the result is null
    Warning,
    Error,
}

impl CommandState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandState::Success | CommandState::Warning | CommandState::Error
        )
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandState::Idle => "Idle",
            CommandState::Unavailable => "Unavailable",
            CommandState::Success => "Success",
            CommandState::Warning => "Warning",
            CommandState::Error => "Error",
        };
        f.write_str(s)
    }
}

/// One line of input: an expression plus optional `;`-separated settings.
#[derive(Debug, Clone)]
pub struct Command {
    text: String,
    expression: String,
    settings: Vec<String>,
    state: CommandState,
    message: String,
    output: String,
    result: Option<Token>,
}

impl Command {
    pub fn new(text: &str) -> Self {
        let mut parts = text.split(';');
        let expression = lexer::clean(parts.next().unwrap_or_default());
        let settings = parts
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Command {
            text: text.to_string(),
            expression,
            settings,
            state: CommandState::Idle,
            message: String::new(),
            output: String::new(),
            result: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The expression part, whitespace collapsed.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn settings(&self) -> &[String] {
        &self.settings
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendered result, rounded to the store's configured decimals.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn result(&self) -> Option<&Token> {
        self.result.as_ref()
    }

    /// Whether this command was a successful `!CleanUp()`.
    pub fn is_cleanup(&self) -> bool {
        self.result
            .as_ref()
            .is_some_and(|t| t.kind == TokenKind::Output && t.name == CLEANUP_FUNCTION)
    }

    /// Runs the command against `store`.
    ///
    /// Failures of the expression itself are recorded on the command, which
    /// ends in [`CommandState::Error`]. The only error returned is for a
    /// command that was already evaluated; it is not run again.
    pub fn evaluate(
        &mut self,
        registry: &FunctionRegistry,
        store: &mut BindingStore,
    ) -> Result<CommandState, EvalError> {
        if self.state != CommandState::Idle {
            return Err(EvalError::AlreadyProcessed {
                state: self.state.to_string(),
                message: self.message.clone(),
            });
        }
        self.state = CommandState::Unavailable;
        debug!("evaluating '{}'", self.expression);

        let renderer = Renderer::new(store.limits().decimals);
        match compile(&self.expression, registry, store) {
            Ok(token) => {
                if token.kind == TokenKind::Null {
                    self.state = CommandState::Warning;
                    self.message = "Result is null".to_string();
                    warn!("'{}' evaluated to null", self.expression);
                } else {
                    self.state = CommandState::Success;
                    self.message = "OK".to_string();
                }
                self.output = renderer.render(&token);
                self.result = Some(token);
            }
            Err(e) => {
                self.state = CommandState::Error;
                self.message = e.user_message();
                self.output = self.message.clone();
                self.result = Some(Token::error(self.message.clone()));
            }
        }

        info!("'{}' -> {}: {}", self.expression, self.state, self.message);
        Ok(self.state)
    }
}

/// Tokenizes, reorders and evaluates one expression.
pub fn compile(
    expression: &str,
    registry: &FunctionRegistry,
    store: &mut BindingStore,
) -> Result<Token, EvalError> {
    if expression.trim().is_empty() {
        return Err(EvalError::EmptyExpression);
    }

    if let Some((names, rhs)) = multi_assignment(expression)? {
        let postfix = lex_and_parse(rhs, registry, store)?;
        let mut evaluator = Evaluator::new(registry, store);
        let result = evaluator.evaluate(postfix)?;
        return evaluator.assign_many(&names, result);
    }

    let postfix = lex_and_parse(expression, registry, store)?;
    Evaluator::new(registry, store).evaluate(postfix)
}

fn lex_and_parse(
    expression: &str,
    registry: &FunctionRegistry,
    store: &BindingStore,
) -> Result<Vec<Token>, EvalError> {
    let tokens = Lexer::new(registry, store).tokenize(expression)?;
    Ok(parser::to_postfix(tokens)?)
}

/// `A,B = EXPR` splits into the names and `EXPR`; anything else is `None`.
fn multi_assignment(expression: &str) -> Result<Option<(Vec<String>, &str)>, EvalError> {
    let Some((left, right)) = lexer::split_assignment(expression)? else {
        return Ok(None);
    };
    if !left.contains(',') {
        return Ok(None);
    }

    let names: Vec<String> = left.split(',').map(|n| n.trim().to_string()).collect();
    if let Some(bad) = names.iter().find(|n| !store::is_identifier(n)) {
        return Err(EvalError::AssignmentFormat(format!("'{}'", bad)));
    }
    Ok(Some((names, right)))
}

/// The registry, the bindings and the history of one user.
pub struct Session {
    registry: FunctionRegistry,
    store: BindingStore,
    history: Vec<Command>,
}

impl Session {
    /// A session over the built-in functions.
    pub fn new(limits: Limits) -> Result<Self, RegistryError> {
        Ok(Session::with_registry(FunctionRegistry::builtin()?, limits))
    }

    pub fn with_registry(registry: FunctionRegistry, limits: Limits) -> Self {
        Session {
            registry,
            store: BindingStore::new(limits),
            history: Vec::new(),
        }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &BindingStore {
        &self.store
    }

    pub fn history(&self) -> &[Command] {
        &self.history
    }

    /// Binds a value directly, e.g. one loaded from a file.
    pub fn bind(&mut self, name: &str, value: Value) -> Result<(), StoreError> {
        self.store.insert(name, value)
    }

    /// Evaluates `text` as a new command and records it in the history.
    pub fn run(&mut self, text: &str) -> &Command {
        let mut command = Command::new(text);
        let mut working = self.store.clone();

        // A fresh command is always Idle, so this can't be rejected.
        let state = command
            .evaluate(&self.registry, &mut working)
            .unwrap_or(CommandState::Error);
        if state != CommandState::Error {
            self.store = working;
        }

        if command.is_cleanup() {
            debug!("clearing {} history entries", self.history.len());
            self.history.clear();
        }
        self.history.push(command);
        &self.history[self.history.len() - 1]
    }
}
