//! Postfix evaluation against the binding store.

use std::fmt;

use log::debug;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    ast::{Operator, Payload, Token, TokenKind},
    docs,
    lexer::LexError,
    parser::ParseError,
    registry::{Arg, FunctionDescriptor, FunctionRegistry, Output, Param, ParamType, ReturnType},
    store::{self, BindingStore, StoreError},
    value::{Grid, Matrix, MatrixError, Value},
};

/// Name of the pseudo-function that clears the command history.
pub const CLEANUP_FUNCTION: &str = "CleanUp";

/// Name of the pseudo-function that lists every function.
pub const HELP_FUNCTION: &str = "Help";

/// Errors that can occur while compiling or evaluating a command.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Tokenizer error
    Lex(LexError),

    /// Shunting-yard error
    Parse(ParseError),

    /// Nothing to evaluate
    EmptyExpression,

    /// Operators consumed every operand and left nothing behind
    LoneOperator,

    /// Several values left over, e.g. `3 4`
    MissingOperator(usize),

    /// An operator or function got fewer operands than it needs
    ArgumentCount {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A name that isn't in the binding store
    UnknownVariable(String),

    /// `null` used in arithmetic
    NullOperand(&'static str),

    /// An operand that can't take part in arithmetic (text, docs, ...)
    InvalidOperand { symbol: &'static str, found: String },

    /// `%` with a divisor that isn't a number or 1x1 matrix
    InvalidModulo,

    /// Bad exponent for `^` or `.^`
    InvalidExponent(String),

    /// Left of `=` isn't a plain name
    AssignmentFormat(String),

    /// Right of `=` isn't a matrix or number
    AssignmentValue(String),

    /// Left of `:` isn't a parameter name
    InvalidHint(String),

    /// `A,B = ...` with the wrong number of results
    MultiAssignment { expected: usize, found: usize },

    UnknownFunction(String),

    UnknownService { service: String, function: String },

    UnknownParameter { function: String, param: String },

    PositionalAfterHint { function: String },

    DuplicateParameter { function: String, param: String },

    MissingParameter { function: String, param: String },

    TooManyArguments { function: String, max: usize },

    /// An argument doesn't parse as the declared type
    ArgumentType { value: String, expected: ParamType },

    /// A service returned something other than its declared type
    ReturnType { function: String, expected: ReturnType },

    /// Failure inside a service; the message is the service's own
    Service { function: String, message: String },

    /// Matrix kernel error
    Matrix(MatrixError),

    /// Name or capacity error from the binding store
    Store(StoreError),

    /// A command was evaluated twice
    AlreadyProcessed { state: String, message: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Lex(e) => write!(f, "{}", e),
            EvalError::Parse(e) => write!(f, "{}", e),
            EvalError::EmptyExpression => write!(f, "Empty expression"),
            EvalError::LoneOperator => write!(f, "Invalid use of a lone operator"),
            EvalError::MissingOperator(n) => write!(
                f,
                "Malformed expression: {} values without an operator between them",
                n
            ),
            EvalError::ArgumentCount {
                what,
                expected,
                found,
            } => write!(
                f,
                "Argument count mismatch for '{}': expected {}, got {}",
                what, expected, found
            ),
            EvalError::UnknownVariable(name) => write!(f, "Unknown variable '{}'", name),
            EvalError::NullOperand(symbol) => {
                write!(f, "Invalid operation with null for '{}'", symbol)
            }
            EvalError::InvalidOperand { symbol, found } => {
                write!(f, "Can't use {} with '{}'", found, symbol)
            }
            EvalError::InvalidModulo => write!(
                f,
                "Invalid modulo format: the divisor must be a number or a 1x1 matrix"
            ),
            EvalError::InvalidExponent(msg) => write!(f, "Invalid exponent: {}", msg),
            EvalError::AssignmentFormat(found) => write!(
                f,
                "Invalid assignment format: can't assign to {}, use NAME = value",
                found
            ),
            EvalError::AssignmentValue(found) => write!(
                f,
                "Assignment failed, right hand side must be a matrix or scalar, got {}",
                found
            ),
            EvalError::InvalidHint(found) => write!(
                f,
                "Invalid parameter hint format: '{}' is not a parameter name",
                found
            ),
            EvalError::MultiAssignment { expected, found } => write!(
                f,
                "Assignment failed: {} names but {} results",
                expected, found
            ),
            EvalError::UnknownFunction(name) => write!(f, "Unknown function '{}'", name),
            EvalError::UnknownService { service, function } => {
                write!(f, "No service '{}' provides '{}'", service, function)
            }
            EvalError::UnknownParameter { function, param } => {
                write!(f, "'{}' has no parameter named '{}'", function, param)
            }
            EvalError::PositionalAfterHint { function } => write!(
                f,
                "'{}': positional arguments can't follow named ones",
                function
            ),
            EvalError::DuplicateParameter { function, param } => write!(
                f,
                "'{}': parameter '{}' is given more than once",
                function, param
            ),
            EvalError::MissingParameter { function, param } => {
                write!(f, "'{}': missing required parameter '{}'", function, param)
            }
            EvalError::TooManyArguments { function, max } => {
                write!(f, "'{}' takes at most {} arguments", function, max)
            }
            EvalError::ArgumentType { value, expected } => {
                write!(f, "Can't parse {} as {}", value, expected)
            }
            EvalError::ReturnType { function, expected } => {
                write!(f, "'{}' didn't return the declared {}", function, expected)
            }
            EvalError::Service { function, message } => write!(f, "{}: {}", function, message),
            EvalError::Matrix(e) => write!(f, "{}", e),
            EvalError::Store(e) => write!(f, "{}", e),
            EvalError::AlreadyProcessed { state, message } => write!(
                f,
                "CMD_COMPILED: command already processed (state: {}, message: {})",
                state, message
            ),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvalError::Lex(e) => Some(e),
            EvalError::Parse(e) => Some(e),
            EvalError::Matrix(e) => Some(e),
            EvalError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl EvalError {
    /// The message recorded on a failed command: service failures show the
    /// callee's own message.
    pub fn user_message(&self) -> String {
        match self {
            EvalError::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<LexError> for EvalError {
    fn from(e: LexError) -> Self {
        EvalError::Lex(e)
    }
}

impl From<ParseError> for EvalError {
    fn from(e: ParseError) -> Self {
        EvalError::Parse(e)
    }
}

impl From<MatrixError> for EvalError {
    fn from(e: MatrixError) -> Self {
        EvalError::Matrix(e)
    }
}

impl From<StoreError> for EvalError {
    fn from(e: StoreError) -> Self {
        EvalError::Store(e)
    }
}

/// An arithmetic operand after reference resolution.
#[derive(Debug, Clone)]
enum Operand {
    Scalar(f64),
    Grid(Value),
}

impl Operand {
    /// A scalar or the single value of a 1x1 matrix.
    fn as_scalar(&self) -> Option<f64> {
        match self {
            Operand::Scalar(x) => Some(*x),
            Operand::Grid(v) => v.as_matrix().as_scalar(),
        }
    }

    fn into_matrix(self) -> Matrix {
        match self {
            Operand::Scalar(x) => Matrix::scalar(x),
            Operand::Grid(v) => v.into_matrix(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Arithmetic {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Arithmetic {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Arithmetic::Add => a + b,
            Arithmetic::Subtract => a - b,
            Arithmetic::Multiply => a * b,
            Arithmetic::Divide => a / b,
        }
    }

    /// Same as [`Arithmetic::apply`], but through decimals when both sides
    /// and the result fit below the decimal scale cap, so `0.1 + 0.2` is
    /// `0.3` while `1e-20 * 1e-20` keeps its float value.
    fn apply_decimal(self, a: f64, b: f64) -> f64 {
        let float = self.apply(a, b);
        if let Some(ad) = Decimal::from_f64(a)
            && let Some(bd) = Decimal::from_f64(b)
            && ad.scale() < Decimal::MAX_SCALE
            && bd.scale() < Decimal::MAX_SCALE
            && let Some(rd) = match self {
                Arithmetic::Add => ad.checked_add(bd),
                Arithmetic::Subtract => ad.checked_sub(bd),
                Arithmetic::Multiply => ad.checked_mul(bd),
                Arithmetic::Divide => ad.checked_div(bd),
            }
            && rd.scale() < Decimal::MAX_SCALE
            && (!rd.is_zero() || float == 0.0)
            && let Some(r) = rd.to_f64()
        {
            return r;
        }
        float
    }

    fn name(self) -> &'static str {
        match self {
            Arithmetic::Add => "addition",
            Arithmetic::Subtract => "subtraction",
            Arithmetic::Multiply => "multiplication",
            Arithmetic::Divide => "division",
        }
    }
}

/// `^` on numbers, with fixed results for a zero base.
pub fn power(base: f64, exponent: f64) -> f64 {
    if base == 0.0 {
        if exponent == 0.0 {
            f64::NAN
        } else if exponent < 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        base.powf(exponent)
    }
}

/// Evaluates postfix token streams.
///
/// Reads functions from the registry and reads and writes bindings in the
/// store it was given.
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    store: &'a mut BindingStore,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry, store: &'a mut BindingStore) -> Self {
        Evaluator { registry, store }
    }

    /// Evaluates a postfix token stream to a single token.
    pub fn evaluate(&mut self, postfix: Vec<Token>) -> Result<Token, EvalError> {
        if postfix.is_empty() {
            return Err(EvalError::EmptyExpression);
        }

        let mut stack: Vec<Token> = Vec::new();
        for token in postfix {
            match token.kind {
                TokenKind::Operator => {
                    let operands = pop_operands(&mut stack, token.param_count, token.symbol())?;
                    let result = self.apply_operator(&token, operands)?;
                    stack.push(result);
                }
                TokenKind::Function => {
                    let args = pop_operands(&mut stack, token.arg_count, &token.name)?;
                    let result = self.call(token, args)?;
                    stack.push(result);
                }
                _ => stack.push(token),
            }
        }

        let result = match stack.len() {
            0 => return Err(EvalError::LoneOperator),
            1 => stack.pop().ok_or(EvalError::LoneOperator)?,
            n => return Err(EvalError::MissingOperator(n)),
        };

        // A bare name evaluates to the value bound to it.
        if result.kind == TokenKind::MatrixRef && result.value == Payload::Null {
            let value = self.resolve(&result)?;
            return Ok(Token::bound_ref(result.name, value));
        }
        Ok(result)
    }

    fn apply_operator(&mut self, token: &Token, mut operands: Vec<Token>) -> Result<Token, EvalError> {
        let Some(op) = token.operator else {
            return Err(EvalError::InvalidOperand {
                symbol: "?",
                found: token.describe(),
            });
        };
        debug!("applying '{}' to {} operand(s)", op.symbol(), operands.len());

        // Unary operators have one operand, the rest two, in stack order.
        let rhs = operands.pop();
        let lhs = operands.pop();
        match (op, lhs, rhs) {
            (Operator::Negate, None, Some(x)) => match self.operand(&x, "u-")? {
                Operand::Scalar(n) => Ok(Token::number(-n)),
                Operand::Grid(v) => Ok(Token::matrix(v.as_matrix().map(|n| -n).into())),
            },
            (Operator::Identity, None, Some(x)) => Ok(match self.operand(&x, "u+")? {
                Operand::Scalar(n) => Token::number(n),
                Operand::Grid(v) => Token::matrix(v),
            }),
            (Operator::Assign, Some(lhs), Some(rhs)) => self.assign(lhs, rhs),
            (Operator::Hint, Some(lhs), Some(rhs)) => attach_hint(lhs, rhs),
            (op, Some(lhs), Some(rhs)) => {
                let symbol = op.symbol();
                let a = self.operand(&lhs, symbol)?;
                let b = self.operand(&rhs, symbol)?;
                match op {
                    Operator::Add => arithmetic(Arithmetic::Add, a, b),
                    Operator::Subtract => arithmetic(Arithmetic::Subtract, a, b),
                    Operator::Multiply => arithmetic(Arithmetic::Multiply, a, b),
                    Operator::Divide => arithmetic(Arithmetic::Divide, a, b),
                    Operator::Modulo => modulo(a, b),
                    Operator::Power => elementwise_power(a, b),
                    Operator::MatrixPower => matrix_power(a, b),
                    Operator::MatrixMultiply => {
                        Ok(Token::matrix(a.into_matrix().matmul(&b.into_matrix())?.into()))
                    }
                    Operator::MatrixDivide => {
                        let inverse = b.into_matrix().inverse()?;
                        Ok(Token::matrix(a.into_matrix().matmul(&inverse)?.into()))
                    }
                    _ => Err(EvalError::ArgumentCount {
                        what: symbol.to_string(),
                        expected: op.arity(),
                        found: 2,
                    }),
                }
            }
            (op, lhs, rhs) => Err(EvalError::ArgumentCount {
                what: op.symbol().to_string(),
                expected: op.arity(),
                found: usize::from(lhs.is_some()) + usize::from(rhs.is_some()),
            }),
        }
    }

    /// Looks a reference up in the store, falling back to the value it carries.
    fn resolve(&self, token: &Token) -> Result<Value, EvalError> {
        if !token.name.is_empty()
            && let Some(v) = self.store.get(&token.name)
        {
            return Ok(v.clone());
        }
        match &token.value {
            Payload::Matrix(v) => Ok(v.clone()),
            _ => Err(EvalError::UnknownVariable(token.name.clone())),
        }
    }

    fn operand(&self, token: &Token, symbol: &'static str) -> Result<Operand, EvalError> {
        match token.kind {
            TokenKind::Null => Err(EvalError::NullOperand(symbol)),
            TokenKind::Number => match token.value {
                Payload::Number(n) => Ok(Operand::Scalar(n)),
                _ => Err(EvalError::NullOperand(symbol)),
            },
            TokenKind::MatrixRef if matches!(token.value, Payload::Matrices(_)) => {
                Err(EvalError::InvalidOperand {
                    symbol,
                    found: token.describe(),
                })
            }
            TokenKind::MatrixRef => self.resolve(token).map(Operand::Grid),
            _ => Err(EvalError::InvalidOperand {
                symbol,
                found: token.describe(),
            }),
        }
    }

    /// `NAME = value`. Creates the binding if needed; the result refers to it.
    pub fn assign(&mut self, lhs: Token, rhs: Token) -> Result<Token, EvalError> {
        if lhs.kind != TokenKind::MatrixRef || lhs.name.is_empty() {
            return Err(EvalError::AssignmentFormat(lhs.describe()));
        }

        let value = match (rhs.kind, &rhs.value) {
            (TokenKind::Number, Payload::Number(n)) => Matrix::scalar(*n).into(),
            (TokenKind::MatrixRef, Payload::Matrices(_)) => {
                return Err(EvalError::AssignmentValue(rhs.describe()));
            }
            (TokenKind::MatrixRef, _) => self.resolve(&rhs)?,
            (_, Payload::Matrix(v)) => v.clone(),
            _ => return Err(EvalError::AssignmentValue(rhs.describe())),
        };

        self.bind(&lhs.name, value.clone())?;
        Ok(Token::bound_ref(lhs.name, value))
    }

    /// `A,B,... = expr` where `expr` produced several matrices.
    pub fn assign_many(&mut self, names: &[String], result: Token) -> Result<Token, EvalError> {
        let values = match result.value {
            Payload::Matrices(values) => values,
            _ => {
                return Err(EvalError::MultiAssignment {
                    expected: names.len(),
                    found: 1,
                });
            }
        };
        if values.len() != names.len() {
            return Err(EvalError::MultiAssignment {
                expected: names.len(),
                found: values.len(),
            });
        }
        for (name, value) in names.iter().zip(&values) {
            self.bind(name, value.clone())?;
        }
        Ok(Token::matrices(values))
    }

    /// Existing names are replaced as-is; new ones are validated and counted.
    fn bind(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        self.store.insert(name, value)?;
        Ok(())
    }

    fn call(&mut self, token: Token, args: Vec<Token>) -> Result<Token, EvalError> {
        let Some(descriptor) = token.function else {
            return Err(EvalError::UnknownFunction(token.name));
        };
        // Session pseudo-functions take no arguments and never reach a service.
        if matches!(descriptor.name.as_str(), CLEANUP_FUNCTION | HELP_FUNCTION) {
            if !args.is_empty() {
                return Err(EvalError::TooManyArguments {
                    function: descriptor.name,
                    max: 0,
                });
            }
            return Ok(match descriptor.name.as_str() {
                CLEANUP_FUNCTION => Token::output(CLEANUP_FUNCTION, "History cleared"),
                _ => Token::docs(HELP_FUNCTION, docs::overview(self.registry)),
            });
        }

        let bound = self.bind_arguments(&descriptor, args)?;
        debug!("calling {}.{} with {} argument(s)", descriptor.service, descriptor.name, bound.len());

        let handler = self
            .registry
            .handler(&descriptor.service, &descriptor.name)
            .ok_or_else(|| EvalError::UnknownService {
                service: descriptor.service.clone(),
                function: descriptor.name.clone(),
            })?;
        let output = handler(&bound, self.store.limits()).map_err(|message| EvalError::Service {
            function: descriptor.name.clone(),
            message,
        })?;

        wrap_output(&descriptor, output)
    }

    /// Binds arguments to parameters by position or by `name:` hint, then
    /// fills defaults and checks that required parameters are present.
    fn bind_arguments(
        &self,
        descriptor: &FunctionDescriptor,
        args: Vec<Token>,
    ) -> Result<Vec<Arg>, EvalError> {
        let function = &descriptor.name;
        let mut slots: Vec<Option<Arg>> = vec![None; descriptor.params.len()];
        let mut named = false;

        for (position, arg) in args.into_iter().enumerate() {
            let index = match &arg.hint {
                Some(hint) => {
                    named = true;
                    descriptor
                        .param_index(hint)
                        .ok_or_else(|| EvalError::UnknownParameter {
                            function: function.clone(),
                            param: hint.clone(),
                        })?
                }
                None if named => {
                    return Err(EvalError::PositionalAfterHint {
                        function: function.clone(),
                    });
                }
                None => position,
            };

            let (Some(param), Some(slot)) = (descriptor.params.get(index), slots.get_mut(index))
            else {
                return Err(EvalError::TooManyArguments {
                    function: function.clone(),
                    max: descriptor.params.len(),
                });
            };
            if slot.is_some() {
                return Err(EvalError::DuplicateParameter {
                    function: function.clone(),
                    param: param.name.clone(),
                });
            }
            *slot = Some(self.coerce(&arg, param)?);
        }

        descriptor
            .params
            .iter()
            .zip(slots)
            .map(|(param, slot)| match (slot, &param.default) {
                (Some(arg), _) => Ok(arg),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) if param.required => Err(EvalError::MissingParameter {
                    function: function.clone(),
                    param: param.name.clone(),
                }),
                (None, None) => Ok(Arg::Null),
            })
            .collect()
    }

    /// Converts an argument token to the parameter's declared type.
    fn coerce(&self, token: &Token, param: &Param) -> Result<Arg, EvalError> {
        let mismatch = || EvalError::ArgumentType {
            value: token.describe(),
            expected: param.ty,
        };

        let numeric = || -> Result<f64, EvalError> {
            match token.kind {
                TokenKind::Number => match token.value {
                    Payload::Number(n) => Ok(n),
                    _ => Err(mismatch()),
                },
                TokenKind::MatrixRef => self
                    .resolve(token)
                    .ok()
                    .and_then(|v| v.as_matrix().as_scalar())
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            }
        };

        match param.ty {
            ParamType::Int => {
                let n = numeric()?;
                if n.fract() != 0.0 || !n.is_finite() {
                    return Err(mismatch());
                }
                Ok(Arg::Int(n as i64))
            }
            ParamType::Float => numeric().map(Arg::Float),
            ParamType::Matrix => match token.kind {
                TokenKind::MatrixRef if !matches!(token.value, Payload::Matrices(_)) => {
                    self.resolve(token).map(Arg::Matrix)
                }
                _ => Err(mismatch()),
            },
            ParamType::Dynamic => match (token.kind, &token.value) {
                (TokenKind::Number, Payload::Number(n)) => Ok(Arg::Float(*n)),
                (TokenKind::String, Payload::Text(s)) => Ok(Arg::Text(s.clone())),
                (TokenKind::Null, _) => Ok(Arg::Null),
                (TokenKind::MatrixRef, Payload::Matrices(_)) => Err(mismatch()),
                (TokenKind::MatrixRef, _) => self.resolve(token).map(Arg::Matrix),
                _ => Err(mismatch()),
            },
        }
    }
}

fn pop_operands(stack: &mut Vec<Token>, count: usize, what: &str) -> Result<Vec<Token>, EvalError> {
    if stack.len() < count {
        return Err(EvalError::ArgumentCount {
            what: what.to_string(),
            expected: count,
            found: stack.len(),
        });
    }
    Ok(stack.split_off(stack.len() - count))
}

/// `name:value` marks the value as bound to the parameter `name`.
fn attach_hint(lhs: Token, mut rhs: Token) -> Result<Token, EvalError> {
    if lhs.kind != TokenKind::MatrixRef
        || lhs.value != Payload::Null
        || !store::is_identifier(&lhs.name)
    {
        return Err(EvalError::InvalidHint(lhs.describe()));
    }
    rhs.hint = Some(lhs.name);
    Ok(rhs)
}

fn wrap_output(descriptor: &FunctionDescriptor, output: Output) -> Result<Token, EvalError> {
    match (descriptor.returns, output) {
        (ReturnType::Matrix, Output::Value(v)) => Ok(Token::matrix(v)),
        (ReturnType::Matrices, Output::Values(vs)) => Ok(Token::matrices(vs)),
        (ReturnType::Float | ReturnType::Int, Output::Number(n)) => Ok(Token::number(n)),
        (ReturnType::Void, Output::Void) => Ok(Token::void(descriptor.name.clone())),
        (ReturnType::Null | ReturnType::Void, Output::Null) => Ok(Token::null()),
        (expected, _) => Err(EvalError::ReturnType {
            function: descriptor.name.clone(),
            expected,
        }),
    }
}

fn arithmetic(op: Arithmetic, a: Operand, b: Operand) -> Result<Token, EvalError> {
    match (a, b) {
        (Operand::Scalar(x), Operand::Scalar(y)) => Ok(Token::number(op.apply_decimal(x, y))),
        (Operand::Grid(m), Operand::Scalar(y)) => {
            Ok(Token::matrix(m.as_matrix().map(|x| op.apply(x, y)).into()))
        }
        (Operand::Scalar(x), Operand::Grid(m)) => {
            Ok(Token::matrix(m.as_matrix().map(|y| op.apply(x, y)).into()))
        }
        (Operand::Grid(a), Operand::Grid(b)) => {
            let (a, b) = (a.as_matrix(), b.as_matrix());
            let result = match (a.as_scalar(), b.as_scalar()) {
                (_, Some(y)) if a.shape() != b.shape() => a.map(|x| op.apply(x, y)),
                (Some(x), _) if a.shape() != b.shape() => b.map(|y| op.apply(x, y)),
                _ => a.zip_with(b, op.name(), |x, y| op.apply(x, y))?,
            };
            Ok(Token::matrix(result.into()))
        }
    }
}

fn modulo(a: Operand, b: Operand) -> Result<Token, EvalError> {
    match (a, b) {
        (Operand::Scalar(x), Operand::Scalar(y)) => Ok(Token::number(x % y)),
        (Operand::Grid(m), Operand::Scalar(y)) => {
            Ok(Token::matrix(m.as_matrix().map(|x| x % y).into()))
        }
        (Operand::Grid(m), Operand::Grid(d)) => match d.as_matrix().as_scalar() {
            Some(y) => Ok(Token::matrix(m.as_matrix().map(|x| x % y).into())),
            None => Err(EvalError::InvalidModulo),
        },
        (Operand::Scalar(_), Operand::Grid(_)) => Err(EvalError::InvalidModulo),
    }
}

fn elementwise_power(base: Operand, exponent: Operand) -> Result<Token, EvalError> {
    let e = exponent
        .as_scalar()
        .ok_or_else(|| EvalError::InvalidExponent("the exponent must be a scalar".into()))?;
    Ok(match base {
        Operand::Scalar(x) => Token::number(power(x, e)),
        Operand::Grid(m) => Token::matrix(m.as_matrix().map(|x| power(x, e)).into()),
    })
}

fn matrix_power(base: Operand, exponent: Operand) -> Result<Token, EvalError> {
    let base = base.into_matrix();
    if !base.is_square() {
        return Err(MatrixError::NotSquare {
            rows: base.rows(),
            cols: base.cols(),
        }
        .into());
    }
    let e = exponent
        .as_scalar()
        .ok_or_else(|| EvalError::InvalidExponent("the exponent must be a scalar".into()))?;
    if e < 0.0 {
        return Err(EvalError::InvalidExponent(format!(
            "'.^' needs a non-negative exponent, got {}",
            e
        )));
    }
    if e.fract() != 0.0 || e > f64::from(u32::MAX) {
        return Err(EvalError::InvalidExponent(format!(
            "'.^' needs a whole exponent, got {}",
            e
        )));
    }
    Ok(match e as u32 {
        0 => Token::number(1.0),
        1 => Token::matrix(base.into()),
        n => Token::matrix(base.self_power(n)?.into()),
    })
}
