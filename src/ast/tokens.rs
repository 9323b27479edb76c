use crate::{
    ast::operators::{Associativity, BRACE_PRIORITY, Operator, SEPARATOR_PRIORITY},
    registry::{FunctionDescriptor, ParamType, ReturnType},
    value::Value,
};

/// What a token is. Decides which other fields of [`Token`] mean anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The null value, or a glyph that isn't an operator
    ///
    /// # Examples
    /// ```text
    /// !null
    /// &
    /// ```
    Null,

    /// Quoted text
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String,

    /// Numeric literal or numeric result
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 1e-3
    /// !pi
    /// ```
    Number,

    /// A named matrix or table, resolved against the binding store when used
    ///
    /// # Examples
    /// ```text
    /// A
    /// data_2024
    /// ```
    MatrixRef,

    /// A function from the registry, written with the `!` prefix
    ///
    /// # Example
    /// ```text
    /// !Identity(4)
    /// ```
    Function,

    /// Argument separator `,`
    ArgSeparator,

    /// Arithmetic, assignment or hint operator
    Operator,

    /// `(`
    LeftBrace,

    /// `)`
    RightBrace,

    /// Documentation request
    ///
    /// # Examples
    /// ```text
    /// ?
    /// ?Inverse
    /// ?pi
    /// ```
    DocsQuery,

    /// Result of a pseudo-function that acts on the session, e.g. `!CleanUp()`
    Output,

    /// Result of a failed evaluation
    ErrorMarker,

    /// Result of a function that returns nothing
    Void,
}

/// Payload of a value-bearing token.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Null,
    Number(f64),
    Matrix(Value),
    /// Several matrices, only valid on the right of `A,B = ...`
    Matrices(Vec<Value>),
    Text(String),
}

/// A lexical unit, and also the unit of value during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Payload,
    /// Matrix or function name; empty for operators and literals
    pub name: String,
    pub operator: Option<Operator>,
    pub associativity: Associativity,
    pub priority: i32,
    /// Operand count of an operator
    pub param_count: usize,
    /// Argument count of a function call, set by the parser
    pub arg_count: usize,
    /// Copy of the registry entry for function tokens
    pub function: Option<FunctionDescriptor>,
    /// Parameter this value was bound to with `name:value`
    pub hint: Option<String>,
    /// Help text of a docs query
    pub info: Option<String>,
}

impl Token {
    fn of_kind(kind: TokenKind) -> Self {
        Token {
            kind,
            value: Payload::Null,
            name: String::new(),
            operator: None,
            associativity: Associativity::Left,
            priority: 0,
            param_count: 0,
            arg_count: 0,
            function: None,
            hint: None,
            info: None,
        }
    }

    pub fn number(n: f64) -> Self {
        Token {
            value: Payload::Number(n),
            ..Token::of_kind(TokenKind::Number)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Token {
            value: Payload::Text(s.into()),
            ..Token::of_kind(TokenKind::String)
        }
    }

    pub fn null() -> Self {
        Token::of_kind(TokenKind::Null)
    }

    /// A glyph that isn't a known operator; it evaluates as null.
    pub fn unknown(glyph: impl Into<String>) -> Self {
        Token {
            name: glyph.into(),
            ..Token::of_kind(TokenKind::Null)
        }
    }

    pub fn matrix_ref(name: impl Into<String>) -> Self {
        Token {
            name: name.into(),
            ..Token::of_kind(TokenKind::MatrixRef)
        }
    }

    /// A reference that also carries its value, e.g. the result of an assignment.
    pub fn bound_ref(name: impl Into<String>, value: Value) -> Self {
        Token {
            value: Payload::Matrix(value),
            ..Token::matrix_ref(name)
        }
    }

    /// An unnamed matrix produced by an operation.
    pub fn matrix(value: Value) -> Self {
        Token {
            value: Payload::Matrix(value),
            ..Token::of_kind(TokenKind::MatrixRef)
        }
    }

    pub fn matrices(values: Vec<Value>) -> Self {
        Token {
            value: Payload::Matrices(values),
            ..Token::of_kind(TokenKind::MatrixRef)
        }
    }

    pub fn function(descriptor: FunctionDescriptor) -> Self {
        Token {
            name: descriptor.name.clone(),
            priority: BRACE_PRIORITY,
            function: Some(descriptor),
            ..Token::of_kind(TokenKind::Function)
        }
    }

    pub fn operator(op: Operator) -> Self {
        Token {
            operator: Some(op),
            associativity: op.associativity(),
            priority: op.priority(),
            param_count: op.arity(),
            ..Token::of_kind(TokenKind::Operator)
        }
    }

    pub fn left_brace() -> Self {
        Token {
            priority: BRACE_PRIORITY,
            ..Token::of_kind(TokenKind::LeftBrace)
        }
    }

    pub fn right_brace() -> Self {
        Token {
            priority: BRACE_PRIORITY,
            ..Token::of_kind(TokenKind::RightBrace)
        }
    }

    pub fn separator() -> Self {
        Token {
            priority: SEPARATOR_PRIORITY,
            ..Token::of_kind(TokenKind::ArgSeparator)
        }
    }

    pub fn docs(name: impl Into<String>, info: impl Into<String>) -> Self {
        let info = info.into();
        Token {
            name: name.into(),
            value: Payload::Text(info.clone()),
            info: Some(info),
            ..Token::of_kind(TokenKind::DocsQuery)
        }
    }

    pub fn output(name: impl Into<String>, info: impl Into<String>) -> Self {
        Token {
            name: name.into(),
            info: Some(info.into()),
            ..Token::of_kind(TokenKind::Output)
        }
    }

    pub fn void(name: impl Into<String>) -> Self {
        Token {
            name: name.into(),
            ..Token::of_kind(TokenKind::Void)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Token {
            info: Some(message.into()),
            ..Token::of_kind(TokenKind::ErrorMarker)
        }
    }

    /// Operator glyph, `u-`/`u+` for the unary forms.
    pub fn symbol(&self) -> &str {
        match self.operator {
            Some(op) => op.symbol(),
            None => &self.name,
        }
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator && self.operator == Some(op)
    }

    pub fn param_types(&self) -> Vec<ParamType> {
        self.function
            .as_ref()
            .map(FunctionDescriptor::param_types)
            .unwrap_or_default()
    }

    pub fn service(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.service.as_str())
    }

    pub fn return_type(&self) -> Option<ReturnType> {
        self.function.as_ref().map(|f| f.returns)
    }

    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match (&self.value, self.kind) {
            (Payload::Number(n), _) => n.to_string(),
            (Payload::Text(s), TokenKind::String) => format!("\"{}\"", s),
            (_, TokenKind::MatrixRef) if !self.name.is_empty() => self.name.clone(),
            (Payload::Matrix(v), _) => {
                let (rows, cols) = crate::value::Grid::shape(v);
                format!("<{}x{} {}>", rows, cols, v.type_name())
            }
            (Payload::Matrices(vs), _) => format!("<{} matrices>", vs.len()),
            (_, TokenKind::Null) if !self.name.is_empty() => self.name.clone(),
            (_, TokenKind::Null) => "null".to_string(),
            (_, TokenKind::Operator) => self.symbol().to_string(),
            (_, kind) if !self.name.is_empty() => format!("{} ({:?})", self.name, kind),
            (_, kind) => format!("{:?}", kind),
        }
    }
}
