/// How operators of equal priority group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Priority of `(` and `)`. Only used for matching, never compared.
pub const BRACE_PRIORITY: i32 = 100;

/// Priority of the argument separator `,`.
pub const SEPARATOR_PRIORITY: i32 = 1;

/// Every operator the language knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Assignment (`=`)
    Assign,
    /// Parameter hint (`name:value`)
    Hint,
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Element-wise multiplication (`*`)
    Multiply,
    /// Element-wise division (`/`)
    Divide,
    /// Remainder (`%`)
    Modulo,
    /// Element-wise power (`^`)
    Power,
    /// Matrix multiplication (`.*`)
    MatrixMultiply,
    /// Multiplication by the inverse of the right operand (`./`)
    MatrixDivide,
    /// Repeated matrix multiplication (`.^`)
    MatrixPower,
    /// Unary minus (`u-`)
    Negate,
    /// Unary plus (`u+`)
    Identity,
}

impl Operator {
    /// Looks up a binary operator by the glyph the user typed.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Operator::Assign),
            ":" => Some(Operator::Hint),
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Subtract),
            "*" => Some(Operator::Multiply),
            "/" => Some(Operator::Divide),
            "%" => Some(Operator::Modulo),
            "^" => Some(Operator::Power),
            ".*" => Some(Operator::MatrixMultiply),
            "./" => Some(Operator::MatrixDivide),
            ".^" => Some(Operator::MatrixPower),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::Hint => ":",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "^",
            Operator::MatrixMultiply => ".*",
            Operator::MatrixDivide => "./",
            Operator::MatrixPower => ".^",
            Operator::Negate => "u-",
            Operator::Identity => "u+",
        }
    }

    /// Higher binds tighter.
    pub fn priority(self) -> i32 {
        match self {
            Operator::Assign => 0,
            Operator::Hint => 2,
            Operator::Add | Operator::Subtract => 3,
            Operator::Multiply
            | Operator::Divide
            | Operator::Modulo
            | Operator::MatrixMultiply
            | Operator::MatrixDivide => 4,
            Operator::Power | Operator::MatrixPower => 5,
            Operator::Negate | Operator::Identity => 200,
        }
    }

    pub fn associativity(self) -> Associativity {
        match self {
            Operator::Assign
            | Operator::Power
            | Operator::MatrixPower
            | Operator::Negate
            | Operator::Identity => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    /// Number of operands.
    pub fn arity(self) -> usize {
        match self {
            Operator::Negate | Operator::Identity => 1,
            _ => 2,
        }
    }

    /// The unary form of `+` and `-`.
    pub fn to_unary(self) -> Option<Self> {
        match self {
            Operator::Add => Some(Operator::Identity),
            Operator::Subtract => Some(Operator::Negate),
            _ => None,
        }
    }
}
