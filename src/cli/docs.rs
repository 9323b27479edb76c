//! Documentation content for the mxe CLI

use super::CliError;
use crate::{docs, registry::FunctionRegistry};

/// Available documentation topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Operators,
    Assignment,
    Functions,
    Tables,
}

impl DocCategory {
    /// Parse topic name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "operators" | "ops" => Some(Self::Operators),
            "assignment" | "assign" | "variables" => Some(Self::Assignment),
            "functions" | "function" | "fns" => Some(Self::Functions),
            "tables" | "table" | "dataframes" => Some(Self::Tables),
            _ => None,
        }
    }
}

/// Get the docs overview (topic listing)
pub fn get_docs_overview() -> &'static str {
    r#"MXE DOCUMENTATION

mxe evaluates matrix expressions. Every command is one expression, optionally
followed by ';'-separated display settings. Named matrices live for the whole
session.

DOCUMENTATION TOPICS

  syntax            Numbers, names, functions, special values and help queries
  operators         Arithmetic, matrix operators, precedence and unary signs
  assignment        Creating and updating named matrices
  functions         Every built-in function with its signature
  tables            Tables (matrices with named columns)

QUICK REFERENCE

  A = !Identity(3)         Create a matrix
  B = A .* A + 1           Matrix product, element-wise add
  !Fill(cols:3, rows:2)    Named arguments
  L,U = !LU(A)             Several results at once
  ?Inverse                 Help for one function, value or matrix
  ?                        Help for everything

Run 'mxe doc <topic>' for a topic, or 'mxe doc <Name>' for a function.
"#
}

/// Documentation for a topic, or for a single function or special value.
pub fn get_doc(name: &str, registry: &FunctionRegistry) -> Result<String, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Syntax) => Ok(SYNTAX_DOC.to_string()),
        Some(DocCategory::Operators) => Ok(OPERATORS_DOC.to_string()),
        Some(DocCategory::Assignment) => Ok(ASSIGNMENT_DOC.to_string()),
        Some(DocCategory::Functions) => Ok(docs::overview(registry)),
        Some(DocCategory::Tables) => Ok(TABLES_DOC.to_string()),
        None => {
            let name = name.trim_start_matches(['!', '?']);
            if let Some(f) = registry.find(name) {
                Ok(docs::render_function(&f))
            } else if let Some(c) = crate::constants::get(name) {
                Ok(docs::render(&docs::DocTarget::Constant(c)))
            } else {
                Err(CliError::UnknownTopic(name.to_string()))
            }
        }
    }
}

const SYNTAX_DOC: &str = r#"SYNTAX - Values and Names

NUMBERS
  42   3.14   .5   1e-3
    Plain numbers. A number stored under a name becomes a 1x1 matrix.

NAMES
  A   data_2024   _tmp
    Letters, digits and underscores, not starting with a digit. A name
    refers to the matrix bound to it; using an unbound name is an error.

    Constraints:
      - Names are case-sensitive
      - Names are limited in length (see --max-name-length)

FUNCTIONS
  !Name(arg, arg, ...)
    Functions are written with a '!' prefix.

    Examples:
      !Identity(3)
      !Fill(2, 3, 0.5)
      !Determinant(A)

    Named arguments:
      !Fill(cols:3, rows:2)
      !Fill(2, 3, value:7)

    Constraints:
      - Once an argument is named, the rest must be named too
      - A parameter can't be given twice
      - Optional parameters take their default when left out

SPECIAL VALUES
  !pi  !e  !tau  !phi  !inf  !nan  !null
    Constants, written like functions without parentheses.

TEXT
  "hello"
    Quoted text, only accepted by functions with a dynamic parameter.

HELP QUERIES
  ?           Everything: functions and special values
  ?Inverse    One function
  ?pi         One special value
  ?A          The shape of the matrix A

SETTINGS
  A .* B ; compact
    Everything after the first ';' is kept as display settings and
    doesn't take part in evaluation.
"#;

const OPERATORS_DOC: &str = r#"OPERATORS - Arithmetic and Matrix Operators

ELEMENT-WISE
  +  -  *  /
    Numbers, or matrices of the same shape. A number or 1x1 matrix on
    either side is applied to every element.

    Examples:
      A + 1
      A * B
      2 / A

  %
    Remainder. The divisor must be a number or a 1x1 matrix.

  ^
    Raises a number, or every element of a matrix, to a numeric power.
      0 ^ 0    =>  NaN
      0 ^ -1   =>  Infinity
      0 ^ 2    =>  0

MATRIX
  .*
    Matrix product. The left operand's column count must match the right
    operand's row count.

  ./
    Multiplies by the inverse of the right operand: A ./ B is A .* B^-1.
    Fails when B is singular.

  .^
    Repeated matrix product of a square matrix with itself.
      A .^ 0   =>  1
      A .^ 1   =>  A
      A .^ 3   =>  A .* A .* A
    The exponent must be a whole number, zero or more.

UNARY SIGNS
  -A   +A   4 - -3
    A '+' or '-' at the start, after '(' or ',' or after another operator
    is a sign, not a subtraction.

PRECEDENCE (highest first)
  u- u+         signs                    right to left
  ^ .^          powers                   right to left
  * / % .* ./   products                 left to right
  + -           sums                     left to right
  :             named argument
  =             assignment               right to left

  Parentheses group as usual: 2 * (3 + 4)  =>  14
"#;

const ASSIGNMENT_DOC: &str = r#"ASSIGNMENT - Named Matrices

CREATE OR UPDATE
  NAME = expression
    Binds the result to NAME. Numbers are stored as 1x1 matrices.

    Examples:
      A = 5
      B = !Identity(3) * 2
      A = A .* B

    Constraints:
      - Exactly one '=' per command
      - Creating a new name counts against the session limit
        (--max-matrices, --max-tables); updating an existing one doesn't

COMPOUND
  NAME += expression    (also -=  *=  /=  %=  ^=)
    Short for NAME = NAME + (expression).

SEVERAL RESULTS
  N1,N2 = expression
    For functions returning several matrices.

    Example:
      L,U = !LU(A)

FAILED COMMANDS
  A command that fails leaves every binding as it was, even if part of it
  ran before the error.
"#;

const TABLES_DOC: &str = r#"TABLES - Matrices with Named Columns

CREATING
  T = !ToTable(A)
    Labels the columns of A col1, col2, ...

  mxe --load T=data.json eval "T"
    An array of objects becomes a table, columns in the key order of the
    first object. An array of arrays becomes a plain matrix.

USING
  !Mean(T)   !Sum(T)
    One row with the mean or sum of every column, labels kept.

  !ToMatrix(T)
    Drops the labels.

  T * 2
    Arithmetic works on the numbers; the result is a plain matrix.

LIMITS
  Tables have their own ceiling (--max-tables), separate from matrices.
"#;
