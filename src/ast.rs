//! # Token model
//!
//! The compiler never builds a tree. A command is turned into a flat list of
//! [`Token`]s, reordered into postfix order, and evaluated with a stack, so
//! the token is both the lexical unit and the unit of value.
//!
//! - **[tokens]** - [`Token`], its [`TokenKind`] tag and value [`Payload`]
//! - **[operators]** - the fixed operator table: glyph, priority,
//!   associativity and arity
//!
//! ## Operator table
//!
//! | glyph | meaning                         | priority | assoc |
//! |-------|---------------------------------|----------|-------|
//! | `=`   | assignment                      | 0        | right |
//! | `,`   | argument separator              | 1        |       |
//! | `:`   | parameter hint                  | 2        | left  |
//! | `+ -` | add, subtract                   | 3        | left  |
//! | `* / %` | element-wise, remainder       | 4        | left  |
//! | `.* ./` | matrix multiply / divide      | 4        | left  |
//! | `^ .^` | element-wise / matrix power    | 5        | right |
//! | `u- u+` | unary minus / plus            | 200      | right |
//!
//! ## Example
//!
//! ```text
//! B = -A .* !Identity(3) + 2
//! ```
pub mod operators;
pub mod tokens;

pub use operators::{Associativity, Operator};
pub use tokens::{Payload, Token, TokenKind};
