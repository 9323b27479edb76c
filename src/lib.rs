pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod config;
pub mod constants;
pub mod docs;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod registry;
pub mod services;
pub mod store;
pub mod value;

pub use ast::{Operator, Payload, Token, TokenKind};
pub use command::{Command, CommandState, Session};
pub use config::Limits;
pub use evaluator::{EvalError, Evaluator};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use registry::{FunctionDescriptor, FunctionRegistry, RegistryError};
pub use store::{BindingStore, StoreError};
pub use value::{Grid, Matrix, MatrixError, Table, Value};
