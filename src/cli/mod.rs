//! CLI support for matrix-expr
//!
//! Provides programmatic access to the `mxe` commands so they can be
//! embedded in other front ends.

mod docs;
mod eval;
mod load;

pub use docs::{DocCategory, get_doc, get_docs_overview};
pub use eval::{EvalOptions, execute_eval, open_session, parse_load_spec};
pub use load::{load_value, value_from_json};

use std::io;

use crate::{evaluator::EvalError, registry::RegistryError, store::StoreError};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Evaluation error outside of a command, e.g. re-running one
    Eval(EvalError),
    /// Built-in function metadata failed to load
    Registry(RegistryError),
    /// A preloaded value couldn't be bound
    Store(StoreError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// JSON that isn't a matrix or table
    InvalidData(String),
    /// `--load` argument not of the form NAME=PATH
    InvalidLoad(String),
    /// Unknown documentation topic
    UnknownTopic(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Eval(e) => write!(f, "Evaluation error: {}", e),
            CliError::Registry(e) => write!(f, "Function metadata error: {}", e),
            CliError::Store(e) => write!(f, "Can't bind value: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            CliError::InvalidLoad(s) => write!(f, "Expected NAME=PATH, got '{}'", s),
            CliError::UnknownTopic(t) => {
                write!(f, "Unknown topic: '{}'\nRun 'mxe doc' to see available topics.", t)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Eval(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EvalError> for CliError {
    fn from(e: EvalError) -> Self {
        CliError::Eval(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
