use std::path::PathBuf;

use log::info;

use super::{CliError, load::load_value};
use crate::{
    command::{Command, Session},
    config::Limits,
};

/// Options for evaluating a batch of commands
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// Commands, run in order against one session
    pub commands: Vec<String>,
    pub limits: Limits,
    /// Values to bind before the first command
    pub loads: Vec<(String, PathBuf)>,
}

/// Splits a `NAME=PATH` argument.
pub fn parse_load_spec(arg: &str) -> Result<(String, PathBuf), CliError> {
    match arg.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(CliError::InvalidLoad(arg.to_string())),
    }
}

/// A session with the built-in functions and the requested files bound.
pub fn open_session(limits: Limits, loads: &[(String, PathBuf)]) -> Result<Session, CliError> {
    let mut session = Session::new(limits)?;
    for (name, path) in loads {
        let value = load_value(path)?;
        session.bind(name, value)?;
        info!("bound '{}' from {}", name, path.display());
    }
    Ok(session)
}

/// Runs every command and returns them in their final state.
pub fn execute_eval(options: &EvalOptions) -> Result<Vec<Command>, CliError> {
    let mut session = open_session(options.limits, &options.loads)?;
    Ok(options
        .commands
        .iter()
        .map(|text| session.run(text).clone())
        .collect())
}
