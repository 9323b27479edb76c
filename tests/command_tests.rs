use matrix_expr::{
    BindingStore, Command, CommandState, EvalError, FunctionRegistry, Limits, Matrix, Session,
    TokenKind,
    output,
    registry::{Arg, Output},
    value::Grid,
};

const CUSTOM_METADATA: &str = r#"{
  "functions": [
    {
      "name": "F",
      "service": "test",
      "returns": "float",
      "params": [
        { "name": "row", "type": "int", "required": true },
        { "name": "col", "type": "int", "required": true }
      ]
    },
    {
      "name": "Describe",
      "service": "test",
      "returns": "float",
      "params": [{ "name": "thing", "type": "dynamic", "required": true }]
    },
    {
      "name": "Nothing",
      "service": "test",
      "returns": "null",
      "params": []
    },
    {
      "name": "Help",
      "service": "session",
      "returns": "void",
      "params": [{ "name": "topic", "type": "dynamic", "required": true }]
    },
    {
      "name": "Orphan",
      "service": "missing",
      "returns": "float",
      "params": []
    }
  ]
}"#;

fn f(args: &[Arg], _: &Limits) -> Result<Output, String> {
    match args {
        [Arg::Int(row), Arg::Int(col)] => Ok(Output::Number((row * 10 + col) as f64)),
        other => Err(format!("bad arguments {:?}", other)),
    }
}

/// 1 for numbers, 2 for text, 3 for matrices, 0 for null.
fn describe(args: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Number(match args.first() {
        Some(Arg::Float(_) | Arg::Int(_)) => 1.0,
        Some(Arg::Text(_)) => 2.0,
        Some(Arg::Matrix(_)) => 3.0,
        _ => 0.0,
    }))
}

fn nothing(_: &[Arg], _: &Limits) -> Result<Output, String> {
    Ok(Output::Null)
}

fn custom_session() -> Session {
    let mut registry = FunctionRegistry::from_json(CUSTOM_METADATA).unwrap();
    registry.register_handler("test", "F", f);
    registry.register_handler("test", "Describe", describe);
    registry.register_handler("test", "Nothing", nothing);
    Session::with_registry(registry, Limits::default())
}

fn session() -> Session {
    Session::new(Limits::default()).unwrap()
}

// ============================================================================
// Command state machine
// ============================================================================

#[test]
fn test_new_command_is_idle() {
    let command = Command::new("1 + 1");
    assert_eq!(command.state(), CommandState::Idle);
    assert!(!command.state().is_terminal());
    assert_eq!(command.message(), "");
}

#[test]
fn test_successful_command() {
    let registry = FunctionRegistry::builtin().unwrap();
    let mut store = BindingStore::default();
    let mut command = Command::new("3 + 4");

    assert_eq!(command.evaluate(&registry, &mut store), Ok(CommandState::Success));
    assert_eq!(command.output(), "7");
    assert!(command.state().is_terminal());
}

#[test]
fn test_second_evaluation_is_rejected() {
    let registry = FunctionRegistry::builtin().unwrap();
    let mut store = BindingStore::default();
    let mut command = Command::new("A = 5");

    assert_eq!(command.evaluate(&registry, &mut store), Ok(CommandState::Success));
    store.replace("A", Matrix::scalar(1.0).into());

    let err = command.evaluate(&registry, &mut store).unwrap_err();
    assert!(matches!(err, EvalError::AlreadyProcessed { .. }));
    assert!(err.to_string().contains("CMD_COMPILED"));
    assert!(err.to_string().contains("Success"));

    // Not re-run: A keeps the value set after the first run
    assert_eq!(store.get("A").unwrap().as_matrix(), &Matrix::scalar(1.0));
    assert_eq!(command.state(), CommandState::Success);
}

#[test]
fn test_failed_command_is_also_frozen() {
    let registry = FunctionRegistry::builtin().unwrap();
    let mut store = BindingStore::default();
    let mut command = Command::new("1 +");

    assert_eq!(command.evaluate(&registry, &mut store), Ok(CommandState::Error));
    assert!(command.evaluate(&registry, &mut store).is_err());
    assert_eq!(command.state(), CommandState::Error);
}

#[test]
fn test_error_records_message() {
    let mut session = session();
    let command = session.run("Z * 2");
    assert_eq!(command.state(), CommandState::Error);
    assert_eq!(command.message(), "Unknown variable 'Z'");
    assert_eq!(command.result().unwrap().kind, TokenKind::ErrorMarker);
}

#[test]
fn test_null_result_is_a_warning() {
    let mut session = session();
    let command = session.run("!null");
    assert_eq!(command.state(), CommandState::Warning);
    assert_eq!(command.output(), "null");
}

#[test]
fn test_settings_are_split_off() {
    let command = Command::new("A  +   1 ; compact ;  ; color=red ");
    assert_eq!(command.expression(), "A + 1");
    assert_eq!(command.settings(), ["compact", "color=red"]);
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn test_bindings_persist_across_commands() {
    let mut session = session();
    session.run("A = !Identity(2)");
    session.run("B = A * 3");
    let command = session.run("!Trace(B)");
    assert_eq!(command.state(), CommandState::Success);
    assert_eq!(command.output(), "6");
    assert_eq!(session.history().len(), 3);
}

#[test]
fn test_failed_command_leaves_store_untouched() {
    let mut session = Session::new(Limits {
        max_matrices: 2,
        ..Limits::default()
    })
    .unwrap();
    session.run("A = !Fill(2, 2, 1) + !Identity(2)");

    // L fits, U hits the ceiling; L must not survive the failure
    let command = session.run("L,U = !LU(A)");
    assert_eq!(command.state(), CommandState::Error);
    assert!(!session.store().contains("L"));
    assert_eq!(session.store().len(), 1);
}

#[test]
fn test_cleanup_clears_history() {
    let mut session = session();
    session.run("A = 1");
    session.run("A + 1");
    let command = session.run("!CleanUp()");
    assert_eq!(command.state(), CommandState::Success);
    assert_eq!(session.history().len(), 1);
    assert!(session.store().contains("A"));
}

#[test]
fn test_help_lists_functions() {
    let mut session = session();
    let command = session.run("!Help()");
    assert_eq!(command.state(), CommandState::Success);
    assert!(command.output().contains("!Identity(size: int) -> Matrix"));
    assert!(command.output().contains("[table]"));
}

#[test]
fn test_pseudo_functions_skip_parameter_binding() {
    // Declared parameters are ignored; the name alone selects the handler
    let mut custom = custom_session();
    let command = custom.run("!Help()");
    assert_eq!(command.state(), CommandState::Success);
    assert!(command.output().contains("!F("));

    let mut builtin = session();
    let command = builtin.run("!CleanUp(1)");
    assert_eq!(command.state(), CommandState::Error);
    assert_eq!(command.message(), "'CleanUp' takes at most 0 arguments");
}

#[test]
fn test_output_rounding() {
    let mut session = Session::new(Limits {
        decimals: 2,
        ..Limits::default()
    })
    .unwrap();
    assert_eq!(session.run("2 / 3").output(), "0.67");
    assert_eq!(session.run("A = !Fill(1, 2, 0.125)").output(), "A =\n0.13  0.13");
}

#[test]
fn test_json_output() {
    let mut session = session();
    let command = session.run("1 + 1");
    assert_eq!(
        output::to_json(command, false).unwrap(),
        r#"{"state":"Success","message":"OK","output":"2"}"#
    );
}

// ============================================================================
// Custom functions
// ============================================================================

#[test]
fn test_positional_and_hinted_calls_match() {
    let mut session = custom_session();
    assert_eq!(session.run("!F(3, 4)").output(), "34");
    assert_eq!(session.run("!F(col:4, row:3)").output(), "34");

    let command = session.run("!F(3, row:1)");
    assert_eq!(command.state(), CommandState::Error);
}

#[test]
fn test_dynamic_parameter_accepts_any_value() {
    let mut session = custom_session();
    assert_eq!(session.run("!Describe(2)").output(), "1");
    assert_eq!(session.run("!Describe(\"text\")").output(), "2");
    session.run("A = 1");
    assert_eq!(session.run("!Describe(A)").output(), "3");
    assert_eq!(session.run("!Describe(!null)").output(), "0");
}

#[test]
fn test_null_return_type() {
    let mut session = custom_session();
    assert_eq!(session.run("!Nothing()").state(), CommandState::Warning);
}

#[test]
fn test_unknown_service() {
    let mut session = custom_session();
    let command = session.run("!Orphan()");
    assert_eq!(command.state(), CommandState::Error);
    assert!(command.message().contains("missing"));
}

#[test]
fn test_service_error_message_is_verbatim() {
    let mut registry = FunctionRegistry::from_json(CUSTOM_METADATA).unwrap();
    registry.register_handler("test", "F", |_, _| Err("row out of range".to_string()));
    let mut session = Session::with_registry(registry, Limits::default());

    let command = session.run("!F(1, 2)");
    assert_eq!(command.state(), CommandState::Error);
    assert_eq!(command.message(), "row out of range");
}
