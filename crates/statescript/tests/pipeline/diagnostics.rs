//! Compile-error reporting and recovery through the boundary API.

use statescript::{compile_source, ErrorCode, ParamBag, ScriptSystem, SystemError, Value};

use crate::fixtures::entity;

#[test]
fn one_pass_surfaces_multiple_independent_errors() {
    let output = compile_source(
        "bad",
        "Number = 1;\n\
         Number y = ;\n\
         Number y2 = 2;\n\
         State A { }\n\
         State A { }",
    );
    assert!(output.has_errors());
    assert!(output.definition.is_none());
    assert!(output.diagnostics.len() >= 3);
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code() == ErrorCode::E201));
}

#[test]
fn diagnostics_carry_lines_and_codes() {
    let output = compile_source("bad", "Number a = 1;\nNumber a = 2;");
    let diag = output
        .diagnostics
        .iter()
        .find(|d| d.code() == ErrorCode::E200)
        .expect("redeclaration reported");
    assert_eq!(diag.line(), 2);
    assert!(diag.to_string().starts_with("error[E200] line 2:"));
}

#[test]
fn unterminated_string_recovers() {
    let output = compile_source("bad", "String s = \"oops\nNumber n = 1;\nNumber n = 2;");
    assert!(output.has_errors());
    // Both the scan error and the later redeclaration surface
    assert!(output.diagnostics.iter().any(|d| d.code() == ErrorCode::E002));
    assert!(output.diagnostics.iter().any(|d| d.code() == ErrorCode::E200));
}

#[test]
fn erroring_script_is_not_installed() {
    let mut system = ScriptSystem::default();
    let err = system.compile_str("bad", "Number = ;").unwrap_err();
    let SystemError::Compile { key, diagnostics } = err else {
        panic!("expected compile error");
    };
    assert_eq!(key, "bad");
    assert!(!diagnostics.is_empty());

    // Nothing to attach to
    assert!(matches!(
        system.attach(entity(1), "bad", &ParamBag::new()),
        Err(SystemError::UnknownScript(_))
    ));
}

#[test]
fn failed_recompile_keeps_running_script() {
    let mut system = ScriptSystem::default();
    system.compile_str("s", "Number v = 1;").unwrap();
    system.attach(entity(1), "s", &ParamBag::new()).unwrap();

    assert!(system.reload("s", "State { }").is_err());

    // Old definition still cached and still running
    assert_eq!(system.get_global(entity(1), "v"), Some(Value::Number(1.0)));
    system.attach(entity(2), "s", &ParamBag::new()).unwrap();
    assert_eq!(system.get_global(entity(2), "v"), Some(Value::Number(1.0)));
}

#[test]
fn duplicate_event_and_invalid_target_codes() {
    let output = compile_source(
        "bad",
        "State A { OnEnter { } OnEnter { } }\nFunction F { 1 = 2; }",
    );
    assert!(output.diagnostics.iter().any(|d| d.code() == ErrorCode::E202));
    assert!(output.diagnostics.iter().any(|d| d.code() == ErrorCode::E102));
}
