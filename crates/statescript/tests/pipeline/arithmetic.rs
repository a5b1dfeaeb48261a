//! Expression evaluation through the whole pipeline.

use statescript::{ParamBag, ScriptSystem, Value};

use crate::fixtures::{attach, entity, number};

fn run(source: &str) -> (ScriptSystem, statescript::EntityId) {
    let mut system = ScriptSystem::default();
    let owner = entity(1);
    attach(&mut system, owner, "expr", source);
    (system, owner)
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let (system, owner) = run("Number r = 1 + 2 * 3;");
    assert_eq!(number(&system, owner, "r"), 7.0);
}

#[test]
fn grouping_and_unary() {
    let (system, owner) = run(
        "Number a = (1 + 2) * 3;\n\
         Number b = -a;\n\
         Bool c = !(a > 10);",
    );
    assert_eq!(number(&system, owner, "a"), 9.0);
    assert_eq!(number(&system, owner, "b"), -9.0);
    assert_eq!(system.get_global(owner, "c"), Some(Value::Bool(true)));
}

#[test]
fn comparison_and_logic() {
    let (system, owner) = run(
        "Bool a = 1 < 2 && 2 <= 2;\n\
         Bool b = 3 == 3 || 1 > 5;\n\
         Bool c = 1 != 2;",
    );
    assert_eq!(system.get_global(owner, "a"), Some(Value::Bool(true)));
    assert_eq!(system.get_global(owner, "b"), Some(Value::Bool(true)));
    assert_eq!(system.get_global(owner, "c"), Some(Value::Bool(true)));
}

#[test]
fn number_bool_equality_crosses_by_truthiness() {
    let (system, owner) = run("Bool a = 1 == true;\nBool b = 0 == false;");
    assert_eq!(system.get_global(owner, "a"), Some(Value::Bool(true)));
    assert_eq!(system.get_global(owner, "b"), Some(Value::Bool(true)));
}

#[test]
fn incompatible_operands_yield_null_not_fault() {
    let (system, owner) = run(
        "Number r = \"abc\" + 1;\n\
         Number s = true * 2;\n\
         Number after = 5;",
    );
    assert_eq!(system.get_global(owner, "r"), Some(Value::Null));
    assert_eq!(system.get_global(owner, "s"), Some(Value::Null));
    // Execution continued past the soft failures
    assert_eq!(number(&system, owner, "after"), 5.0);
}

#[test]
fn vector_arithmetic_and_members() {
    let (system, owner) = run(
        "Vec2 a = Vec2(1, 2);\n\
         Vec2 b = Vec2(3, 4);\n\
         Vec2 sum = a + b;\n\
         Vec2 scaled = b * 2;\n\
         Number x = sum.x;\n\
         Number len = b.Length();",
    );
    assert_eq!(
        system.get_global(owner, "sum"),
        Some(Value::Vec2(glam::Vec2::new(4.0, 6.0)))
    );
    assert_eq!(
        system.get_global(owner, "scaled"),
        Some(Value::Vec2(glam::Vec2::new(6.0, 8.0)))
    );
    assert_eq!(number(&system, owner, "x"), 4.0);
    assert_eq!(number(&system, owner, "len"), 5.0);
}

#[test]
fn member_assignment_writes_back_to_variable() {
    let (system, owner) = run("Vec2 v = Vec2(3, 4);\nv.x = 9;");
    assert_eq!(
        system.get_global(owner, "v"),
        Some(Value::Vec2(glam::Vec2::new(9.0, 4.0)))
    );
}

#[test]
fn vec2_round_trips_through_its_string_form() {
    let (system, owner) = run(
        "Vec2 v = Vec2(3, 4);\n\
         String s = String(v);\n\
         Vec2 w = Vec2(s);",
    );
    assert_eq!(
        system.get_global(owner, "s"),
        Some(Value::string("(3, 4)"))
    );
    assert_eq!(
        system.get_global(owner, "w"),
        Some(Value::Vec2(glam::Vec2::new(3.0, 4.0)))
    );
}

#[test]
fn null_is_falsy_in_conditions() {
    let (system, owner) = run(
        "Number r = 0;\n\
         if (null) { r = 1; } else { r = 2; }",
    );
    assert_eq!(number(&system, owner, "r"), 2.0);
}

#[test]
fn native_call_in_expression() {
    let mut system = ScriptSystem::default();
    system.register_native("Double", |_, params: &ParamBag| {
        Value::Number(params.number("arg0").unwrap_or(0.0) * 2.0)
    });
    let owner = entity(1);
    attach(&mut system, owner, "expr", "Number r = Double(21) + 1;");
    assert_eq!(number(&system, owner, "r"), 43.0);
}
