//! Event dispatch, parameters, and the engine-facing variable API.

use statescript::{ParamBag, ScriptSystem, Value};

use crate::fixtures::{attach, entity, number};

#[test]
fn dispatch_resolves_state_before_global() {
    let mut system = ScriptSystem::default();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "s",
        "Number from = 0;\n\
         Function OnPing { from = 1; }\n\
         State Armed { Function OnPing { from = 2; } }",
    );

    assert!(system.fire_event(owner, "OnPing", &ParamBag::new()));
    assert_eq!(number(&system, owner, "from"), 1.0);

    system.change_state(owner, "Armed").unwrap();
    assert!(system.fire_event(owner, "OnPing", &ParamBag::new()));
    assert_eq!(number(&system, owner, "from"), 2.0);
}

#[test]
fn unhandled_event_mutates_nothing() {
    let mut system = ScriptSystem::default();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "s",
        "Number v = 7;\nState A { }\nChangeState(A);",
    );

    assert!(!system.fire_event(owner, "OnNothing", &ParamBag::new()));
    assert_eq!(number(&system, owner, "v"), 7.0);
    assert_eq!(system.current_state(owner), Some("A"));
}

#[test]
fn event_params_are_readable_by_name() {
    let mut system = ScriptSystem::default();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "s",
        "Number got = 0;\nString who = \"\";\n\
         Function OnHit { got = amount; who = attacker; }",
    );

    let params = ParamBag::new()
        .with("amount", Value::Number(12.0))
        .with("attacker", Value::string("bandit"));
    system.fire_event(owner, "OnHit", &params);

    assert_eq!(number(&system, owner, "got"), 12.0);
    assert_eq!(system.get_global(owner, "who"), Some(Value::string("bandit")));
}

#[test]
fn broadcast_counts_handlers() {
    let mut system = ScriptSystem::default();
    system
        .compile_str("listener", "Number heard = 0;\nFunction OnSignal { heard = 1; }")
        .unwrap();
    system.compile_str("deaf", "Number x = 0;").unwrap();

    system.attach(entity(1), "listener", &ParamBag::new()).unwrap();
    system.attach(entity(2), "deaf", &ParamBag::new()).unwrap();
    system.attach(entity(3), "listener", &ParamBag::new()).unwrap();

    assert_eq!(system.broadcast("OnSignal", &ParamBag::new()), 2);
    assert_eq!(number(&system, entity(1), "heard"), 1.0);
    assert_eq!(number(&system, entity(3), "heard"), 1.0);
}

#[test]
fn instance_overrides_beat_script_defaults() {
    let mut system = ScriptSystem::default();
    system
        .compile_str("s", "Number health = 100;\nNumber speed = 5;")
        .unwrap();

    let overrides = ParamBag::new().with("health", Value::Number(25.0));
    system.attach(entity(1), "s", &overrides).unwrap();

    assert_eq!(number(&system, entity(1), "health"), 25.0);
    assert_eq!(number(&system, entity(1), "speed"), 5.0);
}

#[test]
fn engine_reads_and_writes_script_globals() {
    let mut system = ScriptSystem::default();
    let owner = entity(1);
    attach(&mut system, owner, "s", "Number score = 0;");

    system.set_global(owner, "score", Value::Number(90.0)).unwrap();
    assert_eq!(number(&system, owner, "score"), 90.0);
    assert_eq!(system.get_global(owner, "missing"), None);
}

#[test]
fn entity_references_resolve_after_spawn() {
    let mut system = ScriptSystem::default();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "s",
        "Entity target = \"guard_01\";\nEntity ghost = \"nobody\";",
    );

    // Before resolution the deferred reference is Null
    assert_eq!(system.get_global(owner, "target"), Some(Value::Null));

    system.resolve_entity_refs(|name| (name == "guard_01").then(|| entity(42)));
    assert_eq!(
        system.get_global(owner, "target"),
        Some(Value::Entity(entity(42)))
    );
    assert_eq!(system.get_global(owner, "ghost"), Some(Value::Null));
}

#[test]
fn shared_definition_keeps_instances_separate() {
    let mut system = ScriptSystem::default();
    system
        .compile_str("s", "Number count = 0;\nFunction OnBump { count = count + 1; }")
        .unwrap();
    system.attach(entity(1), "s", &ParamBag::new()).unwrap();
    system.attach(entity(2), "s", &ParamBag::new()).unwrap();

    system.fire_event(entity(1), "OnBump", &ParamBag::new());
    system.fire_event(entity(1), "OnBump", &ParamBag::new());
    system.fire_event(entity(2), "OnBump", &ParamBag::new());

    assert_eq!(number(&system, entity(1), "count"), 2.0);
    assert_eq!(number(&system, entity(2), "count"), 1.0);
}

#[test]
fn natives_receive_the_owner_entity() {
    let mut system = ScriptSystem::default();
    system.register_native("MyId", |owner, _: &ParamBag| {
        Value::Number(owner.as_u64() as f32)
    });
    let owner = entity(9);
    attach(&mut system, owner, "s", "Number id = MyId();");
    assert_eq!(number(&system, owner, "id"), 9.0);
}
