//! A small end-to-end gameplay scenario: health tracking with a
//! boundary rule that fires `OnHealthChange` whenever the engine
//! changes an entity's health.

use statescript::{EntityId, ParamBag, ScriptSystem, Value};

use crate::fixtures::{drain, entity, number, system_with_log};

const HEALTH_SCRIPT: &str = "\
Number health = 10;
Bool dead = false;

Function OnHealthChange {
    health = newHealth;
    if (health <= 0) {
        dead = true;
        Log(\"died\");
        ChangeState(Dead);
    }
}

State Alive {
    OnUpdate { }
}
State Dead {
    OnEnter { Log(\"Dead.enter\"); }
}
ChangeState(Alive);
";

/// Engine-side rule: writing health goes through the script so the
/// script can react.
fn apply_damage(system: &mut ScriptSystem, target: EntityId, amount: f32) {
    let current = system
        .get_global(target, "health")
        .and_then(|v| v.as_number())
        .unwrap_or(0.0);
    let params = ParamBag::new().with("newHealth", Value::Number(current - amount));
    system.fire_event(target, "OnHealthChange", &params);
}

#[test]
fn damage_below_zero_sets_the_dead_flag() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    system.compile_str("health", HEALTH_SCRIPT).unwrap();
    system.attach(owner, "health", &ParamBag::new()).unwrap();
    drain(&log);

    apply_damage(&mut system, owner, 15.0);

    assert_eq!(number(&system, owner, "health"), -5.0);
    assert_eq!(system.get_global(owner, "dead"), Some(Value::Bool(true)));
    assert_eq!(system.current_state(owner), Some("Dead"));
    assert_eq!(drain(&log), vec!["died", "Dead.enter"]);
}

#[test]
fn nonlethal_damage_keeps_the_entity_alive() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    system.compile_str("health", HEALTH_SCRIPT).unwrap();
    system.attach(owner, "health", &ParamBag::new()).unwrap();
    drain(&log);

    apply_damage(&mut system, owner, 4.0);

    assert_eq!(number(&system, owner, "health"), 6.0);
    assert_eq!(system.get_global(owner, "dead"), Some(Value::Bool(false)));
    assert_eq!(system.current_state(owner), Some("Alive"));
    assert!(drain(&log).is_empty());
}

#[test]
fn two_entities_take_damage_independently() {
    let (mut system, _log) = system_with_log();
    system.compile_str("health", HEALTH_SCRIPT).unwrap();
    let a = entity(1);
    let b = entity(2);
    system.attach(a, "health", &ParamBag::new()).unwrap();
    system.attach(b, "health", &ParamBag::new()).unwrap();

    apply_damage(&mut system, a, 15.0);
    apply_damage(&mut system, b, 3.0);

    assert_eq!(system.get_global(a, "dead"), Some(Value::Bool(true)));
    assert_eq!(system.get_global(b, "dead"), Some(Value::Bool(false)));
    assert_eq!(number(&system, b, "health"), 7.0);
}

#[test]
fn overridden_starting_health_feeds_the_same_rule() {
    let (mut system, _log) = system_with_log();
    let owner = entity(1);
    system.compile_str("health", HEALTH_SCRIPT).unwrap();
    let overrides = ParamBag::new().with("health", Value::Number(3.0));
    system.attach(owner, "health", &overrides).unwrap();

    apply_damage(&mut system, owner, 5.0);
    assert_eq!(number(&system, owner, "health"), -2.0);
    assert_eq!(system.get_global(owner, "dead"), Some(Value::Bool(true)));
}
