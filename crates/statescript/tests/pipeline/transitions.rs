//! State machine transition semantics.

use statescript::Value;

use crate::fixtures::{attach, drain, entity, number, system_with_log};

const PATROL: &str = "\
State Patrol {
    Number steps = 0;
    OnEnter { Log(\"Patrol.enter\"); }
    OnExit { Log(\"Patrol.exit\"); }
}
State Alert {
    OnEnter { Log(\"Alert.enter\"); }
    OnExit { Log(\"Alert.exit\"); }
}
ChangeState(Patrol);
";

#[test]
fn global_chunk_can_set_the_initial_state() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    attach(&mut system, owner, "guard", PATROL);

    assert_eq!(system.current_state(owner), Some("Patrol"));
    assert_eq!(drain(&log), vec!["Patrol.enter"]);
}

#[test]
fn transition_order_is_exit_then_reinit_then_enter() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    attach(&mut system, owner, "guard", PATROL);
    drain(&log);

    system.change_state(owner, "Alert").unwrap();
    assert_eq!(drain(&log), vec!["Patrol.exit", "Alert.enter"]);
    assert_eq!(system.current_state(owner), Some("Alert"));
}

#[test]
fn self_transition_is_a_noop() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    attach(&mut system, owner, "guard", PATROL);
    drain(&log);

    system.change_state(owner, "Patrol").unwrap();
    assert!(drain(&log).is_empty());
    assert_eq!(system.current_state(owner), Some("Patrol"));
}

#[test]
fn unknown_state_transition_is_a_noop() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    attach(&mut system, owner, "guard", PATROL);
    drain(&log);

    system.change_state(owner, "Berserk").unwrap();
    assert!(drain(&log).is_empty());
    assert_eq!(system.current_state(owner), Some("Patrol"));
}

#[test]
fn state_locals_are_rebuilt_on_reentry() {
    let (mut system, _log) = system_with_log();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "guard",
        "Number seen = 0;\n\
         State A {\n\
           Number charge = 3;\n\
           Function OnDrain { charge = charge - 1; seen = charge; }\n\
         }\n\
         State B { }\n\
         ChangeState(A);",
    );

    // State locals are not visible as globals
    assert_eq!(system.get_global(owner, "charge"), None);

    system.fire_event(owner, "OnDrain", &statescript::ParamBag::new());
    system.fire_event(owner, "OnDrain", &statescript::ParamBag::new());
    assert_eq!(number(&system, owner, "seen"), 1.0);

    // Leaving and re-entering resets charge to its declared value
    system.change_state(owner, "B").unwrap();
    system.change_state(owner, "A").unwrap();
    system.fire_event(owner, "OnDrain", &statescript::ParamBag::new());
    assert_eq!(number(&system, owner, "seen"), 2.0);
}

#[test]
fn event_handler_can_change_state() {
    let (mut system, log) = system_with_log();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "guard",
        "State Idle {\n\
           OnExit { Log(\"Idle.exit\"); }\n\
           Function OnAlert { ChangeState(Chase); Log(\"after\"); }\n\
         }\n\
         State Chase {\n\
           OnEnter { Log(\"Chase.enter\"); }\n\
         }\n\
         ChangeState(Idle);",
    );
    drain(&log);

    system.fire_event(owner, "OnAlert", &statescript::ParamBag::new());
    // Transition is eager; the rest of the handler still runs afterwards
    assert_eq!(drain(&log), vec!["Idle.exit", "Chase.enter", "after"]);
    assert_eq!(system.current_state(owner), Some("Chase"));
}

#[test]
fn runaway_mutual_transitions_disable_the_component() {
    let (mut system, _log) = system_with_log();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "guard",
        "State A { OnEnter { ChangeState(B); } }\n\
         State B { OnEnter { ChangeState(A); } }\n\
         ChangeState(A);",
    );

    // Initialization hit the depth limit; the component is disabled and
    // every dispatch is a checked no-op
    assert!(!system.component(owner).unwrap().is_valid());
    assert!(!system.fire_event(owner, "OnPing", &statescript::ParamBag::new()));
}

#[test]
fn update_reaches_only_the_current_state() {
    let (mut system, _log) = system_with_log();
    let owner = entity(1);
    attach(
        &mut system,
        owner,
        "guard",
        "Number a = 0;\n\
         Number b = 0;\n\
         State A { OnUpdate { a = a + 1; } }\n\
         State B { OnUpdate { b = b + 1; } }\n\
         ChangeState(A);",
    );

    system.update(0.016);
    system.update(0.016);
    system.change_state(owner, "B").unwrap();
    system.update(0.016);

    assert_eq!(number(&system, owner, "a"), 2.0);
    assert_eq!(number(&system, owner, "b"), 1.0);
    assert_eq!(system.get_global(owner, "a"), Some(Value::Number(2.0)));
}
