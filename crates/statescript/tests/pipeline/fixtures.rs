//! Shared helpers for the pipeline suite.

use std::cell::RefCell;
use std::rc::Rc;

use statescript::{EntityId, ParamBag, ScriptSystem, Value};

pub fn entity(id: u64) -> EntityId {
    EntityId::new(id)
}

/// A system with a `Log(msg)` native that appends to a shared record,
/// so tests can assert on call order.
pub fn system_with_log() -> (ScriptSystem, Rc<RefCell<Vec<String>>>) {
    let mut system = ScriptSystem::default();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = log.clone();
    system.register_native("Log", move |_, params: &ParamBag| {
        let entry = params.arg(0).map(Value::to_string).unwrap_or_default();
        sink.borrow_mut().push(entry);
        Value::Null
    });
    (system, log)
}

/// Compile `source` under `key` and attach it to `owner`.
pub fn attach(system: &mut ScriptSystem, owner: EntityId, key: &str, source: &str) {
    system.compile_str(key, source).expect("fixture compiles");
    system
        .attach(owner, key, &ParamBag::new())
        .expect("fixture attaches");
}

pub fn number(system: &ScriptSystem, owner: EntityId, name: &str) -> f32 {
    system
        .get_global(owner, name)
        .and_then(|v| v.as_number())
        .unwrap_or_else(|| panic!("global '{name}' is not a number"))
}

pub fn drain(log: &Rc<RefCell<Vec<String>>>) -> Vec<String> {
    log.borrow_mut().drain(..).collect()
}
