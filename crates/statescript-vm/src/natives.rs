//! Native event registry.
//!
//! Free calls in script (`PlaySound("bang", 0.5);`) dispatch to engine
//! functions registered by name. A call to an unregistered name is a
//! logged no-op yielding Null.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use statescript_core::EntityId;

use crate::params::ParamBag;
use crate::value::Value;

/// An engine function callable from script. Receives the calling
/// script's owner entity and the call arguments.
pub type NativeFn = Rc<dyn Fn(EntityId, &ParamBag) -> Value>;

/// Name-keyed table of native functions.
#[derive(Default)]
pub struct NativeRegistry {
    entries: IndexMap<String, NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native under `name`, replacing any previous binding.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(EntityId, &ParamBag) -> Value + 'static,
    {
        self.entries.insert(name.into(), Rc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Invoke a native by name. Unknown names warn and return None; the
    /// caller substitutes Null.
    pub fn call(&self, name: &str, owner: EntityId, params: &ParamBag) -> Option<Value> {
        match self.entries.get(name) {
            Some(f) => Some(f(owner, params)),
            None => {
                warn!(name, %owner, "call to unregistered native");
                None
            }
        }
    }
}

impl std::fmt::Debug for NativeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRegistry")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
