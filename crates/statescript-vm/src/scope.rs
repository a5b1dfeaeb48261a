//! The variable scope chain.
//!
//! Resolution walks innermost to outermost: transient block scopes, then
//! the current state's locals, then the script globals. Engine-side
//! externals are never in the chain; they only cross through member and
//! native-call opcodes.
//!
//! `define` keeps an already-present value in the target scope instead
//! of overwriting it. That is what lets per-instance overrides survive
//! the global chunk's own initializers: the component seeds the override
//! first, then the DefineVar for the same name becomes a no-op. State
//! re-initialization still resets locals because the transition installs
//! a fresh state scope before re-running the state chunk.

use indexmap::IndexMap;

use crate::value::Value;

type Scope = IndexMap<String, Value>;

/// Scope chain of one script instance.
#[derive(Clone, Debug, Default)]
pub struct Scopes {
    globals: Scope,
    state: Option<Scope>,
    blocks: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` in the innermost active scope, keeping any value
    /// already defined there.
    pub fn define(&mut self, name: &str, value: Value) {
        let target = self
            .blocks
            .last_mut()
            .or(self.state.as_mut())
            .unwrap_or(&mut self.globals);
        if !target.contains_key(name) {
            target.insert(name.to_string(), value);
        }
    }

    /// Resolve `name` through the chain.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.blocks
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.state.as_ref().and_then(|scope| scope.get(name)))
            .or_else(|| self.globals.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        for scope in self.blocks.iter_mut().rev() {
            if scope.contains_key(name) {
                return scope.get_mut(name);
            }
        }
        if let Some(scope) = self.state.as_mut()
            && scope.contains_key(name)
        {
            return scope.get_mut(name);
        }
        self.globals.get_mut(name)
    }

    /// Assign to the first enclosing scope that defines `name`. Returns
    /// false if no scope does.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push_block(&mut self) {
        self.blocks.push(Scope::new());
    }

    pub fn pop_block(&mut self) {
        self.blocks.pop();
    }

    /// Detach the transient block scopes of the running event so a
    /// nested dispatch starts from a clean chain.
    pub fn take_blocks(&mut self) -> Vec<Scope> {
        std::mem::take(&mut self.blocks)
    }

    pub fn restore_blocks(&mut self, blocks: Vec<Scope>) {
        self.blocks = blocks;
    }

    /// Install a fresh, empty state scope.
    pub fn reset_state(&mut self) {
        self.state = Some(Scope::new());
    }

    /// Drop the state scope entirely (no active state).
    pub fn clear_state(&mut self) {
        self.state = None;
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Insert or overwrite a script global directly. Engine-side setter;
    /// unlike `define` this always writes.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.globals.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_order_block_state_global() {
        let mut scopes = Scopes::new();
        scopes.define("x", Value::Number(1.0)); // global
        scopes.reset_state();
        scopes.define("x", Value::Number(2.0)); // state shadows global
        scopes.push_block();
        scopes.define("x", Value::Number(3.0)); // block shadows state

        assert_eq!(scopes.get("x"), Some(&Value::Number(3.0)));
        scopes.pop_block();
        assert_eq!(scopes.get("x"), Some(&Value::Number(2.0)));
        scopes.clear_state();
        assert_eq!(scopes.get("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn define_keeps_existing_value() {
        let mut scopes = Scopes::new();
        scopes.set_global("health", Value::Number(50.0)); // instance override
        scopes.define("health", Value::Number(100.0)); // script default
        assert_eq!(scopes.get("health"), Some(&Value::Number(50.0)));
    }

    #[test]
    fn assign_writes_first_defining_scope() {
        let mut scopes = Scopes::new();
        scopes.define("g", Value::Number(1.0));
        scopes.reset_state();
        scopes.push_block();

        assert!(scopes.assign("g", Value::Number(9.0)));
        scopes.pop_block();
        scopes.clear_state();
        assert_eq!(scopes.get("g"), Some(&Value::Number(9.0)));
    }

    #[test]
    fn assign_unknown_name_fails() {
        let mut scopes = Scopes::new();
        assert!(!scopes.assign("nope", Value::Null));
    }

    #[test]
    fn reset_state_discards_locals() {
        let mut scopes = Scopes::new();
        scopes.reset_state();
        scopes.define("t", Value::Number(5.0));
        scopes.reset_state();
        assert_eq!(scopes.get("t"), None);
    }

    #[test]
    fn take_and_restore_blocks() {
        let mut scopes = Scopes::new();
        scopes.push_block();
        scopes.define("local", Value::Bool(true));

        let saved = scopes.take_blocks();
        assert_eq!(scopes.get("local"), None);
        scopes.restore_blocks(saved);
        assert_eq!(scopes.get("local"), Some(&Value::Bool(true)));
    }
}
