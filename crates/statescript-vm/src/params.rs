//! Parameter bags.
//!
//! The single argument shape crossing the script/native boundary: event
//! dispatch, timer payloads, and native calls all take a [`ParamBag`].
//! Entries preserve insertion order; positional call arguments are keyed
//! `arg0..argN`.

use indexmap::IndexMap;

use statescript_core::EntityId;

use crate::value::Value;

/// Order-preserving, string-keyed value map with typed getters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamBag {
    entries: IndexMap<String, Value>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from positional arguments, keyed `arg0..argN`.
    pub fn from_args(args: impl IntoIterator<Item = Value>) -> Self {
        let mut bag = Self::new();
        for (i, value) in args.into_iter().enumerate() {
            bag.set(format!("arg{i}"), value);
        }
        bag
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Positional argument by index.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.entries.get(&format!("arg{index}"))
    }

    pub fn number(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Value::as_number)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn entity(&self, key: &str) -> Option<EntityId> {
        self.get(key).and_then(Value::as_entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
