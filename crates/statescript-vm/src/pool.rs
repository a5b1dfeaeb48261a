//! The object pool.
//!
//! Instances of user-registered types are heap objects handed out as
//! reference-counted handles. The pool bounds how many can be live at
//! once; allocation past capacity is refused outright rather than
//! evicting or growing. A handle stays valid as long as any clone of it
//! exists, and the pool slot is reclaimed when the last clone drops.
//!
//! Field access goes through `RefCell` borrows: the borrow guard keeps
//! the object's data in place for its scope and releases on drop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use statescript_core::TypeId;

use crate::value::Value;

/// Allocation refused because every slot is occupied by a live object.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("object pool exhausted (capacity {capacity})")]
pub struct PoolExhausted {
    pub capacity: usize,
}

/// Backing data of a pooled object.
#[derive(Debug)]
pub struct ObjectData {
    type_id: TypeId,
    type_name: Rc<str>,
    fields: IndexMap<String, Value>,
}

impl ObjectData {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Overwrite an existing field. Fields are fixed at allocation; a
    /// name the type never declared is rejected.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Shared handle to a pooled object.
pub type ObjRef = Rc<RefCell<ObjectData>>;

/// Capacity-bounded allocator for script objects.
#[derive(Debug)]
pub struct ObjectPool {
    capacity: usize,
    live: Vec<Weak<RefCell<ObjectData>>>,
}

impl ObjectPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of objects still reachable through at least one handle.
    pub fn live_count(&mut self) -> usize {
        self.reap();
        self.live.len()
    }

    /// Allocate an object with the given fields. Refuses when the pool
    /// is full of live objects.
    pub fn allocate(
        &mut self,
        type_id: TypeId,
        type_name: &str,
        fields: IndexMap<String, Value>,
    ) -> Result<ObjRef, PoolExhausted> {
        self.reap();
        if self.live.len() >= self.capacity {
            warn!(
                type_name,
                capacity = self.capacity,
                "object pool exhausted, refusing allocation"
            );
            return Err(PoolExhausted {
                capacity: self.capacity,
            });
        }
        let obj = Rc::new(RefCell::new(ObjectData {
            type_id,
            type_name: Rc::from(type_name),
            fields,
        }));
        self.live.push(Rc::downgrade(&obj));
        Ok(obj)
    }

    /// Drop tracking entries whose objects have been released.
    fn reap(&mut self) {
        self.live.retain(|weak| weak.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> IndexMap<String, Value> {
        names.iter().map(|n| (n.to_string(), Value::Null)).collect()
    }

    #[test]
    fn allocate_and_access_fields() {
        let mut pool = ObjectPool::new(4);
        let obj = pool
            .allocate(TypeId::new(32), "Enemy", fields(&["health"]))
            .unwrap();

        assert!(obj.borrow_mut().set_field("health", Value::Number(50.0)));
        assert_eq!(obj.borrow().field("health"), Some(&Value::Number(50.0)));
        assert_eq!(obj.borrow().type_name(), "Enemy");
    }

    #[test]
    fn undeclared_field_rejected() {
        let mut pool = ObjectPool::new(4);
        let obj = pool
            .allocate(TypeId::new(32), "Enemy", fields(&["health"]))
            .unwrap();
        assert!(!obj.borrow_mut().set_field("mana", Value::Number(1.0)));
        assert_eq!(obj.borrow().field("mana"), None);
    }

    #[test]
    fn exhaustion_refuses_allocation() {
        let mut pool = ObjectPool::new(2);
        let _a = pool.allocate(TypeId::new(32), "T", fields(&[])).unwrap();
        let _b = pool.allocate(TypeId::new(32), "T", fields(&[])).unwrap();
        let err = pool.allocate(TypeId::new(32), "T", fields(&[])).unwrap_err();
        assert_eq!(err.capacity, 2);
    }

    #[test]
    fn dropped_handles_free_slots() {
        let mut pool = ObjectPool::new(1);
        let a = pool.allocate(TypeId::new(32), "T", fields(&[])).unwrap();
        assert_eq!(pool.live_count(), 1);
        drop(a);
        assert_eq!(pool.live_count(), 0);
        // The freed slot is reusable
        assert!(pool.allocate(TypeId::new(32), "T", fields(&[])).is_ok());
    }

    #[test]
    fn clones_keep_object_live() {
        let mut pool = ObjectPool::new(1);
        let a = pool.allocate(TypeId::new(32), "T", fields(&[])).unwrap();
        let b = a.clone();
        drop(a);
        assert_eq!(pool.live_count(), 1);
        drop(b);
        assert_eq!(pool.live_count(), 0);
    }
}
