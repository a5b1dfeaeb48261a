//! The type registry.
//!
//! Built-in types (Number, String, Bool, Vec2, Vec3, Entity) have their
//! members and methods dispatched directly on the value tag; the
//! registry only assigns them their well-known ids. User types are
//! described by a [`TypeInfo`] held in a side table keyed by [`TypeId`],
//! so member resolution on the hot path never compares type names.
//! Instances of user types come out of the capacity-bounded
//! [`ObjectPool`].

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use statescript_core::TypeId;

use crate::error::RuntimeError;
use crate::pool::{ObjRef, ObjectPool};
use crate::value::Value;

/// A method on a user-registered type.
pub type MethodFn = Rc<dyn Fn(&ObjRef, &[Value]) -> Value>;

/// Description of a user-registered type.
pub struct TypeInfo {
    id: TypeId,
    name: String,
    /// Declared members with their default values, in declaration order.
    members: IndexMap<String, Value>,
    methods: IndexMap<String, MethodFn>,
}

impl TypeInfo {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn method(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Name-to-id mapping plus the user-type side table.
#[derive(Debug)]
pub struct TypeRegistry {
    by_name: IndexMap<String, TypeId>,
    user: HashMap<TypeId, TypeInfo>,
    next_user: u16,
}

impl TypeRegistry {
    /// A registry with the built-in types installed.
    pub fn new() -> Self {
        let mut by_name = IndexMap::new();
        for id in [
            TypeId::NUMBER,
            TypeId::STRING,
            TypeId::BOOL,
            TypeId::VEC2,
            TypeId::VEC3,
            TypeId::ENTITY,
        ] {
            if let Some(name) = id.name() {
                by_name.insert(name.to_string(), id);
            }
        }
        Self {
            by_name,
            user: HashMap::new(),
            next_user: TypeId::USER_BASE,
        }
    }

    /// Register a user type with its members and defaults. Re-registering
    /// a name replaces the previous definition but keeps its id.
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (String, Value)>,
    ) -> TypeId {
        let name = name.into();
        let id = match self.by_name.get(&name) {
            Some(id) if !id.is_builtin() => *id,
            Some(id) => return *id, // built-ins cannot be redefined
            None => {
                let id = TypeId::new(self.next_user);
                self.next_user += 1;
                self.by_name.insert(name.clone(), id);
                id
            }
        };
        self.user.insert(
            id,
            TypeInfo {
                id,
                name,
                members: members.into_iter().collect(),
                methods: IndexMap::new(),
            },
        );
        id
    }

    /// Attach a method to a previously registered user type.
    pub fn register_method<F>(&mut self, type_id: TypeId, name: impl Into<String>, f: F) -> bool
    where
        F: Fn(&ObjRef, &[Value]) -> Value + 'static,
    {
        match self.user.get_mut(&type_id) {
            Some(info) => {
                info.methods.insert(name.into(), Rc::new(f));
                true
            }
            None => false,
        }
    }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn info(&self, id: TypeId) -> Option<&TypeInfo> {
        self.user.get(&id)
    }

    /// Construct a value of the named type from positional arguments.
    ///
    /// Built-ins construct inline values; a user type allocates from the
    /// pool, seeds member defaults, then overrides members positionally
    /// in declaration order. Bad arguments are a soft failure (Null);
    /// pool exhaustion is a hard one.
    pub fn construct(
        &self,
        name: &str,
        args: &[Value],
        pool: &mut ObjectPool,
    ) -> Result<Value, RuntimeError> {
        let value = match name {
            "Number" => match args {
                [] => Value::Number(0.0),
                [Value::Number(n), ..] => Value::Number(*n),
                [Value::Bool(b), ..] => Value::Number(if *b { 1.0 } else { 0.0 }),
                [Value::String(s), ..] => s
                    .trim()
                    .parse::<f32>()
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
            "String" => match args {
                [] => Value::string(""),
                [v, ..] => Value::string(v.to_string()),
            },
            "Bool" => match args {
                [] => Value::Bool(false),
                [v, ..] => Value::Bool(v.is_truthy()),
            },
            "Vec2" => match args {
                [] => Value::Vec2(glam::Vec2::ZERO),
                [Value::Number(x), Value::Number(y)] => Value::Vec2(glam::Vec2::new(*x, *y)),
                [Value::String(s)] => Value::parse_vec2(s).map(Value::Vec2).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            "Vec3" => match args {
                [] => Value::Vec3(glam::Vec3::ZERO),
                [Value::Number(x), Value::Number(y), Value::Number(z)] => {
                    Value::Vec3(glam::Vec3::new(*x, *y, *z))
                }
                [Value::String(s)] => Value::parse_vec3(s).map(Value::Vec3).unwrap_or(Value::Null),
                _ => Value::Null,
            },
            "Entity" => match args {
                [Value::Entity(id)] => Value::Entity(*id),
                _ => Value::Null,
            },
            _ => return self.construct_user(name, args, pool),
        };
        if value.is_null() {
            warn!(type_name = name, argc = args.len(), "bad constructor arguments");
        }
        Ok(value)
    }

    fn construct_user(
        &self,
        name: &str,
        args: &[Value],
        pool: &mut ObjectPool,
    ) -> Result<Value, RuntimeError> {
        let Some(info) = self.id_of(name).and_then(|id| self.info(id)) else {
            warn!(type_name = name, "construction of unregistered type");
            return Ok(Value::Null);
        };
        let mut fields: IndexMap<String, Value> = info
            .members
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        // Positional overrides follow member declaration order
        for (slot, arg) in fields.values_mut().zip(args) {
            *slot = arg.clone();
        }
        let obj = pool
            .allocate(info.id, &info.name, fields)
            .map_err(|e| RuntimeError::PoolExhausted {
                capacity: e.capacity,
            })?;
        Ok(Value::Object(obj))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a member of a value. Built-ins dispatch on the tag; objects go
/// through their field table. None means the member does not exist.
pub fn member_get(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Vec2(v) => match name {
            "x" => Some(Value::Number(v.x)),
            "y" => Some(Value::Number(v.y)),
            _ => None,
        },
        Value::Vec3(v) => match name {
            "x" => Some(Value::Number(v.x)),
            "y" => Some(Value::Number(v.y)),
            "z" => Some(Value::Number(v.z)),
            _ => None,
        },
        Value::Object(obj) => obj.borrow().field(name).cloned(),
        _ => None,
    }
}

/// Write a member of a value in place. Returns false when the member
/// does not exist or the new value has the wrong shape.
pub fn member_set(value: &mut Value, name: &str, new: Value) -> bool {
    match value {
        Value::Vec2(v) => match (name, new.as_number()) {
            ("x", Some(n)) => {
                v.x = n;
                true
            }
            ("y", Some(n)) => {
                v.y = n;
                true
            }
            _ => false,
        },
        Value::Vec3(v) => match (name, new.as_number()) {
            ("x", Some(n)) => {
                v.x = n;
                true
            }
            ("y", Some(n)) => {
                v.y = n;
                true
            }
            ("z", Some(n)) => {
                v.z = n;
                true
            }
            _ => false,
        },
        Value::Object(obj) => obj.borrow_mut().set_field(name, new),
        _ => false,
    }
}

/// Invoke a method on a value. Built-in methods dispatch on the tag;
/// user-type methods resolve through the side table. None means the
/// method does not exist.
pub fn member_call(
    registry: &TypeRegistry,
    value: &Value,
    name: &str,
    args: &[Value],
) -> Option<Value> {
    match value {
        Value::String(s) => match name {
            "Length" => Some(Value::Number(s.chars().count() as f32)),
            _ => None,
        },
        Value::Vec2(v) => match (name, args) {
            ("Length", []) => Some(Value::Number(v.length())),
            ("Normalize", []) => Some(Value::Vec2(v.normalize_or_zero())),
            ("Dot", [Value::Vec2(o)]) => Some(Value::Number(v.dot(*o))),
            _ => None,
        },
        Value::Vec3(v) => match (name, args) {
            ("Length", []) => Some(Value::Number(v.length())),
            ("Normalize", []) => Some(Value::Vec3(v.normalize_or_zero())),
            ("Dot", [Value::Vec3(o)]) => Some(Value::Number(v.dot(*o))),
            ("Cross", [Value::Vec3(o)]) => Some(Value::Vec3(v.cross(*o))),
            _ => None,
        },
        Value::Object(obj) => {
            let id = obj.borrow().type_id();
            let method = registry.info(id)?.method(name)?.clone();
            Some(method(obj, args))
        }
        _ => None,
    }
}
