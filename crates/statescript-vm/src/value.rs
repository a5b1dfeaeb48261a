//! The runtime value model.
//!
//! Values are a closed tagged sum: scripts are dynamically typed, but the
//! set of built-in runtime shapes is fixed. User-registered types all
//! share the `Object` tag and carry their [`TypeId`] in the pooled
//! object data.

use std::fmt;
use std::rc::Rc;

use statescript_core::{EntityId, TypeId};

use crate::pool::ObjRef;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Number(f32),
    Bool(bool),
    String(Rc<str>),
    Vec2(glam::Vec2),
    Vec3(glam::Vec3),
    Entity(EntityId),
    Object(ObjRef),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null => TypeId::NULL,
            Value::Number(_) => TypeId::NUMBER,
            Value::Bool(_) => TypeId::BOOL,
            Value::String(_) => TypeId::STRING,
            Value::Vec2(_) => TypeId::VEC2,
            Value::Vec3(_) => TypeId::VEC3,
            Value::Entity(_) => TypeId::ENTITY,
            Value::Object(obj) => obj.borrow().type_id(),
        }
    }

    /// The display name of the value's type.
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(obj) => obj.borrow().type_name().to_string(),
            other => other
                .type_id()
                .name()
                .unwrap_or("Object")
                .to_string(),
        }
    }

    /// Truthiness under the boolean-evaluation rule: Null, `false`, and
    /// zero are falsy; strings are truthy when non-empty; an entity
    /// reference is truthy when it points at a live id.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Vec2(_) | Value::Vec3(_) | Value::Object(_) => true,
            Value::Entity(id) => id.is_valid(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Value::Entity(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<glam::Vec2> {
        match self {
            Value::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<glam::Vec3> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Parse the display form of a Vec2, `"(x, y)"`.
    pub fn parse_vec2(s: &str) -> Option<glam::Vec2> {
        let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
        let mut parts = inner.split(',');
        let x = parts.next()?.trim().parse::<f32>().ok()?;
        let y = parts.next()?.trim().parse::<f32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(glam::Vec2::new(x, y))
    }

    /// Parse the display form of a Vec3, `"(x, y, z)"`.
    pub fn parse_vec3(s: &str) -> Option<glam::Vec3> {
        let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
        let mut parts = inner.split(',');
        let x = parts.next()?.trim().parse::<f32>().ok()?;
        let y = parts.next()?.trim().parse::<f32>().ok()?;
        let z = parts.next()?.trim().parse::<f32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(glam::Vec3::new(x, y, z))
    }
}

/// Same-tag structural equality. Cross-type equality rules (Number vs
/// Bool by truthiness) live in the operator table, not here.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vec2(a), Value::Vec2(b)) => a == b,
            (Value::Vec3(a), Value::Vec3(b)) => a == b,
            (Value::Entity(a), Value::Entity(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Whole numbers print without a decimal point so vector forms like
/// `(3, 4)` round-trip through their string representation.
fn fmt_number(f: &mut fmt::Formatter<'_>, n: f32) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e7 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Number(n) => fmt_number(f, *n),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Vec2(v) => {
                write!(f, "(")?;
                fmt_number(f, v.x)?;
                write!(f, ", ")?;
                fmt_number(f, v.y)?;
                write!(f, ")")
            }
            Value::Vec3(v) => {
                write!(f, "(")?;
                fmt_number(f, v.x)?;
                write!(f, ", ")?;
                fmt_number(f, v.y)?;
                write!(f, ", ")?;
                fmt_number(f, v.z)?;
                write!(f, ")")
            }
            Value::Entity(id) => write!(f, "{id}"),
            Value::Object(obj) => write!(f, "{}", obj.borrow().type_name()),
        }
    }
}
