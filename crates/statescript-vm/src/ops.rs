//! Polymorphic operators.
//!
//! Binary and unary operators dispatch on the operand tag pair. An
//! incompatible pair is a soft failure: it yields `Value::Null` and a
//! warning record, never a fault. Comparison ordering exists only
//! between Numbers; String and Bool cross equality by truthiness.

use tracing::warn;

use crate::value::Value;

fn incompatible(op: &str, a: &Value, b: &Value) -> Value {
    warn!(
        op,
        lhs = %a.type_name(),
        rhs = %b.type_name(),
        "incompatible operands"
    );
    Value::Null
}

pub fn add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Value::Number(x + y),
        (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(*x + *y),
        (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(*x + *y),
        _ => incompatible("+", a, b),
    }
}

pub fn subtract(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Value::Number(x - y),
        (Value::Vec2(x), Value::Vec2(y)) => Value::Vec2(*x - *y),
        (Value::Vec3(x), Value::Vec3(y)) => Value::Vec3(*x - *y),
        _ => incompatible("-", a, b),
    }
}

pub fn multiply(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Value::Number(x * y),
        (Value::Vec2(v), Value::Number(s)) | (Value::Number(s), Value::Vec2(v)) => {
            Value::Vec2(*v * *s)
        }
        (Value::Vec3(v), Value::Number(s)) | (Value::Number(s), Value::Vec3(v)) => {
            Value::Vec3(*v * *s)
        }
        _ => incompatible("*", a, b),
    }
}

pub fn divide(a: &Value, b: &Value) -> Value {
    match (a, b) {
        // IEEE semantics: dividing by zero gives an infinity, not a fault
        (Value::Number(x), Value::Number(y)) => Value::Number(x / y),
        (Value::Vec2(v), Value::Number(s)) => Value::Vec2(*v / *s),
        (Value::Vec3(v), Value::Number(s)) => Value::Vec3(*v / *s),
        _ => incompatible("/", a, b),
    }
}

/// Equality. Same tags compare structurally. Across tags, String and
/// Bool compare by truthiness against any operand; everything else is
/// unequal.
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::String(_), Value::String(_)) => a == b,
        (Value::Bool(_) | Value::String(_), _) | (_, Value::Bool(_) | Value::String(_)) => {
            a.is_truthy() == b.is_truthy()
        }
        _ => a == b,
    }
}

fn ordering(op: &str, a: &Value, b: &Value) -> Option<(f32, f32)> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Some((*x, *y)),
        _ => {
            incompatible(op, a, b);
            None
        }
    }
}

pub fn greater(a: &Value, b: &Value) -> Value {
    match ordering(">", a, b) {
        Some((x, y)) => Value::Bool(x > y),
        None => Value::Null,
    }
}

pub fn greater_equal(a: &Value, b: &Value) -> Value {
    match ordering(">=", a, b) {
        Some((x, y)) => Value::Bool(x >= y),
        None => Value::Null,
    }
}

pub fn less(a: &Value, b: &Value) -> Value {
    match ordering("<", a, b) {
        Some((x, y)) => Value::Bool(x < y),
        None => Value::Null,
    }
}

pub fn less_equal(a: &Value, b: &Value) -> Value {
    match ordering("<=", a, b) {
        Some((x, y)) => Value::Bool(x <= y),
        None => Value::Null,
    }
}

pub fn negate(a: &Value) -> Value {
    match a {
        Value::Number(n) => Value::Number(-n),
        Value::Vec2(v) => Value::Vec2(-*v),
        Value::Vec3(v) => Value::Vec3(-*v),
        _ => {
            warn!(operand = %a.type_name(), "cannot negate");
            Value::Null
        }
    }
}

pub fn not(a: &Value) -> Value {
    Value::Bool(!a.is_truthy())
}

/// Both operands are already evaluated when these run; the combine is on
/// truthiness.
pub fn and(a: &Value, b: &Value) -> Value {
    Value::Bool(a.is_truthy() && b.is_truthy())
}

pub fn or(a: &Value, b: &Value) -> Value {
    Value::Bool(a.is_truthy() || b.is_truthy())
}
