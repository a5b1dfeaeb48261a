//! The operand stack.

use thiserror::Error;

use crate::value::Value;

/// Popping or peeking an empty operand stack.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operand stack underflow")]
pub struct StackError;

/// Operand stack for one chunk interpretation.
///
/// Every dispatch gets a fresh stack; a compiled chunk leaves it empty
/// when interpretation finishes (expression statements pop their value).
#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, StackError> {
        self.values.pop().ok_or(StackError)
    }

    /// Pop without failing: an empty stack yields Null. Used by Return,
    /// whose chunk may or may not have produced a result value.
    pub fn pop_or_null(&mut self) -> Value {
        self.values.pop().unwrap_or(Value::Null)
    }

    pub fn peek(&self) -> Result<&Value, StackError> {
        self.values.last().ok_or(StackError)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
