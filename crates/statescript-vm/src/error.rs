//! Runtime errors.
//!
//! Only structural faults surface as errors: a malformed tape, an
//! exhausted object pool, or runaway transition recursion. Type
//! mismatches and unknown names are soft failures that degrade to
//! `Value::Null` with a log record instead.

use thiserror::Error;

/// A hard interpretation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("operand stack underflow at offset {offset} in chunk '{chunk}'")]
    StackUnderflow { chunk: String, offset: usize },

    #[error("invalid opcode byte {byte:#04x} at offset {offset} in chunk '{chunk}'")]
    InvalidOpcode {
        chunk: String,
        byte: u8,
        offset: usize,
    },

    #[error("missing constant {index} in chunk '{chunk}'")]
    MissingConstant { chunk: String, index: u16 },

    #[error("jump past end of chunk '{chunk}' at offset {offset}")]
    JumpOutOfBounds { chunk: String, offset: usize },

    #[error("truncated operand at offset {offset} in chunk '{chunk}'")]
    TruncatedOperand { chunk: String, offset: usize },

    #[error("interpretation depth limit exceeded ({max})")]
    DepthExceeded { max: usize },

    #[error("object pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
}
