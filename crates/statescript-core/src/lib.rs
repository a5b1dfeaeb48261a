//! Core types for the StateScript language.
//!
//! This crate provides the foundational types shared by the compiler and
//! the virtual machine:
//! - Source positions and spans
//! - Tokens and token kinds
//! - Opcodes and bytecode chunks
//! - Script definitions (a global chunk plus named state chunks)
//! - Type and entity identifiers
//! - Diagnostics and error codes

pub mod chunk;
pub mod disasm;
pub mod error;
pub mod opcode;
pub mod span;
pub mod token;
pub mod types;

// Re-export commonly used types at crate root
pub use chunk::{Chunk, Constant, ScriptDefinition};
pub use disasm::disassemble;
pub use error::{Diagnostic, DiagnosticBuilder, ErrorCode, Severity};
pub use opcode::OpCode;
pub use span::{Pos, Span};
pub use token::{Token, TokenKind};
pub use types::{EntityId, TypeId};
