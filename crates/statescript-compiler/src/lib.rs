//! Scanner and single-pass compiler for StateScript.
//!
//! The compiler has no AST: the parser recognizes grammar productions and
//! emits opcodes directly into the bytecode chunk on top of a compile-time
//! chunk stack (global chunk, then state chunks, then event chunks).

pub mod lexer;
pub mod parser;

pub use lexer::Lexer;
pub use parser::{CompileOutput, Compiler};

use statescript_core::ScriptDefinition;

/// Scan and compile a source string in one step.
pub fn compile_source(name: &str, source: &str) -> CompileOutput {
    let tokens = Lexer::new(source).scan();
    Compiler::new(name, tokens).compile()
}

/// Convenience for callers that only care about success.
pub fn compile_or_none(name: &str, source: &str) -> Option<ScriptDefinition> {
    compile_source(name, source).definition
}
