//! Chunk disassembler for developer tooling and tests.

use std::fmt::Write;

use crate::chunk::{Chunk, Constant, ScriptDefinition};
use crate::opcode::OpCode;

/// Render a chunk (and its nested event chunks) as human-readable text.
pub fn disassemble(chunk: &Chunk) -> String {
    let mut out = String::new();
    disassemble_into(chunk, 0, &mut out);
    out
}

/// Render a whole script definition: global chunk, then each state.
pub fn disassemble_definition(def: &ScriptDefinition) -> String {
    let mut out = String::new();
    disassemble_into(&def.global, 0, &mut out);
    for state in def.states.values() {
        disassemble_into(state, 0, &mut out);
    }
    out
}

fn disassemble_into(chunk: &Chunk, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    let _ = writeln!(out, "{pad}== {} ==", chunk.name());

    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &pad, out);
    }

    for event in chunk.events.values() {
        disassemble_into(event, indent + 1, out);
    }
}

fn disassemble_instruction(chunk: &Chunk, offset: usize, pad: &str, out: &mut String) -> usize {
    let byte = chunk.code[offset];
    let line = chunk.line_at(offset);
    let Some(op) = OpCode::from_byte(byte) else {
        let _ = writeln!(out, "{pad}{offset:04} [{line:>3}] ?? 0x{byte:02X}");
        return offset + 1;
    };

    let _ = write!(out, "{pad}{offset:04} [{line:>3}] {op:?}");
    match op {
        OpCode::LoadConst => {
            let idx = chunk.read_u16(offset + 1);
            let _ = writeln!(out, " {}", render_constant(chunk, idx));
        }
        OpCode::DefineVar
        | OpCode::GetVar
        | OpCode::Assign
        | OpCode::MemberGet
        | OpCode::ChangeState => {
            let idx = chunk.read_u16(offset + 1);
            let _ = writeln!(out, " {}", render_constant(chunk, idx));
        }
        OpCode::Jump | OpCode::JumpIfFalse => {
            let dist = chunk.read_u16(offset + 1) as usize;
            let target = offset + 3 + dist;
            let _ = writeln!(out, " -> {target:04}");
        }
        OpCode::Construct | OpCode::Call | OpCode::MemberCall => {
            let idx = chunk.read_u16(offset + 1);
            let argc = chunk.code[offset + 3];
            let _ = writeln!(out, " {} argc={argc}", render_constant(chunk, idx));
        }
        OpCode::MemberSet => {
            let var = chunk.read_u16(offset + 1);
            let member = chunk.read_u16(offset + 3);
            let _ = writeln!(
                out,
                " {}.{}",
                render_constant(chunk, var),
                render_constant(chunk, member)
            );
        }
        _ => {
            let _ = writeln!(out);
        }
    }
    offset + 1 + op.operand_len()
}

fn render_constant(chunk: &Chunk, index: u16) -> String {
    match chunk.constant(index) {
        Some(Constant::Number(n)) => format!("{n}"),
        Some(Constant::String(s)) => format!("'{s}'"),
        None => format!("<bad const {index}>"),
    }
}
