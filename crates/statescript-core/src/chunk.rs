//! Bytecode chunks and script definitions.
//!
//! A [`Chunk`] is a pure data container: a linear instruction tape, an
//! append-only constant pool, a parallel line-number table, and a map of
//! nested event chunks. A [`ScriptDefinition`] owns one global chunk plus a
//! named chunk per declared state; each state chunk owns its own event map.

use indexmap::IndexMap;

use crate::opcode::OpCode;

/// A compile-time constant in a chunk's pool.
#[derive(Clone, PartialEq, Debug)]
pub enum Constant {
    Number(f32),
    String(String),
}

impl Constant {
    /// The string payload, for name operands.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            Constant::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A named, linear sequence of bytecode plus its constant pool and nested
/// event chunks.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Chunk {
    name: String,
    /// Instruction tape: opcodes and raw operand bytes.
    pub code: Vec<u8>,
    /// Source line for each byte of `code` (parallel table).
    lines: Vec<u32>,
    constants: Vec<Constant>,
    /// Event chunks declared inside this chunk, in declaration order.
    pub events: IndexMap<String, Chunk>,
    /// Deferred entity-reference initializers: (variable name, entity name).
    /// Resolved to live entity ids after the whole scene has spawned.
    pub entity_inits: Vec<(String, String)>,
}

impl Chunk {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current length of the instruction tape.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Append a raw byte.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    /// Append a little-endian u16 operand.
    pub fn write_u16(&mut self, value: u16, line: u32) {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(lo, line);
        self.write_byte(hi, line);
    }

    /// Overwrite a previously written u16 operand (jump back-patching).
    pub fn patch_u16(&mut self, at: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.code[at] = lo;
        self.code[at + 1] = hi;
    }

    /// Read a little-endian u16 operand at `at`.
    pub fn read_u16(&self, at: usize) -> u16 {
        u16::from_le_bytes([self.code[at], self.code[at + 1]])
    }

    /// Add a constant to the pool, returning its stable index.
    ///
    /// The pool is append-only; identical constants share an index.
    pub fn add_constant(&mut self, constant: Constant) -> u16 {
        if let Some(idx) = self.constants.iter().position(|c| *c == constant) {
            return idx as u16;
        }
        let idx = self.constants.len() as u16;
        self.constants.push(constant);
        idx
    }

    pub fn constant(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> u32 {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    /// Roll the tape back to `len` bytes (used when the compiler rewrites
    /// its most recent emission).
    pub fn truncate(&mut self, len: usize) {
        self.code.truncate(len);
        self.lines.truncate(len);
    }

    /// Attach an event chunk. Returns false if the name is already taken.
    pub fn add_event(&mut self, chunk: Chunk) -> bool {
        if self.events.contains_key(chunk.name()) {
            return false;
        }
        self.events.insert(chunk.name().to_string(), chunk);
        true
    }

    /// Look up a directly declared event chunk.
    pub fn event(&self, name: &str) -> Option<&Chunk> {
        self.events.get(name)
    }

    /// Recursively search this chunk and its nested event chunks for an
    /// event with the given name.
    pub fn find_event(&self, name: &str) -> Option<&Chunk> {
        if let Some(chunk) = self.events.get(name) {
            return Some(chunk);
        }
        self.events.values().find_map(|c| c.find_event(name))
    }
}

/// A compiled script: one global chunk plus a chunk per declared state.
///
/// State names are unique within a definition; event names are unique
/// within the chunk that declares them (enforced at compile time).
#[derive(Clone, PartialEq, Debug)]
pub struct ScriptDefinition {
    name: String,
    pub global: Chunk,
    pub states: IndexMap<String, Chunk>,
}

impl ScriptDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            global: Chunk::new(name.clone()),
            states: IndexMap::new(),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a state chunk. Returns false if the name is already taken.
    pub fn add_state(&mut self, chunk: Chunk) -> bool {
        if self.states.contains_key(chunk.name()) {
            return false;
        }
        self.states.insert(chunk.name().to_string(), chunk);
        true
    }

    pub fn state(&self, name: &str) -> Option<&Chunk> {
        self.states.get(name)
    }

    /// Declared state names, in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
