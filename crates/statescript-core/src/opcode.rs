//! Bytecode opcodes.
//!
//! Every opcode is a single byte; operands follow as raw bytes in the
//! chunk's instruction tape. Multi-byte operands are little-endian `u16`
//! values (constant-pool indices or relative jump distances).

/// Bytecode opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Return from the current chunk. The top of the operand stack (if any)
    /// is the chunk's result.
    Return = 0x00,
    /// Push a constant. Followed by pool index (u16).
    LoadConst = 0x01,
    /// Construct a value of a registered type. Followed by type-name pool
    /// index (u16) and argument count (u8); arguments are popped.
    Construct = 0x02,
    /// Define a variable in the innermost scope. Followed by name pool
    /// index (u16); the initial value is popped.
    DefineVar = 0x03,
    /// Push a variable's value, resolved through the scope chain.
    /// Followed by name pool index (u16).
    GetVar = 0x04,
    /// Assign to the first enclosing scope that defines the name. Followed
    /// by name pool index (u16); the value stays on the stack.
    Assign = 0x05,
    /// Pop and discard the top of the stack.
    Pop = 0x06,
    /// Pop a receiver and push one of its members. Followed by member-name
    /// pool index (u16).
    MemberGet = 0x07,
    /// Assign to a member of a named variable. Followed by variable-name
    /// pool index (u16) and member-name pool index (u16); the value stays
    /// on the stack.
    MemberSet = 0x08,
    /// Call a bound method on a receiver. Followed by method-name pool
    /// index (u16) and argument count (u8); arguments and receiver are
    /// popped, the result is pushed.
    MemberCall = 0x09,
    /// Call an externally registered native event. Followed by name pool
    /// index (u16) and argument count (u8).
    Call = 0x0A,
    /// Transition the owning script instance to another state. Followed by
    /// state-name pool index (u16).
    ChangeState = 0x0B,
    /// Unconditional forward jump. Followed by byte distance (u16).
    Jump = 0x0C,
    /// Pop a condition; jump forward if it is falsy. Followed by byte
    /// distance (u16).
    JumpIfFalse = 0x0D,
    /// Enter a nested variable scope.
    PushScope = 0x0E,
    /// Leave the innermost variable scope.
    PopScope = 0x0F,

    // Unary
    Negate = 0x10,
    Not = 0x11,

    // Arithmetic
    Add = 0x12,
    Subtract = 0x13,
    Multiply = 0x14,
    Divide = 0x15,

    // Comparison
    Equal = 0x16,
    NotEqual = 0x17,
    Greater = 0x18,
    GreaterEqual = 0x19,
    Less = 0x1A,
    LessEqual = 0x1B,

    // Logical (both operands already evaluated; truthiness combine)
    And = 0x1C,
    Or = 0x1D,

    // Immediate literals
    LoadTrue = 0x1E,
    LoadFalse = 0x1F,
    LoadNull = 0x20,
}

impl OpCode {
    /// Decode a raw byte into an opcode.
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        use OpCode::*;
        Some(match byte {
            0x00 => Return,
            0x01 => LoadConst,
            0x02 => Construct,
            0x03 => DefineVar,
            0x04 => GetVar,
            0x05 => Assign,
            0x06 => Pop,
            0x07 => MemberGet,
            0x08 => MemberSet,
            0x09 => MemberCall,
            0x0A => Call,
            0x0B => ChangeState,
            0x0C => Jump,
            0x0D => JumpIfFalse,
            0x0E => PushScope,
            0x0F => PopScope,
            0x10 => Negate,
            0x11 => Not,
            0x12 => Add,
            0x13 => Subtract,
            0x14 => Multiply,
            0x15 => Divide,
            0x16 => Equal,
            0x17 => NotEqual,
            0x18 => Greater,
            0x19 => GreaterEqual,
            0x1A => Less,
            0x1B => LessEqual,
            0x1C => And,
            0x1D => Or,
            0x1E => LoadTrue,
            0x1F => LoadFalse,
            0x20 => LoadNull,
            _ => return None,
        })
    }

    /// Number of operand bytes following this opcode in the tape.
    pub fn operand_len(self) -> usize {
        use OpCode::*;
        match self {
            LoadConst | DefineVar | GetVar | Assign | MemberGet | ChangeState | Jump
            | JumpIfFalse => 2,
            Construct | MemberCall | Call => 3,
            MemberSet => 4,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_opcodes() {
        for byte in 0x00..=0x20u8 {
            let op = OpCode::from_byte(byte).expect("every byte in range decodes");
            assert_eq!(op as u8, byte);
        }
    }

    #[test]
    fn unknown_byte() {
        assert_eq!(OpCode::from_byte(0xFF), None);
        assert_eq!(OpCode::from_byte(0x21), None);
    }

    #[test]
    fn operand_lengths() {
        assert_eq!(OpCode::Add.operand_len(), 0);
        assert_eq!(OpCode::LoadConst.operand_len(), 2);
        assert_eq!(OpCode::Call.operand_len(), 3);
        assert_eq!(OpCode::MemberSet.operand_len(), 4);
    }
}
