//! Single-pass Pratt parser/compiler.
//!
//! Grammar productions emit opcodes as they are recognized; there is no
//! intermediate syntax tree. The compiler maintains a stack of chunks
//! (global at the bottom, then the state being compiled, then the event
//! being compiled) and always emits into the top. Malformed productions
//! report a diagnostic and synchronize forward so one pass can surface
//! several independent errors; any error-severity diagnostic prevents the
//! definition from being installed.

use std::collections::HashSet;

use statescript_core::{
    Chunk, Constant, Diagnostic, ErrorCode, OpCode, ScriptDefinition, Token, TokenKind,
};

/// Result of a compile pass.
#[derive(Debug)]
pub struct CompileOutput {
    /// The compiled definition, present only when no errors were reported.
    pub definition: Option<ScriptDefinition>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Expression precedence levels, lowest to highest.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
}

impl Precedence {
    /// The next-higher level, used for the right operand of a
    /// left-associative infix operator.
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call => Call,
        }
    }
}

/// Single-pass compiler from a token stream to a [`ScriptDefinition`].
pub struct Compiler {
    tokens: Vec<Token>,
    cursor: usize,
    definition: ScriptDefinition,
    /// Compile-time chunk stack; emission targets the top.
    chunks: Vec<Chunk>,
    /// Declared-name scopes per chunk on the stack, innermost last.
    declared: Vec<Vec<HashSet<String>>>,
    diagnostics: Vec<Diagnostic>,
    panic_mode: bool,
    /// Position and name index of the most recent GetVar emission, used to
    /// rewrite `ident.member = expr` into a MemberSet.
    last_get_var: Option<(usize, u16)>,
}

impl Compiler {
    pub fn new(name: &str, tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: 0,
            definition: ScriptDefinition::new(name),
            chunks: vec![Chunk::new(name)],
            declared: vec![vec![HashSet::new()]],
            diagnostics: Vec::new(),
            panic_mode: false,
            last_get_var: None,
        }
    }

    /// Run the compile pass.
    pub fn compile(mut self) -> CompileOutput {
        while !self.check(TokenKind::Eof) {
            self.top_level_declaration();
        }
        self.emit_op(OpCode::Return);

        let global = self.chunks.pop().unwrap_or_default();
        self.definition.global = global;

        let has_errors = self.diagnostics.iter().any(Diagnostic::is_error);
        CompileOutput {
            definition: (!has_errors).then_some(self.definition),
            diagnostics: self.diagnostics,
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn top_level_declaration(&mut self) {
        match self.current_kind() {
            TokenKind::State => self.state_declaration(),
            TokenKind::OnEnter | TokenKind::OnUpdate | TokenKind::OnExit | TokenKind::Function => {
                self.event_declaration()
            }
            _ => self.statement(),
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    /// `State <name> { <event or variable declarations> }`
    fn state_declaration(&mut self) {
        self.advance(); // State
        let Some(name) = self.consume_identifier("expected state name after 'State'") else {
            return;
        };
        if !self.consume(TokenKind::LeftBrace, ErrorCode::E100, "expected '{' after state name") {
            return;
        }

        self.begin_chunk(&name);
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            match self.current_kind() {
                TokenKind::OnEnter
                | TokenKind::OnUpdate
                | TokenKind::OnExit
                | TokenKind::Function => self.event_declaration(),
                TokenKind::State => {
                    self.error_here(ErrorCode::E103, "states cannot be nested");
                    self.advance();
                }
                _ => self.statement(),
            }
            if self.panic_mode {
                self.synchronize();
            }
        }
        self.consume(TokenKind::RightBrace, ErrorCode::E101, "expected '}' to close state");
        self.emit_op(OpCode::Return);

        let chunk = self.end_chunk();
        let line = self.previous().line;
        if !self.definition.add_state(chunk) {
            self.report(
                Diagnostic::error(ErrorCode::E201, line)
                    .message(format!("duplicate state name '{name}'"))
                    .build(),
            );
        }
    }

    /// `OnEnter { ... }`, `OnUpdate { ... }`, `OnExit { ... }`, or
    /// `Function <name> { ... }` for custom events.
    fn event_declaration(&mut self) {
        let keyword = self.current_kind();
        self.advance();
        let name = if keyword == TokenKind::Function {
            match self.consume_identifier("expected event name after 'Function'") {
                Some(name) => name,
                None => return,
            }
        } else {
            self.previous().lexeme.clone()
        };
        if !self.consume(TokenKind::LeftBrace, ErrorCode::E100, "expected '{' to open event body")
        {
            return;
        }

        self.begin_chunk(&name);
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.statement();
            if self.panic_mode {
                self.synchronize();
            }
        }
        self.consume(TokenKind::RightBrace, ErrorCode::E101, "expected '}' to close event");
        self.emit_op(OpCode::Return);

        let chunk = self.end_chunk();
        let line = self.previous().line;
        if !self.current_chunk_mut().add_event(chunk) {
            self.report(
                Diagnostic::error(ErrorCode::E202, line)
                    .message(format!("duplicate event name '{name}'"))
                    .build(),
            );
        }
    }

    /// `<TypeName> <name> [= expr] ;`
    fn var_declaration(&mut self) {
        let type_kind = self.current_kind();
        self.advance();
        let Some(name) = self.consume_identifier("expected variable name") else {
            return;
        };
        let line = self.previous().line;

        // Compile-time uniqueness within the declaring scope
        if let Some(scope) = self.declared.last_mut().and_then(|s| s.last_mut())
            && !scope.insert(name.clone())
        {
            self.report(
                Diagnostic::error(ErrorCode::E200, line)
                    .message(format!("variable '{name}' already declared in this scope"))
                    .build(),
            );
        }

        // Deferred entity reference: `Entity guard = "guard_01";` records the
        // name for post-spawn resolution instead of compiling the string.
        if type_kind == TokenKind::EntityType
            && self.check(TokenKind::Equal)
            && self.peek_kind(1) == Some(TokenKind::String)
        {
            self.advance(); // =
            self.advance(); // string
            let entity_name = self.previous().lexeme.clone();
            self.current_chunk_mut()
                .entity_inits
                .push((name.clone(), entity_name));
            self.emit_op(OpCode::LoadNull);
        } else if self.matches(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_default_value(type_kind, line);
        }

        let idx = self.name_constant(&name);
        self.emit_op(OpCode::DefineVar);
        self.emit_u16(idx);
        self.consume(TokenKind::Semicolon, ErrorCode::E100, "expected ';' after declaration");
    }

    /// Default initial value for an uninitialized declaration.
    fn emit_default_value(&mut self, type_kind: TokenKind, line: u32) {
        match type_kind {
            TokenKind::NumberType => {
                let idx = self.current_chunk_mut().add_constant(Constant::Number(0.0));
                self.emit_op(OpCode::LoadConst);
                self.emit_u16(idx);
            }
            TokenKind::StringType => {
                let idx = self
                    .current_chunk_mut()
                    .add_constant(Constant::String(String::new()));
                self.emit_op(OpCode::LoadConst);
                self.emit_u16(idx);
            }
            TokenKind::BoolType => self.emit_op(OpCode::LoadFalse),
            TokenKind::Vec2Type | TokenKind::Vec3Type => {
                let name = type_kind.type_name().unwrap_or_default();
                let idx = self.name_constant(name);
                self.emit_op(OpCode::Construct);
                self.emit_u16(idx);
                self.emit_byte(0);
            }
            _ => {
                let _ = line;
                self.emit_op(OpCode::LoadNull);
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self) {
        match self.current_kind() {
            kind if kind.is_type_name() => self.var_declaration(),
            TokenKind::If => self.if_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::ChangeState => self.change_state_statement(),
            TokenKind::LeftBrace => self.block_statement(),
            TokenKind::OnEnter
            | TokenKind::OnUpdate
            | TokenKind::OnExit
            | TokenKind::Function
            | TokenKind::State => {
                self.error_here(ErrorCode::E103, "declaration not allowed here");
                self.advance();
            }
            TokenKind::Error => {
                // error_here substitutes the scan error's own code
                self.error_here(ErrorCode::E001, "unrecognized input");
                self.advance();
            }
            _ => self.expression_statement(),
        }
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.emit_op(OpCode::Pop);
        self.consume(TokenKind::Semicolon, ErrorCode::E100, "expected ';' after expression");
    }

    fn if_statement(&mut self) {
        self.advance(); // if
        self.consume(TokenKind::LeftParen, ErrorCode::E100, "expected '(' after 'if'");
        self.expression();
        self.consume(TokenKind::RightParen, ErrorCode::E100, "expected ')' after condition");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.statement();

        if self.check(TokenKind::Else) {
            let else_jump = self.emit_jump(OpCode::Jump);
            self.patch_jump(then_jump);
            self.advance(); // else
            self.statement();
            self.patch_jump(else_jump);
        } else {
            self.patch_jump(then_jump);
        }
    }

    fn return_statement(&mut self) {
        self.advance(); // return
        if !self.check(TokenKind::Semicolon) {
            self.expression();
        }
        self.consume(TokenKind::Semicolon, ErrorCode::E100, "expected ';' after return");
        self.emit_op(OpCode::Return);
    }

    fn change_state_statement(&mut self) {
        self.advance(); // ChangeState
        self.consume(TokenKind::LeftParen, ErrorCode::E100, "expected '(' after 'ChangeState'");
        let Some(target) = self.consume_identifier("expected state name") else {
            return;
        };
        self.consume(TokenKind::RightParen, ErrorCode::E100, "expected ')' after state name");
        self.consume(TokenKind::Semicolon, ErrorCode::E100, "expected ';' after ChangeState");

        let idx = self.name_constant(&target);
        self.emit_op(OpCode::ChangeState);
        self.emit_u16(idx);
    }

    fn block_statement(&mut self) {
        self.advance(); // {
        self.emit_op(OpCode::PushScope);
        self.begin_scope();
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.statement();
            if self.panic_mode {
                self.synchronize();
            }
        }
        self.consume(TokenKind::RightBrace, ErrorCode::E101, "expected '}' to close block");
        self.end_scope();
        self.emit_op(OpCode::PopScope);
    }

    // ========================================================================
    // Expressions (Pratt / precedence climbing)
    // ========================================================================

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let can_assign = precedence <= Precedence::Assignment;
        if !self.prefix(self.previous().kind, can_assign) {
            self.error_at_previous(ErrorCode::E100, "expected expression");
            return;
        }

        while precedence <= Self::infix_precedence(self.current_kind()) {
            self.advance();
            self.infix(self.previous().kind, can_assign);
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.error_at_previous(ErrorCode::E102, "invalid assignment target");
        }
    }

    /// Dispatch a prefix handler. Returns false if the token cannot begin
    /// an expression.
    fn prefix(&mut self, kind: TokenKind, can_assign: bool) -> bool {
        match kind {
            TokenKind::Number => self.number_literal(),
            TokenKind::String => self.string_literal(),
            TokenKind::True => self.emit_op(OpCode::LoadTrue),
            TokenKind::False => self.emit_op(OpCode::LoadFalse),
            TokenKind::Null => self.emit_op(OpCode::LoadNull),
            TokenKind::Identifier => self.variable(can_assign),
            TokenKind::LeftParen => {
                self.expression();
                self.consume(TokenKind::RightParen, ErrorCode::E100, "expected ')'");
            }
            TokenKind::Minus => {
                self.parse_precedence(Precedence::Unary);
                self.emit_op(OpCode::Negate);
            }
            TokenKind::Bang => {
                self.parse_precedence(Precedence::Unary);
                self.emit_op(OpCode::Not);
            }
            kind if kind.is_type_name() => self.type_constructor(kind),
            _ => return false,
        }
        true
    }

    fn infix_precedence(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::OrOr => Precedence::Or,
            TokenKind::AndAnd => Precedence::And,
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => Precedence::Comparison,
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash => Precedence::Factor,
            TokenKind::Dot => Precedence::Call,
            _ => Precedence::None,
        }
    }

    fn infix(&mut self, kind: TokenKind, can_assign: bool) {
        if kind == TokenKind::Dot {
            self.dot(can_assign);
            return;
        }

        let precedence = Self::infix_precedence(kind);
        self.parse_precedence(precedence.next());
        let op = match kind {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            TokenKind::EqualEqual => OpCode::Equal,
            TokenKind::BangEqual => OpCode::NotEqual,
            TokenKind::Greater => OpCode::Greater,
            TokenKind::GreaterEqual => OpCode::GreaterEqual,
            TokenKind::Less => OpCode::Less,
            TokenKind::LessEqual => OpCode::LessEqual,
            TokenKind::AndAnd => OpCode::And,
            TokenKind::OrOr => OpCode::Or,
            _ => return,
        };
        self.emit_op(op);
    }

    fn number_literal(&mut self) {
        let token = self.previous();
        let line = token.line;
        match token.lexeme.parse::<f32>() {
            Ok(value) => {
                let idx = self.current_chunk_mut().add_constant(Constant::Number(value));
                self.emit_op(OpCode::LoadConst);
                self.emit_u16(idx);
            }
            Err(_) => {
                self.report(Diagnostic::error(ErrorCode::E003, line).build());
            }
        }
    }

    fn string_literal(&mut self) {
        let value = self.previous().lexeme.clone();
        let idx = self.current_chunk_mut().add_constant(Constant::String(value));
        self.emit_op(OpCode::LoadConst);
        self.emit_u16(idx);
    }

    /// Identifier in expression position: free call, assignment, or plain
    /// variable reference.
    fn variable(&mut self, can_assign: bool) {
        let name = self.previous().lexeme.clone();
        let idx = self.name_constant(&name);

        if self.matches(TokenKind::LeftParen) {
            let argc = self.argument_list();
            self.emit_op(OpCode::Call);
            self.emit_u16(idx);
            self.emit_byte(argc);
        } else if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_op(OpCode::Assign);
            self.emit_u16(idx);
        } else {
            let at = self.current_chunk_mut().len();
            self.emit_op(OpCode::GetVar);
            self.emit_u16(idx);
            self.last_get_var = Some((at, idx));
        }
    }

    /// `Vec2(x, y)` and friends: registered-type construction.
    fn type_constructor(&mut self, kind: TokenKind) {
        let name = kind.type_name().unwrap_or_default();
        let idx = self.name_constant(name);
        if !self.consume(TokenKind::LeftParen, ErrorCode::E100, "expected '(' after type name") {
            return;
        }
        let argc = self.argument_list();
        self.emit_op(OpCode::Construct);
        self.emit_u16(idx);
        self.emit_byte(argc);
    }

    /// Member access, member method call, or member assignment.
    fn dot(&mut self, can_assign: bool) {
        let Some(member) = self.consume_identifier("expected member name after '.'") else {
            return;
        };
        let member_idx = self.name_constant(&member);

        if self.matches(TokenKind::LeftParen) {
            let argc = self.argument_list();
            self.emit_op(OpCode::MemberCall);
            self.emit_u16(member_idx);
            self.emit_byte(argc);
        } else if can_assign && self.matches(TokenKind::Equal) {
            // Rewrite `var.member = expr`: drop the GetVar we just emitted
            // and compile a MemberSet against the variable by name. Targets
            // other than a plain variable cannot be written through.
            let receiver = self.last_get_var.take();
            match receiver {
                Some((at, var_idx)) if at + 3 == self.current_chunk_mut().len() => {
                    self.current_chunk_mut().truncate(at);
                    self.expression();
                    self.emit_op(OpCode::MemberSet);
                    self.emit_u16(var_idx);
                    self.emit_u16(member_idx);
                }
                _ => self.error_at_previous(ErrorCode::E102, "invalid assignment target"),
            }
        } else {
            self.emit_op(OpCode::MemberGet);
            self.emit_u16(member_idx);
        }
    }

    /// Parse a ')'-terminated comma-separated argument list.
    fn argument_list(&mut self) -> u8 {
        let mut argc: u8 = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if argc == u8::MAX {
                    self.error_here(ErrorCode::E100, "too many arguments");
                } else {
                    argc += 1;
                }
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, ErrorCode::E100, "expected ')' after arguments");
        argc
    }

    // ========================================================================
    // Emission helpers
    // ========================================================================

    fn current_chunk_mut(&mut self) -> &mut Chunk {
        self.chunks.last_mut().expect("chunk stack is never empty")
    }

    fn emit_op(&mut self, op: OpCode) {
        self.last_get_var = None;
        let line = self.previous_line();
        self.current_chunk_mut().write_op(op, line);
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous_line();
        self.current_chunk_mut().write_byte(byte, line);
    }

    fn emit_u16(&mut self, value: u16) {
        let line = self.previous_line();
        self.current_chunk_mut().write_u16(value, line);
    }

    /// Emit a jump with a placeholder distance; returns the operand offset
    /// for later patching.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        let at = self.current_chunk_mut().len();
        self.emit_u16(0xFFFF);
        at
    }

    /// Patch a jump emitted by [`Self::emit_jump`] to land at the current
    /// end of the tape.
    fn patch_jump(&mut self, operand_at: usize) {
        let distance = self.current_chunk_mut().len() - (operand_at + 2);
        let line = self.previous_line();
        if distance > u16::MAX as usize {
            self.report(
                Diagnostic::error(ErrorCode::E101, line)
                    .message("jump distance too large")
                    .build(),
            );
            return;
        }
        self.current_chunk_mut().patch_u16(operand_at, distance as u16);
    }

    fn name_constant(&mut self, name: &str) -> u16 {
        self.current_chunk_mut()
            .add_constant(Constant::String(name.to_string()))
    }

    fn begin_chunk(&mut self, name: &str) {
        self.chunks.push(Chunk::new(name));
        self.declared.push(vec![HashSet::new()]);
    }

    fn end_chunk(&mut self) -> Chunk {
        self.declared.pop();
        self.chunks.pop().expect("chunk stack is never empty")
    }

    fn begin_scope(&mut self) {
        if let Some(scopes) = self.declared.last_mut() {
            scopes.push(HashSet::new());
        }
    }

    fn end_scope(&mut self) {
        if let Some(scopes) = self.declared.last_mut() {
            scopes.pop();
        }
    }

    // ========================================================================
    // Token-stream helpers
    // ========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.cursor.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    fn previous_line(&self) -> u32 {
        self.previous().line
    }

    fn peek_kind(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.cursor + ahead).map(|t| t.kind)
    }

    fn advance(&mut self) {
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, code: ErrorCode, message: &str) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            self.error_here(code, message);
            false
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Option<String> {
        if self.check(TokenKind::Identifier) {
            self.advance();
            Some(self.previous().lexeme.clone())
        } else {
            self.error_here(ErrorCode::E100, message);
            None
        }
    }

    // ========================================================================
    // Error reporting and recovery
    // ========================================================================

    fn report(&mut self, diagnostic: Diagnostic) {
        if !self.panic_mode {
            self.diagnostics.push(diagnostic);
        }
        self.panic_mode = true;
    }

    /// A scan-error token surfaces its own diagnostic rather than the
    /// parser's expectation at that point.
    fn scan_error(token: &Token) -> Option<(ErrorCode, String)> {
        if token.kind != TokenKind::Error {
            return None;
        }
        if token.lexeme.starts_with('"') {
            Some((ErrorCode::E002, "unterminated string literal".to_string()))
        } else {
            Some((
                ErrorCode::E001,
                format!("unrecognized character '{}'", token.lexeme),
            ))
        }
    }

    fn error_here(&mut self, code: ErrorCode, message: impl Into<String>) {
        let token = self.current();
        let line = token.line;
        let span = token.span;
        let (code, message) = Self::scan_error(token).unwrap_or((code, message.into()));
        self.report(Diagnostic::error(code, line).message(message).span(span).build());
    }

    fn error_at_previous(&mut self, code: ErrorCode, message: impl Into<String>) {
        let token = self.previous();
        let line = token.line;
        let span = token.span;
        let (code, message) = Self::scan_error(token).unwrap_or((code, message.into()));
        self.report(Diagnostic::error(code, line).message(message).span(span).build());
    }

    /// Skip forward to the next safe synchronization point (statement
    /// boundary or closing brace) after an error.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while !self.check(TokenKind::Eof) {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.current_kind() {
                TokenKind::RightBrace
                | TokenKind::State
                | TokenKind::Function
                | TokenKind::OnEnter
                | TokenKind::OnUpdate
                | TokenKind::OnExit
                | TokenKind::If
                | TokenKind::Return
                | TokenKind::ChangeState => return,
                kind if kind.is_type_name() => return,
                _ => self.advance(),
            }
        }
    }
}
