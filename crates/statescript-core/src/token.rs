use crate::span::Span;

/// Kind of a scanned token.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    // Punctuation
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,

    // One- and two-character operators
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Equal,
    EqualEqual,
    BangEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    AndAnd,
    OrOr,

    // Literals
    Number,
    String,
    Identifier,

    // Keywords
    State,
    Function,
    OnEnter,
    OnUpdate,
    OnExit,
    ChangeState,
    If,
    Else,
    Return,
    True,
    False,
    Null,

    // Built-in type names (declaration keywords)
    NumberType,
    StringType,
    BoolType,
    Vec2Type,
    Vec3Type,
    EntityType,

    /// Unrecognized input. Carries the offending lexeme; the stream stays
    /// total so the parser can report and recover.
    Error,
    /// End of input. Always the last token.
    Eof,
}

impl TokenKind {
    /// Resolve an identifier lexeme to a keyword kind, if it is one.
    pub fn keyword(lexeme: &str) -> Option<TokenKind> {
        match lexeme {
            "State" => Some(TokenKind::State),
            "Function" => Some(TokenKind::Function),
            "OnEnter" => Some(TokenKind::OnEnter),
            "OnUpdate" => Some(TokenKind::OnUpdate),
            "OnExit" => Some(TokenKind::OnExit),
            "ChangeState" => Some(TokenKind::ChangeState),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "return" => Some(TokenKind::Return),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            "Number" => Some(TokenKind::NumberType),
            "String" => Some(TokenKind::StringType),
            "Bool" => Some(TokenKind::BoolType),
            "Vec2" => Some(TokenKind::Vec2Type),
            "Vec3" => Some(TokenKind::Vec3Type),
            "Entity" => Some(TokenKind::EntityType),
            _ => None,
        }
    }

    /// Check if this kind is a built-in type name.
    pub fn is_type_name(self) -> bool {
        matches!(
            self,
            TokenKind::NumberType
                | TokenKind::StringType
                | TokenKind::BoolType
                | TokenKind::Vec2Type
                | TokenKind::Vec3Type
                | TokenKind::EntityType
        )
    }

    /// The type name this keyword declares, for type-name kinds.
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            TokenKind::NumberType => Some("Number"),
            TokenKind::StringType => Some("String"),
            TokenKind::BoolType => Some("Bool"),
            TokenKind::Vec2Type => Some("Vec2"),
            TokenKind::Vec3Type => Some("Vec3"),
            TokenKind::EntityType => Some("Entity"),
            _ => None,
        }
    }
}

/// A scanned token: kind, source text, and location.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == TokenKind::Error
    }
}
