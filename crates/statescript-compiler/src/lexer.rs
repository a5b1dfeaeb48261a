//! Scanner for StateScript source text.
//!
//! Produces a flat token stream terminated by an EOF token. The stream is
//! always total: unrecognized characters become `Error` tokens rather than
//! aborting the scan, and unterminated strings are reported but still
//! yield a token so the parser can keep going.

use statescript_core::{Pos, Span, Token, TokenKind};

/// Scanner for StateScript source code.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Scan the entire source, returning the token stream.
    pub fn scan(mut self) -> Vec<Token> {
        while self.skip_trivia() {
            self.scan_token();
        }
        let end = Pos::new(self.source.len() as u32);
        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.line, Span::new(end, end)));
        self.tokens
    }

    /// Skip whitespace and comments, tracking line changes.
    /// Returns true if more input remains.
    fn skip_trivia(&mut self) -> bool {
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                }
                b'/' if bytes.get(self.pos + 1) == Some(&b'/') => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'/' if bytes.get(self.pos + 1) == Some(&b'*') => {
                    self.pos += 2;
                    while self.pos < bytes.len() {
                        if bytes[self.pos] == b'*' && bytes.get(self.pos + 1) == Some(&b'/') {
                            self.pos += 2;
                            break;
                        }
                        if bytes[self.pos] == b'\n' {
                            self.line += 1;
                        }
                        self.pos += 1;
                    }
                }
                _ => return true,
            }
        }
        false
    }

    fn scan_token(&mut self) {
        let bytes = self.source.as_bytes();
        let start = self.pos;
        let byte = bytes[self.pos];
        self.pos += 1;

        let kind = match byte {
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'=' if self.match_byte(b'=') => TokenKind::EqualEqual,
            b'=' => TokenKind::Equal,
            b'!' if self.match_byte(b'=') => TokenKind::BangEqual,
            b'!' => TokenKind::Bang,
            b'>' if self.match_byte(b'=') => TokenKind::GreaterEqual,
            b'>' => TokenKind::Greater,
            b'<' if self.match_byte(b'=') => TokenKind::LessEqual,
            b'<' => TokenKind::Less,
            b'&' if self.match_byte(b'&') => TokenKind::AndAnd,
            b'|' if self.match_byte(b'|') => TokenKind::OrOr,
            b'"' => {
                self.scan_string(start);
                return;
            }
            b'0'..=b'9' => {
                self.scan_number(start);
                return;
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                self.scan_identifier(start);
                return;
            }
            _ => {
                // Consume the whole codepoint so the lexeme slice stays
                // on a char boundary
                let len = self.source[start..].chars().next().map_or(1, char::len_utf8);
                self.pos = start + len;
                TokenKind::Error
            }
        };

        self.push(kind, start);
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.source.as_bytes().get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Scan a double-quoted string literal. The pushed lexeme is the
    /// unescaped payload without quotes; an unterminated string stops at
    /// the newline or end of input and is pushed as an `Error` token.
    fn scan_string(&mut self, start: usize) {
        let mut value = String::new();
        while let Some(ch) = self.source[self.pos..].chars().next() {
            match ch {
                '"' => {
                    self.pos += 1;
                    let span = self.span_from(start);
                    self.tokens
                        .push(Token::new(TokenKind::String, value, self.line, span));
                    return;
                }
                '\n' => break,
                '\\' => {
                    self.pos += 1;
                    let Some(next) = self.source[self.pos..].chars().next() else {
                        break;
                    };
                    let escaped = match next {
                        'n' => '\n',
                        't' => '\t',
                        '"' => '"',
                        '\\' => '\\',
                        other => other,
                    };
                    value.push(escaped);
                    self.pos += next.len_utf8();
                }
                _ => {
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        // Unterminated: report as an error token carrying the raw text
        self.push(TokenKind::Error, start);
    }

    fn scan_number(&mut self, start: usize) {
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos < bytes.len()
            && bytes[self.pos] == b'.'
            && bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
        {
            self.pos += 1;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        self.push(TokenKind::Number, start);
    }

    fn scan_identifier(&mut self, start: usize) {
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let lexeme = &self.source[start..self.pos];
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.push(kind, start);
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let span = self.span_from(start);
        let lexeme = &self.source[start..self.pos];
        self.tokens.push(Token::new(kind, lexeme, self.line, span));
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(Pos::new(start as u32), Pos::new(self.pos as u32))
    }
}
