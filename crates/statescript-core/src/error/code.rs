use thiserror::Error;

/// Error codes for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Error)]
pub enum ErrorCode {
    // Lexical errors (E001-E099)
    #[error("unrecognized character")]
    E001,
    #[error("unterminated string")]
    E002,
    #[error("malformed number")]
    E003,

    // Parse errors (E100-E199)
    #[error("unexpected token")]
    E100,
    #[error("unclosed block")]
    E101,
    #[error("invalid assignment target")]
    E102,
    #[error("declaration not allowed here")]
    E103,

    // Link-time semantic errors (E200-E299)
    #[error("variable already declared in this scope")]
    E200,
    #[error("duplicate state name")]
    E201,
    #[error("duplicate event name")]
    E202,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E001").
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
        }
    }

    /// Get a short description of the error.
    pub fn message(self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::E001.as_str(), "E001");
        assert_eq!(ErrorCode::E200.as_str(), "E200");
    }

    #[test]
    fn error_code_message() {
        assert_eq!(ErrorCode::E002.message(), "unterminated string");
        assert_eq!(ErrorCode::E201.message(), "duplicate state name");
    }
}
