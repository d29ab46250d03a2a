use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// Two tokens claim overlapping ranges, given as `[start, end)` pairs.
    OverlappingTokens { first: (usize, usize), second: (usize, usize) },
    TokenOutOfBounds { start: usize, end: usize, length: usize },
    EncryptorNotFound { table: String, column: String, encryptor: String },
    EncryptFailed { table: String, column: String, message: String },
}

impl Display for RewriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewriteError::OverlappingTokens { first, second } => write!(
                f,
                "rewrite tokens [{}, {}) and [{}, {}) overlap",
                first.0, first.1, second.0, second.1
            ),
            RewriteError::TokenOutOfBounds { start, end, length } => {
                write!(f, "rewrite token [{start}, {end}) is outside the {length} bytes of SQL")
            }
            RewriteError::EncryptorNotFound { table, column, encryptor } => {
                write!(f, "encryptor '{encryptor}' of '{table}.{column}' is not registered")
            }
            RewriteError::EncryptFailed { table, column, message } => {
                write!(f, "cannot encrypt value of '{table}.{column}': {message}")
            }
        }
    }
}

impl std::error::Error for RewriteError {}
