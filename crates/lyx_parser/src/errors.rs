pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of statement, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("expected {expected}, found {found} at line {line}, column {col}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        col: usize,
    },

    #[error("unterminated quoted string starting at line {line}, column {col}")]
    UnterminatedString { line: usize, col: usize },

    #[error("unterminated block comment starting at line {line}, column {col}")]
    UnterminatedComment { line: usize, col: usize },

    #[error("statement is nested more than {limit} levels deep")]
    NestingTooDeep { limit: usize },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid INSERT: {0}")]
    InvalidInsert(String),

    #[error("statement cannot be routed: {0}")]
    Unrouteable(String),
}

macro_rules! unsupported {
    ($($arg:tt)*) => {
        crate::errors::ParseError::Unsupported(std::format!($($arg)*))
    };
}

pub(crate) use unsupported;
