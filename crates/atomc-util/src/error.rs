use thiserror::Error;

/// Errors raised by the lexer (component B).
#[derive(Debug, Error)]
pub enum LexError {
    #[error("line {line}: unrecognized character '{ch}'")]
    UnrecognizedChar { line: u32, ch: char },

    #[error("line {line}: unterminated char literal")]
    UnterminatedChar { line: u32 },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: u32 },

    #[error("line {line}: invalid number literal '{lexeme}'")]
    InvalidNumber { line: u32, lexeme: String },
}

impl LexError {
    pub fn line(&self) -> u32 {
        match self {
            LexError::UnrecognizedChar { line, .. }
            | LexError::UnterminatedChar { line }
            | LexError::UnterminatedString { line }
            | LexError::InvalidNumber { line, .. } => *line,
        }
    }
}

/// Errors raised by the parser and the semantic analyzer interleaved with
/// it (component F). Parsing and semantic analysis are one phase per the
/// design, so both kinds of failure share one error type and one
/// first-error-aborts policy.
#[derive(Debug, Error)]
pub enum SemError {
    #[error("line {line}: expected {expected}")]
    Syntax { line: u32, expected: String },

    #[error("line {line}: redefinition of '{name}'")]
    Redefinition { line: u32, name: String },

    #[error("line {line}: array size must be greater than 0")]
    InvalidArraySize { line: u32 },

    #[error("line {line}: no struct definition for '{name}'")]
    NoStructDef { line: u32, name: String },

    #[error("line {line}: undefined identifier '{name}'")]
    UndefinedId { line: u32, name: String },

    #[error("line {line}: '{name}' is not callable")]
    UncallableId { line: u32, name: String },

    #[error("line {line}: left-hand side is not an l-value")]
    NotLval { line: u32 },

    #[error("line {line}: cannot assign to a constant")]
    ConstantTarget { line: u32 },

    #[error("line {line}: invalid type: {message}")]
    InvalidType { line: u32, message: String },

    #[error("line {line}: cannot cast: {message}")]
    TypeCast { line: u32, message: String },

    #[error("line {line}: too few arguments in call to '{name}'")]
    TooFewArguments { line: u32, name: String },

    #[error("line {line}: too many arguments in call to '{name}'")]
    TooManyArguments { line: u32, name: String },
}

impl SemError {
    pub fn line(&self) -> u32 {
        match self {
            SemError::Syntax { line, .. }
            | SemError::Redefinition { line, .. }
            | SemError::InvalidArraySize { line }
            | SemError::NoStructDef { line, .. }
            | SemError::UndefinedId { line, .. }
            | SemError::UncallableId { line, .. }
            | SemError::NotLval { line }
            | SemError::ConstantTarget { line }
            | SemError::InvalidType { line, .. }
            | SemError::TypeCast { line, .. }
            | SemError::TooFewArguments { line, .. }
            | SemError::TooManyArguments { line, .. } => *line,
        }
    }
}

/// Errors raised by the VM (components H, I).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime error: empty stack")]
    EmptyStack,

    #[error("runtime error: address out of bounds")]
    OutOfBounds,

    #[error("runtime error: unknown external function '{name}'")]
    UnknownExternal { name: String },

    #[error("runtime error: instruction pointer out of range")]
    InvalidIp,
}
