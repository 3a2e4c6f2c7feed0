use std::fmt::{Display, Formatter};

/// A character-level failure. Always fatal for the compilation unit.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("At {line}:{col} (byte {offset}) near `{snippet}`:\n{kind}")]
pub struct LexError {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
    /// A few characters of source starting at `offset`.
    pub snippet: String,
    pub kind: LexErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexErrorKind {
    UnexpectedCharacter(char),
    NewlineInString,
    UnterminatedString,
    UnterminatedBlockComment,
    IntegerOutOfRange(String),
}

impl Display for LexErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use LexErrorKind::*;
        match self {
            UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            NewlineInString => write!(f, "unexpected newline in string literal"),
            UnterminatedString => write!(f, "unterminated string literal"),
            UnterminatedBlockComment => write!(f, "unterminated block comment"),
            IntegerOutOfRange(text) => {
                write!(f, "integer literal '{}' is outside the range 0..=32767", text)
            }
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("At {line}:{col}:\nExpected {expected}, got {found} instead.")]
    Mismatch {
        expected: String,
        found: String,
        /// Index of the offending token in the token stream.
        position: usize,
        line: usize,
        col: usize,
    },
    #[error("Unexpected end of file, expected {expected} instead.")]
    UnexpectedEof { expected: String, position: usize },
    #[error("At {line}:{col}:\nCode is nested more than {limit} levels deep.")]
    NestingTooDeep { limit: usize, line: usize, col: usize },
    #[error("At {line}:{col}:\nExpected end of file after the class, got {found} instead.")]
    TrailingInput { found: String, line: usize, col: usize },
}

impl ParseError {
    /// Whether an enclosing production may backtrack over this failure and try another
    /// alternative.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Mismatch { .. } | Self::UnexpectedEof { .. })
    }

    /// How far into the token stream the failure happened, used to pick the most useful
    /// diagnostic out of several failed alternatives.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Mismatch { position, .. } | Self::UnexpectedEof { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum CodegenError {
    #[error(
        "In {subroutine}:\nThe variable '{name}' either does not exist or was defined in another class or function."
    )]
    UnresolvedSymbol { name: String, subroutine: String },
    #[error("In {scope}:\nThe name '{name}' is declared more than once.")]
    DuplicateSymbol { name: String, scope: String },
    #[error("In {subroutine}:\nThe string constant needs the value {value}, which is outside 0..=32767.")]
    ConstantOutOfRange { value: usize, subroutine: String },
}

/// The stage of compilation that failed.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum StageError {
    #[error("Failed to tokenize:\n{0}")]
    Lex(#[from] LexError),
    #[error("Failed to parse:\n{0}")]
    Parse(#[from] ParseError),
    #[error("Failed to generate code:\n{0}")]
    Codegen(#[from] CodegenError),
}

/// A fatal error for one compilation unit, labeled with the filename hint it was compiled under.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{filename}: {stage}")]
pub struct CompileError {
    pub filename: String,
    /// Not exposed as `source()`: the message already includes it.
    pub stage: StageError,
}

impl CompileError {
    pub fn new(filename: &str, stage: impl Into<StageError>) -> Self {
        Self {
            filename: filename.to_owned(),
            stage: stage.into(),
        }
    }
}
