//! Demangling failures.

use std::fmt;

/// Why a symbol could not be demangled.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DemangleErrorKind {
    #[error("symbol does not start with a recognized mangling prefix")]
    UnsupportedPrefix,
    #[error("unexpected end of symbol")]
    UnexpectedEnd,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("expected {0} on the operand stack")]
    MissingOperand(&'static str),
    #[error("substitution index {0} is out of range")]
    InvalidSubstitution(usize),
    #[error("word index {0} is out of range")]
    InvalidWord(usize),
    #[error("repeat count {0} exceeds the limit")]
    RepeatCount(u64),
    #[error("number does not fit")]
    NumberOverflow,
    #[error("invalid punycode identifier")]
    Punycode,
    #[error("identifier is not valid UTF-8")]
    InvalidUtf8,
    #[error("{0} nodes left over after parsing")]
    TrailingNodes(usize),
    #[error("nesting exceeds the limit of {0}")]
    NestingTooDeep(u32),
    #[error("demangled tree exceeds {0} nodes")]
    TooLarge(usize),
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
}

/// A symbol that failed to demangle.
///
/// Carries the byte offset where parsing stopped and the prefix consumed up to
/// that point. No partial declaration survives a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemangleError {
    pub offset: usize,
    pub consumed: String,
    pub kind: DemangleErrorKind,
}

impl DemangleError {
    pub(crate) fn new(offset: usize, consumed: &[u8], kind: DemangleErrorKind) -> Self {
        DemangleError {
            offset,
            consumed: String::from_utf8_lossy(consumed).into_owned(),
            kind,
        }
    }
}

impl fmt::Display for DemangleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed symbol at byte {} (after `{}`): {}",
            self.offset, self.consumed, self.kind
        )
    }
}

impl std::error::Error for DemangleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
