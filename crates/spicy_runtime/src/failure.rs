//! Runtime failure taxonomy: every way a generated parser can fail, and
//! which of those failures a `try` block can recover from.
//!
//! Grounded on the project convention of hand-rolled error enums with
//! manual `Display`/`std::error::Error` impls rather than a derive-macro
//! error crate, following `logicaffeine_base::error`'s `SpannedError`
//! pattern.

use std::fmt;

/// Every way a generated parser or runtime primitive can fail at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Recoverable parse fault; a containing `try` block catches it and
    /// resumes at its fallback branch.
    ParseError(String),
    InvalidValue(String),
    OutOfRange(String),
    MissingData(String),
    Overflow(String),
    AttributeNotSet(String),
    UnsetOptional(String),
    UnsetUnionMember(String),
    IndexError(String),
    InvalidIterator(String),
    MatchStateReuse,
    StackSizeExceeded,
    AssertionFailure(String),
}

impl Failure {
    /// `true` for the one recoverable kind; every other kind is either a
    /// programming error or an input fault that propagates normally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Failure::ParseError(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Failure::ParseError(_) => "ParseError",
            Failure::InvalidValue(_) => "InvalidValue",
            Failure::OutOfRange(_) => "OutOfRange",
            Failure::MissingData(_) => "MissingData",
            Failure::Overflow(_) => "Overflow",
            Failure::AttributeNotSet(_) => "AttributeNotSet",
            Failure::UnsetOptional(_) => "UnsetOptional",
            Failure::UnsetUnionMember(_) => "UnsetUnionMember",
            Failure::IndexError(_) => "IndexError",
            Failure::InvalidIterator(_) => "InvalidIterator",
            Failure::MatchStateReuse => "MatchStateReuse",
            Failure::StackSizeExceeded => "StackSizeExceeded",
            Failure::AssertionFailure(_) => "AssertionFailure",
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::ParseError(msg)
            | Failure::InvalidValue(msg)
            | Failure::OutOfRange(msg)
            | Failure::MissingData(msg)
            | Failure::Overflow(msg)
            | Failure::AttributeNotSet(msg)
            | Failure::UnsetOptional(msg)
            | Failure::UnsetUnionMember(msg)
            | Failure::IndexError(msg)
            | Failure::InvalidIterator(msg)
            | Failure::AssertionFailure(msg) => write!(f, "{}: {}", self.kind_name(), msg),
            Failure::MatchStateReuse => write!(f, "MatchStateReuse: match state used after a non-negative indicator"),
            Failure::StackSizeExceeded => write!(f, "StackSizeExceeded"),
        }
    }
}

impl std::error::Error for Failure {}

pub type Result<T> = std::result::Result<T, Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_parse_error_is_recoverable() {
        assert!(Failure::ParseError("x".into()).is_recoverable());
        assert!(!Failure::Overflow("x".into()).is_recoverable());
        assert!(!Failure::MatchStateReuse.is_recoverable());
    }

    #[test]
    fn display_includes_kind_name() {
        let msg = Failure::OutOfRange("index 5 of 3".into()).to_string();
        assert!(msg.contains("OutOfRange"));
        assert!(msg.contains("index 5 of 3"));
    }
}
