//! Error model for plan compilation and decoding.
use std::fmt::{self, Display, Formatter};

/// The compile-time failure raised while turning a [`crate::Shape`] into a [`crate::plan::Plan`].
///
/// This is the only failure the compiler itself can raise, and it only fires when
/// [`crate::InitOptions::disallow_string_tag_on_unsupported_types`] is set.
#[derive(Debug, Clone)]
pub struct PlanError {
    what: &'static str,
    message: String,
}

impl PlanError {
    pub(crate) fn string_tag_on_unsupported_type(field: &str) -> Self {
        Self {
            what: "ErrStringTagOnUnsupportedType",
            message: format!("field `{field}` uses the \",string\" tag option on an unsupported type"),
        }
    }
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PlanError: {}: {}", self.what, self.message)
    }
}

impl std::error::Error for PlanError {}

/// The closed taxonomy of decode-time failures.
#[derive(Debug)]
pub enum ErrorKind {
    /// `ErrNilDest` — destination pointer is null.
    NilDest,
    /// `ErrUnexpectedValue` — token does not match the expected shape at this frame.
    UnexpectedValue,
    /// `ErrUnknownField` — unknown struct field while `disallow_unknown_fields` is set.
    UnknownField(String),
    /// `ErrIntegerOverflow` — integer literal exceeds the target width.
    IntegerOverflow,
    /// Supplemented strict-mode extension: duplicate object key rejected.
    DuplicateField(String),
    /// A malformed float literal, propagated from the float parser with the token's index.
    InvalidNumber(String),
    /// Input nesting exceeded the interpreter's recursion guard.
    NestingTooDeep,
    /// Propagated verbatim from a user `FromJsonRaw`/`FromJsonText` implementation.
    Custom(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NilDest => write!(f, "destination pointer is null"),
            ErrorKind::UnexpectedValue => write!(f, "unexpected value"),
            ErrorKind::UnknownField(name) => write!(f, "unknown field `{name}`"),
            ErrorKind::IntegerOverflow => write!(f, "integer overflow"),
            ErrorKind::DuplicateField(name) => write!(f, "duplicate field `{name}`"),
            ErrorKind::InvalidNumber(text) => write!(f, "invalid number `{text}`"),
            ErrorKind::NestingTooDeep => write!(f, "nesting too deep"),
            ErrorKind::Custom(err) => write!(f, "{err}"),
        }
    }
}

/// A single error value returned from [`crate::Decoder::decode`], carrying the byte index
/// into the source at which decoding failed.
#[derive(Debug)]
pub struct DecodeError {
    pub index: usize,
    pub kind: ErrorKind,
}

impl DecodeError {
    pub(crate) fn new(index: usize, kind: ErrorKind) -> Self {
        Self { index, kind }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "at index {}: {}", self.index, self.kind)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Custom(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_spec_format() {
        let err = DecodeError::new(12, ErrorKind::IntegerOverflow);
        assert_eq!(format!("{err}"), "at index 12: integer overflow");
    }

    #[test]
    fn plan_error_display() {
        let err = PlanError::string_tag_on_unsupported_type("Foo");
        assert!(format!("{err}").starts_with("PlanError: ErrStringTagOnUnsupportedType"));
    }
}
