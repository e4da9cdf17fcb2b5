use std::str::Utf8Error;

use thiserror::Error;

/// Errors raised by the byte cursor, the tree store, the wire codec and the
/// fill/scan interpreters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ran out in the middle of an atom.
    #[error("underflow: {0} more bytes needed")]
    Underflow(usize),
    /// The output buffer ran out of space.
    #[error("overflow: destination too small, {0} more bytes needed")]
    Overflow(usize),
    #[error("unrecognized type code 0x{0:02x}")]
    InvalidTypeCode(u8),
    #[error("invalid utf-8 in string payload")]
    Utf8(#[from] Utf8Error),
    #[error("invalid unicode scalar 0x{0:08x}")]
    InvalidChar(u32),
    #[error("invalid argument: {0}")]
    Arg(String),
    #[error("{0}")]
    Invalid(String),
}

impl CodecError {
    pub(crate) fn arg(msg: impl Into<String>) -> CodecError {
        CodecError::Arg(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> CodecError {
        CodecError::Invalid(msg.into())
    }
}
