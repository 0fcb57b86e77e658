//! Crate-wide error type.
//!
//! Every public entry point returns `Result<T, Error>`. Fatal structural problems (§7 kind 1)
//! are the only ones that reach here; recoverable per-record problems are captured as
//! [`crate::diagnostic::Diagnostic`]s attached to the owning entity instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognized Mach-O magic: {0:#010x}")]
    InvalidMagic(u32),

    #[error("data too small: expected at least {expected} bytes, got {actual}")]
    DataTooSmall { expected: usize, actual: usize },

    #[error("architecture not found in fat binary: {0:?}")]
    ArchitectureNotFound(crate::arch::Arch),

    #[error("invalid load command")]
    InvalidLoadCommand,

    #[error("unsupported format")]
    UnsupportedFormat,

    #[error("chained fixups data too small")]
    ChainedFixupsDataTooSmall,

    #[error("chained fixups header is invalid")]
    ChainedFixupsInvalidFormat,

    #[error("unsupported chained fixups pointer format: {0:#06x}")]
    ChainedFixupsUnsupportedPointerFormat(u16),

    #[error("offset {offset} out of bounds (buffer size {size})")]
    OffsetOutOfBounds { offset: usize, size: usize },

    #[error("read of {length} bytes at offset {offset} out of bounds (buffer size {size})")]
    ReadOutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },

    #[error("invalid C string at offset {0}")]
    InvalidCString(usize),

    #[error("invalid fixed-width string encoding")]
    InvalidEncoding,

    #[error("malformed LEB128 value at offset {0}")]
    Leb128Malformed(usize),

    #[error("LEB128 value at offset {0} exceeds 64 bits")]
    Leb128TooLarge(usize),

    #[error("parser failure: {0}")]
    ParsingError(String),

    #[error("unknown or reserved load command")]
    UnknownLoadCommand,

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        Error::ParsingError(err.to_string())
    }
}
