//! Error types for the wire codec.

use std::fmt;
use std::io;
use thiserror::Error;

/// Classification of a fatal protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolErrorKind {
    /// Bytes that cannot be interpreted (bad tag byte, invalid UTF-8).
    InvalidData,
    /// A length or element count prefix was negative.
    NegativeSize,
    /// A length or element count exceeded the configured limit or the
    /// bytes remaining in the input.
    SizeLimit,
    /// A message header carried a missing or unsupported version.
    BadVersion,
    /// Nesting went deeper than the configured depth limit.
    DepthLimit,
    /// The input ended in the middle of a value.
    UnexpectedEof,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidData => "invalid data",
            Self::NegativeSize => "negative size",
            Self::SizeLimit => "size limit exceeded",
            Self::BadVersion => "bad version",
            Self::DepthLimit => "depth limit exceeded",
            Self::UnexpectedEof => "unexpected end of input",
        };
        f.write_str(name)
    }
}

/// The main error type for encoding and decoding records.
#[derive(Debug, Error)]
pub enum WireError {
    /// Malformed or truncated wire data. The input position is undefined
    /// after this error and the stream must not be read further.
    #[error("protocol error ({kind}): {message}")]
    Protocol {
        /// What went wrong.
        kind: ProtocolErrorKind,
        /// Human-readable detail.
        message: String,
    },

    /// A record or descriptor does not satisfy its schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// Invalid codec configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WireError {
    /// Creates a protocol error of the given kind.
    pub fn protocol(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self::Protocol {
            kind,
            message: message.into(),
        }
    }

    /// Returns the protocol error kind, if this is a protocol error.
    pub fn protocol_kind(&self) -> Option<ProtocolErrorKind> {
        match self {
            Self::Protocol { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A specialized `Result` type for codec operations.
pub type Result<T> = std::result::Result<T, WireError>;
