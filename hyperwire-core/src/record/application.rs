//! The standard application-exception struct.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use thiserror::Error;

use super::{FieldDescriptor, Record, RecordType, StructDescriptor, TypeDescriptor, Value};
use crate::error::{Result, WireError};

/// Category carried in the `type` field of an application exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ApplicationErrorKind {
    /// Unclassified failure.
    Unknown = 0,
    /// The method name is not served.
    UnknownMethod = 1,
    /// The message type was not expected.
    InvalidMessageType = 2,
    /// A reply named a different method.
    WrongMethodName = 3,
    /// A reply carried an unexpected sequence id.
    BadSequenceId = 4,
    /// A reply had no result field.
    MissingResult = 5,
    /// The server failed while handling the call.
    InternalError = 6,
    /// The request could not be decoded.
    ProtocolError = 7,
    /// An unsupported transport transform was requested.
    InvalidTransform = 8,
    /// An unsupported protocol was requested.
    InvalidProtocol = 9,
    /// The client type is not supported.
    UnsupportedClientType = 10,
}

impl ApplicationErrorKind {
    /// Converts a wire value, returning `None` for unassigned codes.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::UnknownMethod),
            2 => Some(Self::InvalidMessageType),
            3 => Some(Self::WrongMethodName),
            4 => Some(Self::BadSequenceId),
            5 => Some(Self::MissingResult),
            6 => Some(Self::InternalError),
            7 => Some(Self::ProtocolError),
            8 => Some(Self::InvalidTransform),
            9 => Some(Self::InvalidProtocol),
            10 => Some(Self::UnsupportedClientType),
            _ => None,
        }
    }

    /// Returns the wire value.
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for ApplicationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::UnknownMethod => "unknown method",
            Self::InvalidMessageType => "invalid message type",
            Self::WrongMethodName => "wrong method name",
            Self::BadSequenceId => "bad sequence id",
            Self::MissingResult => "missing result",
            Self::InternalError => "internal error",
            Self::ProtocolError => "protocol error",
            Self::InvalidTransform => "invalid transform",
            Self::InvalidProtocol => "invalid protocol",
            Self::UnsupportedClientType => "unsupported client type",
        };
        f.write_str(name)
    }
}

static DESCRIPTOR: Lazy<Result<Arc<StructDescriptor>>> = Lazy::new(|| {
    StructDescriptor::builder("TApplicationException")
        .field(FieldDescriptor::new(1, "message", TypeDescriptor::String).optional())
        .field(FieldDescriptor::new(2, "type", TypeDescriptor::I32).optional())
        .build()
        .map(Arc::new)
});

/// Returns the descriptor of the application-exception struct.
pub fn application_exception_descriptor() -> Result<Arc<StructDescriptor>> {
    match &*DESCRIPTOR {
        Ok(descriptor) => Ok(Arc::clone(descriptor)),
        Err(e) => Err(WireError::Schema(e.to_string())),
    }
}

/// An error reported by a remote service in an EXCEPTION message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("application exception ({kind}): {}", .message.as_deref().unwrap_or("no message"))]
pub struct ApplicationException {
    /// Failure category.
    pub kind: ApplicationErrorKind,
    /// Detail from the remote side.
    pub message: Option<String>,
}

impl ApplicationException {
    /// Creates an exception with a message.
    pub fn new(kind: ApplicationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }
}

impl RecordType for ApplicationException {
    fn descriptor() -> Result<Arc<StructDescriptor>> {
        application_exception_descriptor()
    }

    fn to_record(&self) -> Result<Record> {
        let mut record = Record::new(&Self::descriptor()?);
        if let Some(message) = &self.message {
            record.set("message", message.as_str())?;
        }
        record.set("type", Value::I32(self.kind.as_i32()))?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let code = record.get_i32("type")?.unwrap_or(0);
        let kind = ApplicationErrorKind::from_i32(code).unwrap_or_else(|| {
            tracing::debug!(code, "unassigned application error code");
            ApplicationErrorKind::Unknown
        });
        Ok(Self {
            kind,
            message: record.get_string("message")?.map(str::to_string),
        })
    }
}
