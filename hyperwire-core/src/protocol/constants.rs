//! Wire-level constants for the Thrift binary protocol.

use std::fmt;

use crate::error::{ProtocolErrorKind, Result, WireError};

/// Mask selecting the version bits of a strict message header.
pub const VERSION_MASK: u32 = 0xffff_0000;
/// Version 1 marker written in strict message headers.
pub const VERSION_1: u32 = 0x8001_0000;
/// Mask selecting the message type of a strict message header.
pub const MESSAGE_TYPE_MASK: u32 = 0x0000_00ff;

/// Size of a list or set header on the wire: element tag plus count.
pub const LIST_HEADER_SIZE: usize = 5;
/// Size of a map header on the wire: key tag, value tag plus count.
pub const MAP_HEADER_SIZE: usize = 6;

/// Single-byte tag identifying how a value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Ends a struct's field list.
    Stop = 0,
    /// No value.
    Void = 1,
    /// One byte, zero or one.
    Bool = 2,
    /// Signed 8-bit integer.
    Byte = 3,
    /// IEEE 754 double, big-endian.
    Double = 4,
    /// Signed 16-bit integer.
    I16 = 6,
    /// Signed 32-bit integer.
    I32 = 8,
    /// Signed 64-bit integer.
    I64 = 10,
    /// Length-prefixed bytes; text or binary.
    String = 11,
    /// Field list closed by STOP.
    Struct = 12,
    /// Key and value types, count, then entries.
    Map = 13,
    /// Element type, count, then elements.
    Set = 14,
    /// Element type, count, then elements.
    List = 15,
}

impl WireType {
    /// Creates a WireType from its tag byte.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::Stop),
            1 => Ok(Self::Void),
            2 => Ok(Self::Bool),
            3 => Ok(Self::Byte),
            4 => Ok(Self::Double),
            6 => Ok(Self::I16),
            8 => Ok(Self::I32),
            10 => Ok(Self::I64),
            11 => Ok(Self::String),
            12 => Ok(Self::Struct),
            13 => Ok(Self::Map),
            14 => Ok(Self::Set),
            15 => Ok(Self::List),
            _ => Err(WireError::protocol(
                ProtocolErrorKind::InvalidData,
                format!("unknown type tag: {}", tag),
            )),
        }
    }

    /// Returns the tag byte for this wire type.
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Returns the encoded size for fixed-width types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte => Some(1),
            Self::I16 => Some(2),
            Self::I32 => Some(4),
            Self::I64 | Self::Double => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stop => "STOP",
            Self::Void => "VOID",
            Self::Bool => "BOOL",
            Self::Byte => "BYTE",
            Self::Double => "DOUBLE",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::String => "STRING",
            Self::Struct => "STRUCT",
            Self::Map => "MAP",
            Self::Set => "SET",
            Self::List => "LIST",
        };
        f.write_str(name)
    }
}

/// Kind of an RPC message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// A request expecting a reply.
    Call = 1,
    /// A successful response.
    Reply = 2,
    /// A response carrying an application exception.
    Exception = 3,
    /// A request with no reply.
    Oneway = 4,
}

impl MessageType {
    /// Creates a MessageType from its wire byte.
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            1 => Ok(Self::Call),
            2 => Ok(Self::Reply),
            3 => Ok(Self::Exception),
            4 => Ok(Self::Oneway),
            _ => Err(WireError::protocol(
                ProtocolErrorKind::InvalidData,
                format!("unknown message type: {}", b),
            )),
        }
    }

    /// Returns the wire byte for this message type.
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_tags() {
        assert_eq!(WireType::Stop.tag(), 0x00);
        assert_eq!(WireType::Bool.tag(), 0x02);
        assert_eq!(WireType::I64.tag(), 0x0A);
        assert_eq!(WireType::String.tag(), 0x0B);
        assert_eq!(WireType::Struct.tag(), 0x0C);
        assert_eq!(WireType::List.tag(), 0x0F);
    }

    #[test]
    fn test_wire_type_from_tag() {
        for tag in [0u8, 1, 2, 3, 4, 6, 8, 10, 11, 12, 13, 14, 15] {
            assert_eq!(WireType::from_tag(tag).unwrap().tag(), tag);
        }
    }

    #[test]
    fn test_wire_type_unknown_tag() {
        for tag in [5u8, 7, 9, 16, 0xFF] {
            let err = WireType::from_tag(tag).unwrap_err();
            assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::InvalidData));
        }
    }

    #[test]
    fn test_fixed_size() {
        assert_eq!(WireType::Bool.fixed_size(), Some(1));
        assert_eq!(WireType::I16.fixed_size(), Some(2));
        assert_eq!(WireType::Double.fixed_size(), Some(8));
        assert_eq!(WireType::String.fixed_size(), None);
        assert_eq!(WireType::Struct.fixed_size(), None);
    }

    #[test]
    fn test_message_type_round_trip() {
        for ty in [
            MessageType::Call,
            MessageType::Reply,
            MessageType::Exception,
            MessageType::Oneway,
        ] {
            assert_eq!(MessageType::from_byte(ty.as_byte()).unwrap(), ty);
        }
        assert!(MessageType::from_byte(0).is_err());
        assert!(MessageType::from_byte(5).is_err());
    }

    #[test]
    fn test_version_constants() {
        assert_eq!(VERSION_1 & VERSION_MASK, VERSION_1);
        assert_eq!((VERSION_1 | MessageType::Reply.as_byte() as u32) & MESSAGE_TYPE_MASK, 2);
    }
}
