//! Header types exchanged between the protocol and the record engine.

use super::constants::{MessageType, WireType};

/// Header preceding each field value inside a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    /// On-wire type of the value that follows.
    pub wire_type: WireType,
    /// Field id; zero for the STOP marker.
    pub id: i16,
}

impl FieldHeader {
    /// Creates a field header.
    pub fn new(wire_type: WireType, id: i16) -> Self {
        Self { wire_type, id }
    }

    /// Returns the header that terminates a struct.
    pub fn stop() -> Self {
        Self::new(WireType::Stop, 0)
    }

    /// Returns true if this header ends the field loop.
    pub fn is_stop(&self) -> bool {
        self.wire_type == WireType::Stop
    }
}

/// Header preceding the elements of a list or set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    /// Wire type shared by every element.
    pub element_type: WireType,
    /// Number of elements that follow.
    pub size: usize,
}

impl ListHeader {
    /// Creates a list or set header.
    pub fn new(element_type: WireType, size: usize) -> Self {
        Self { element_type, size }
    }
}

/// Header preceding the entries of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    /// Wire type shared by every key.
    pub key_type: WireType,
    /// Wire type shared by every value.
    pub value_type: WireType,
    /// Number of key/value pairs that follow.
    pub size: usize,
}

impl MapHeader {
    /// Creates a map header.
    pub fn new(key_type: WireType, value_type: WireType, size: usize) -> Self {
        Self {
            key_type,
            value_type,
            size,
        }
    }
}

/// Envelope around a call, reply or exception payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Method name.
    pub name: String,
    /// Envelope kind.
    pub message_type: MessageType,
    /// Sequence id correlating replies with calls.
    pub seqid: i32,
}

impl MessageHeader {
    /// Creates a message header.
    pub fn new(name: impl Into<String>, message_type: MessageType, seqid: i32) -> Self {
        Self {
            name: name.into(),
            message_type,
            seqid,
        }
    }
}
