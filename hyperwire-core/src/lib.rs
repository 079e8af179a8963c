//! Descriptor-driven record codec for the Thrift binary protocol.
//!
//! Records are generic: a [`StructDescriptor`] lists the fields of a type and
//! a [`Record`] holds one optional [`Value`] per field. The [`RecordEngine`]
//! walks both to produce or consume the binary wire format, skipping fields
//! it does not recognise.

#![warn(missing_docs)]

pub mod error;
pub mod protocol;
pub mod record;
pub mod serialization;

pub use error::{ProtocolErrorKind, Result, WireError};
pub use protocol::{
    BinaryReader, BinaryWriter, MessageHeader, MessageType, ProtocolConfig, ProtocolReader,
    ProtocolWriter, WireType,
};
pub use record::{
    decode_record, encode_record, DescriptorRegistry, FieldDescriptor, Record, RecordCodec,
    RecordEngine, RecordType, Requiredness, StandardCodec, StructDescriptor, TypeDescriptor, Value,
};
pub use serialization::{BufferOutput, DataInput, DataOutput, SliceInput, StreamInput, StreamOutput};
