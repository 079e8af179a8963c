//! Typed views over generic records.

use std::sync::Arc;

use super::{decode_record, encode_record, Record, RecordCodec, StandardCodec, StructDescriptor};
use crate::error::Result;
use crate::protocol::{ProtocolConfig, ProtocolReader, ProtocolWriter};

/// A Rust type with a fixed struct descriptor.
///
/// Implementors convert to and from a generic [`Record`]; the provided
/// methods then encode and decode through the standard engine.
pub trait RecordType: Sized {
    /// Returns the shared descriptor for this type.
    fn descriptor() -> Result<Arc<StructDescriptor>>;

    /// Converts this value into a generic record.
    fn to_record(&self) -> Result<Record>;

    /// Builds a value from a generic record of this type.
    fn from_record(record: &Record) -> Result<Self>;

    /// Encodes with the default protocol configuration.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        StandardCodec.encode(&self.to_record()?, &ProtocolConfig::default())
    }

    /// Decodes with the default protocol configuration.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let descriptor = Self::descriptor()?;
        let record = StandardCodec.decode(bytes, &descriptor, &ProtocolConfig::default())?;
        Self::from_record(&record)
    }

    /// Writes this value as a struct to an open protocol.
    fn write<P: ProtocolWriter + ?Sized>(&self, protocol: &mut P) -> Result<()> {
        encode_record(protocol, &self.to_record()?)
    }

    /// Reads a value of this type from an open protocol.
    fn read<P: ProtocolReader + ?Sized>(protocol: &mut P) -> Result<Self> {
        let descriptor = Self::descriptor()?;
        Self::from_record(&decode_record(protocol, &descriptor)?)
    }
}
