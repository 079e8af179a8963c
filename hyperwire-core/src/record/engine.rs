//! Generic struct reader and writer driven by descriptors.
//!
//! Decoding a struct is a loop over field headers:
//!
//! ```text
//! START -> header -> STOP    -> END
//!                 -> known   -> decode -> START
//!                 -> unknown -> skip   -> START
//! ```
//!
//! A field is "known" only when both its id and its wire type match the
//! descriptor. Anything else is skipped, so newer writers can add fields
//! without breaking older readers.

use std::fmt;
use std::sync::Arc;

use super::{Record, StructDescriptor, TypeDescriptor, Value};
use crate::error::{Result, WireError};
use crate::protocol::{
    initial_capacity, nested, skip_value, BinaryReader, BinaryWriter, ListHeader, MapHeader,
    ProtocolConfig, ProtocolReader, ProtocolWriter, WireType,
};
use crate::serialization::{BufferOutput, SliceInput};

/// Writes a record as a struct: every present field in descriptor order,
/// then STOP. The record is validated first.
pub fn encode_record<P: ProtocolWriter + ?Sized>(protocol: &mut P, record: &Record) -> Result<()> {
    record.validate()?;
    protocol.write_struct_begin(record.type_name())?;
    for (field, value) in record.present_fields() {
        protocol.write_field_begin(field.name(), field.wire_type(), field.id())?;
        write_value(protocol, field.ty(), value)?;
        protocol.write_field_end()?;
    }
    protocol.write_field_stop()?;
    protocol.write_struct_end()
}

/// Reads a struct into a new record. Declared defaults are not applied.
pub fn decode_record<P: ProtocolReader + ?Sized>(
    protocol: &mut P,
    descriptor: &Arc<StructDescriptor>,
) -> Result<Record> {
    nested(protocol, |p| {
        let mut record = Record::empty(descriptor);
        p.read_struct_begin()?;
        loop {
            let header = p.read_field_begin()?;
            if header.is_stop() {
                break;
            }
            match descriptor.field_by_id(header.id) {
                Some((index, field)) if field.wire_type() == header.wire_type => {
                    match read_value(p, field.ty())? {
                        Some(value) => *record.slot_mut(index) = Some(value),
                        None => tracing::debug!(
                            struct_name = descriptor.name(),
                            field = field.name(),
                            field_id = header.id,
                            "field left unset"
                        ),
                    }
                }
                Some((_, field)) => {
                    if p.config().warn_on_type_mismatch() {
                        tracing::warn!(
                            struct_name = descriptor.name(),
                            field = field.name(),
                            field_id = header.id,
                            expected = %field.wire_type(),
                            actual = %header.wire_type,
                            "skipping field with mismatched wire type"
                        );
                    } else {
                        tracing::debug!(
                            struct_name = descriptor.name(),
                            field = field.name(),
                            field_id = header.id,
                            expected = %field.wire_type(),
                            actual = %header.wire_type,
                            "skipping field with mismatched wire type"
                        );
                    }
                    p.skip(header.wire_type)?;
                }
                None => {
                    tracing::trace!(
                        struct_name = descriptor.name(),
                        field_id = header.id,
                        wire_type = %header.wire_type,
                        "skipping unknown field"
                    );
                    p.skip(header.wire_type)?;
                }
            }
            p.read_field_end()?;
        }
        p.read_struct_end()?;
        Ok(record)
    })
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> WireError {
    WireError::Schema(format!("cannot write {} as {}", value.kind_name(), ty))
}

/// Writes one value of the given type. Fails if the value's shape does not
/// match the type.
pub fn write_value<P: ProtocolWriter + ?Sized>(
    protocol: &mut P,
    ty: &TypeDescriptor,
    value: &Value,
) -> Result<()> {
    match (ty, value) {
        (TypeDescriptor::Bool, Value::Bool(v)) => protocol.write_bool(*v),
        (TypeDescriptor::Byte, Value::Byte(v)) => protocol.write_byte(*v),
        (TypeDescriptor::I16, Value::I16(v)) => protocol.write_i16(*v),
        (TypeDescriptor::I32, Value::I32(v)) => protocol.write_i32(*v),
        (TypeDescriptor::I64, Value::I64(v)) => protocol.write_i64(*v),
        (TypeDescriptor::Double, Value::Double(v)) => protocol.write_double(*v),
        (TypeDescriptor::String, Value::String(v)) => protocol.write_string(v),
        (TypeDescriptor::Binary, Value::Binary(v)) => protocol.write_binary(v),
        (TypeDescriptor::Struct(descriptor), Value::Struct(record)) => {
            if descriptor.name() != record.type_name() {
                return Err(mismatch(ty, value));
            }
            encode_record(protocol, record)
        }
        (TypeDescriptor::List(elem), Value::List(items)) => {
            protocol.write_list_begin(ListHeader::new(elem.wire_type(), items.len()))?;
            for item in items {
                write_value(protocol, elem, item)?;
            }
            protocol.write_list_end()
        }
        (TypeDescriptor::Set(elem), Value::Set(items)) => {
            protocol.write_set_begin(ListHeader::new(elem.wire_type(), items.len()))?;
            for item in items {
                write_value(protocol, elem, item)?;
            }
            protocol.write_set_end()
        }
        (TypeDescriptor::Map(key_ty, value_ty), Value::Map(entries)) => {
            protocol.write_map_begin(MapHeader::new(
                key_ty.wire_type(),
                value_ty.wire_type(),
                entries.len(),
            ))?;
            for (k, v) in entries {
                write_value(protocol, key_ty, k)?;
                write_value(protocol, value_ty, v)?;
            }
            protocol.write_map_end()
        }
        _ => Err(mismatch(ty, value)),
    }
}

/// Logs a container skipped because its element types differ from the schema.
fn log_element_mismatch<P: ProtocolReader + ?Sized>(
    protocol: &P,
    container: &str,
    expected: WireType,
    actual: WireType,
) {
    if protocol.config().warn_on_type_mismatch() {
        tracing::warn!(
            container,
            expected = %expected,
            actual = %actual,
            "skipping container with mismatched element type"
        );
    } else {
        tracing::debug!(
            container,
            expected = %expected,
            actual = %actual,
            "skipping container with mismatched element type"
        );
    }
}

/// Reads the elements of a list or set whose header is already consumed.
fn read_elements<P: ProtocolReader + ?Sized>(
    protocol: &mut P,
    elem: &TypeDescriptor,
    header: ListHeader,
    container: &str,
) -> Result<Option<Vec<Value>>> {
    if header.size > 0 && header.element_type != elem.wire_type() {
        log_element_mismatch(protocol, container, elem.wire_type(), header.element_type);
        for _ in 0..header.size {
            skip_value(protocol, header.element_type)?;
        }
        return Ok(None);
    }
    let mut items = Vec::with_capacity(initial_capacity(header.size));
    let mut complete = true;
    for _ in 0..header.size {
        match read_value(protocol, elem)? {
            Some(item) => items.push(item),
            None => complete = false,
        }
    }
    Ok(complete.then_some(items))
}

/// Reads one value of the given type.
///
/// Returns `None` when a container, or a container nested inside it, declares
/// element types that differ from `ty`. The value is consumed either way.
/// Empty containers match any element type.
pub fn read_value<P: ProtocolReader + ?Sized>(
    protocol: &mut P,
    ty: &TypeDescriptor,
) -> Result<Option<Value>> {
    let value = match ty {
        TypeDescriptor::Bool => Value::Bool(protocol.read_bool()?),
        TypeDescriptor::Byte => Value::Byte(protocol.read_byte()?),
        TypeDescriptor::I16 => Value::I16(protocol.read_i16()?),
        TypeDescriptor::I32 => Value::I32(protocol.read_i32()?),
        TypeDescriptor::I64 => Value::I64(protocol.read_i64()?),
        TypeDescriptor::Double => Value::Double(protocol.read_double()?),
        TypeDescriptor::String => Value::String(protocol.read_string()?),
        TypeDescriptor::Binary => Value::Binary(protocol.read_binary()?),
        TypeDescriptor::Struct(descriptor) => Value::Struct(decode_record(protocol, descriptor)?),
        TypeDescriptor::List(elem) => {
            return nested(protocol, |p| {
                let header = p.read_list_begin()?;
                let items = read_elements(p, elem, header, "list")?;
                p.read_list_end()?;
                Ok(items.map(Value::List))
            })
        }
        TypeDescriptor::Set(elem) => {
            return nested(protocol, |p| {
                let header = p.read_set_begin()?;
                let items = read_elements(p, elem, header, "set")?;
                p.read_set_end()?;
                Ok(items.map(Value::Set))
            })
        }
        TypeDescriptor::Map(key_ty, value_ty) => {
            return nested(protocol, |p| {
                let header = p.read_map_begin()?;
                if header.size > 0 && header.key_type != key_ty.wire_type() {
                    log_element_mismatch(p, "map key", key_ty.wire_type(), header.key_type);
                } else if header.size > 0 && header.value_type != value_ty.wire_type() {
                    log_element_mismatch(p, "map value", value_ty.wire_type(), header.value_type);
                } else {
                    let mut entries = Vec::with_capacity(initial_capacity(header.size));
                    let mut complete = true;
                    for _ in 0..header.size {
                        let k = read_value(p, key_ty)?;
                        let v = read_value(p, value_ty)?;
                        match (k, v) {
                            (Some(k), Some(v)) => entries.push((k, v)),
                            _ => complete = false,
                        }
                    }
                    p.read_map_end()?;
                    return Ok(complete.then_some(Value::Map(entries)));
                }
                for _ in 0..header.size {
                    skip_value(p, header.key_type)?;
                    skip_value(p, header.value_type)?;
                }
                p.read_map_end()?;
                Ok(None)
            })
        }
    };
    Ok(Some(value))
}

/// A strategy for turning records into bytes and back.
///
/// Every implementation must produce output byte-identical to
/// [`StandardCodec`] and accept everything it accepts.
pub trait RecordCodec: Send + Sync + fmt::Debug {
    /// Returns a short name for diagnostics.
    fn name(&self) -> &str;

    /// Encodes a record into a new buffer.
    fn encode(&self, record: &Record, config: &ProtocolConfig) -> Result<Vec<u8>>;

    /// Decodes a record of the given type from `bytes`.
    fn decode(
        &self,
        bytes: &[u8],
        descriptor: &Arc<StructDescriptor>,
        config: &ProtocolConfig,
    ) -> Result<Record>;
}

/// The descriptor-driven codec built on [`BinaryWriter`] and [`BinaryReader`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec;

impl RecordCodec for StandardCodec {
    fn name(&self) -> &str {
        "standard"
    }

    fn encode(&self, record: &Record, config: &ProtocolConfig) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::with_config(BufferOutput::new(), config.clone());
        encode_record(&mut writer, record)?;
        Ok(writer.into_inner().into_bytes())
    }

    fn decode(
        &self,
        bytes: &[u8],
        descriptor: &Arc<StructDescriptor>,
        config: &ProtocolConfig,
    ) -> Result<Record> {
        let mut reader = BinaryReader::with_config(SliceInput::new(bytes), config.clone());
        let record = decode_record(&mut reader, descriptor)?;
        if !reader.get_ref().is_exhausted() {
            tracing::debug!(
                struct_name = descriptor.name(),
                consumed = reader.get_ref().position(),
                total = bytes.len(),
                "trailing bytes after record"
            );
        }
        Ok(record)
    }
}

/// Encodes and decodes records through a codec chosen at construction.
#[derive(Debug, Clone)]
pub struct RecordEngine {
    codec: Arc<dyn RecordCodec>,
    config: ProtocolConfig,
}

impl RecordEngine {
    /// Creates an engine using [`StandardCodec`] and the default configuration.
    pub fn new() -> Self {
        Self::with_config(ProtocolConfig::default())
    }

    /// Creates an engine using [`StandardCodec`] and the given configuration.
    pub fn with_config(config: ProtocolConfig) -> Self {
        Self::with_codec(Arc::new(StandardCodec), config)
    }

    /// Creates an engine using the given codec.
    pub fn with_codec(codec: Arc<dyn RecordCodec>, config: ProtocolConfig) -> Self {
        tracing::debug!(codec = codec.name(), "record engine created");
        Self { codec, config }
    }

    /// Returns the name of the active codec.
    pub fn codec_name(&self) -> &str {
        self.codec.name()
    }

    /// Returns the protocol configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Encodes a record.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        self.codec.encode(record, &self.config)
    }

    /// Decodes a record of the given type.
    pub fn decode(&self, bytes: &[u8], descriptor: &Arc<StructDescriptor>) -> Result<Record> {
        self.codec.decode(bytes, descriptor, &self.config)
    }
}

impl Default for RecordEngine {
    fn default() -> Self {
        Self::new()
    }
}
