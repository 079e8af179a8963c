//! Reader and writer traits for tagged wire protocols.

use super::config::ProtocolConfig;
use super::constants::WireType;
use super::headers::{FieldHeader, ListHeader, MapHeader, MessageHeader};
use crate::error::{ProtocolErrorKind, Result, WireError};

/// Trait for writing structs, containers and primitives to a wire protocol.
///
/// Begin/end pairs must be balanced by the caller. Implementations are free
/// to emit nothing for either side of a pair.
pub trait ProtocolWriter {
    /// Returns the active configuration.
    fn config(&self) -> &ProtocolConfig;

    /// Writes a message envelope header.
    fn write_message_begin(&mut self, header: &MessageHeader) -> Result<()>;

    /// Closes a message envelope.
    fn write_message_end(&mut self) -> Result<()>;

    /// Opens a struct. `name` is diagnostic only.
    fn write_struct_begin(&mut self, name: &str) -> Result<()>;

    /// Closes a struct.
    fn write_struct_end(&mut self) -> Result<()>;

    /// Writes a field header. `name` is diagnostic only.
    fn write_field_begin(&mut self, name: &str, wire_type: WireType, id: i16) -> Result<()>;

    /// Closes a field.
    fn write_field_end(&mut self) -> Result<()>;

    /// Writes the marker that terminates a struct's field loop.
    fn write_field_stop(&mut self) -> Result<()>;

    /// Writes a list header.
    fn write_list_begin(&mut self, header: ListHeader) -> Result<()>;

    /// Closes a list.
    fn write_list_end(&mut self) -> Result<()>;

    /// Writes a set header.
    fn write_set_begin(&mut self, header: ListHeader) -> Result<()>;

    /// Closes a set.
    fn write_set_end(&mut self) -> Result<()>;

    /// Writes a map header.
    fn write_map_begin(&mut self, header: MapHeader) -> Result<()>;

    /// Closes a map.
    fn write_map_end(&mut self) -> Result<()>;

    /// Writes a boolean.
    fn write_bool(&mut self, v: bool) -> Result<()>;

    /// Writes a signed byte.
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a 16-bit integer.
    fn write_i16(&mut self, v: i16) -> Result<()>;

    /// Writes a 32-bit integer.
    fn write_i32(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit integer.
    fn write_i64(&mut self, v: i64) -> Result<()>;

    /// Writes a double.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes a UTF-8 string.
    fn write_string(&mut self, v: &str) -> Result<()>;

    /// Writes opaque binary data.
    fn write_binary(&mut self, v: &[u8]) -> Result<()>;
}

/// Trait for reading structs, containers and primitives from a wire protocol.
pub trait ProtocolReader {
    /// Returns the active configuration.
    fn config(&self) -> &ProtocolConfig;

    /// Enters one level of struct or container nesting.
    ///
    /// Fails with a depth-limit error once the configured maximum is reached.
    fn descend(&mut self) -> Result<()>;

    /// Leaves one level of nesting.
    fn ascend(&mut self);

    /// Reads a message envelope header.
    fn read_message_begin(&mut self) -> Result<MessageHeader>;

    /// Closes a message envelope.
    fn read_message_end(&mut self) -> Result<()>;

    /// Opens a struct.
    fn read_struct_begin(&mut self) -> Result<()>;

    /// Closes a struct.
    fn read_struct_end(&mut self) -> Result<()>;

    /// Reads a field header, or the STOP marker.
    fn read_field_begin(&mut self) -> Result<FieldHeader>;

    /// Closes a field.
    fn read_field_end(&mut self) -> Result<()>;

    /// Reads a list header.
    fn read_list_begin(&mut self) -> Result<ListHeader>;

    /// Closes a list.
    fn read_list_end(&mut self) -> Result<()>;

    /// Reads a set header.
    fn read_set_begin(&mut self) -> Result<ListHeader>;

    /// Closes a set.
    fn read_set_end(&mut self) -> Result<()>;

    /// Reads a map header.
    fn read_map_begin(&mut self) -> Result<MapHeader>;

    /// Closes a map.
    fn read_map_end(&mut self) -> Result<()>;

    /// Reads a boolean.
    fn read_bool(&mut self) -> Result<bool>;

    /// Reads a signed byte.
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a 16-bit integer.
    fn read_i16(&mut self) -> Result<i16>;

    /// Reads a 32-bit integer.
    fn read_i32(&mut self) -> Result<i32>;

    /// Reads a 64-bit integer.
    fn read_i64(&mut self) -> Result<i64>;

    /// Reads a double.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads a UTF-8 string.
    fn read_string(&mut self) -> Result<String>;

    /// Reads opaque binary data.
    fn read_binary(&mut self) -> Result<Vec<u8>>;

    /// Consumes and discards one value of the given wire type.
    fn skip(&mut self, wire_type: WireType) -> Result<()> {
        skip_value(self, wire_type)
    }
}

/// Runs `f` one nesting level deeper, restoring the depth afterwards.
pub fn nested<P, T, F>(protocol: &mut P, f: F) -> Result<T>
where
    P: ProtocolReader + ?Sized,
    F: FnOnce(&mut P) -> Result<T>,
{
    protocol.descend()?;
    let result = f(protocol);
    protocol.ascend();
    result
}

/// Consumes and discards one value of the given wire type, recursing into
/// structs and containers.
pub fn skip_value<P: ProtocolReader + ?Sized>(protocol: &mut P, wire_type: WireType) -> Result<()> {
    match wire_type {
        WireType::Bool => protocol.read_bool().map(drop),
        WireType::Byte => protocol.read_byte().map(drop),
        WireType::I16 => protocol.read_i16().map(drop),
        WireType::I32 => protocol.read_i32().map(drop),
        WireType::I64 => protocol.read_i64().map(drop),
        WireType::Double => protocol.read_double().map(drop),
        WireType::String => protocol.read_binary().map(drop),
        WireType::Struct => nested(protocol, |p| {
            p.read_struct_begin()?;
            loop {
                let header = p.read_field_begin()?;
                if header.is_stop() {
                    break;
                }
                skip_value(p, header.wire_type)?;
                p.read_field_end()?;
            }
            p.read_struct_end()
        }),
        WireType::List => nested(protocol, |p| {
            let header = p.read_list_begin()?;
            for _ in 0..header.size {
                skip_value(p, header.element_type)?;
            }
            p.read_list_end()
        }),
        WireType::Set => nested(protocol, |p| {
            let header = p.read_set_begin()?;
            for _ in 0..header.size {
                skip_value(p, header.element_type)?;
            }
            p.read_set_end()
        }),
        WireType::Map => nested(protocol, |p| {
            let header = p.read_map_begin()?;
            for _ in 0..header.size {
                skip_value(p, header.key_type)?;
                skip_value(p, header.value_type)?;
            }
            p.read_map_end()
        }),
        WireType::Stop | WireType::Void => Err(WireError::protocol(
            ProtocolErrorKind::InvalidData,
            format!("cannot skip a value of type {}", wire_type),
        )),
    }
}
