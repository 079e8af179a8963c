//! Binary protocol reader and writer.
//!
//! Layout:
//! - field header: `[type:1][id:2]`, STOP is the single byte `0x00`
//! - string/binary: `[len:4][bytes]`
//! - list/set: `[element type:1][count:4]` followed by the elements
//! - map: `[key type:1][value type:1][count:4]` followed by the pairs
//! - integers and doubles: fixed width, big-endian
//!
//! Struct boundaries are implicit; only field headers and STOP are written.

use super::config::ProtocolConfig;
use super::constants::*;
use super::headers::{FieldHeader, ListHeader, MapHeader, MessageHeader};
use super::traits::{ProtocolReader, ProtocolWriter};
use crate::error::{ProtocolErrorKind, Result, WireError};
use crate::serialization::{DataInput, DataOutput};

/// Upper bound on up-front allocation when the input length is unknown.
const MAX_PREALLOCATION: usize = 4096;

/// Writes values in the binary protocol to a `DataOutput`.
#[derive(Debug)]
pub struct BinaryWriter<O> {
    output: O,
    config: ProtocolConfig,
}

impl<O: DataOutput> BinaryWriter<O> {
    /// Creates a writer with the default configuration.
    pub fn new(output: O) -> Self {
        Self::with_config(output, ProtocolConfig::default())
    }

    /// Creates a writer with the given configuration.
    pub fn with_config(output: O, config: ProtocolConfig) -> Self {
        Self { output, config }
    }

    /// Returns a reference to the underlying output.
    pub fn get_ref(&self) -> &O {
        &self.output
    }

    /// Consumes the writer and returns the underlying output.
    pub fn into_inner(self) -> O {
        self.output
    }

    /// Writes a length or count prefix, rejecting anything a reader with the
    /// same configuration would refuse.
    fn write_size(&mut self, size: usize, limit: usize, what: &str) -> Result<()> {
        if size > limit {
            return Err(WireError::protocol(
                ProtocolErrorKind::SizeLimit,
                format!("{} length {} exceeds limit {}", what, size, limit),
            ));
        }
        let size = i32::try_from(size).map_err(|_| {
            WireError::protocol(
                ProtocolErrorKind::SizeLimit,
                format!("{} size {} does not fit in a 32-bit length", what, size),
            )
        })?;
        self.output.write_i32(size)
    }

    fn write_tag(&mut self, wire_type: WireType) -> Result<()> {
        self.output.write_byte(wire_type.tag() as i8)
    }
}

impl<O: DataOutput> ProtocolWriter for BinaryWriter<O> {
    fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    fn write_message_begin(&mut self, header: &MessageHeader) -> Result<()> {
        if self.config.strict_write() {
            let version = VERSION_1 | header.message_type.as_byte() as u32;
            self.output.write_i32(version as i32)?;
            self.write_string(&header.name)?;
        } else {
            self.write_string(&header.name)?;
            self.output.write_byte(header.message_type.as_byte() as i8)?;
        }
        self.output.write_i32(header.seqid)
    }

    fn write_message_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_struct_begin(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_field_begin(&mut self, _name: &str, wire_type: WireType, id: i16) -> Result<()> {
        if wire_type == WireType::Stop {
            return Ok(());
        }
        self.write_tag(wire_type)?;
        self.output.write_i16(id)
    }

    fn write_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_field_stop(&mut self) -> Result<()> {
        self.write_tag(WireType::Stop)
    }

    fn write_list_begin(&mut self, header: ListHeader) -> Result<()> {
        self.write_tag(header.element_type)?;
        self.write_size(header.size, self.config.container_limit(), "list")
    }

    fn write_list_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_set_begin(&mut self, header: ListHeader) -> Result<()> {
        self.write_tag(header.element_type)?;
        self.write_size(header.size, self.config.container_limit(), "set")
    }

    fn write_set_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_map_begin(&mut self, header: MapHeader) -> Result<()> {
        self.write_tag(header.key_type)?;
        self.write_tag(header.value_type)?;
        self.write_size(header.size, self.config.container_limit(), "map")
    }

    fn write_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.output.write_byte(if v { 1 } else { 0 })
    }

    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.output.write_byte(v)
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.output.write_i16(v)
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.output.write_i32(v)
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.output.write_i64(v)
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.output.write_double(v)
    }

    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_binary(v.as_bytes())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<()> {
        self.write_size(v.len(), self.config.string_limit(), "string")?;
        self.output.write_bytes(v)
    }
}

/// Reads values in the binary protocol from a `DataInput`.
#[derive(Debug)]
pub struct BinaryReader<I> {
    input: I,
    config: ProtocolConfig,
    depth: usize,
}

impl<I: DataInput> BinaryReader<I> {
    /// Creates a reader with the default configuration.
    pub fn new(input: I) -> Self {
        Self::with_config(input, ProtocolConfig::default())
    }

    /// Creates a reader with the given configuration.
    pub fn with_config(input: I, config: ProtocolConfig) -> Self {
        Self {
            input,
            config,
            depth: 0,
        }
    }

    /// Returns a reference to the underlying input.
    pub fn get_ref(&self) -> &I {
        &self.input
    }

    /// Consumes the reader and returns the underlying input.
    pub fn into_inner(self) -> I {
        self.input
    }

    /// Returns the current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn read_tag(&mut self) -> Result<WireType> {
        let tag = self.input.read_byte()? as u8;
        WireType::from_tag(tag)
    }

    /// Validates a length prefix against the configured limit and, when the
    /// input knows it, the number of bytes left.
    fn check_length(&self, len: i32, limit: usize, min_bytes_each: usize, what: &str) -> Result<usize> {
        if len < 0 {
            return Err(WireError::protocol(
                ProtocolErrorKind::NegativeSize,
                format!("negative {} length: {}", what, len),
            ));
        }
        let len = len as usize;
        if len > limit {
            return Err(WireError::protocol(
                ProtocolErrorKind::SizeLimit,
                format!("{} length {} exceeds limit {}", what, len, limit),
            ));
        }
        if let Some(remaining) = self.input.remaining() {
            let needed = len.saturating_mul(min_bytes_each);
            if needed > remaining {
                return Err(WireError::protocol(
                    ProtocolErrorKind::UnexpectedEof,
                    format!(
                        "{} length {} needs at least {} bytes, only {} remain",
                        what, len, needed, remaining
                    ),
                ));
            }
        }
        Ok(len)
    }

    fn read_container_size(&mut self, element_types: &[WireType], what: &str) -> Result<usize> {
        let raw = self.input.read_i32()?;
        let min_bytes_each = element_types.iter().map(|t| min_encoded_size(*t)).sum();
        self.check_length(raw, self.config.container_limit(), min_bytes_each, what)
    }

    fn read_list_header(&mut self, what: &str) -> Result<ListHeader> {
        let element_type = self.read_tag()?;
        let size = self.read_container_size(&[element_type], what)?;
        Ok(ListHeader::new(element_type, size))
    }

    fn read_string_body(&mut self, len: i32) -> Result<String> {
        let len = self.check_length(len, self.config.string_limit(), 1, "string")?;
        let bytes = self.input.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| {
            WireError::protocol(
                ProtocolErrorKind::InvalidData,
                format!("invalid UTF-8 string: {}", e),
            )
        })
    }
}

/// Smallest number of bytes a value of the given type occupies.
fn min_encoded_size(wire_type: WireType) -> usize {
    match wire_type {
        WireType::String => 4,
        WireType::Struct => 1,
        WireType::List | WireType::Set => LIST_HEADER_SIZE,
        WireType::Map => MAP_HEADER_SIZE,
        WireType::Stop | WireType::Void => 0,
        other => other.fixed_size().unwrap_or(1),
    }
}

/// Caps the initial capacity of a decoded container.
pub(crate) fn initial_capacity(size: usize) -> usize {
    size.min(MAX_PREALLOCATION)
}

impl<I: DataInput> ProtocolReader for BinaryReader<I> {
    fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth() {
            return Err(WireError::protocol(
                ProtocolErrorKind::DepthLimit,
                format!("nesting exceeds maximum depth {}", self.config.max_depth()),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn read_message_begin(&mut self) -> Result<MessageHeader> {
        let first = self.input.read_i32()?;
        if first < 0 {
            let word = first as u32;
            let version = word & VERSION_MASK;
            if version != VERSION_1 {
                return Err(WireError::protocol(
                    ProtocolErrorKind::BadVersion,
                    format!("bad version in message header: {:#010x}", version),
                ));
            }
            let message_type = MessageType::from_byte((word & MESSAGE_TYPE_MASK) as u8)?;
            let name = self.read_string()?;
            let seqid = self.input.read_i32()?;
            Ok(MessageHeader::new(name, message_type, seqid))
        } else {
            if self.config.strict_read() {
                return Err(WireError::protocol(
                    ProtocolErrorKind::BadVersion,
                    "missing version in message header, old client?",
                ));
            }
            let name = self.read_string_body(first)?;
            let message_type = MessageType::from_byte(self.input.read_byte()? as u8)?;
            let seqid = self.input.read_i32()?;
            Ok(MessageHeader::new(name, message_type, seqid))
        }
    }

    fn read_message_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<FieldHeader> {
        let wire_type = self.read_tag()?;
        if wire_type == WireType::Stop {
            return Ok(FieldHeader::stop());
        }
        let id = self.input.read_i16()?;
        Ok(FieldHeader::new(wire_type, id))
    }

    fn read_field_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_list_begin(&mut self) -> Result<ListHeader> {
        self.read_list_header("list")
    }

    fn read_list_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<ListHeader> {
        self.read_list_header("set")
    }

    fn read_set_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<MapHeader> {
        let key_type = self.read_tag()?;
        let value_type = self.read_tag()?;
        let size = self.read_container_size(&[key_type, value_type], "map")?;
        Ok(MapHeader::new(key_type, value_type, size))
    }

    fn read_map_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.input.read_byte()? != 0)
    }

    fn read_byte(&mut self) -> Result<i8> {
        self.input.read_byte()
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.input.read_i16()
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.input.read_i32()
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.input.read_i64()
    }

    fn read_double(&mut self) -> Result<f64> {
        self.input.read_double()
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.input.read_i32()?;
        self.read_string_body(len)
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.input.read_i32()?;
        let len = self.check_length(len, self.config.string_limit(), 1, "binary")?;
        self.input.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{BufferOutput, SliceInput};

    fn writer() -> BinaryWriter<BufferOutput> {
        BinaryWriter::new(BufferOutput::new())
    }

    fn reader(data: &[u8]) -> BinaryReader<SliceInput<'_>> {
        BinaryReader::new(SliceInput::new(data))
    }

    #[test]
    fn test_struct_begin_end_emit_nothing() {
        let mut w = writer();
        w.write_struct_begin("HqlResult").unwrap();
        w.write_struct_end().unwrap();
        w.write_field_end().unwrap();
        w.write_list_end().unwrap();
        w.write_map_end().unwrap();
        assert!(w.get_ref().is_empty());
    }

    #[test]
    fn test_field_header_layout() {
        let mut w = writer();
        w.write_field_begin("scanner", WireType::I64, 3).unwrap();
        w.write_i64(42).unwrap();
        w.write_field_stop().unwrap();
        assert_eq!(
            w.get_ref().as_bytes(),
            &[0x0A, 0x00, 0x03, 0, 0, 0, 0, 0, 0, 0, 42, 0x00]
        );
    }

    #[test]
    fn test_field_begin_stop_emits_nothing() {
        let mut w = writer();
        w.write_field_begin("", WireType::Stop, 0).unwrap();
        assert!(w.get_ref().is_empty());
    }

    #[test]
    fn test_negative_field_id_round_trips() {
        let mut w = writer();
        w.write_field_begin("legacy", WireType::Bool, -1).unwrap();
        let bytes = w.into_inner().into_bytes();
        assert_eq!(bytes, vec![0x02, 0xFF, 0xFF]);

        let mut r = reader(&bytes);
        assert_eq!(r.read_field_begin().unwrap(), FieldHeader::new(WireType::Bool, -1));
    }

    #[test]
    fn test_string_layout() {
        let mut w = writer();
        w.write_string("ab").unwrap();
        assert_eq!(w.get_ref().as_bytes(), &[0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn test_list_and_map_header_layout() {
        let mut w = writer();
        w.write_list_begin(ListHeader::new(WireType::String, 2)).unwrap();
        w.write_map_begin(MapHeader::new(WireType::I32, WireType::Double, 1))
            .unwrap();
        assert_eq!(
            w.get_ref().as_bytes(),
            &[0x0B, 0, 0, 0, 2, 0x08, 0x04, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_primitives_round_trip() {
        let mut w = writer();
        w.write_bool(true).unwrap();
        w.write_byte(-7).unwrap();
        w.write_i16(-300).unwrap();
        w.write_i32(70_000).unwrap();
        w.write_i64(-5_000_000_000).unwrap();
        w.write_double(2.5).unwrap();
        w.write_string("héllo").unwrap();
        w.write_binary(&[0, 255]).unwrap();
        let bytes = w.into_inner().into_bytes();

        let mut r = reader(&bytes);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_byte().unwrap(), -7);
        assert_eq!(r.read_i16().unwrap(), -300);
        assert_eq!(r.read_i32().unwrap(), 70_000);
        assert_eq!(r.read_i64().unwrap(), -5_000_000_000);
        assert_eq!(r.read_double().unwrap(), 2.5);
        assert_eq!(r.read_string().unwrap(), "héllo");
        assert_eq!(r.read_binary().unwrap(), vec![0, 255]);
        assert_eq!(r.get_ref().remaining(), Some(0));
    }

    #[test]
    fn test_read_unknown_tag() {
        let data = [0x07, 0x00, 0x01];
        let err = reader(&data).read_field_begin().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::InvalidData));
    }

    #[test]
    fn test_read_stop_consumes_one_byte() {
        let data = [0x00, 0xAA];
        let mut r = reader(&data);
        assert!(r.read_field_begin().unwrap().is_stop());
        assert_eq!(r.get_ref().remaining(), Some(1));
    }

    #[test]
    fn test_negative_string_length() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let err = reader(&data).read_string().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::NegativeSize));
    }

    #[test]
    fn test_string_length_beyond_remaining() {
        let data = [0x00, 0x00, 0x00, 0x10, b'a'];
        let err = reader(&data).read_string().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_invalid_utf8_string() {
        let data = [0, 0, 0, 2, 0xFF, 0xFE];
        let err = reader(&data).read_string().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::InvalidData));
    }

    #[test]
    fn test_invalid_utf8_allowed_as_binary() {
        let data = [0, 0, 0, 2, 0xFF, 0xFE];
        assert_eq!(reader(&data).read_binary().unwrap(), vec![0xFF, 0xFE]);
    }

    #[test]
    fn test_string_limit() {
        let config = ProtocolConfig::builder().string_limit(3).build().unwrap();
        let data = [0, 0, 0, 4, b't', b'e', b's', b't'];
        let mut r = BinaryReader::with_config(SliceInput::new(&data), config);
        let err = r.read_string().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::SizeLimit));
    }

    #[test]
    fn test_container_limit() {
        let config = ProtocolConfig::builder().container_limit(1).build().unwrap();
        let data = [0x08, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2];
        let mut r = BinaryReader::with_config(SliceInput::new(&data), config);
        let err = r.read_list_begin().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::SizeLimit));
    }

    #[test]
    fn test_writer_enforces_string_limit() {
        let config = ProtocolConfig::builder().string_limit(3).build().unwrap();
        let mut w = BinaryWriter::with_config(BufferOutput::new(), config);
        w.write_string("abc").unwrap();
        let err = w.write_string("test").unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::SizeLimit));
        let err = w.write_binary(&[0; 4]).unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::SizeLimit));
        assert_eq!(w.get_ref().len(), 7);
    }

    #[test]
    fn test_writer_enforces_container_limit() {
        let config = ProtocolConfig::builder().container_limit(1).build().unwrap();
        let mut w = BinaryWriter::with_config(BufferOutput::new(), config);
        w.write_list_begin(ListHeader::new(WireType::I32, 1)).unwrap();
        for err in [
            w.write_list_begin(ListHeader::new(WireType::I32, 2)).unwrap_err(),
            w.write_set_begin(ListHeader::new(WireType::I32, 2)).unwrap_err(),
            w.write_map_begin(MapHeader::new(WireType::I32, WireType::I32, 2)).unwrap_err(),
        ] {
            assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::SizeLimit));
        }
    }

    #[test]
    fn test_list_count_beyond_remaining() {
        // 1000 i64 elements announced, 8 bytes present
        let data = [0x0A, 0, 0, 0x03, 0xE8, 0, 0, 0, 0, 0, 0, 0, 1];
        let err = reader(&data).read_list_begin().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_negative_map_size() {
        let data = [0x0B, 0x0B, 0xFF, 0xFF, 0xFF, 0xFE];
        let err = reader(&data).read_map_begin().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::NegativeSize));
    }

    #[test]
    fn test_skip_nested_struct() {
        let mut w = writer();
        // struct { 1: list<list<string>> [["x"]], 2: map<i32,bool> {1: true} }
        w.write_field_begin("cells", WireType::List, 1).unwrap();
        w.write_list_begin(ListHeader::new(WireType::List, 1)).unwrap();
        w.write_list_begin(ListHeader::new(WireType::String, 1)).unwrap();
        w.write_string("x").unwrap();
        w.write_field_begin("flags", WireType::Map, 2).unwrap();
        w.write_map_begin(MapHeader::new(WireType::I32, WireType::Bool, 1))
            .unwrap();
        w.write_i32(1).unwrap();
        w.write_bool(true).unwrap();
        w.write_field_stop().unwrap();
        w.write_i16(99).unwrap();
        let bytes = w.into_inner().into_bytes();

        let mut r = reader(&bytes);
        r.skip(WireType::Struct).unwrap();
        assert_eq!(r.depth(), 0);
        assert_eq!(r.read_i16().unwrap(), 99);
    }

    #[test]
    fn test_skip_stop_is_error() {
        let err = reader(&[]).skip(WireType::Stop).unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::InvalidData));
    }

    #[test]
    fn test_skip_depth_limit() {
        let config = ProtocolConfig::builder().max_depth(2).build().unwrap();
        // list<list<list<i32>>> with one element at each level
        let data = [
            0x0F, 0, 0, 0, 1, 0x0F, 0, 0, 0, 1, 0x08, 0, 0, 0, 1, 0, 0, 0, 5,
        ];
        let mut r = BinaryReader::with_config(SliceInput::new(&data), config);
        let err = r.skip(WireType::List).unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::DepthLimit));
    }

    #[test]
    fn test_strict_message_round_trip() {
        let header = MessageHeader::new("hql_query", MessageType::Call, 17);
        let mut w = writer();
        w.write_message_begin(&header).unwrap();
        let bytes = w.into_inner().into_bytes();
        assert_eq!(&bytes[..4], &[0x80, 0x01, 0x00, 0x01]);

        assert_eq!(reader(&bytes).read_message_begin().unwrap(), header);
    }

    #[test]
    fn test_non_strict_message_round_trip() {
        let config = ProtocolConfig::builder().strict_write(false).build().unwrap();
        let header = MessageHeader::new("hql_exec", MessageType::Reply, 3);
        let mut w = BinaryWriter::with_config(BufferOutput::new(), config);
        w.write_message_begin(&header).unwrap();
        let bytes = w.into_inner().into_bytes();
        assert_eq!(&bytes[..4], &[0, 0, 0, 8]);

        assert_eq!(reader(&bytes).read_message_begin().unwrap(), header);
    }

    #[test]
    fn test_strict_read_rejects_unversioned_message() {
        let config = ProtocolConfig::builder()
            .strict_write(false)
            .strict_read(true)
            .build()
            .unwrap();
        let mut w = BinaryWriter::with_config(BufferOutput::new(), config.clone());
        w.write_message_begin(&MessageHeader::new("m", MessageType::Call, 1))
            .unwrap();
        let bytes = w.into_inner().into_bytes();

        let mut r = BinaryReader::with_config(SliceInput::new(&bytes), config);
        let err = r.read_message_begin().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::BadVersion));
    }

    #[test]
    fn test_bad_message_version() {
        let data = [0x80, 0x02, 0x00, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = reader(&data).read_message_begin().unwrap_err();
        assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::BadVersion));
    }
}
