//! Encoding over blocking `Read`/`Write` transports.

use std::io::Cursor;
use std::sync::Arc;

use hyperwire_core::protocol::ListHeader;
use hyperwire_core::{
    decode_record, encode_record, BinaryReader, BinaryWriter, FieldDescriptor, MessageHeader,
    MessageType, ProtocolConfig, ProtocolErrorKind, ProtocolReader, ProtocolWriter, Record,
    StreamInput, StreamOutput, StructDescriptor, TypeDescriptor, Value, WireType,
};

fn descriptor() -> Arc<StructDescriptor> {
    Arc::new(
        StructDescriptor::builder("Result")
            .field(FieldDescriptor::new(1, "results", TypeDescriptor::list(TypeDescriptor::String)))
            .field(FieldDescriptor::new(3, "scanner", TypeDescriptor::I64))
            .build()
            .unwrap(),
    )
}

fn sample() -> Record {
    Record::from_fields(
        &descriptor(),
        [
            ("results", Value::string_list(["ok", "2 rows"])),
            ("scanner", Value::I64(-3)),
        ],
    )
    .unwrap()
}

fn write_reply(config: ProtocolConfig) -> Vec<u8> {
    let mut writer = BinaryWriter::with_config(StreamOutput::new(Vec::new()), config);
    writer
        .write_message_begin(&MessageHeader::new("hql_query", MessageType::Reply, 17))
        .unwrap();
    encode_record(&mut writer, &sample()).unwrap();
    writer.write_message_end().unwrap();
    writer.into_inner().into_inner()
}

#[test]
fn strict_reply_over_stream() {
    let bytes = write_reply(ProtocolConfig::default());
    assert_eq!(&bytes[..4], &[0x80, 0x01, 0x00, 0x02]);

    let config = ProtocolConfig::builder().strict_read(true).build().unwrap();
    let mut reader = BinaryReader::with_config(StreamInput::new(Cursor::new(bytes)), config);
    let header = reader.read_message_begin().unwrap();
    assert_eq!(header, MessageHeader::new("hql_query", MessageType::Reply, 17));
    assert_eq!(decode_record(&mut reader, &descriptor()).unwrap(), sample());
    reader.read_message_end().unwrap();
}

#[test]
fn non_strict_reply_over_stream() {
    let config = ProtocolConfig::builder().strict_write(false).build().unwrap();
    let bytes = write_reply(config);
    assert_eq!(&bytes[..4], &[0, 0, 0, 9]);

    let mut reader = BinaryReader::new(StreamInput::new(Cursor::new(bytes)));
    let header = reader.read_message_begin().unwrap();
    assert_eq!(header.seqid, 17);
    assert_eq!(decode_record(&mut reader, &descriptor()).unwrap(), sample());
}

#[test]
fn stream_eof_is_protocol_error() {
    let bytes = write_reply(ProtocolConfig::default());
    let truncated = bytes[..bytes.len() - 4].to_vec();
    let mut reader = BinaryReader::new(StreamInput::new(Cursor::new(truncated)));
    reader.read_message_begin().unwrap();
    let err = decode_record(&mut reader, &descriptor()).unwrap_err();
    assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::UnexpectedEof));
}

#[test]
fn stream_container_limit_applies_without_length_hint() {
    let mut writer = BinaryWriter::new(StreamOutput::new(Vec::new()));
    writer
        .write_field_begin("results", WireType::List, 1)
        .unwrap();
    writer
        .write_list_begin(ListHeader::new(WireType::String, 5))
        .unwrap();
    let bytes = writer.into_inner().into_inner();

    let config = ProtocolConfig::builder().container_limit(4).build().unwrap();
    let mut reader = BinaryReader::with_config(StreamInput::new(Cursor::new(bytes)), config);
    let err = decode_record(&mut reader, &descriptor()).unwrap_err();
    assert_eq!(err.protocol_kind(), Some(ProtocolErrorKind::SizeLimit));
}
