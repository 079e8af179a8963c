//! Wire-level tests for the HQL result records.

use hyperwire_core::{
    BinaryReader, BinaryWriter, BufferOutput, MessageHeader, MessageType, ProtocolReader,
    ProtocolWriter, Record, RecordEngine, RecordType, SliceInput, Value,
};
use hyperwire_hql::{schema, Cell, HqlResult, HqlResult2, HqlResultAsArrays, Key, KeyFlag};
use proptest::prelude::*;

fn scenario() -> HqlResult {
    HqlResult {
        results: Some(vec!["a".to_string(), "b".to_string()]),
        cells: Some(Vec::new()),
        scanner: Some(42),
        mutator: None,
    }
}

#[test]
fn scenario_round_trips_with_mutator_absent() {
    let bytes = scenario().to_bytes().unwrap();
    let expected: Vec<u8> = vec![
        0x0f, 0x00, 0x01, 0x0b, 0, 0, 0, 2, // results: list<string>[2]
        0, 0, 0, 1, b'a', 0, 0, 0, 1, b'b', //
        0x0f, 0x00, 0x02, 0x0c, 0, 0, 0, 0, // cells: list<struct>[0]
        0x0a, 0x00, 0x03, 0, 0, 0, 0, 0, 0, 0, 42, // scanner
        0x00,
    ];
    assert_eq!(bytes, expected);

    let decoded = HqlResult::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, scenario());
    assert_eq!(decoded.mutator, None);
}

#[test]
fn generic_and_typed_views_agree() {
    let schema = schema().unwrap();
    let record = Record::from_fields(
        &schema.hql_result,
        [
            ("results", Value::string_list(["a", "b"])),
            ("cells", Value::List(Vec::new())),
            ("scanner", Value::I64(42)),
        ],
    )
    .unwrap();
    let engine = RecordEngine::new();
    assert_eq!(engine.encode(&record).unwrap(), scenario().to_bytes().unwrap());
    assert_eq!(HqlResult::from_record(&record).unwrap(), scenario());
}

#[test]
fn cells_with_keys_round_trip() {
    let result = HqlResult {
        cells: Some(vec![
            Cell {
                key: Some(Key {
                    row: Some("user:1".to_string()),
                    column_family: Some("info".to_string()),
                    column_qualifier: Some("name".to_string()),
                    timestamp: Some(1_400_000_000_000_000_000),
                    revision: Some(1_400_000_000_000_000_001),
                    flag: KeyFlag::Insert,
                }),
                value: Some(b"Ada".to_vec()),
            },
            Cell {
                key: Some(Key {
                    row: Some("user:2".to_string()),
                    flag: KeyFlag::DeleteRow,
                    ..Key::default()
                }),
                value: None,
            },
        ]),
        ..HqlResult::default()
    };
    let decoded = HqlResult::from_bytes(&result.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, result);
}

#[test]
fn unassigned_key_flag_survives_round_trip() {
    let result = HqlResult {
        cells: Some(vec![Cell {
            key: Some(Key {
                row: Some("r".to_string()),
                flag: KeyFlag::Other(7),
                ..Key::default()
            }),
            value: None,
        }]),
        ..HqlResult::default()
    };
    let bytes = result.to_bytes().unwrap();
    // flag field of the nested key: i32 id 6 carrying 7
    assert!(bytes.windows(7).any(|w| w == [0x08, 0x00, 0x06, 0, 0, 0, 7]));

    let decoded = HqlResult::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, result);
    assert_eq!(decoded.to_bytes().unwrap(), bytes);
}

#[test]
fn array_forms_share_bytes() {
    let two = HqlResult2 {
        results: Some(vec!["ok".to_string()]),
        cells: Some(vec![
            vec!["r1".to_string(), "cf".to_string(), "q".to_string(), "v".to_string()],
            vec![],
        ]),
        scanner: None,
        mutator: Some(7),
    };
    let arrays: HqlResultAsArrays = two.clone().into();
    let bytes = two.to_bytes().unwrap();
    assert_eq!(bytes, arrays.to_bytes().unwrap());
    assert_eq!(HqlResult2::from_bytes(&bytes).unwrap(), two);
    assert_eq!(HqlResultAsArrays::from_bytes(&bytes).unwrap(), arrays);
}

#[test]
fn array_cells_are_skipped_by_struct_reader() {
    let two = HqlResult2 {
        results: Some(vec!["ok".to_string()]),
        cells: Some(vec![vec!["r".to_string()]]),
        scanner: Some(1),
        ..HqlResult2::default()
    };
    let decoded = HqlResult::from_bytes(&two.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.cells, None);
    assert_eq!(decoded.results, two.results);
    assert_eq!(decoded.scanner, Some(1));
}

#[test]
fn newer_writer_fields_are_skipped() {
    let mut bytes = scenario().to_bytes().unwrap();
    bytes.pop();
    bytes.extend_from_slice(&[0x0b, 0x00, 0x05, 0, 0, 0, 3, b'n', b'e', b'w']);
    bytes.extend_from_slice(&[0x02, 0x00, 0x06, 0x01]);
    bytes.push(0x00);
    assert_eq!(HqlResult::from_bytes(&bytes).unwrap(), scenario());
}

#[test]
fn truncated_after_first_header_fails() {
    let bytes = scenario().to_bytes().unwrap();
    for cut in 3..bytes.len() {
        assert!(HqlResult::from_bytes(&bytes[..cut]).is_err(), "cut at {}", cut);
    }
}

#[test]
fn reply_envelope() {
    let mut writer = BinaryWriter::new(BufferOutput::new());
    writer
        .write_message_begin(&MessageHeader::new("hql_query2", MessageType::Reply, 5))
        .unwrap();
    HqlResult2::default().write(&mut writer).unwrap();
    writer.write_message_end().unwrap();
    let bytes = writer.into_inner().into_bytes();

    let mut reader = BinaryReader::new(SliceInput::new(&bytes));
    let header = reader.read_message_begin().unwrap();
    assert_eq!(header.name, "hql_query2");
    assert_eq!(HqlResult2::read(&mut reader).unwrap(), HqlResult2::default());
    reader.read_message_end().unwrap();
}

fn arb_result() -> impl Strategy<Value = HqlResult2> {
    (
        prop::option::of(prop::collection::vec("[a-z0-9 ]{0,8}", 0..5)),
        prop::option::of(prop::collection::vec(
            prop::collection::vec("[a-z0-9:]{0,8}", 0..5),
            0..5,
        )),
        prop::option::of(any::<i64>()),
        prop::option::of(any::<i64>()),
    )
        .prop_map(|(results, cells, scanner, mutator)| HqlResult2 {
            results,
            cells,
            scanner,
            mutator,
        })
}

proptest! {
    #[test]
    fn hql_result2_round_trips(result in arb_result()) {
        let bytes = result.to_bytes().unwrap();
        prop_assert_eq!(HqlResult2::from_bytes(&bytes).unwrap(), result);
    }
}
