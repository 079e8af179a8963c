#![no_main]

use hyperwire_core::{BinaryReader, ProtocolReader, SliceInput, WireType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&tag, rest)) = data.split_first() else {
        return;
    };
    let Ok(wire_type) = WireType::from_tag(tag) else {
        return;
    };
    let mut reader = BinaryReader::new(SliceInput::new(rest));
    let _ = reader.skip(wire_type);
    assert_eq!(reader.depth(), 0);
});
