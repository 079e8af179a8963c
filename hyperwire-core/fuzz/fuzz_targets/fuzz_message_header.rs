#![no_main]

use hyperwire_core::{BinaryReader, ProtocolConfig, ProtocolReader, SliceInput};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BinaryReader::new(SliceInput::new(data));
    let _ = reader.read_message_begin();

    if let Ok(config) = ProtocolConfig::builder().strict_read(true).build() {
        let mut strict = BinaryReader::with_config(SliceInput::new(data), config);
        let _ = strict.read_message_begin();
    }
});
