#![no_main]

use std::sync::Arc;

use hyperwire_core::{FieldDescriptor, RecordEngine, StructDescriptor, TypeDescriptor};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static DESCRIPTOR: Lazy<Option<Arc<StructDescriptor>>> = Lazy::new(|| {
    let inner = StructDescriptor::builder("Inner")
        .field(FieldDescriptor::new(1, "name", TypeDescriptor::String))
        .field(FieldDescriptor::new(2, "blob", TypeDescriptor::Binary))
        .build()
        .ok()
        .map(Arc::new)?;
    StructDescriptor::builder("Outer")
        .field(FieldDescriptor::new(1, "results", TypeDescriptor::list(TypeDescriptor::String)))
        .field(FieldDescriptor::new(2, "inner", TypeDescriptor::list(TypeDescriptor::structure(&inner))))
        .field(FieldDescriptor::new(
            3,
            "attrs",
            TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::set(TypeDescriptor::I64)),
        ))
        .field(FieldDescriptor::new(4, "scanner", TypeDescriptor::I64))
        .build()
        .ok()
        .map(Arc::new)
});

fuzz_target!(|data: &[u8]| {
    let Some(descriptor) = DESCRIPTOR.as_ref() else {
        return;
    };
    let engine = RecordEngine::new();
    if let Ok(record) = engine.decode(data, descriptor) {
        let _ = record.to_string();
        let bytes = engine.encode(&record).expect("decoded record re-encodes");
        let again = engine.decode(&bytes, descriptor).expect("re-encoded bytes decode");
        assert_eq!(record, again);
    }
});
