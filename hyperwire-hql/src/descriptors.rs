//! Struct descriptors for the HQL result schema.

use std::sync::Arc;

use hyperwire_core::{
    DescriptorRegistry, FieldDescriptor, Result, StructDescriptor, TypeDescriptor, WireError,
};
use once_cell::sync::Lazy;

/// Registry name of the key struct.
pub const KEY: &str = "Key";
/// Registry name of the cell struct.
pub const CELL: &str = "Cell";
/// Registry name of the struct-cell result.
pub const HQL_RESULT: &str = "HqlResult";
/// Registry name of the string-array result.
pub const HQL_RESULT2: &str = "HqlResult2";
/// Registry name of the second string-array result.
pub const HQL_RESULT_AS_ARRAYS: &str = "HqlResultAsArrays";

/// Wire value of `KeyFlag::Insert`, the default flag of a key.
pub(crate) const FLAG_INSERT: i32 = 255;

/// The shared descriptors of every HQL result type.
#[derive(Debug)]
pub struct HqlSchema {
    /// `Key`.
    pub key: Arc<StructDescriptor>,
    /// `Cell`.
    pub cell: Arc<StructDescriptor>,
    /// `HqlResult`.
    pub hql_result: Arc<StructDescriptor>,
    /// `HqlResult2`.
    pub hql_result2: Arc<StructDescriptor>,
    /// `HqlResultAsArrays`.
    pub hql_result_as_arrays: Arc<StructDescriptor>,
    registry: DescriptorRegistry,
}

/// Field layout shared by `HqlResult2` and `HqlResultAsArrays`.
fn array_result(name: &str) -> Result<StructDescriptor> {
    StructDescriptor::builder(name)
        .field(
            FieldDescriptor::new(1, "results", TypeDescriptor::list(TypeDescriptor::String))
                .optional(),
        )
        .field(
            FieldDescriptor::new(
                2,
                "cells",
                TypeDescriptor::list(TypeDescriptor::list(TypeDescriptor::String)),
            )
            .optional(),
        )
        .field(FieldDescriptor::new(3, "scanner", TypeDescriptor::I64).optional())
        .field(FieldDescriptor::new(4, "mutator", TypeDescriptor::I64).optional())
        .build()
}

impl HqlSchema {
    fn build() -> Result<Self> {
        let mut registry = DescriptorRegistry::new();

        let key = registry.register(
            StructDescriptor::builder(KEY)
                .field(FieldDescriptor::new(1, "row", TypeDescriptor::String))
                .field(FieldDescriptor::new(2, "column_family", TypeDescriptor::String))
                .field(FieldDescriptor::new(3, "column_qualifier", TypeDescriptor::String))
                .field(FieldDescriptor::new(4, "timestamp", TypeDescriptor::I64).optional())
                .field(FieldDescriptor::new(5, "revision", TypeDescriptor::I64).optional())
                .field(FieldDescriptor::new(6, "flag", TypeDescriptor::I32).with_default(FLAG_INSERT))
                .build()?,
        )?;

        let cell = registry.register(
            StructDescriptor::builder(CELL)
                .field(FieldDescriptor::new(1, "key", TypeDescriptor::structure(&key)))
                .field(FieldDescriptor::new(2, "value", TypeDescriptor::Binary).optional())
                .build()?,
        )?;

        let hql_result = registry.register(
            StructDescriptor::builder(HQL_RESULT)
                .field(
                    FieldDescriptor::new(1, "results", TypeDescriptor::list(TypeDescriptor::String))
                        .optional(),
                )
                .field(
                    FieldDescriptor::new(
                        2,
                        "cells",
                        TypeDescriptor::list(TypeDescriptor::structure(&cell)),
                    )
                    .optional(),
                )
                .field(FieldDescriptor::new(3, "scanner", TypeDescriptor::I64).optional())
                .field(FieldDescriptor::new(4, "mutator", TypeDescriptor::I64).optional())
                .build()?,
        )?;

        let hql_result2 = registry.register(array_result(HQL_RESULT2)?)?;
        let hql_result_as_arrays = registry.register(array_result(HQL_RESULT_AS_ARRAYS)?)?;

        tracing::debug!(types = registry.len(), "built HQL schema");

        Ok(Self {
            key,
            cell,
            hql_result,
            hql_result2,
            hql_result_as_arrays,
            registry,
        })
    }

    /// Returns the registry holding every HQL descriptor by name.
    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }
}

static SCHEMA: Lazy<Result<HqlSchema>> = Lazy::new(HqlSchema::build);

/// Returns the HQL schema, building it on first use.
pub fn schema() -> Result<&'static HqlSchema> {
    Lazy::force(&SCHEMA)
        .as_ref()
        .map_err(|e| WireError::Schema(format!("HQL schema is invalid: {}", e)))
}

/// Returns the registry of HQL descriptors.
pub fn registry() -> Result<&'static DescriptorRegistry> {
    schema().map(HqlSchema::registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperwire_core::{Record, Requiredness, Value, WireType};

    #[test]
    fn test_registry_contents() {
        let registry = registry().unwrap();
        assert_eq!(
            registry.names(),
            vec![CELL, HQL_RESULT, HQL_RESULT2, HQL_RESULT_AS_ARRAYS, KEY]
        );
        let schema = schema().unwrap();
        assert!(Arc::ptr_eq(&schema.cell, &registry.get(CELL).unwrap()));
    }

    #[test]
    fn test_result_layout() {
        let d = &schema().unwrap().hql_result;
        let expected = [
            (1, "results", WireType::List),
            (2, "cells", WireType::List),
            (3, "scanner", WireType::I64),
            (4, "mutator", WireType::I64),
        ];
        for (id, name, wire_type) in expected {
            let (_, field) = d.field_by_id(id).unwrap();
            assert_eq!(field.name(), name);
            assert_eq!(field.wire_type(), wire_type);
            assert_eq!(field.requiredness(), Requiredness::Optional);
        }
    }

    #[test]
    fn test_array_forms_differ_only_by_name() {
        let schema = schema().unwrap();
        assert_eq!(
            schema.hql_result2.fields(),
            schema.hql_result_as_arrays.fields()
        );
        assert_ne!(schema.hql_result2, schema.hql_result_as_arrays);
        assert_ne!(schema.hql_result.fields()[1], schema.hql_result2.fields()[1]);
    }

    #[test]
    fn test_key_flag_default() {
        let key = Record::new(&schema().unwrap().key);
        assert_eq!(key.get("flag").unwrap(), Some(&Value::I32(FLAG_INSERT)));
    }
}
