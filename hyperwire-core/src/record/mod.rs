//! Descriptor-driven records and the generic engine that encodes them.

mod application;
mod descriptor;
mod engine;
mod record_type;
mod registry;
mod value;

pub use application::{application_exception_descriptor, ApplicationErrorKind, ApplicationException};
pub use descriptor::{
    FieldDescriptor, Requiredness, StructDescriptor, StructDescriptorBuilder, TypeDescriptor,
    Validator,
};
pub use engine::{
    decode_record, encode_record, read_value, write_value, RecordCodec, RecordEngine,
    StandardCodec,
};
pub use record_type::RecordType;
pub use registry::DescriptorRegistry;
pub use value::Value;

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, WireError};

/// An instance of a schema-defined struct.
///
/// Holds one optional value slot per descriptor field. A `None` slot is an
/// absent field and is omitted on the wire.
#[derive(Clone)]
pub struct Record {
    descriptor: Arc<StructDescriptor>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Creates a record with every declared default applied.
    pub fn new(descriptor: &Arc<StructDescriptor>) -> Self {
        let values = descriptor
            .fields()
            .iter()
            .map(|f| f.default_value().cloned())
            .collect();
        Self {
            descriptor: Arc::clone(descriptor),
            values,
        }
    }

    /// Creates a record with every field absent, defaults included.
    pub fn empty(descriptor: &Arc<StructDescriptor>) -> Self {
        Self {
            descriptor: Arc::clone(descriptor),
            values: vec![None; descriptor.field_count()],
        }
    }

    /// Creates a record from `(name, value)` pairs on top of the declared defaults.
    pub fn from_fields<I, S>(descriptor: &Arc<StructDescriptor>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let mut record = Self::new(descriptor);
        for (name, value) in fields {
            record.set(name.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Returns the descriptor of this record.
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    /// Returns the struct name.
    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.descriptor.field_index(name).ok_or_else(|| {
            WireError::Schema(format!(
                "{} has no field named '{}'",
                self.descriptor.name(),
                name
            ))
        })
    }

    /// Returns the value of the named field, or `None` if it is absent.
    ///
    /// Returns an error if the descriptor has no such field.
    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        let index = self.index_of(name)?;
        Ok(self.values[index].as_ref())
    }

    /// Returns the value of the field with the given id, if known and present.
    pub fn get_by_id(&self, id: i16) -> Option<&Value> {
        self.descriptor
            .field_by_id(id)
            .and_then(|(index, _)| self.values[index].as_ref())
    }

    /// Sets the named field, rejecting values that do not match its type.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(name)?;
        let value = value.into();
        let field = &self.descriptor.fields()[index];
        if !field.ty().accepts(&value) {
            return Err(WireError::Schema(format!(
                "{}.{}: expected {}, got {}",
                self.descriptor.name(),
                name,
                field.ty(),
                value.kind_name()
            )));
        }
        self.values[index] = Some(value);
        Ok(())
    }

    /// Makes the named field absent.
    pub fn clear(&mut self, name: &str) -> Result<()> {
        let index = self.index_of(name)?;
        self.values[index] = None;
        Ok(())
    }

    /// Returns true if the named field is present.
    pub fn is_set(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Iterates over present fields in descriptor order.
    pub fn present_fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.descriptor
            .fields()
            .iter()
            .zip(self.values.iter())
            .filter_map(|(field, value)| value.as_ref().map(|v| (field, v)))
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Option<Value> {
        &mut self.values[index]
    }

    /// Checks required fields are present, then runs the descriptor's
    /// custom validator if one is installed.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.descriptor.fields().iter().zip(self.values.iter()) {
            if field.requiredness() == Requiredness::Required && value.is_none() {
                return Err(WireError::Schema(format!(
                    "required field '{}' is unset in {}",
                    field.name(),
                    self.descriptor.name()
                )));
            }
        }
        match self.descriptor.validator() {
            Some(validator) => validator(self),
            None => Ok(()),
        }
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(name)? {
            None => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                WireError::Schema(format!(
                    "{}.{} is {}, not {}",
                    self.descriptor.name(),
                    name,
                    value.kind_name(),
                    expected
                ))
            }),
        }
    }

    /// Gets a boolean field.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        self.typed(name, "bool", Value::as_bool)
    }

    /// Gets an i32 field.
    pub fn get_i32(&self, name: &str) -> Result<Option<i32>> {
        self.typed(name, "i32", Value::as_i32)
    }

    /// Gets an i64 field.
    pub fn get_i64(&self, name: &str) -> Result<Option<i64>> {
        self.typed(name, "i64", Value::as_i64)
    }

    /// Gets a double field.
    pub fn get_double(&self, name: &str) -> Result<Option<f64>> {
        self.typed(name, "double", Value::as_double)
    }

    /// Gets a string field.
    pub fn get_string(&self, name: &str) -> Result<Option<&str>> {
        self.typed(name, "string", Value::as_str)
    }

    /// Gets a binary field.
    pub fn get_binary(&self, name: &str) -> Result<Option<&[u8]>> {
        self.typed(name, "binary", |v| match v {
            Value::Binary(b) => Some(b.as_slice()),
            _ => None,
        })
    }

    /// Gets a list or set field.
    pub fn get_list(&self, name: &str) -> Result<Option<&[Value]>> {
        self.typed(name, "list", Value::as_list)
    }

    /// Gets a nested struct field.
    pub fn get_struct(&self, name: &str) -> Result<Option<&Record>> {
        self.typed(name, "struct", Value::as_struct)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name() == other.descriptor.name() && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.descriptor.name())?;
        for (i, (field, value)) in self.present_fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field.name(), value)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
