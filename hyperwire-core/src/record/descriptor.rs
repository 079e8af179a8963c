//! Field and struct descriptors driving the generic record engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Record, Value};
use crate::error::{Result, WireError};
use crate::protocol::WireType;

/// Custom validation hook run by [`Record::validate`].
pub type Validator = fn(&Record) -> Result<()>;

/// Schema-level type of a field or container element.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Encoded as BOOL.
    Bool,
    /// Encoded as BYTE.
    Byte,
    /// Encoded as I16.
    I16,
    /// Encoded as I32.
    I32,
    /// Encoded as I64.
    I64,
    /// Encoded as DOUBLE.
    Double,
    /// UTF-8 text, encoded as STRING.
    String,
    /// Opaque bytes, encoded as STRING.
    Binary,
    /// A nested struct of the given type.
    Struct(Arc<StructDescriptor>),
    /// Ordered elements of one type.
    List(Box<TypeDescriptor>),
    /// Unordered elements of one type.
    Set(Box<TypeDescriptor>),
    /// Key type and value type.
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Shorthand for `List(Box::new(element))`.
    pub fn list(element: TypeDescriptor) -> Self {
        Self::List(Box::new(element))
    }

    /// Shorthand for `Set(Box::new(element))`.
    pub fn set(element: TypeDescriptor) -> Self {
        Self::Set(Box::new(element))
    }

    /// Shorthand for `Map(Box::new(key), Box::new(value))`.
    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Shorthand for a nested struct type.
    pub fn structure(descriptor: &Arc<StructDescriptor>) -> Self {
        Self::Struct(Arc::clone(descriptor))
    }

    /// Returns the wire type values of this type are encoded with.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Bool => WireType::Bool,
            Self::Byte => WireType::Byte,
            Self::I16 => WireType::I16,
            Self::I32 => WireType::I32,
            Self::I64 => WireType::I64,
            Self::Double => WireType::Double,
            Self::String | Self::Binary => WireType::String,
            Self::Struct(_) => WireType::Struct,
            Self::List(_) => WireType::List,
            Self::Set(_) => WireType::Set,
            Self::Map(_, _) => WireType::Map,
        }
    }

    /// Returns true if `value` has the shape this type describes,
    /// checking container elements and nested struct names recursively.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_))
            | (Self::Byte, Value::Byte(_))
            | (Self::I16, Value::I16(_))
            | (Self::I32, Value::I32(_))
            | (Self::I64, Value::I64(_))
            | (Self::Double, Value::Double(_))
            | (Self::String, Value::String(_))
            | (Self::Binary, Value::Binary(_)) => true,
            (Self::Struct(d), Value::Struct(r)) => d.name() == r.type_name(),
            (Self::List(elem), Value::List(items)) | (Self::Set(elem), Value::Set(items)) => {
                items.iter().all(|v| elem.accepts(v))
            }
            (Self::Map(k, v), Value::Map(entries)) => entries
                .iter()
                .all(|(key, value)| k.accepts(key) && v.accepts(value)),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Byte => f.write_str("byte"),
            Self::I16 => f.write_str("i16"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::Double => f.write_str("double"),
            Self::String => f.write_str("string"),
            Self::Binary => f.write_str("binary"),
            Self::Struct(d) => f.write_str(d.name()),
            Self::List(e) => write!(f, "list<{}>", e),
            Self::Set(e) => write!(f, "set<{}>", e),
            Self::Map(k, v) => write!(f, "map<{},{}>", k, v),
        }
    }
}

/// Whether a field must be present when a record is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requiredness {
    /// Must be set before encoding.
    Required,
    /// May be absent; absent fields are omitted on the wire.
    Optional,
    /// No annotation in the schema; treated like `Optional`.
    #[default]
    Default,
}

/// Descriptor for one field within a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    id: i16,
    name: String,
    ty: TypeDescriptor,
    requiredness: Requiredness,
    default: Option<Value>,
}

impl FieldDescriptor {
    /// Creates a field descriptor with default requiredness and no default value.
    pub fn new(id: i16, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            requiredness: Requiredness::Default,
            default: None,
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.requiredness = Requiredness::Required;
        self
    }

    /// Marks the field as optional.
    pub fn optional(mut self) -> Self {
        self.requiredness = Requiredness::Optional;
        self
    }

    /// Sets the value a freshly constructed record starts with.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the field id.
    pub fn id(&self) -> i16 {
        self.id
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field type.
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Returns the wire type of the field.
    pub fn wire_type(&self) -> WireType {
        self.ty.wire_type()
    }

    /// Returns the field requiredness.
    pub fn requiredness(&self) -> Requiredness {
        self.requiredness
    }

    /// Returns the declared default value, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered field table for one record type.
///
/// Field ids start at 1; id 0 is reserved. No two fields share an id or a
/// name. Immutable once built.
#[derive(Clone)]
pub struct StructDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_id: HashMap<i16, usize>,
    by_name: HashMap<String, usize>,
    validator: Option<Validator>,
}

impl StructDescriptor {
    /// Returns a builder for a struct with the given name.
    pub fn builder(name: impl Into<String>) -> StructDescriptorBuilder {
        StructDescriptorBuilder::new(name)
    }

    /// Creates a descriptor from a field list, checking ids and names.
    pub fn with_fields(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let mut builder = Self::builder(name);
        for field in fields {
            builder = builder.field(field);
        }
        builder.build()
    }

    /// Returns the struct name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the number of declared fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a field by id, returning its position and descriptor.
    pub fn field_by_id(&self, id: i16) -> Option<(usize, &FieldDescriptor)> {
        self.by_id.get(&id).map(|&i| (i, &self.fields[i]))
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Returns the position of the named field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns true if a field with the given name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the custom validation hook, if any.
    pub fn validator(&self) -> Option<Validator> {
        self.validator
    }
}

impl PartialEq for StructDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

impl fmt::Debug for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Builder for `StructDescriptor`.
#[derive(Debug, Clone)]
pub struct StructDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    validator: Option<Validator>,
}

impl StructDescriptorBuilder {
    /// Creates a builder for a struct with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            validator: None,
        }
    }

    /// Appends a field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Installs a custom validation hook.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> Result<StructDescriptor> {
        let mut by_id = HashMap::with_capacity(self.fields.len());
        let mut by_name = HashMap::with_capacity(self.fields.len());

        for (index, field) in self.fields.iter().enumerate() {
            if field.id < 1 {
                return Err(WireError::Schema(format!(
                    "{}.{}: field id must be positive, got {}",
                    self.name, field.name, field.id
                )));
            }
            if by_id.insert(field.id, index).is_some() {
                return Err(WireError::Schema(format!(
                    "{}: duplicate field id {}",
                    self.name, field.id
                )));
            }
            if by_name.insert(field.name.clone(), index).is_some() {
                return Err(WireError::Schema(format!(
                    "{}: duplicate field name '{}'",
                    self.name, field.name
                )));
            }
            if let Some(default) = &field.default {
                if !field.ty.accepts(default) {
                    return Err(WireError::Schema(format!(
                        "{}.{}: default {} does not match type {}",
                        self.name,
                        field.name,
                        default.kind_name(),
                        field.ty
                    )));
                }
            }
        }

        Ok(StructDescriptor {
            name: self.name,
            fields: self.fields,
            by_id,
            by_name,
            validator: self.validator,
        })
    }
}
