//! Tagged binary wire protocol.
//!
//! The protocol knows nothing about schemas: it reads and writes field,
//! container and message headers plus primitive values, and can skip any
//! value given only its wire type.

mod binary;
mod config;
pub mod constants;
mod headers;
mod traits;

pub use binary::{BinaryReader, BinaryWriter};
pub(crate) use binary::initial_capacity;
pub use config::{ProtocolConfig, ProtocolConfigBuilder};
pub use constants::{MessageType, WireType};
pub use headers::{FieldHeader, ListHeader, MapHeader, MessageHeader};
pub use traits::{nested, skip_value, ProtocolReader, ProtocolWriter};
