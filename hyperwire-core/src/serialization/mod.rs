//! Byte-level input and output for the wire protocol.

mod data_input;
mod data_output;

#[cfg(feature = "serde")]
mod serde;

pub use data_input::{DataInput, SliceInput, StreamInput};
pub use data_output::{BufferOutput, DataOutput, StreamOutput};
