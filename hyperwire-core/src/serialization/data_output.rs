//! Byte output sinks for the binary protocol.

use crate::error::Result;
use bytes::{BufMut, BytesMut};
use std::io::Write;

/// Trait for writing fixed-width values to a byte sink.
///
/// All multi-byte values are written in big-endian byte order.
pub trait DataOutput {
    /// Writes a single signed byte.
    fn write_byte(&mut self, v: i8) -> Result<()>;

    /// Writes a 16-bit signed integer.
    fn write_i16(&mut self, v: i16) -> Result<()>;

    /// Writes a 32-bit signed integer.
    fn write_i32(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer.
    fn write_i64(&mut self, v: i64) -> Result<()>;

    /// Writes a 64-bit IEEE-754 float.
    fn write_double(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without a length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;
}

/// A growable in-memory `DataOutput`.
#[derive(Debug)]
pub struct BufferOutput {
    buffer: BytesMut,
}

impl BufferOutput {
    /// Creates a new output with default capacity.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Creates a new output with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Consumes the output and returns the underlying buffer.
    pub fn into_inner(self) -> BytesMut {
        self.buffer
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clears the buffer, removing all written data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for BufferOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for BufferOutput {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.buffer.put_i8(v);
        Ok(())
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.buffer.put_i16(v);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32(v);
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64(v);
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.buffer.put_f64(v);
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }
}

/// A `DataOutput` over a blocking `std::io::Write` transport.
#[derive(Debug)]
pub struct StreamOutput<W> {
    inner: W,
}

impl<W: Write> StreamOutput<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Flushes the wrapped writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DataOutput for StreamOutput<W> {
    fn write_byte(&mut self, v: i8) -> Result<()> {
        self.inner.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.inner.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.inner.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.inner.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn write_double(&mut self, v: f64) -> Result<()> {
        self.inner.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.inner.write_all(v)?;
        Ok(())
    }
}
