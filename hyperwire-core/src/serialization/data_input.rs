//! Byte input sources for the binary protocol.

use crate::error::{ProtocolErrorKind, Result, WireError};
use bytes::Buf;
use std::io::{self, Cursor, Read};

/// Trait for reading fixed-width values from a byte source.
///
/// All multi-byte values are read in big-endian byte order.
pub trait DataInput {
    /// Reads a single signed byte.
    fn read_byte(&mut self) -> Result<i8>;

    /// Reads a 16-bit signed integer.
    fn read_i16(&mut self) -> Result<i16>;

    /// Reads a 32-bit signed integer.
    fn read_i32(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_i64(&mut self) -> Result<i64>;

    /// Reads a 64-bit IEEE-754 float.
    fn read_double(&mut self) -> Result<f64>;

    /// Reads exactly `len` raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Returns the number of bytes left, when the source knows it.
    ///
    /// Stream-backed inputs return `None`.
    fn remaining(&self) -> Option<usize> {
        None
    }
}

fn eof(need: usize, have: usize) -> WireError {
    WireError::protocol(
        ProtocolErrorKind::UnexpectedEof,
        format!("need {} bytes, have {}", need, have),
    )
}

/// A `DataInput` over an in-memory byte slice.
#[derive(Debug)]
pub struct SliceInput<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> SliceInput<'a> {
    /// Creates a new input reading from the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Returns true once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        !self.cursor.has_remaining()
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(eof(n, self.cursor.remaining()))
        } else {
            Ok(())
        }
    }
}

impl DataInput for SliceInput<'_> {
    fn read_byte(&mut self) -> Result<i8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_i8())
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.ensure_remaining(2)?;
        Ok(self.cursor.get_i16())
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32())
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64())
    }

    fn read_double(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_f64())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.cursor.remaining())
    }
}

/// A `DataInput` over a blocking `std::io::Read` transport.
#[derive(Debug)]
pub struct StreamInput<R> {
    inner: R,
}

impl<R: Read> StreamInput<R> {
    /// Wraps a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(WireError::protocol(
                ProtocolErrorKind::UnexpectedEof,
                format!("stream ended while reading {} bytes", buf.len()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read> DataInput for StreamInput<R> {
    fn read_byte(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}
