//! A strictly forward-only, bounds-checked cursor over a borrowed class-file byte span.
//!
//! Grounded in `original_source/class_loader/byte_reader.hpp`'s templated `read<T>()`, but
//! specialized into named methods (`read_u1/u2/u4/u8`) since Rust generics over `byteorder`'s
//! trait methods would need a turbofish at every call site for no real benefit here.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{VmError, VmResult};
use crate::types::{U1, U2, U4, U8};

pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
    len: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { cursor: Cursor::new(data), len: data.len() }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn check_bounds(&self, n: usize) -> VmResult<()> {
        if self.position() + n > self.len {
            return Err(VmError::OutOfBounds(format!(
                "attempted to read {} bytes at offset {} of {} total",
                n,
                self.position(),
                self.len
            )));
        }
        Ok(())
    }

    pub fn read_u1(&mut self) -> VmResult<U1> {
        self.check_bounds(1)?;
        self.cursor.read_u8().map_err(|e| VmError::OutOfBounds(e.to_string()))
    }

    pub fn read_u2(&mut self) -> VmResult<U2> {
        self.check_bounds(2)?;
        self.cursor.read_u16::<BigEndian>().map_err(|e| VmError::OutOfBounds(e.to_string()))
    }

    pub fn read_u4(&mut self) -> VmResult<U4> {
        self.check_bounds(4)?;
        self.cursor.read_u32::<BigEndian>().map_err(|e| VmError::OutOfBounds(e.to_string()))
    }

    pub fn read_u8(&mut self) -> VmResult<U8> {
        self.check_bounds(8)?;
        self.cursor.read_u64::<BigEndian>().map_err(|e| VmError::OutOfBounds(e.to_string()))
    }

    /// Reads `n` bytes and returns them as a freshly owned vector.
    pub fn read_bytes(&mut self, n: usize) -> VmResult<Vec<U1>> {
        self.check_bounds(n)?;
        let mut buf = vec![0u8; n];
        self.cursor.read_exact(&mut buf).map_err(|e| VmError::OutOfBounds(e.to_string()))?;
        Ok(buf)
    }

    /// Reads `buffer.len()` bytes into `buffer`. Mirrors the reference's buffered overload;
    /// there is no null-pointer state in Rust so the only failure mode is running past the end.
    pub fn read_bytes_into(&mut self, buffer: &mut [u8]) -> VmResult<()> {
        self.check_bounds(buffer.len())?;
        self.cursor.read_exact(buffer).map_err(|e| VmError::OutOfBounds(e.to_string()))
    }
}
