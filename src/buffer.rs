//! Typed, big-endian codec over a caller-owned byte region.
//!
//! The engine never allocates an I/O buffer itself: callers hand it a
//! pre-sized input slice plus an offset, and a pre-sized output slice to
//! append into. [`RequestReader`] performs sequential (and absolute) reads;
//! [`ResponseWriter`] performs cursor-based appends. Both are bounds-checked
//! rather than trusting the caller, since an out-of-bounds read/write on a
//! borrowed slice would otherwise panic deep inside a match.

use crate::error::CodecError;

/// Sequential big-endian reader over a borrowed input slice.
pub struct RequestReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RequestReader<'a> {
    /// Creates a reader starting at `offset` within `buf`.
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    /// Current absolute cursor position within the backing slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CodecError::BufferExhausted {
                needed: len,
                offset: self.pos,
                capacity: self.buf.len(),
            })?;
        if end > self.buf.len() {
            return Err(CodecError::BufferExhausted {
                needed: len,
                offset: self.pos,
                capacity: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads a big-endian `i64` and advances the cursor by 8 bytes.
    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("length checked above");
        Ok(i64::from_be_bytes(bytes))
    }

    /// Reads a big-endian `u64` and advances the cursor by 8 bytes.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(self.read_i64()? as u64)
    }

    /// Reads a big-endian `i32` and advances the cursor by 4 bytes.
    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("length checked above");
        Ok(i32::from_be_bytes(bytes))
    }

    /// Reads a big-endian `u32` and advances the cursor by 4 bytes.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(self.read_i32()? as u32)
    }

    /// Reads a big-endian `i16` and advances the cursor by 2 bytes.
    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        let bytes: [u8; 2] = self.take(2)?.try_into().expect("length checked above");
        Ok(i16::from_be_bytes(bytes))
    }

    /// Reads a single byte and advances the cursor by 1.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }
}

/// Cursor-based big-endian appender over a borrowed, mutable output slice.
pub struct ResponseWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ResponseWriter<'a> {
    /// Creates a writer appending to `buf` starting at `offset`.
    pub fn new(buf: &'a mut [u8], offset: usize) -> Self {
        Self { buf, pos: offset }
    }

    /// Number of bytes appended so far (absolute position in the backing slice).
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes still available between the cursor and the end of the backing slice.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CodecError::BufferExhausted {
                needed: len,
                offset: self.pos,
                capacity: self.buf.len(),
            })?;
        if end > self.buf.len() {
            return Err(CodecError::BufferExhausted {
                needed: len,
                offset: self.pos,
                capacity: self.buf.len(),
            });
        }
        let slice = &mut self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Appends a big-endian `i64`.
    pub fn append_i64(&mut self, value: i64) -> Result<(), CodecError> {
        self.reserve(8)?.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Appends a big-endian `u64`.
    pub fn append_u64(&mut self, value: u64) -> Result<(), CodecError> {
        self.append_i64(value as i64)
    }

    /// Appends a big-endian `i32`.
    pub fn append_i32(&mut self, value: i32) -> Result<(), CodecError> {
        self.reserve(4)?.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Appends a big-endian `u32`.
    pub fn append_u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.append_i32(value as i32)
    }

    /// Appends a big-endian `u16`.
    pub fn append_u16(&mut self, value: u16) -> Result<(), CodecError> {
        self.reserve(2)?.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Appends a single byte.
    pub fn append_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    /// Appends a boolean as a single `0`/`1` byte.
    pub fn append_bool(&mut self, value: bool) -> Result<(), CodecError> {
        self.append_u8(value as u8)
    }
}
