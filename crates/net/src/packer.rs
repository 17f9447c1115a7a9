//! Low-level wire primitives: variable-length integers and length-prefixed
//! strings.
//!
//! Integers use the engine's compact signed encoding: the first byte carries
//! a continuation bit (0x80), a sign bit (0x40) and the low 6 magnitude
//! bits; each following byte carries a continuation bit and 7 more magnitude
//! bits. Negative values store the one's complement of the value, so small
//! magnitudes of either sign cost one byte — the common case for game-state
//! deltas.

use crate::error::FieldError;

/// Longest legal packed integer. The fifth byte may only use its low 4 bits
/// (6 + 7 + 7 + 7 + 4 = 31 magnitude bits).
pub const MAX_PACKED_INT_BYTES: usize = 5;

const CONTINUATION: u8 = 0x80;
const SIGN: u8 = 0x40;

/// Append-only byte sink for field encodings.
#[derive(Debug, Default)]
pub struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    /// Start with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one packed integer.
    pub fn put_int(&mut self, value: i32) {
        let mut first = 0u8;
        let mut rest = if value < 0 {
            first |= SIGN;
            !value as u32
        } else {
            value as u32
        };

        first |= (rest & 0x3f) as u8;
        rest >>= 6;
        if rest == 0 {
            self.buf.push(first);
            return;
        }

        self.buf.push(first | CONTINUATION);
        while rest != 0 {
            let mut byte = (rest & 0x7f) as u8;
            rest >>= 7;
            if rest != 0 {
                byte |= CONTINUATION;
            }
            self.buf.push(byte);
        }
    }

    /// Append a packed length prefix followed by the raw UTF-8 bytes.
    ///
    /// Content validation (mode checks, byte limit) happens in the codec
    /// before this is called.
    pub fn put_str(&mut self, s: &str) {
        self.put_int(s.len() as i32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the packer, yielding the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Cursor over a received byte buffer.
///
/// Pure and synchronous: a truncated field is an error, never a suspension.
/// Buffering until a complete item is available is the transport's job.
#[derive(Debug)]
pub struct Unpacker<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Unpacker<'a> {
    /// Wrap a complete item buffer.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_byte(&mut self) -> Result<u8, FieldError> {
        let byte = self
            .data
            .get(self.pos)
            .copied()
            .ok_or(FieldError::InvalidEncoding("truncated integer"))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Decode one packed integer.
    ///
    /// Reconstructs the signed value independent of any declared range;
    /// range validation is a separate pass in the codec. Magnitudes beyond
    /// the signed 32-bit space fail with [`FieldError::IntegerOverflow`].
    pub fn get_int(&mut self) -> Result<i32, FieldError> {
        let first = self.next_byte()?;
        let negative = first & SIGN != 0;
        let mut magnitude = u32::from(first & 0x3f);
        let mut more = first & CONTINUATION != 0;
        let mut shift = 6;

        while more {
            let byte = self.next_byte()?;
            more = byte & CONTINUATION != 0;
            let part = u32::from(byte & 0x7f);
            if shift == 27 && (more || part > 0x0f) {
                return Err(FieldError::IntegerOverflow);
            }
            magnitude |= part << shift;
            shift += 7;
        }

        let magnitude = magnitude as i32;
        Ok(if negative { !magnitude } else { magnitude })
    }

    /// Decode one length-prefixed string of at most `max` bytes.
    ///
    /// Checks the length prefix before touching content, then UTF-8
    /// well-formedness. Mode-specific control-character checks happen in the
    /// codec.
    pub fn get_str(&mut self, max: usize) -> Result<&'a str, FieldError> {
        let len = self.get_int()?;
        if len < 0 {
            return Err(FieldError::InvalidEncoding("negative string length"));
        }
        let len = len as usize;
        if len > max {
            return Err(FieldError::StringTooLong { len, max });
        }
        if len > self.remaining() {
            return Err(FieldError::InvalidEncoding("string length exceeds buffer"));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        std::str::from_utf8(bytes).map_err(|_| FieldError::InvalidEncoding("invalid utf-8"))
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}
