#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Cursor-based reading of little-endian fixed-layout records.
//!
//! Every container format in the asset pipeline is a sequence of fixed-size
//! records, count-prefixed arrays and NUL-padded strings. [`Reader`] decodes
//! them field by field, so no record relies on in-memory struct layout.

use std::{borrow::Cow, result};

use byteorder::{ByteOrder, LE};
use glam::Vec3;
use thiserror::Error;

/// A structural decoding error shared by all container decoders.
#[derive(Debug, Clone, Error, Hash, PartialEq, Eq)]
pub enum Error {
    #[error("invalid {format}: {reason}")]
    InvalidFormat {
        format: &'static str,
        reason: Cow<'static, str>,
    },
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl Error {
    pub fn invalid(format: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidFormat {
            format,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Returns the bytes before the first NUL, or all of `bytes` if there is none.
#[must_use]
pub fn null_terminated_prefix(bytes: &[u8]) -> &[u8] {
    bytes.splitn(2, |&b| b == 0).next().unwrap_or_default()
}

/// A fixed-size record that can be decoded from a [`Reader`].
pub trait Record: Sized {
    /// Encoded size in bytes, including any padding.
    const SIZE: usize;

    /// # Errors
    ///
    /// Returns `Err` if the reader runs out of bytes.
    fn read(reader: &mut Reader) -> Result<Self>;
}

#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[must_use]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    fn truncated(&self, needed: usize) -> Error {
        Error::TruncatedInput {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }

    /// Reads `count` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `count` bytes remain.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.truncated(count));
        }

        let bytes = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Skips `count` padding bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `count` bytes remain.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `Err` if the input is exhausted.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// # Errors
    ///
    /// Returns `Err` if the input is exhausted.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Reads a one-byte flag, any non-zero value is `true`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the input is exhausted.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|b| b != 0)
    }

    /// # Errors
    ///
    /// Returns `Err` if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LE::read_u16)
    }

    /// # Errors
    ///
    /// Returns `Err` if fewer than 2 bytes remain.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_bytes(2).map(LE::read_i16)
    }

    /// # Errors
    ///
    /// Returns `Err` if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LE::read_u32)
    }

    /// # Errors
    ///
    /// Returns `Err` if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bytes(4).map(LE::read_i32)
    }

    /// # Errors
    ///
    /// Returns `Err` if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_bytes(4).map(LE::read_f32)
    }

    /// # Errors
    ///
    /// Returns `Err` if fewer than 12 bytes remain.
    pub fn read_vec3(&mut self) -> Result<Vec3> {
        let bytes = self.read_bytes(12)?;
        Ok(Vec3::new(
            LE::read_f32(&bytes[0..4]),
            LE::read_f32(&bytes[4..8]),
            LE::read_f32(&bytes[8..12]),
        ))
    }

    /// Reads an `n` byte NUL-padded string.
    ///
    /// Everything from the first NUL on is discarded. Bytes are mapped one to one
    /// onto chars so legacy code page names never fail to decode.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `n` bytes remain.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(null_terminated_prefix(bytes)
            .iter()
            .copied()
            .map(char::from)
            .collect())
    }

    /// Reads a single record.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the record is truncated or invalid.
    pub fn read_record<T: Record>(&mut self) -> Result<T> {
        T::read(self)
    }

    /// Reads `count` records stored back to back.
    /// A zero or negative `count` yields an empty array.
    ///
    /// The whole array is bounds checked before any record is consumed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than `count * T::SIZE` bytes remain or a record is invalid.
    pub fn read_records<T: Record>(&mut self, count: impl Into<i64>) -> Result<Vec<T>> {
        let count = count.into();
        if count <= 0 {
            return Ok(Vec::new());
        }

        let count = usize::try_from(count).map_err(|_| self.truncated(usize::MAX))?;
        let needed = count.checked_mul(T::SIZE).unwrap_or(usize::MAX);
        if needed > self.remaining() {
            return Err(self.truncated(needed));
        }

        (0..count).map(|_| T::read(self)).collect()
    }
}

impl Record for u8 {
    const SIZE: usize = 1;

    fn read(reader: &mut Reader) -> Result<Self> {
        reader.read_u8()
    }
}

impl Record for u16 {
    const SIZE: usize = 2;

    fn read(reader: &mut Reader) -> Result<Self> {
        reader.read_u16()
    }
}

impl Record for i16 {
    const SIZE: usize = 2;

    fn read(reader: &mut Reader) -> Result<Self> {
        reader.read_i16()
    }
}

impl Record for f32 {
    const SIZE: usize = 4;

    fn read(reader: &mut Reader) -> Result<Self> {
        reader.read_f32()
    }
}

impl Record for Vec3 {
    const SIZE: usize = 12;

    fn read(reader: &mut Reader) -> Result<Self> {
        reader.read_vec3()
    }
}
