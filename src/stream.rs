//! Seekable byte cursor with primitive typed readers.
//!
//! [`Stream`] wraps any `Read + Seek` source (in-memory buffers and slices
//! via [`std::io::Cursor`], files via `BufReader<File>`) into the uniform
//! cursor the interpreter drives. Reads are exact: a reader that cannot get
//! the bytes it asked for fails with [`Error::UnexpectedEnd`] instead of
//! returning a short buffer.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::ByteOrder;

/// Cursor movement mode for seek opcodes.
///
/// The description encodes these as 0 / 1 / 2, matching the usual whence
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeekMode {
    /// Absolute offset from the origin.
    Start,
    /// Relative to the current position.
    Current,
    /// Relative to the end of the stream.
    End,
}

/// Seekable byte cursor over a `Read + Seek` source.
pub struct Stream<R> {
    inner: R,
}

impl Stream<Cursor<Vec<u8>>> {
    /// Wrap an owned byte buffer.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::new(Cursor::new(data))
    }
}

impl<'a> Stream<Cursor<&'a [u8]>> {
    /// Wrap a borrowed byte slice.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(Cursor::new(data))
    }
}

impl<R: Read + Seek> Stream<R> {
    /// Wrap an arbitrary seekable reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Current offset from the origin.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Consume exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEnd {
                    offset: self.inner.stream_position().unwrap_or(0),
                    wanted: n,
                }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(buf)
    }

    /// Return the next `n` bytes without net cursor movement.
    pub fn peek(&mut self, n: usize) -> Result<Vec<u8>> {
        let pos = self.position()?;
        let buf = self.read_exact(n)?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(buf)
    }

    /// Move the cursor.
    ///
    /// Seeking to a negative position is [`Error::InvalidSeek`]; seeking past
    /// the end is permitted (the next read fails instead).
    pub fn seek(&mut self, offset: i64, mode: SeekMode) -> Result<u64> {
        let target = match mode {
            SeekMode::Start => {
                if offset < 0 {
                    return Err(Error::InvalidSeek { offset });
                }
                SeekFrom::Start(offset as u64)
            }
            SeekMode::Current => SeekFrom::Current(offset),
            SeekMode::End => SeekFrom::End(offset),
        };
        self.inner.seek(target).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidInput {
                Error::InvalidSeek { offset }
            } else {
                Error::Io(e)
            }
        })
    }

    /// Read an unsigned integer of `bits` width in the given byte order.
    ///
    /// The width must already be validated (nonzero multiple of 8, at most
    /// 64); the compiler rejects anything else before execution.
    pub fn read_uint(&mut self, bits: u16, order: ByteOrder) -> Result<u64> {
        let buf = self.read_exact(usize::from(bits / 8))?;
        Ok(match order {
            ByteOrder::Little => LittleEndian::read_uint(&buf, buf.len()),
            ByteOrder::Big => BigEndian::read_uint(&buf, buf.len()),
        })
    }

    /// Read a two's complement signed integer of `bits` width.
    pub fn read_int(&mut self, bits: u16, order: ByteOrder) -> Result<i64> {
        let buf = self.read_exact(usize::from(bits / 8))?;
        Ok(match order {
            ByteOrder::Little => LittleEndian::read_int(&buf, buf.len()),
            ByteOrder::Big => BigEndian::read_int(&buf, buf.len()),
        })
    }

    /// Read an IEEE 754 float of 32 or 64 bits, widened to `f64`.
    pub fn read_float(&mut self, bits: u16, order: ByteOrder) -> Result<f64> {
        let buf = self.read_exact(usize::from(bits / 8))?;
        Ok(match (bits, order) {
            (32, ByteOrder::Little) => f64::from(LittleEndian::read_f32(&buf)),
            (32, ByteOrder::Big) => f64::from(BigEndian::read_f32(&buf)),
            (_, ByteOrder::Little) => LittleEndian::read_f64(&buf),
            (_, ByteOrder::Big) => BigEndian::read_f64(&buf),
        })
    }

    /// Read an unsigned LEB128 varint.
    ///
    /// Accumulates the low 7 bits of each byte in little-endian order until a
    /// byte with the top bit clear. A value that does not fit in 64 bits is
    /// [`Error::MalformedVarint`].
    pub fn read_uvarint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_exact(1)?[0];
            let low = u64::from(byte & 0x7F);
            if shift >= 64 || (low << shift) >> shift != low {
                return Err(Error::MalformedVarint);
            }
            value |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Read a single byte as a boolean (nonzero is true).
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_exact(1)?[0] != 0)
    }
}
