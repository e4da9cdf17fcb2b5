use byteorder::{BigEndian, ByteOrder};

use crate::error::CodecError;

/// Bounded big-endian writer over a caller-provided buffer.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        ByteWriter { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn claim(&mut self, size: usize) -> Result<&mut [u8], CodecError> {
        if self.pos + size > self.buf.len() {
            return Err(CodecError::Overflow(self.pos + size - self.buf.len()));
        }
        let out = &mut self.buf[self.pos..self.pos + size];
        self.pos += size;
        Ok(out)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.claim(1)?[0] = value;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), CodecError> {
        self.write_u8(value as u8)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.claim(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Byte run with a 1-byte length prefix; the caller guarantees the run
    /// fits in 255 bytes.
    pub fn write_var8(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_u8(bytes.len() as u8)?;
        self.write_bytes(bytes)
    }

    /// Byte run with a 4-byte length prefix.
    pub fn write_var32(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_u32(bytes.len() as u32)?;
        self.write_bytes(bytes)
    }
}

macro_rules! writer {
    ( $fn:ident, $size:expr, $ty:ty) => {
        impl ByteWriter<'_> {
            pub fn $fn(&mut self, value: $ty) -> Result<(), CodecError> {
                BigEndian::$fn(self.claim($size)?, value);
                Ok(())
            }
        }
    };
}

writer!(write_u16, 2, u16);
writer!(write_i16, 2, i16);
writer!(write_u32, 4, u32);
writer!(write_i32, 4, i32);
writer!(write_u64, 8, u64);
writer!(write_i64, 8, i64);
writer!(write_f32, 4, f32);
writer!(write_f64, 8, f64);
