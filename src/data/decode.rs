//! Wire-format decoder: extends the tree at the cursor with the values a
//! byte slice contains.

use tracing::warn;
use uuid::Uuid;

use super::AmqpData;
use crate::codec::constants::TypeCode;
use crate::codec::decoder::{
    read_exact, read_f32, read_f64, read_i16, read_i32, read_i64, read_i8, read_u16, read_u32,
    read_u64, read_u8, read_var32, read_var8,
};
use crate::error::CodecError;
use crate::types::{AmqpType, Decimal128, Decimal32, Decimal64, Timestamp};

impl AmqpData {
    /// Decode exactly one value from `input`, returning the remaining
    /// bytes. On failure nothing is appended: the partially decoded value
    /// is dropped and the cursor restored.
    pub fn decode<'a>(&mut self, input: &'a [u8]) -> Result<&'a [u8], CodecError> {
        let mark = self.mark();
        match self.decode_value(input) {
            Ok(remaining) => Ok(remaining),
            Err(err) => {
                self.truncate(mark);
                Err(err)
            }
        }
    }

    /// Streaming decode: consume values until `input` is exhausted. On
    /// failure the successfully decoded prefix remains in the tree.
    pub fn decode_all(&mut self, mut input: &[u8]) -> Result<(), CodecError> {
        while !input.is_empty() {
            input = self.decode(input)?;
        }
        Ok(())
    }

    fn decode_value<'a>(&mut self, input: &'a [u8]) -> Result<&'a [u8], CodecError> {
        let (input, raw) = read_u8(input)?;
        let code = TypeCode::try_from(raw).map_err(|_| {
            warn!(code = raw, "unrecognized type code");
            CodecError::InvalidTypeCode(raw)
        })?;

        if code == TypeCode::Described {
            self.put_described()?;
            self.enter();
            let input = self.decode_value(input)?;
            let input = self.decode_value(input)?;
            self.exit();
            return Ok(input);
        }

        self.decode_payload(code, input)
    }

    /// Decode the payload of a value whose constructor byte has already
    /// been consumed. Array elements share one constructor, so this is
    /// also the per-element entry point.
    fn decode_payload<'a>(&mut self, code: TypeCode, input: &'a [u8]) -> Result<&'a [u8], CodecError> {
        match code {
            TypeCode::Described => Err(CodecError::InvalidTypeCode(code.into())),
            TypeCode::Null => {
                self.put_null()?;
                Ok(input)
            }
            TypeCode::BooleanTrue => {
                self.put_bool(true)?;
                Ok(input)
            }
            TypeCode::BooleanFalse => {
                self.put_bool(false)?;
                Ok(input)
            }
            TypeCode::Boolean => {
                let (input, v) = read_u8(input)?;
                self.put_bool(v != 0)?;
                Ok(input)
            }
            TypeCode::UByte => {
                let (input, v) = read_u8(input)?;
                self.put_ubyte(v)?;
                Ok(input)
            }
            TypeCode::Byte => {
                let (input, v) = read_i8(input)?;
                self.put_byte(v)?;
                Ok(input)
            }
            TypeCode::UShort => {
                let (input, v) = read_u16(input)?;
                self.put_ushort(v)?;
                Ok(input)
            }
            TypeCode::Short => {
                let (input, v) = read_i16(input)?;
                self.put_short(v)?;
                Ok(input)
            }
            TypeCode::UInt0 => {
                self.put_uint(0)?;
                Ok(input)
            }
            TypeCode::UIntSmall => {
                let (input, v) = read_u8(input)?;
                self.put_uint(u32::from(v))?;
                Ok(input)
            }
            TypeCode::UInt => {
                let (input, v) = read_u32(input)?;
                self.put_uint(v)?;
                Ok(input)
            }
            TypeCode::IntSmall => {
                let (input, v) = read_i8(input)?;
                self.put_int(i32::from(v))?;
                Ok(input)
            }
            TypeCode::Int => {
                let (input, v) = read_i32(input)?;
                self.put_int(v)?;
                Ok(input)
            }
            TypeCode::Char => {
                let (input, v) = read_u32(input)?;
                let c = char::from_u32(v).ok_or(CodecError::InvalidChar(v))?;
                self.put_char(c)?;
                Ok(input)
            }
            TypeCode::ULong0 => {
                self.put_ulong(0)?;
                Ok(input)
            }
            TypeCode::ULongSmall => {
                let (input, v) = read_u8(input)?;
                self.put_ulong(u64::from(v))?;
                Ok(input)
            }
            TypeCode::ULong => {
                let (input, v) = read_u64(input)?;
                self.put_ulong(v)?;
                Ok(input)
            }
            TypeCode::LongSmall => {
                let (input, v) = read_i8(input)?;
                self.put_long(i64::from(v))?;
                Ok(input)
            }
            TypeCode::Long => {
                let (input, v) = read_i64(input)?;
                self.put_long(v)?;
                Ok(input)
            }
            TypeCode::Timestamp => {
                let (input, v) = read_i64(input)?;
                self.put_timestamp(Timestamp(v))?;
                Ok(input)
            }
            TypeCode::Float => {
                let (input, v) = read_f32(input)?;
                self.put_float(v)?;
                Ok(input)
            }
            TypeCode::Double => {
                let (input, v) = read_f64(input)?;
                self.put_double(v)?;
                Ok(input)
            }
            TypeCode::Decimal32 => {
                let (input, v) = read_u32(input)?;
                self.put_decimal32(Decimal32(v))?;
                Ok(input)
            }
            TypeCode::Decimal64 => {
                let (input, v) = read_u64(input)?;
                self.put_decimal64(Decimal64(v))?;
                Ok(input)
            }
            TypeCode::Decimal128 => {
                let (input, bytes) = read_exact(input, 16)?;
                let mut raw = [0u8; 16];
                raw.copy_from_slice(bytes);
                self.put_decimal128(Decimal128(raw))?;
                Ok(input)
            }
            TypeCode::Uuid => {
                let (input, bytes) = read_exact(input, 16)?;
                let mut raw = [0u8; 16];
                raw.copy_from_slice(bytes);
                self.put_uuid(Uuid::from_bytes(raw))?;
                Ok(input)
            }
            TypeCode::Binary8 => {
                let (input, bytes) = read_var8(input)?;
                self.put_binary(bytes)?;
                Ok(input)
            }
            TypeCode::Binary32 => {
                let (input, bytes) = read_var32(input)?;
                self.put_binary(bytes)?;
                Ok(input)
            }
            TypeCode::String8 => {
                let (input, bytes) = read_var8(input)?;
                self.put_string(std::str::from_utf8(bytes)?)?;
                Ok(input)
            }
            TypeCode::String32 => {
                let (input, bytes) = read_var32(input)?;
                self.put_string(std::str::from_utf8(bytes)?)?;
                Ok(input)
            }
            TypeCode::Symbol8 => {
                let (input, bytes) = read_var8(input)?;
                self.put_symbol(std::str::from_utf8(bytes)?)?;
                Ok(input)
            }
            TypeCode::Symbol32 => {
                let (input, bytes) = read_var32(input)?;
                self.put_symbol(std::str::from_utf8(bytes)?)?;
                Ok(input)
            }
            TypeCode::List0 => {
                self.put_list()?;
                Ok(input)
            }
            TypeCode::List8 | TypeCode::Map8 => {
                let (input, _size) = read_u8(input)?;
                let (input, count) = read_u8(input)?;
                self.decode_compound(code.tag(), count as usize, input)
            }
            TypeCode::List32 | TypeCode::Map32 => {
                let (input, _size) = read_u32(input)?;
                let (input, count) = read_u32(input)?;
                self.decode_compound(code.tag(), count as usize, input)
            }
            TypeCode::Array8 => {
                let (input, _size) = read_u8(input)?;
                let (input, count) = read_u8(input)?;
                self.decode_array(count as usize, input)
            }
            TypeCode::Array32 => {
                let (input, _size) = read_u32(input)?;
                let (input, count) = read_u32(input)?;
                self.decode_array(count as usize, input)
            }
        }
    }

    fn decode_compound<'a>(
        &mut self,
        tag: AmqpType,
        count: usize,
        mut input: &'a [u8],
    ) -> Result<&'a [u8], CodecError> {
        match tag {
            AmqpType::List => self.put_list()?,
            _ => {
                if count % 2 != 0 {
                    return Err(CodecError::arg(format!("odd map entry count {count}")));
                }
                self.put_map()?;
            }
        }
        self.enter();
        for _ in 0..count {
            input = self.decode_value(input)?;
        }
        self.exit();
        Ok(input)
    }

    fn decode_array<'a>(&mut self, count: usize, input: &'a [u8]) -> Result<&'a [u8], CodecError> {
        let (mut input, mut raw) = read_u8(input)?;

        let described = raw == u8::from(TypeCode::Described);
        self.put_array(described, AmqpType::Null)?;
        self.enter();
        if described {
            input = self.decode_value(input)?;
            let (rest, next) = read_u8(input)?;
            input = rest;
            raw = next;
        }

        let element = TypeCode::try_from(raw).map_err(|_| {
            warn!(code = raw, "unrecognized array element code");
            CodecError::InvalidTypeCode(raw)
        })?;
        let tag = element.tag();
        if tag == AmqpType::Described {
            // one descriptor slot per array; a second leading descriptor
            // has nowhere to go in the node schema
            return Err(CodecError::arg("array element code may not be a descriptor"));
        }
        self.set_parent_array_type(tag)?;

        for _ in 0..count {
            input = self.decode_payload(element, input)?;
        }
        self.exit();
        Ok(input)
    }
}
