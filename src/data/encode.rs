//! Wire-format encoder: pre-order traversal of the tree choosing the
//! narrowest code per atom and the short or long form per composite.

use super::{AmqpData, NodeValue};
use crate::codec::constants::TypeCode;
use crate::codec::encoder::ByteWriter;
use crate::error::CodecError;

/// Largest short-form body: count byte plus content must fit the u8 size
/// field.
const SHORT_MAX: usize = u8::MAX as usize;

impl AmqpData {
    /// Encode the whole tree into `buf`, returning the number of bytes
    /// written. Fails with [`CodecError::Overflow`] when the buffer is too
    /// small.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let mut writer = ByteWriter::new(buf);
        let mut nd = if self.nodes.is_empty() { 0 } else { 1 };
        while nd != 0 {
            self.encode_value(nd, &mut writer)?;
            nd = self.nodes[nd - 1].next;
        }
        Ok(writer.position())
    }

    /// Encode into a freshly allocated buffer of exactly the right size.
    pub fn encode_vec(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = vec![0u8; self.encoded_size()?];
        let written = self.encode(&mut buf)?;
        debug_assert_eq!(written, buf.len());
        Ok(buf)
    }

    /// Exact number of bytes [`encode`](Self::encode) will produce.
    pub fn encoded_size(&self) -> Result<usize, CodecError> {
        let mut size = 0;
        let mut nd = if self.nodes.is_empty() { 0 } else { 1 };
        while nd != 0 {
            size += self.value_size(nd)?;
            nd = self.nodes[nd - 1].next;
        }
        Ok(size)
    }

    /// Full encoded size of one value, constructor byte included.
    fn value_size(&self, nd: usize) -> Result<usize, CodecError> {
        let node = &self.nodes[nd - 1];
        Ok(match node.value {
            NodeValue::Null | NodeValue::Bool(_) => 1,
            NodeValue::Ubyte(_) | NodeValue::Byte(_) => 2,
            NodeValue::Ushort(_) | NodeValue::Short(_) => 3,
            NodeValue::Uint(v) => match v {
                0 => 1,
                1..=255 => 2,
                _ => 5,
            },
            NodeValue::Int(v) => {
                if i8::try_from(v).is_ok() {
                    2
                } else {
                    5
                }
            }
            NodeValue::Char(_) | NodeValue::Float(_) | NodeValue::Decimal32(_) => 5,
            NodeValue::Ulong(v) => match v {
                0 => 1,
                1..=255 => 2,
                _ => 9,
            },
            NodeValue::Long(v) => {
                if i8::try_from(v).is_ok() {
                    2
                } else {
                    9
                }
            }
            NodeValue::Timestamp(_) | NodeValue::Double(_) | NodeValue::Decimal64(_) => 9,
            NodeValue::Decimal128(_) | NodeValue::Uuid(_) => 17,
            NodeValue::Binary(span) | NodeValue::String(span) | NodeValue::Symbol(span) => {
                if span.len <= SHORT_MAX {
                    2 + span.len
                } else {
                    5 + span.len
                }
            }
            NodeValue::Described => {
                let (descriptor, value) = self.described_children(nd)?;
                1 + self.value_size(descriptor)? + self.value_size(value)?
            }
            NodeValue::List if node.children == 0 => 1,
            NodeValue::List | NodeValue::Map => {
                if node.value == NodeValue::Map && node.children % 2 != 0 {
                    return Err(CodecError::invalid("map has an odd number of children"));
                }
                1 + compound_overhead(self.children_size(nd)?, node.children)
            }
            NodeValue::Array => {
                let (body, count) = self.array_body(nd)?;
                1 + compound_overhead(body, count)
            }
        })
    }

    /// Size of an array element's payload; the constructor is shared and
    /// counted by the array itself.
    fn element_size(&self, nd: usize) -> Result<usize, CodecError> {
        let node = &self.nodes[nd - 1];
        Ok(match node.value {
            NodeValue::Null => 0,
            NodeValue::Bool(_) | NodeValue::Ubyte(_) | NodeValue::Byte(_) => 1,
            NodeValue::Ushort(_) | NodeValue::Short(_) => 2,
            NodeValue::Uint(_)
            | NodeValue::Int(_)
            | NodeValue::Char(_)
            | NodeValue::Float(_)
            | NodeValue::Decimal32(_) => 4,
            NodeValue::Ulong(_)
            | NodeValue::Long(_)
            | NodeValue::Timestamp(_)
            | NodeValue::Double(_)
            | NodeValue::Decimal64(_) => 8,
            NodeValue::Decimal128(_) | NodeValue::Uuid(_) => 16,
            NodeValue::Binary(span) | NodeValue::String(span) | NodeValue::Symbol(span) => {
                4 + span.len
            }
            NodeValue::List | NodeValue::Map => 8 + self.children_size(nd)?,
            NodeValue::Array => {
                let (body, _) = self.array_body(nd)?;
                8 + body
            }
            NodeValue::Described => {
                return Err(CodecError::arg("described is not an array element type"))
            }
        })
    }

    fn children_size(&self, nd: usize) -> Result<usize, CodecError> {
        let mut size = 0;
        let mut child = self.nodes[nd - 1].down;
        while child != 0 {
            size += self.value_size(child)?;
            child = self.nodes[child - 1].next;
        }
        Ok(size)
    }

    /// Short-form body of an array (descriptor frame, element code and
    /// element payloads) plus the wire element count.
    fn array_body(&self, nd: usize) -> Result<(usize, usize), CodecError> {
        let node = &self.nodes[nd - 1];
        let mut body = 1; // element code
        let mut count = node.children;
        let mut child = node.down;
        if node.described {
            let descriptor = child;
            if descriptor == 0 {
                return Err(CodecError::invalid("described array has no descriptor"));
            }
            body += 1 + self.value_size(descriptor)?;
            count -= 1;
            child = self.nodes[descriptor - 1].next;
        }
        while child != 0 {
            body += self.element_size(child)?;
            child = self.nodes[child - 1].next;
        }
        Ok((body, count))
    }

    fn described_children(&self, nd: usize) -> Result<(usize, usize), CodecError> {
        let node = &self.nodes[nd - 1];
        if node.children != 2 || node.down == 0 {
            return Err(CodecError::invalid(
                "described value must have a descriptor and a value",
            ));
        }
        let descriptor = node.down;
        Ok((descriptor, self.nodes[descriptor - 1].next))
    }

    fn encode_value(&self, nd: usize, w: &mut ByteWriter<'_>) -> Result<(), CodecError> {
        let node = &self.nodes[nd - 1];
        match node.value {
            NodeValue::Null => w.write_u8(TypeCode::Null.into()),
            NodeValue::Bool(true) => w.write_u8(TypeCode::BooleanTrue.into()),
            NodeValue::Bool(false) => w.write_u8(TypeCode::BooleanFalse.into()),
            NodeValue::Ubyte(v) => {
                w.write_u8(TypeCode::UByte.into())?;
                w.write_u8(v)
            }
            NodeValue::Byte(v) => {
                w.write_u8(TypeCode::Byte.into())?;
                w.write_i8(v)
            }
            NodeValue::Ushort(v) => {
                w.write_u8(TypeCode::UShort.into())?;
                w.write_u16(v)
            }
            NodeValue::Short(v) => {
                w.write_u8(TypeCode::Short.into())?;
                w.write_i16(v)
            }
            NodeValue::Uint(0) => w.write_u8(TypeCode::UInt0.into()),
            NodeValue::Uint(v @ 1..=255) => {
                w.write_u8(TypeCode::UIntSmall.into())?;
                w.write_u8(v as u8)
            }
            NodeValue::Uint(v) => {
                w.write_u8(TypeCode::UInt.into())?;
                w.write_u32(v)
            }
            NodeValue::Int(v) => match i8::try_from(v) {
                Ok(small) => {
                    w.write_u8(TypeCode::IntSmall.into())?;
                    w.write_i8(small)
                }
                Err(_) => {
                    w.write_u8(TypeCode::Int.into())?;
                    w.write_i32(v)
                }
            },
            NodeValue::Char(c) => {
                w.write_u8(TypeCode::Char.into())?;
                w.write_u32(c as u32)
            }
            NodeValue::Ulong(0) => w.write_u8(TypeCode::ULong0.into()),
            NodeValue::Ulong(v @ 1..=255) => {
                w.write_u8(TypeCode::ULongSmall.into())?;
                w.write_u8(v as u8)
            }
            NodeValue::Ulong(v) => {
                w.write_u8(TypeCode::ULong.into())?;
                w.write_u64(v)
            }
            NodeValue::Long(v) => match i8::try_from(v) {
                Ok(small) => {
                    w.write_u8(TypeCode::LongSmall.into())?;
                    w.write_i8(small)
                }
                Err(_) => {
                    w.write_u8(TypeCode::Long.into())?;
                    w.write_i64(v)
                }
            },
            NodeValue::Timestamp(t) => {
                w.write_u8(TypeCode::Timestamp.into())?;
                w.write_i64(t.millis())
            }
            NodeValue::Float(v) => {
                w.write_u8(TypeCode::Float.into())?;
                w.write_f32(v.into_inner())
            }
            NodeValue::Double(v) => {
                w.write_u8(TypeCode::Double.into())?;
                w.write_f64(v.into_inner())
            }
            NodeValue::Decimal32(d) => {
                w.write_u8(TypeCode::Decimal32.into())?;
                w.write_u32(d.0)
            }
            NodeValue::Decimal64(d) => {
                w.write_u8(TypeCode::Decimal64.into())?;
                w.write_u64(d.0)
            }
            NodeValue::Decimal128(d) => {
                w.write_u8(TypeCode::Decimal128.into())?;
                w.write_bytes(&d.0)
            }
            NodeValue::Uuid(u) => {
                w.write_u8(TypeCode::Uuid.into())?;
                w.write_bytes(u.as_bytes())
            }
            NodeValue::Binary(span) => {
                self.encode_variable(span, TypeCode::Binary8, TypeCode::Binary32, w)
            }
            NodeValue::String(span) => {
                self.encode_variable(span, TypeCode::String8, TypeCode::String32, w)
            }
            NodeValue::Symbol(span) => {
                self.encode_variable(span, TypeCode::Symbol8, TypeCode::Symbol32, w)
            }
            NodeValue::Described => {
                let (descriptor, value) = self.described_children(nd)?;
                w.write_u8(TypeCode::Described.into())?;
                self.encode_value(descriptor, w)?;
                self.encode_value(value, w)
            }
            NodeValue::List if node.children == 0 => w.write_u8(TypeCode::List0.into()),
            NodeValue::List => self.encode_compound(nd, TypeCode::List8, TypeCode::List32, true, w),
            NodeValue::Map => {
                if node.children % 2 != 0 {
                    return Err(CodecError::invalid("map has an odd number of children"));
                }
                self.encode_compound(nd, TypeCode::Map8, TypeCode::Map32, true, w)
            }
            NodeValue::Array => self.encode_array(nd, true, w),
        }
    }

    fn encode_variable(
        &self,
        span: super::Span,
        code8: TypeCode,
        code32: TypeCode,
        w: &mut ByteWriter<'_>,
    ) -> Result<(), CodecError> {
        let bytes = self.bytes(span);
        if bytes.len() <= SHORT_MAX {
            w.write_u8(code8.into())?;
            w.write_var8(bytes)
        } else {
            w.write_u8(code32.into())?;
            w.write_var32(bytes)
        }
    }

    fn encode_compound(
        &self,
        nd: usize,
        code8: TypeCode,
        code32: TypeCode,
        with_code: bool,
        w: &mut ByteWriter<'_>,
    ) -> Result<(), CodecError> {
        let node = &self.nodes[nd - 1];
        let content = self.children_size(nd)?;
        let count = node.children;
        let short = with_code && count <= SHORT_MAX && content + 1 <= SHORT_MAX;
        if with_code {
            w.write_u8(if short { code8 } else { code32 }.into())?;
        }
        if short {
            w.write_u8((content + 1) as u8)?;
            w.write_u8(count as u8)?;
        } else {
            w.write_u32((content + 4) as u32)?;
            w.write_u32(count as u32)?;
        }
        let mut child = node.down;
        while child != 0 {
            self.encode_value(child, w)?;
            child = self.nodes[child - 1].next;
        }
        Ok(())
    }

    /// Array frame: size, count, optional descriptor, then one shared
    /// element code. The element code is written even when there are no
    /// data elements, so the element type survives a round-trip.
    fn encode_array(
        &self,
        nd: usize,
        with_code: bool,
        w: &mut ByteWriter<'_>,
    ) -> Result<(), CodecError> {
        let node = &self.nodes[nd - 1];
        let (body, count) = self.array_body(nd)?;
        let element = node.element_type.wide_code()?;
        let short = with_code && count <= SHORT_MAX && body + 1 <= SHORT_MAX;
        if with_code {
            w.write_u8(if short { TypeCode::Array8 } else { TypeCode::Array32 }.into())?;
        }
        if short {
            w.write_u8((body + 1) as u8)?;
            w.write_u8(count as u8)?;
        } else {
            w.write_u32((body + 4) as u32)?;
            w.write_u32(count as u32)?;
        }

        let mut child = node.down;
        if node.described {
            w.write_u8(TypeCode::Described.into())?;
            self.encode_value(child, w)?;
            child = self.nodes[child - 1].next;
        }
        w.write_u8(element.into())?;
        while child != 0 {
            self.encode_element(child, w)?;
            child = self.nodes[child - 1].next;
        }
        Ok(())
    }

    /// One array element: payload only, in the wide layout the shared
    /// element code advertises.
    fn encode_element(&self, nd: usize, w: &mut ByteWriter<'_>) -> Result<(), CodecError> {
        let node = &self.nodes[nd - 1];
        match node.value {
            NodeValue::Null => Ok(()),
            NodeValue::Bool(v) => w.write_u8(v as u8),
            NodeValue::Ubyte(v) => w.write_u8(v),
            NodeValue::Byte(v) => w.write_i8(v),
            NodeValue::Ushort(v) => w.write_u16(v),
            NodeValue::Short(v) => w.write_i16(v),
            NodeValue::Uint(v) => w.write_u32(v),
            NodeValue::Int(v) => w.write_i32(v),
            NodeValue::Char(c) => w.write_u32(c as u32),
            NodeValue::Ulong(v) => w.write_u64(v),
            NodeValue::Long(v) => w.write_i64(v),
            NodeValue::Timestamp(t) => w.write_i64(t.millis()),
            NodeValue::Float(v) => w.write_f32(v.into_inner()),
            NodeValue::Double(v) => w.write_f64(v.into_inner()),
            NodeValue::Decimal32(d) => w.write_u32(d.0),
            NodeValue::Decimal64(d) => w.write_u64(d.0),
            NodeValue::Decimal128(d) => w.write_bytes(&d.0),
            NodeValue::Uuid(u) => w.write_bytes(u.as_bytes()),
            NodeValue::Binary(span) | NodeValue::String(span) | NodeValue::Symbol(span) => {
                w.write_var32(self.bytes(span))
            }
            NodeValue::List => self.encode_compound(nd, TypeCode::List8, TypeCode::List32, false, w),
            NodeValue::Map => self.encode_compound(nd, TypeCode::Map8, TypeCode::Map32, false, w),
            NodeValue::Array => self.encode_array(nd, false, w),
            NodeValue::Described => Err(CodecError::arg("described is not an array element type")),
        }
    }
}

fn compound_overhead(body: usize, count: usize) -> usize {
    if count <= SHORT_MAX && body + 1 <= SHORT_MAX {
        2 + body
    } else {
        8 + body
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::data::{AmqpData, FillArg};
    use crate::error::CodecError;
    use crate::types::AmqpType;

    #[test]
    fn described_list_wire_prefix() {
        let mut data = AmqpData::new();
        data.fill(
            "DL[SSI]",
            &[
                FillArg::Ulong(0x70),
                FillArg::Str("hello"),
                FillArg::Str("world"),
                FillArg::Uint(42),
            ],
        )
        .unwrap();
        let bytes = data.encode_vec().unwrap();
        assert_eq!(
            bytes,
            vec![
                0x00, 0x53, 0x70, // descriptor: smallulong 0x70
                0xc0, 0x11, 0x03, // list8, size 17, count 3
                0xa1, 0x05, b'h', b'e', b'l', b'l', b'o', // "hello"
                0xa1, 0x05, b'w', b'o', b'r', b'l', b'd', // "world"
                0x52, 0x2a, // smalluint 42
            ]
        );
    }

    #[test]
    fn array_shares_one_wide_element_code() {
        let mut data = AmqpData::new();
        data.fill(
            "@T[III]",
            &[
                FillArg::Type(AmqpType::Uint),
                FillArg::Uint(1),
                FillArg::Uint(2),
                FillArg::Uint(3),
            ],
        )
        .unwrap();
        let bytes = data.encode_vec().unwrap();
        assert_eq!(
            bytes,
            vec![
                0xe0, 0x0e, 0x03, 0x70, // array8, size 14, count 3, element uint
                0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03,
            ]
        );

        let mut back = AmqpData::new();
        back.decode_all(&bytes).unwrap();
        assert_eq!(back, data);
        back.rewind();
        assert!(back.next());
        assert_eq!(back.get_array_type(), Some(AmqpType::Uint));
        assert_eq!(back.get_array(), Some(3));
    }

    #[test]
    fn empty_list_encodes_as_single_byte() {
        let mut data = AmqpData::new();
        data.put_list().unwrap();
        assert_eq!(data.encode_vec().unwrap(), vec![0x45]);
    }

    #[test]
    fn descriptor_only_array_keeps_element_code() {
        let mut data = AmqpData::new();
        data.put_array(true, AmqpType::Uint).unwrap();
        data.enter();
        data.put_uint(0x10).unwrap();
        data.exit();

        let bytes = data.encode_vec().unwrap();
        assert_eq!(
            bytes,
            vec![
                0xe0, 0x05, 0x00, // array8, size 5, zero data elements
                0x00, 0x52, 0x10, // descriptor: smalluint 0x10
                0x70, // element code survives
            ]
        );

        let mut back = AmqpData::new();
        back.decode_all(&bytes).unwrap();
        back.rewind();
        assert!(back.next());
        assert!(back.is_array_described());
        assert_eq!(back.get_array_type(), Some(AmqpType::Uint));
        assert_eq!(back.get_array(), Some(0));
        assert_eq!(back, data);
    }

    #[test]
    fn list_size_boundary_short_vs_long() {
        // 254 one-byte elements: body = 255, still short
        let mut short = AmqpData::new();
        short.put_list().unwrap();
        short.enter();
        for _ in 0..254 {
            short.put_bool(false).unwrap();
        }
        short.exit();
        let bytes = short.encode_vec().unwrap();
        assert_eq!(bytes[0], 0xc0);
        assert_eq!(bytes[1], 0xff);
        assert_eq!(bytes[2], 0xfe);
        assert_eq!(bytes.len(), 3 + 254);

        // one more element pushes the body past the u8 size field
        let mut long = AmqpData::new();
        long.put_list().unwrap();
        long.enter();
        for _ in 0..255 {
            long.put_bool(false).unwrap();
        }
        long.exit();
        let bytes = long.encode_vec().unwrap();
        assert_eq!(bytes[0], 0xd0);
        assert_eq!(&bytes[1..9], &[0, 0, 1, 3, 0, 0, 0, 255]);
        assert_eq!(bytes.len(), 9 + 255);

        let mut back = AmqpData::new();
        back.decode_all(&bytes).unwrap();
        assert_eq!(back, long);
    }

    #[test]
    fn fixed_buffer_overflow_reports_shortfall() {
        let mut data = AmqpData::new();
        data.put_string("a string that will not fit").unwrap();
        let mut buf = [0u8; 4];
        match data.encode(&mut buf) {
            Err(CodecError::Overflow(needed)) => assert!(needed > 0),
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn structural_violations_halt_encoding() {
        let mut described = AmqpData::new();
        described.put_described().unwrap();
        described.enter();
        described.put_ulong(1).unwrap();
        described.exit();
        assert!(matches!(
            described.encode_vec(),
            Err(CodecError::Invalid(_))
        ));

        let mut map = AmqpData::new();
        map.put_map().unwrap();
        map.enter();
        map.put_string("key-without-value").unwrap();
        map.exit();
        assert!(matches!(map.encode_vec(), Err(CodecError::Invalid(_))));
    }
}
