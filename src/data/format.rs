//! Text rendering of a tree: `Display`, `format` and `print`.

use std::fmt;

use super::{AmqpData, NodeValue};

impl AmqpData {
    /// The tree as text, top-level values space-separated.
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// Write the formatted tree to stdout.
    pub fn print(&self) {
        println!("{self}");
    }

    fn fmt_node(&self, nd: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[nd - 1];
        match node.value {
            NodeValue::Null => f.write_str("null"),
            NodeValue::Bool(v) => f.write_str(if v { "true" } else { "false" }),
            NodeValue::Ubyte(v) => write!(f, "{v}"),
            NodeValue::Byte(v) => write!(f, "{v}"),
            NodeValue::Ushort(v) => write!(f, "{v}"),
            NodeValue::Short(v) => write!(f, "{v}"),
            NodeValue::Uint(v) => write!(f, "{v}"),
            NodeValue::Int(v) => write!(f, "{v}"),
            NodeValue::Char(v) => write!(f, "{v}"),
            NodeValue::Ulong(v) => write!(f, "{v}"),
            NodeValue::Long(v) => write!(f, "{v}"),
            NodeValue::Timestamp(t) => write!(f, "{}", t.millis()),
            NodeValue::Float(v) => write!(f, "{v}"),
            NodeValue::Double(v) => write!(f, "{v}"),
            NodeValue::Decimal32(d) => write!(f, "D32({})", d.0),
            NodeValue::Decimal64(d) => write!(f, "D64({})", d.0),
            NodeValue::Decimal128(d) => {
                f.write_str("D128(")?;
                for byte in d.0 {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str(")")
            }
            NodeValue::Uuid(u) => write!(f, "UUID({u})"),
            NodeValue::Binary(span) => {
                f.write_str("b\"")?;
                quote_bytes(self.bytes(span), f)?;
                f.write_str("\"")
            }
            NodeValue::String(span) => {
                f.write_str("\"")?;
                quote_bytes(self.bytes(span), f)?;
                f.write_str("\"")
            }
            NodeValue::Symbol(span) => {
                let bytes = self.bytes(span);
                f.write_str(":")?;
                if bytes.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_')
                    && !bytes.is_empty()
                {
                    quote_bytes(bytes, f)
                } else {
                    f.write_str("\"")?;
                    quote_bytes(bytes, f)?;
                    f.write_str("\"")
                }
            }
            NodeValue::Described => {
                let descriptor = node.down;
                f.write_str("@")?;
                if descriptor != 0 {
                    self.fmt_node(descriptor, f)?;
                    let value = self.nodes[descriptor - 1].next;
                    if value != 0 {
                        f.write_str(" ")?;
                        self.fmt_node(value, f)?;
                    }
                }
                Ok(())
            }
            NodeValue::List => {
                f.write_str("[")?;
                self.fmt_children(node.down, ", ", f)?;
                f.write_str("]")
            }
            NodeValue::Map => {
                f.write_str("{")?;
                let mut child = node.down;
                let mut index = 0usize;
                while child != 0 {
                    if index > 0 {
                        f.write_str(if index % 2 == 0 { ", " } else { "=" })?;
                    }
                    self.fmt_node(child, f)?;
                    child = self.nodes[child - 1].next;
                    index += 1;
                }
                f.write_str("}")
            }
            NodeValue::Array => {
                let mut child = node.down;
                if node.described {
                    f.write_str("@")?;
                    if child != 0 {
                        self.fmt_node(child, f)?;
                        child = self.nodes[child - 1].next;
                    }
                    f.write_str(" ")?;
                }
                write!(f, "@{}[", node.element_type)?;
                self.fmt_children(child, ", ", f)?;
                f.write_str("]")
            }
        }
    }

    fn fmt_children(
        &self,
        first: usize,
        separator: &str,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut child = first;
        while child != 0 {
            if child != first {
                f.write_str(separator)?;
            }
            self.fmt_node(child, f)?;
            child = self.nodes[child - 1].next;
        }
        Ok(())
    }
}

/// Printable bytes pass through; quotes, backslashes and everything else
/// become escapes.
fn quote_bytes(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for &byte in bytes {
        match byte {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            0x20..=0x7e => write!(f, "{}", byte as char)?,
            _ => write!(f, "\\x{byte:02x}")?,
        }
    }
    Ok(())
}

impl fmt::Display for AmqpData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nd = if self.nodes.is_empty() { 0 } else { 1 };
        while nd != 0 {
            self.fmt_node(nd, f)?;
            nd = self.nodes[nd - 1].next;
            if nd != 0 {
                f.write_str(" ")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::data::{AmqpData, FillArg};
    use crate::types::AmqpType;

    #[test]
    fn described_list_rendering() {
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
        assert_eq!(data.format(), "@112 [\"hello\", \"world\", 42]");
    }

    #[test]
    fn symbols_quote_non_identifier_bytes() {
        let mut data = AmqpData::new();
        data.fill(
            "sss",
            &[
                FillArg::Symbol("accepted_1"),
                FillArg::Symbol("amqp:accepted:list"),
                FillArg::Symbol(""),
            ],
        )
        .unwrap();
        assert_eq!(data.format(), ":accepted_1 :\"amqp:accepted:list\" :\"\"");
    }

    #[test]
    fn maps_arrays_and_escapes() {
        let mut data = AmqpData::new();
        data.fill(
            "{Si}@T[II]z",
            &[
                FillArg::Str("k"),
                FillArg::Int(-1),
                FillArg::Type(AmqpType::Uint),
                FillArg::Uint(1),
                FillArg::Uint(2),
                FillArg::Binary(b"\x00a\"b"),
            ],
        )
        .unwrap();
        assert_eq!(
            data.format(),
            "{\"k\"=-1} @uint[1, 2] b\"\\x00a\\\"b\""
        );
    }

    #[test]
    fn described_array_names_descriptor_and_type() {
        let mut data = AmqpData::new();
        data.put_array(true, AmqpType::Uint).unwrap();
        data.enter();
        data.put_symbol("window").unwrap();
        data.put_uint(3).unwrap();
        data.exit();
        assert_eq!(data.format(), "@:window @uint[3]");
    }
}
