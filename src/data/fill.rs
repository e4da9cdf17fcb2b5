//! The `fill` mini-language: append values into the tree from a format
//! string and a slice of typed arguments.

use std::iter::Peekable;
use std::slice;
use std::str::Chars;

use super::AmqpData;
use crate::error::CodecError;
use crate::types::{AmqpType, Timestamp};

/// One argument consumed by [`AmqpData::fill`], in format-string order.
///
/// `Null` stands in for an absent payload under the `z`, `S` and `s`
/// codes.
#[derive(Debug, Clone, Copy)]
pub enum FillArg<'a> {
    Null,
    Bool(bool),
    Ubyte(u8),
    Byte(i8),
    Ushort(u16),
    Short(i16),
    Uint(u32),
    Int(i32),
    Char(char),
    Ulong(u64),
    Long(i64),
    Timestamp(Timestamp),
    Float(f32),
    Double(f64),
    Binary(&'a [u8]),
    Str(&'a str),
    Symbol(&'a str),
    Symbols(&'a [&'a str]),
    Type(AmqpType),
    Tree(&'a AmqpData),
}

macro_rules! impl_fill_arg_from {
    ($variant:ident, $ty:ty) => {
        impl<'a> From<$ty> for FillArg<'a> {
            fn from(value: $ty) -> Self {
                FillArg::$variant(value)
            }
        }
    };
}

impl_fill_arg_from!(Bool, bool);
impl_fill_arg_from!(Ubyte, u8);
impl_fill_arg_from!(Byte, i8);
impl_fill_arg_from!(Ushort, u16);
impl_fill_arg_from!(Short, i16);
impl_fill_arg_from!(Uint, u32);
impl_fill_arg_from!(Int, i32);
impl_fill_arg_from!(Char, char);
impl_fill_arg_from!(Ulong, u64);
impl_fill_arg_from!(Long, i64);
impl_fill_arg_from!(Timestamp, Timestamp);
impl_fill_arg_from!(Float, f32);
impl_fill_arg_from!(Double, f64);
impl_fill_arg_from!(Binary, &'a [u8]);
impl_fill_arg_from!(Str, &'a str);
impl_fill_arg_from!(Symbols, &'a [&'a str]);
impl_fill_arg_from!(Type, AmqpType);
impl_fill_arg_from!(Tree, &'a AmqpData);

fn next_arg<'a, 'b>(
    args: &mut slice::Iter<'b, FillArg<'a>>,
    code: char,
) -> Result<&'b FillArg<'a>, CodecError> {
    args.next()
        .ok_or_else(|| CodecError::arg(format!("missing argument for fill code {code:?}")))
}

fn mismatch(code: char, arg: &FillArg<'_>) -> CodecError {
    CodecError::arg(format!("fill code {code:?} cannot take argument {arg:?}"))
}

impl AmqpData {
    /// Interpret `fmt`, consuming one argument per value code, and append
    /// the described values, containers and primitives it denotes at the
    /// cursor.
    pub fn fill(&mut self, fmt: &str, args: &[FillArg<'_>]) -> Result<(), CodecError> {
        let mut args = args.iter();
        let mut chars = fmt.chars().peekable();

        while let Some(code) = chars.next() {
            match code {
                'n' => self.put_null()?,
                'o' | 'B' | 'b' | 'H' | 'h' | 'I' | 'i' | 'c' | 'L' | 'l' | 't' | 'f' | 'd'
                | 'z' | 'S' | 's' => {
                    let arg = next_arg(&mut args, code)?;
                    self.fill_value(code, arg)?;
                }
                'D' => {
                    self.put_described()?;
                    self.enter();
                }
                '@' => self.fill_array(&mut chars, &mut args)?,
                '[' => {
                    self.put_list()?;
                    self.enter();
                }
                '{' => {
                    self.put_map()?;
                    self.enter();
                }
                ']' | '}' => {
                    if !self.exit() {
                        return Err(CodecError::invalid("exit failed"));
                    }
                }
                'T' => match next_arg(&mut args, code)? {
                    FillArg::Type(element_type) => self.set_parent_array_type(*element_type)?,
                    arg => return Err(mismatch(code, arg)),
                },
                '?' => match next_arg(&mut args, code)? {
                    FillArg::Bool(true) => {}
                    FillArg::Bool(false) => {
                        // placeholder null; whatever the next unit builds
                        // inside it is unlinked again by the auto-exit
                        self.put_null()?;
                        self.enter();
                    }
                    arg => return Err(mismatch(code, arg)),
                },
                '*' => {
                    match chars.next() {
                        Some('s') => {}
                        other => {
                            return Err(CodecError::arg(format!(
                                "unrecognized * code: {other:?}"
                            )))
                        }
                    }
                    match next_arg(&mut args, code)? {
                        FillArg::Symbols(symbols) => {
                            for symbol in *symbols {
                                self.put_symbol(symbol)?;
                            }
                        }
                        arg => return Err(mismatch(code, arg)),
                    }
                }
                'C' => match next_arg(&mut args, code)? {
                    FillArg::Tree(src) => {
                        if src.size() > 0 {
                            self.appendn(src, 1)?;
                        } else {
                            self.put_null()?;
                        }
                    }
                    arg => return Err(mismatch(code, arg)),
                },
                other => {
                    return Err(CodecError::arg(format!(
                        "unrecognized fill code: {other:?}"
                    )))
                }
            }

            self.auto_exit();
        }

        Ok(())
    }

    fn fill_value(&mut self, code: char, arg: &FillArg<'_>) -> Result<(), CodecError> {
        match (code, arg) {
            ('o', FillArg::Bool(v)) => self.put_bool(*v),
            ('B', FillArg::Ubyte(v)) => self.put_ubyte(*v),
            ('b', FillArg::Byte(v)) => self.put_byte(*v),
            ('H', FillArg::Ushort(v)) => self.put_ushort(*v),
            ('h', FillArg::Short(v)) => self.put_short(*v),
            ('I', FillArg::Uint(v)) => self.put_uint(*v),
            ('i', FillArg::Int(v)) => self.put_int(*v),
            ('c', FillArg::Char(v)) => self.put_char(*v),
            ('L', FillArg::Ulong(v)) => self.put_ulong(*v),
            ('l', FillArg::Long(v)) => self.put_long(*v),
            ('t', FillArg::Timestamp(v)) => self.put_timestamp(*v),
            ('f', FillArg::Float(v)) => self.put_float(*v),
            ('d', FillArg::Double(v)) => self.put_double(*v),
            ('z', FillArg::Binary(v)) => self.put_binary(v),
            ('S', FillArg::Str(v)) => self.put_string(v),
            ('s', FillArg::Symbol(v) | FillArg::Str(v)) => self.put_symbol(v),
            ('z' | 'S' | 's', FillArg::Null) => self.put_null(),
            (code, arg) => Err(mismatch(code, arg)),
        }
    }

    /// `@`, `@D`, `@T` and `@DT` array openers; the bracket that follows
    /// belongs to the array, not to a list.
    fn fill_array(
        &mut self,
        chars: &mut Peekable<Chars<'_>>,
        args: &mut slice::Iter<'_, FillArg<'_>>,
    ) -> Result<(), CodecError> {
        let described = matches!(chars.peek(), Some(&'D'));
        if described {
            chars.next();
        }
        self.put_array(described, AmqpType::Null)?;
        self.enter();
        if let Some(&'T') = chars.peek() {
            chars.next();
            match next_arg(args, 'T')? {
                FillArg::Type(element_type) => self.set_parent_array_type(*element_type)?,
                arg => return Err(mismatch('T', arg)),
            }
        }
        match chars.next() {
            Some('[') => Ok(()),
            _ => Err(CodecError::arg("'@' must open an array with '['")),
        }
    }

    /// Close finished described units: a described node with both children
    /// present pops automatically, and a `?`-placeholder null discards the
    /// single unit built inside it.
    fn auto_exit(&mut self) {
        loop {
            let (tag, children) = match self.node(self.parent) {
                Some(parent) => (parent.value.tag(), parent.children),
                None => return,
            };
            if tag == AmqpType::Described && children == 2 {
                self.exit();
            } else if tag == AmqpType::Null && children == 1 {
                self.exit();
                let current = self.current;
                self.nodes[current - 1].down = 0;
                self.nodes[current - 1].children = 0;
            } else {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::FillArg;
    use crate::data::AmqpData;
    use crate::error::CodecError;
    use crate::types::{AmqpType, Timestamp};

    #[test]
    fn described_unit_closes_itself() {
        let mut data = AmqpData::new();
        data.fill(
            "DL[SSI]I",
            &[
                FillArg::Ulong(0x70),
                FillArg::Str("hello"),
                FillArg::Str("world"),
                FillArg::Uint(42),
                FillArg::Uint(7),
            ],
        )
        .unwrap();

        data.rewind();
        assert!(data.next());
        assert!(data.is_described());
        assert!(data.enter());
        assert!(data.next());
        assert_eq!(data.get_ulong(), Some(0x70));
        assert!(data.next());
        assert_eq!(data.get_list(), Some(3));
        assert!(data.exit());
        // the uint after the described unit is a sibling, not a child
        assert!(data.next());
        assert_eq!(data.get_uint(), Some(7));
    }

    #[test]
    fn optional_false_collapses_to_null() {
        let mut data = AmqpData::new();
        data.fill(
            "?DL[S]I",
            &[
                FillArg::Bool(false),
                FillArg::Ulong(1),
                FillArg::Str("gone"),
                FillArg::Uint(9),
            ],
        )
        .unwrap();

        data.rewind();
        assert!(data.next());
        assert!(data.is_null());
        assert!(data.next());
        assert_eq!(data.get_uint(), Some(9));
        assert!(!data.next());
    }

    #[test]
    fn optional_true_is_transparent() {
        let mut data = AmqpData::new();
        data.fill("?o", &[FillArg::Bool(true), FillArg::Bool(true)]).unwrap();
        data.rewind();
        assert!(data.next());
        assert_eq!(data.get_bool(), Some(true));
        assert!(!data.next());
    }

    #[test]
    fn symbol_batches() {
        let mut data = AmqpData::new();
        let symbols: &[&str] = &["amqp:link:stolen", "amqp:link:redirect"];
        data.fill("@T[*s]", &[FillArg::Type(AmqpType::Symbol), FillArg::Symbols(symbols)])
            .unwrap();
        data.rewind();
        assert!(data.next());
        assert_eq!(data.get_array(), Some(2));
        assert_eq!(data.get_array_type(), Some(AmqpType::Symbol));
        data.enter();
        assert!(data.next());
        assert_eq!(data.get_symbol(), Some("amqp:link:stolen"));
    }

    #[test]
    fn subtree_argument_appends_one_value() {
        let mut body = AmqpData::new();
        body.fill("[II]", &[FillArg::Uint(1), FillArg::Uint(2)]).unwrap();

        let mut data = AmqpData::new();
        data.fill("DLC", &[FillArg::Ulong(0x77), FillArg::Tree(&body)]).unwrap();

        data.rewind();
        assert!(data.next());
        assert!(data.enter());
        assert!(data.next());
        assert_eq!(data.get_ulong(), Some(0x77));
        assert!(data.next());
        assert_eq!(data.get_list(), Some(2));

        let empty_src = AmqpData::new();
        let mut nulled = AmqpData::new();
        nulled.fill("C", &[FillArg::Tree(&empty_src)]).unwrap();
        nulled.rewind();
        assert!(nulled.next());
        assert!(nulled.is_null());
    }

    #[test]
    fn described_array_with_preset_type() {
        let mut data = AmqpData::new();
        data.fill(
            "@DT[LII]",
            &[
                FillArg::Type(AmqpType::Uint),
                FillArg::Ulong(0x53),
                FillArg::Uint(1),
                FillArg::Uint(2),
            ],
        )
        .unwrap();
        data.rewind();
        assert!(data.next());
        assert!(data.is_array_described());
        assert_eq!(data.get_array_type(), Some(AmqpType::Uint));
        assert_eq!(data.get_array(), Some(2));
    }

    #[test]
    fn timestamps_and_floats() {
        let mut data = AmqpData::new();
        data.fill(
            "tfd",
            &[
                FillArg::Timestamp(Timestamp(1234)),
                FillArg::Float(1.5),
                FillArg::Double(-0.25),
            ],
        )
        .unwrap();
        data.rewind();
        assert!(data.next());
        assert_eq!(data.get_timestamp(), Some(Timestamp(1234)));
        assert!(data.next());
        assert_eq!(data.get_float(), Some(1.5));
        assert!(data.next());
        assert_eq!(data.get_double(), Some(-0.25));
    }

    #[test]
    fn bad_codes_and_arguments_are_argument_errors() {
        let mut data = AmqpData::new();
        assert!(matches!(
            data.fill("q", &[]),
            Err(CodecError::Arg(_))
        ));
        assert!(matches!(
            data.fill("I", &[FillArg::Str("not a uint")]),
            Err(CodecError::Arg(_))
        ));
        assert!(matches!(data.fill("I", &[]), Err(CodecError::Arg(_))));
        assert!(matches!(
            data.fill("T", &[FillArg::Type(AmqpType::Uint)]),
            Err(CodecError::Invalid(_))
        ));
    }

    #[test]
    fn null_payload_stand_ins() {
        let mut data = AmqpData::new();
        data.fill("zSs", &[FillArg::Null, FillArg::Null, FillArg::Null]).unwrap();
        data.rewind();
        for _ in 0..3 {
            assert!(data.next());
            assert!(data.is_null());
        }
    }
}
