//! The `scan` mini-language: walk the tree against a format string and
//! report, per code, whether it matched and what it read.

use super::AmqpData;
use crate::error::CodecError;
use crate::types::{AmqpType, Symbol, Timestamp};

/// Value read by one scan code.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanValue {
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
    Binary(Vec<u8>),
    String(String),
    Symbol(Symbol),
    /// Subtree extracted by the `C` code.
    Tree(AmqpData),
}

/// Outcome of one cursor-consuming scan code. Container codes and `.`
/// carry no value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanField {
    pub found: bool,
    pub value: Option<ScanValue>,
}

/// One field per cursor-consuming code, in format order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    fields: Vec<ScanField>,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the i-th cursor-consuming code matched.
    pub fn found(&self, index: usize) -> bool {
        self.fields.get(index).map_or(false, |field| field.found)
    }

    pub fn get(&self, index: usize) -> Option<&ScanValue> {
        self.fields.get(index)?.value.as_ref()
    }

    pub fn fields(&self) -> &[ScanField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<ScanField> {
        self.fields
    }

    fn push(&mut self, found: bool, value: Option<ScanValue>) {
        self.fields.push(ScanField { found, value });
    }
}

/// Skip state for a missing container or descriptor: the structural codes
/// that would have matched inside it are consumed without moving the
/// cursor. Only codes at the level the miss occurred count down.
struct Suspense {
    remaining: usize,
    level: usize,
}

fn tick(suspense: &mut Option<Suspense>, level: usize) {
    if let Some(state) = suspense {
        if state.level == level {
            state.remaining -= 1;
            if state.remaining == 0 {
                *suspense = None;
            }
        }
    }
}

impl AmqpData {
    /// Rewind and walk the tree against `fmt`, returning one field per
    /// cursor-consuming code. A missed container suspends its inner codes
    /// (1 for `[`/`{`, 3 for `D`/`@`) so later fields stay aligned.
    pub fn scan(&mut self, fmt: &str) -> Result<ScanResult, CodecError> {
        self.rewind();
        let mut out = ScanResult::default();
        let mut suspense: Option<Suspense> = None;
        let mut level = 0usize;
        let mut in_array = false;
        let mut chars = fmt.chars().peekable();

        while let Some(code) = chars.next() {
            let suspended = suspense.is_some();
            match code {
                'n' => {
                    let found = self.scan_next(suspended) && self.is_null();
                    out.push(found, found.then_some(ScanValue::Null));
                    tick(&mut suspense, level);
                }
                'o' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_bool().map(ScanValue::Bool)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'B' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_ubyte().map(ScanValue::Ubyte)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'b' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_byte().map(ScanValue::Byte)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'H' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_ushort().map(ScanValue::Ushort)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'h' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_short().map(ScanValue::Short)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'I' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_uint().map(ScanValue::Uint)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'i' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_int().map(ScanValue::Int)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'c' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_char().map(ScanValue::Char)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'L' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_ulong().map(ScanValue::Ulong)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'l' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_long().map(ScanValue::Long)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                't' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_timestamp().map(ScanValue::Timestamp)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'f' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_float().map(ScanValue::Float)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'd' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_double().map(ScanValue::Double)
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'z' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_binary().map(|b| ScanValue::Binary(b.to_vec()))
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'S' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_string().map(|s| ScanValue::String(s.to_string()))
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                's' => {
                    let value = self.scan_value(suspended, |data| {
                        data.get_symbol().map(|s| ScanValue::Symbol(Symbol::from(s)))
                    });
                    out.push(value.is_some(), value);
                    tick(&mut suspense, level);
                }
                'D' => {
                    let found = self.scan_next(suspended) && self.is_described();
                    if found {
                        self.enter();
                    } else if !suspended {
                        suspense = Some(Suspense {
                            remaining: 3,
                            level,
                        });
                    }
                    out.push(found, None);
                    tick(&mut suspense, level);
                }
                '@' => {
                    let found =
                        self.scan_next(suspended) && self.node_type() == Some(AmqpType::Array);
                    if found {
                        self.enter();
                        in_array = true;
                    } else if !suspended {
                        suspense = Some(Suspense {
                            remaining: 3,
                            level,
                        });
                    }
                    out.push(found, None);
                    tick(&mut suspense, level);
                }
                '[' => {
                    if in_array {
                        in_array = false;
                        out.push(true, None);
                    } else {
                        let found =
                            self.scan_next(suspended) && self.node_type() == Some(AmqpType::List);
                        if found {
                            self.enter();
                        } else if !suspended {
                            suspense = Some(Suspense {
                                remaining: 1,
                                level,
                            });
                        }
                        out.push(found, None);
                    }
                    level += 1;
                }
                '{' => {
                    let found =
                        self.scan_next(suspended) && self.node_type() == Some(AmqpType::Map);
                    if found {
                        self.enter();
                    } else if !suspended {
                        suspense = Some(Suspense {
                            remaining: 1,
                            level,
                        });
                    }
                    out.push(found, None);
                    level += 1;
                }
                ']' | '}' => {
                    if level == 0 {
                        return Err(CodecError::invalid(format!("unmatched {code:?}")));
                    }
                    level -= 1;
                    if !suspended && !self.exit() {
                        return Err(CodecError::invalid("exit failed"));
                    }
                    tick(&mut suspense, level);
                }
                '.' => {
                    let found = self.scan_next(suspended);
                    out.push(found, None);
                    tick(&mut suspense, level);
                }
                '?' => match chars.peek() {
                    None | Some(&'?') => {
                        return Err(CodecError::arg("codes must follow a ?"));
                    }
                    // every field carries its own found flag already
                    Some(_) => {}
                },
                'C' => {
                    let mut found = false;
                    let mut value = None;
                    if !suspended {
                        if let Some(nd) = self.peek() {
                            if self.nodes[nd - 1].value.tag() != AmqpType::Null {
                                let mut subtree = AmqpData::new();
                                subtree.deep_copy(self, nd)?;
                                found = true;
                                value = Some(ScanValue::Tree(subtree));
                            }
                        }
                        self.next();
                    }
                    out.push(found, value);
                    tick(&mut suspense, level);
                }
                other => {
                    return Err(CodecError::arg(format!(
                        "unrecognized scan code: {other:?}"
                    )))
                }
            }
        }

        Ok(out)
    }

    fn scan_value(
        &mut self,
        suspended: bool,
        read: impl Fn(&AmqpData) -> Option<ScanValue>,
    ) -> Option<ScanValue> {
        if self.scan_next(suspended) {
            read(self)
        } else {
            None
        }
    }

    /// Advance to the next atom, stepping out of exhausted described
    /// parents so `D<desc><value>` reads as a flat unit.
    fn scan_next(&mut self, suspended: bool) -> bool {
        if suspended {
            return false;
        }
        if self.next() {
            return true;
        }
        let parent_is_described = self
            .node(self.parent)
            .map_or(false, |parent| parent.value.tag() == AmqpType::Described);
        if parent_is_described {
            self.exit();
            self.scan_next(false)
        } else {
            false
        }
    }
}
