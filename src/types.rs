use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, TimeZone, Utc};
use derive_more::From;

use crate::codec::constants::TypeCode;
use crate::error::CodecError;

/// Logical AMQP 1.0 type tags.
///
/// The set is closed: every atom in a tree carries exactly one of these,
/// and every wire code in [`TypeCode`] maps onto one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmqpType {
    Null,
    Bool,
    Ubyte,
    Byte,
    Ushort,
    Short,
    Uint,
    Int,
    Char,
    Ulong,
    Long,
    Timestamp,
    Float,
    Double,
    Decimal32,
    Decimal64,
    Decimal128,
    Uuid,
    Binary,
    String,
    Symbol,
    Described,
    Array,
    List,
    Map,
}

impl AmqpType {
    pub fn name(self) -> &'static str {
        match self {
            AmqpType::Null => "null",
            AmqpType::Bool => "bool",
            AmqpType::Ubyte => "ubyte",
            AmqpType::Byte => "byte",
            AmqpType::Ushort => "ushort",
            AmqpType::Short => "short",
            AmqpType::Uint => "uint",
            AmqpType::Int => "int",
            AmqpType::Char => "char",
            AmqpType::Ulong => "ulong",
            AmqpType::Long => "long",
            AmqpType::Timestamp => "timestamp",
            AmqpType::Float => "float",
            AmqpType::Double => "double",
            AmqpType::Decimal32 => "decimal32",
            AmqpType::Decimal64 => "decimal64",
            AmqpType::Decimal128 => "decimal128",
            AmqpType::Uuid => "uuid",
            AmqpType::Binary => "binary",
            AmqpType::String => "string",
            AmqpType::Symbol => "symbol",
            AmqpType::Described => "described",
            AmqpType::Array => "array",
            AmqpType::List => "list",
            AmqpType::Map => "map",
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(
            self,
            AmqpType::Described | AmqpType::Array | AmqpType::List | AmqpType::Map
        )
    }

    /// Wire code shared by all elements of an array of this type.
    ///
    /// Array elements always use the widest encoding of their tag, so every
    /// element fits the single advertised constructor.
    pub(crate) fn wide_code(self) -> Result<TypeCode, CodecError> {
        Ok(match self {
            AmqpType::Null => TypeCode::Null,
            AmqpType::Bool => TypeCode::Boolean,
            AmqpType::Ubyte => TypeCode::UByte,
            AmqpType::Byte => TypeCode::Byte,
            AmqpType::Ushort => TypeCode::UShort,
            AmqpType::Short => TypeCode::Short,
            AmqpType::Uint => TypeCode::UInt,
            AmqpType::Int => TypeCode::Int,
            AmqpType::Char => TypeCode::Char,
            AmqpType::Ulong => TypeCode::ULong,
            AmqpType::Long => TypeCode::Long,
            AmqpType::Timestamp => TypeCode::Timestamp,
            AmqpType::Float => TypeCode::Float,
            AmqpType::Double => TypeCode::Double,
            AmqpType::Decimal32 => TypeCode::Decimal32,
            AmqpType::Decimal64 => TypeCode::Decimal64,
            AmqpType::Decimal128 => TypeCode::Decimal128,
            AmqpType::Uuid => TypeCode::Uuid,
            AmqpType::Binary => TypeCode::Binary32,
            AmqpType::String => TypeCode::String32,
            AmqpType::Symbol => TypeCode::Symbol32,
            AmqpType::List => TypeCode::List32,
            AmqpType::Map => TypeCode::Map32,
            AmqpType::Array => TypeCode::Array32,
            AmqpType::Described => {
                return Err(CodecError::arg("described is not an array element type"))
            }
        })
    }
}

impl fmt::Display for AmqpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed milliseconds since the Unix epoch.
///
/// The raw value is kept as-is so the full wire range survives a
/// round-trip; `chrono` only comes in at the conversion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn millis(self) -> i64 {
        self.0
    }

    /// `None` when the instant falls outside chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp(value.timestamp_millis())
    }
}

/// Opaque IEEE 754-2008 decimal bit patterns. The codec moves them without
/// interpreting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub struct Decimal32(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub struct Decimal64(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub struct Decimal128(pub [u8; 16]);

/// ASCII identifier drawn from a constrained domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for Symbol {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(string: String) -> Self {
        Symbol(string)
    }
}

impl From<&str> for Symbol {
    fn from(string: &str) -> Self {
        Symbol(string.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Timestamp;

    #[test]
    fn timestamp_survives_extremes() {
        assert_eq!(Timestamp(i64::MIN).millis(), i64::MIN);
        assert_eq!(Timestamp(i64::MIN).to_datetime(), None);
        let t = Timestamp(1_577_836_800_000);
        let dt = t.to_datetime().unwrap();
        assert_eq!(Timestamp::from(dt), t);
    }
}
