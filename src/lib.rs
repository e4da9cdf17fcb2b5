//! AMQP 1.0 type system: navigable value trees plus the binary wire codec
//! over them (encoding table of AMQP 1.0 section 1.6).

pub mod codec;
pub mod data;
pub mod error;
pub mod types;

pub use codec::constants::TypeCode;
pub use data::{AmqpData, FillArg, Point, ScanField, ScanResult, ScanValue};
pub use error::CodecError;
pub use types::{AmqpType, Decimal128, Decimal32, Decimal64, Symbol, Timestamp};
