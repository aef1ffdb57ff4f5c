use crate::BuiltinType;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A strongly-typed scalar value exchanged with providers.
///
/// # Timestamp semantics
/// `NGValue::Timestamp` carries a UTC instant; the runtime adapter converts it
/// to the protocol's 100ns tick representation.
#[derive(Clone, Debug, PartialEq)]
pub enum NGValue {
    Boolean(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(Arc<str>),
    Binary(Bytes),
    Timestamp(DateTime<Utc>),
}

impl NGValue {
    /// Return the builtin type this value is encoded as.
    #[inline]
    pub fn data_type(&self) -> BuiltinType {
        match self {
            NGValue::Boolean(_) => BuiltinType::Boolean,
            NGValue::Int8(_) => BuiltinType::SByte,
            NGValue::UInt8(_) => BuiltinType::Byte,
            NGValue::Int16(_) => BuiltinType::Int16,
            NGValue::UInt16(_) => BuiltinType::UInt16,
            NGValue::Int32(_) => BuiltinType::Int32,
            NGValue::UInt32(_) => BuiltinType::UInt32,
            NGValue::Int64(_) => BuiltinType::Int64,
            NGValue::UInt64(_) => BuiltinType::UInt64,
            NGValue::Float32(_) => BuiltinType::Float,
            NGValue::Float64(_) => BuiltinType::Double,
            NGValue::String(_) => BuiltinType::String,
            NGValue::Binary(_) => BuiltinType::ByteString,
            NGValue::Timestamp(_) => BuiltinType::DateTime,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NGValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for NGValue {
    fn from(v: bool) -> Self {
        NGValue::Boolean(v)
    }
}

impl From<i32> for NGValue {
    fn from(v: i32) -> Self {
        NGValue::Int32(v)
    }
}

impl From<f64> for NGValue {
    fn from(v: f64) -> Self {
        NGValue::Float64(v)
    }
}

impl From<DateTime<Utc>> for NGValue {
    fn from(v: DateTime<Utc>) -> Self {
        NGValue::Timestamp(v)
    }
}
