use chrono::{DateTime as ChronoDateTime, Utc};
use ng_uaserver_error::{NGError, NGResult};
use ng_uaserver_sdk::{BuiltinType, DataSourceError, NGValue, Selector, StaticValue, ValueShape};
use opcua::types::{
    Array, ByteString, DataTypeId, DataValue, DateTime, DiagnosticInfo, ExpandedNodeId,
    ExtensionObject, Guid, LocalizedText, NodeId, NumericRange, QualifiedName, StatusCode,
    UAString, Variant, VariantScalarTypeId, XmlElement,
};
use std::sync::Arc;

/// Convert NGValue to OPC UA Variant.
pub fn value_to_variant(v: &NGValue) -> Variant {
    match v {
        NGValue::Boolean(x) => Variant::Boolean(*x),
        NGValue::Int8(x) => Variant::SByte(*x),
        NGValue::UInt8(x) => Variant::Byte(*x),
        NGValue::Int16(x) => Variant::Int16(*x),
        NGValue::UInt16(x) => Variant::UInt16(*x),
        NGValue::Int32(x) => Variant::Int32(*x),
        NGValue::UInt32(x) => Variant::UInt32(*x),
        NGValue::Int64(x) => Variant::Int64(*x),
        NGValue::UInt64(x) => Variant::UInt64(*x),
        NGValue::Float32(x) => Variant::Float(*x),
        NGValue::Float64(x) => Variant::Double(*x),
        NGValue::String(s) => Variant::String(UAString::from(s.as_ref())),
        NGValue::Binary(b) => Variant::ByteString(ByteString::from(b.as_ref())),
        NGValue::Timestamp(ts) => Variant::DateTime(Box::new(DateTime::from(*ts))),
    }
}

/// Convert an incoming Variant into the scalar value model.
pub fn variant_to_value(v: &Variant) -> Result<NGValue, DataSourceError> {
    Ok(match v {
        Variant::Boolean(x) => NGValue::Boolean(*x),
        Variant::SByte(x) => NGValue::Int8(*x),
        Variant::Byte(x) => NGValue::UInt8(*x),
        Variant::Int16(x) => NGValue::Int16(*x),
        Variant::UInt16(x) => NGValue::UInt16(*x),
        Variant::Int32(x) => NGValue::Int32(*x),
        Variant::UInt32(x) => NGValue::UInt32(*x),
        Variant::Int64(x) => NGValue::Int64(*x),
        Variant::UInt64(x) => NGValue::UInt64(*x),
        Variant::Float(x) => NGValue::Float32(*x),
        Variant::Double(x) => NGValue::Float64(*x),
        Variant::String(s) => NGValue::String(Arc::<str>::from(s.to_string())),
        Variant::ByteString(bs) => NGValue::Binary(bytes::Bytes::copy_from_slice(bs.as_ref())),
        Variant::DateTime(dt) => NGValue::Timestamp(ChronoDateTime::<Utc>::from(**dt)),
        other => {
            return Err(DataSourceError::UnsupportedValue {
                reason: format!("{other:?}"),
            })
        }
    })
}

pub fn map_data_type(dt: BuiltinType) -> DataTypeId {
    match dt {
        BuiltinType::Boolean => DataTypeId::Boolean,
        BuiltinType::SByte => DataTypeId::SByte,
        BuiltinType::Byte => DataTypeId::Byte,
        BuiltinType::Int16 => DataTypeId::Int16,
        BuiltinType::UInt16 => DataTypeId::UInt16,
        BuiltinType::Int32 => DataTypeId::Int32,
        BuiltinType::UInt32 => DataTypeId::UInt32,
        BuiltinType::Int64 => DataTypeId::Int64,
        BuiltinType::UInt64 => DataTypeId::UInt64,
        BuiltinType::Float => DataTypeId::Float,
        BuiltinType::Double => DataTypeId::Double,
        BuiltinType::String => DataTypeId::String,
        BuiltinType::DateTime => DataTypeId::DateTime,
        BuiltinType::Guid => DataTypeId::Guid,
        BuiltinType::ByteString => DataTypeId::ByteString,
        BuiltinType::XmlElement => DataTypeId::XmlElement,
        BuiltinType::NodeId => DataTypeId::NodeId,
        BuiltinType::ExpandedNodeId => DataTypeId::ExpandedNodeId,
        BuiltinType::StatusCode => DataTypeId::StatusCode,
        BuiltinType::QualifiedName => DataTypeId::QualifiedName,
        BuiltinType::LocalizedText => DataTypeId::LocalizedText,
        BuiltinType::ExtensionObject => DataTypeId::Structure,
        BuiltinType::DataValue => DataTypeId::DataValue,
        BuiltinType::Variant => DataTypeId::BaseDataType,
        BuiltinType::DiagnosticInfo => DataTypeId::DiagnosticInfo,
    }
}

fn scalar_type_id(dt: BuiltinType) -> VariantScalarTypeId {
    match dt {
        BuiltinType::Boolean => VariantScalarTypeId::Boolean,
        BuiltinType::SByte => VariantScalarTypeId::SByte,
        BuiltinType::Byte => VariantScalarTypeId::Byte,
        BuiltinType::Int16 => VariantScalarTypeId::Int16,
        BuiltinType::UInt16 => VariantScalarTypeId::UInt16,
        BuiltinType::Int32 => VariantScalarTypeId::Int32,
        BuiltinType::UInt32 => VariantScalarTypeId::UInt32,
        BuiltinType::Int64 => VariantScalarTypeId::Int64,
        BuiltinType::UInt64 => VariantScalarTypeId::UInt64,
        BuiltinType::Float => VariantScalarTypeId::Float,
        BuiltinType::Double => VariantScalarTypeId::Double,
        BuiltinType::String => VariantScalarTypeId::String,
        BuiltinType::DateTime => VariantScalarTypeId::DateTime,
        BuiltinType::Guid => VariantScalarTypeId::Guid,
        BuiltinType::ByteString => VariantScalarTypeId::ByteString,
        BuiltinType::XmlElement => VariantScalarTypeId::XmlElement,
        BuiltinType::NodeId => VariantScalarTypeId::NodeId,
        BuiltinType::ExpandedNodeId => VariantScalarTypeId::ExpandedNodeId,
        BuiltinType::StatusCode => VariantScalarTypeId::StatusCode,
        BuiltinType::QualifiedName => VariantScalarTypeId::QualifiedName,
        BuiltinType::LocalizedText => VariantScalarTypeId::LocalizedText,
        BuiltinType::ExtensionObject => VariantScalarTypeId::ExtensionObject,
        BuiltinType::DataValue => VariantScalarTypeId::DataValue,
        BuiltinType::Variant => VariantScalarTypeId::Variant,
        BuiltinType::DiagnosticInfo => VariantScalarTypeId::DiagnosticInfo,
    }
}

/// The builtin type's default value as a scalar Variant.
pub fn default_scalar(dt: BuiltinType) -> Variant {
    match dt {
        BuiltinType::Boolean => Variant::Boolean(false),
        BuiltinType::SByte => Variant::SByte(0),
        BuiltinType::Byte => Variant::Byte(0),
        BuiltinType::Int16 => Variant::Int16(0),
        BuiltinType::UInt16 => Variant::UInt16(0),
        BuiltinType::Int32 => Variant::Int32(0),
        BuiltinType::UInt32 => Variant::UInt32(0),
        BuiltinType::Int64 => Variant::Int64(0),
        BuiltinType::UInt64 => Variant::UInt64(0),
        BuiltinType::Float => Variant::Float(0.0),
        BuiltinType::Double => Variant::Double(0.0),
        BuiltinType::String => Variant::String(UAString::null()),
        BuiltinType::DateTime => Variant::DateTime(Box::new(DateTime::null())),
        BuiltinType::Guid => Variant::Guid(Box::new(Guid::null())),
        BuiltinType::ByteString => Variant::ByteString(ByteString::null()),
        BuiltinType::XmlElement => Variant::XmlElement(XmlElement::default()),
        BuiltinType::NodeId => Variant::NodeId(Box::new(NodeId::null())),
        BuiltinType::ExpandedNodeId => Variant::ExpandedNodeId(Box::new(ExpandedNodeId::null())),
        BuiltinType::StatusCode => Variant::StatusCode(StatusCode::Good),
        BuiltinType::QualifiedName => Variant::QualifiedName(Box::new(QualifiedName::null())),
        BuiltinType::LocalizedText => Variant::LocalizedText(Box::new(LocalizedText::null())),
        BuiltinType::ExtensionObject => Variant::ExtensionObject(ExtensionObject::null()),
        BuiltinType::DataValue => Variant::DataValue(Box::new(DataValue::default())),
        BuiltinType::Variant => Variant::Variant(Box::new(Variant::Empty)),
        BuiltinType::DiagnosticInfo => Variant::DiagnosticInfo(Box::new(DiagnosticInfo::default())),
    }
}

/// Initial Variant of a static variable.
pub fn static_variant(value: &StaticValue) -> NGResult<Variant> {
    match value {
        StaticValue::Value(v) => Ok(value_to_variant(v)),
        StaticValue::Default {
            data_type,
            shape: ValueShape::Scalar,
        } => Ok(default_scalar(*data_type)),
        StaticValue::Default {
            data_type,
            shape: ValueShape::Array(len),
        } => {
            let values = vec![default_scalar(*data_type); *len as usize];
            let array = Array::new(scalar_type_id(*data_type), values).map_err(|e| {
                NGError::RegistrationError(format!("cannot build {data_type} array: {e:?}"))
            })?;
            Ok(Variant::Array(Box::new(array)))
        }
    }
}

/// Map an OPC UA index range onto a selector.
///
/// `None` means the whole value was requested.
pub fn range_to_selector(range: &NumericRange) -> Result<Option<Selector>, DataSourceError> {
    match range {
        NumericRange::None => Ok(None),
        other => other.to_string().parse::<Selector>().map(Some),
    }
}

/// Status code reported to the client for a per-operation failure.
pub fn map_status(err: &DataSourceError) -> StatusCode {
    match err {
        DataSourceError::InvalidRange => StatusCode::BadIndexRangeInvalid,
        DataSourceError::OutOfMemory => StatusCode::BadOutOfMemory,
        DataSourceError::TypeMismatch { .. } | DataSourceError::UnsupportedValue { .. } => {
            StatusCode::BadTypeMismatch
        }
        DataSourceError::Io { .. } | DataSourceError::Corrupted { .. } => {
            StatusCode::BadInternalError
        }
    }
}
