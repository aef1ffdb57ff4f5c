use std::fmt;

/// OPC UA builtin data types in catalog order.
///
/// The discriminant is the zero-based catalog ordinal (`Boolean = 0` ..
/// `DiagnosticInfo = 24`), which is the builtin type id minus one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BuiltinType {
    Boolean = 0,
    SByte = 1,
    Byte = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,
    Float = 9,
    Double = 10,
    String = 11,
    DateTime = 12,
    Guid = 13,
    ByteString = 14,
    XmlElement = 15,
    NodeId = 16,
    ExpandedNodeId = 17,
    StatusCode = 18,
    QualifiedName = 19,
    LocalizedText = 20,
    ExtensionObject = 21,
    DataValue = 22,
    Variant = 23,
    DiagnosticInfo = 24,
}

impl BuiltinType {
    /// Every builtin type, ordered by ordinal.
    pub const ALL: [BuiltinType; 25] = [
        BuiltinType::Boolean,
        BuiltinType::SByte,
        BuiltinType::Byte,
        BuiltinType::Int16,
        BuiltinType::UInt16,
        BuiltinType::Int32,
        BuiltinType::UInt32,
        BuiltinType::Int64,
        BuiltinType::UInt64,
        BuiltinType::Float,
        BuiltinType::Double,
        BuiltinType::String,
        BuiltinType::DateTime,
        BuiltinType::Guid,
        BuiltinType::ByteString,
        BuiltinType::XmlElement,
        BuiltinType::NodeId,
        BuiltinType::ExpandedNodeId,
        BuiltinType::StatusCode,
        BuiltinType::QualifiedName,
        BuiltinType::LocalizedText,
        BuiltinType::ExtensionObject,
        BuiltinType::DataValue,
        BuiltinType::Variant,
        BuiltinType::DiagnosticInfo,
    ];

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Self-describing container types of the runtime.
    ///
    /// `Variant` would nest a value of unknown type and `DiagnosticInfo` is
    /// recursive, so neither can be instantiated generically.
    #[inline]
    pub fn is_meta(self) -> bool {
        matches!(self, BuiltinType::Variant | BuiltinType::DiagnosticInfo)
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shape of a variable's value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Scalar,
    /// One-dimensional array of fixed length.
    Array(u32),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
}
