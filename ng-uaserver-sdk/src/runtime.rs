//! Registration contract of the server runtime.
//!
//! The runtime owns protocol encoding, the address-space store, sessions and
//! transport. Application code only registers nodes and then hands control to
//! [`ServerRuntime::serve`], which returns once the [`RunningFlag`] is cleared.
use crate::{BuiltinType, DataSourceBinding, NGValue, ValueShape};
use async_trait::async_trait;
use ng_uaserver_error::NGResult;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Identity of a node.
///
/// `Numeric` and `String` keys live in the application namespace; the
/// runtime resolves its index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// The standard `Objects` folder.
    ObjectsFolder,
    Numeric(u32),
    String(Arc<str>),
}

impl NodeKey {
    pub fn string(s: impl AsRef<str>) -> Self {
        NodeKey::String(Arc::from(s.as_ref()))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::ObjectsFolder => f.write_str("Objects"),
            NodeKey::Numeric(id) => write!(f, "i={id}"),
            NodeKey::String(s) => write!(f, "s={s}"),
        }
    }
}

/// A plain grouping node, organized under `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub id: NodeKey,
    pub browse_name: String,
    pub parent: NodeKey,
}

/// Initial value of a static variable.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
    Value(NGValue),
    /// The builtin type's default, as a scalar or a fixed-length array.
    Default {
        data_type: BuiltinType,
        shape: ValueShape,
    },
}

impl StaticValue {
    pub fn data_type(&self) -> BuiltinType {
        match self {
            StaticValue::Value(v) => v.data_type(),
            StaticValue::Default { data_type, .. } => *data_type,
        }
    }
}

/// A variable holding a static value, organized under `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode {
    pub id: NodeKey,
    pub browse_name: String,
    pub parent: NodeKey,
    pub value: StaticValue,
}

/// A variable whose value is produced by a [`DataSourceBinding`].
#[derive(Debug, Clone)]
pub struct DataSourceNode {
    pub id: NodeKey,
    pub parent: NodeKey,
    pub binding: DataSourceBinding,
}

impl DataSourceNode {
    #[inline]
    pub fn browse_name(&self) -> &str {
        self.binding.name()
    }
}

/// Process-wide running state.
///
/// Set once at construction, cleared at most once by the interrupt path and
/// only read everywhere else.
#[derive(Debug, Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Status returned by the runtime's serve loop (a 32-bit protocol status code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeStatus(u32);

impl ServeStatus {
    pub const GOOD: ServeStatus = ServeStatus(0);
    pub const BAD_INTERNAL_ERROR: ServeStatus = ServeStatus(0x8002_0000);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Severity bits are `00` for good codes.
    #[inline]
    pub const fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Process exit code carrying this status.
    ///
    /// Exit codes are a single byte, so a bad status keeps its sub-code byte
    /// and is never reported as 0.
    pub fn exit_code(self) -> u8 {
        if self.is_good() {
            return 0;
        }
        match ((self.0 >> 16) & 0xFF) as u8 {
            0 => 1,
            code => code,
        }
    }
}

/// The external server runtime as seen by the lifecycle controller.
#[async_trait]
pub trait ServerRuntime: Send {
    fn add_object(&mut self, node: ObjectNode) -> NGResult<()>;

    fn add_variable(&mut self, node: VariableNode) -> NGResult<()>;

    fn add_data_source_variable(&mut self, node: DataSourceNode) -> NGResult<()>;

    /// Run protocol processing until `running` is cleared.
    ///
    /// The flag is checked between processing iterations. Consumes the
    /// runtime, so the instance is released when this returns.
    async fn serve(self, running: RunningFlag) -> ServeStatus
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_flag_is_shared_between_clones() {
        let flag = RunningFlag::new();
        let observer = flag.clone();
        assert!(observer.is_running());
        flag.stop();
        assert!(!observer.is_running());
    }

    #[test]
    fn exit_code_keeps_sub_code_byte() {
        assert_eq!(ServeStatus::GOOD.exit_code(), 0);
        assert_eq!(ServeStatus::BAD_INTERNAL_ERROR.exit_code(), 0x02);
        assert_eq!(ServeStatus::from_bits(0x8000_0000).exit_code(), 1);
        assert!(!ServeStatus::from_bits(0x8000_0000).is_good());
    }

    #[test]
    fn node_keys_display_like_protocol_ids() {
        assert_eq!(NodeKey::Numeric(50000).to_string(), "i=50000");
        assert_eq!(NodeKey::string("the.answer").to_string(), "s=the.answer");
    }
}
