mod datasource;
mod error;
mod guard;
mod runtime;
mod selector;
mod snapshot;
mod types;
mod value;

pub use datasource::{
    ensure_whole_write, reject_scalar_selector, DataSink, DataSource, DataSourceBinding,
    DataSourceResult, WriteRequest,
};
pub use error::DataSourceError;
pub use guard::Guard;
pub use runtime::{
    DataSourceNode, NodeKey, ObjectNode, RunningFlag, ServeStatus, ServerRuntime, StaticValue,
    VariableNode,
};
pub use selector::Selector;
pub use snapshot::Snapshot;
pub use types::{AccessMode, BuiltinType, ValueShape};
pub use value::NGValue;
