//! Data source contract between the server runtime and externally-backed values.
//!
//! The runtime drives three operations on behalf of protocol clients:
//! - `read`: capture a [`Snapshot`] of the current value
//! - `release`: hand the snapshot back once the response is encoded
//! - `write`: replace the value, only offered by sources that also implement [`DataSink`]
//!
//! All three may be invoked concurrently from any runtime worker thread.
use crate::{AccessMode, BuiltinType, DataSourceError, NGValue, Selector, Snapshot};
use std::{fmt, sync::Arc};

pub type DataSourceResult<T> = Result<T, DataSourceError>;

/// Read side of an externally-backed value.
pub trait DataSource: Send + Sync {
    /// Stable browse name of the node this source backs.
    fn name(&self) -> &str;

    /// Builtin type of the values produced by `read`.
    fn data_type(&self) -> BuiltinType;

    /// Capture the current value.
    ///
    /// A selector on a source that cannot be range-addressed must produce
    /// `Ok(Snapshot::rejected(InvalidRange))`, not an `Err`. When
    /// `source_timestamp` is set the snapshot carries the capture instant.
    fn read(
        &self,
        selector: Option<&Selector>,
        source_timestamp: bool,
    ) -> DataSourceResult<Snapshot<'_>>;

    /// Return a snapshot produced by `read`.
    fn release(&self, snapshot: &mut Snapshot<'_>) {
        snapshot.release();
    }
}

/// Write side of an externally-backed value.
pub trait DataSink: Send + Sync {
    fn write(&self, request: WriteRequest) -> DataSourceResult<()>;
}

/// Value delivered once to [`DataSink::write`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    value: NGValue,
    selector: Option<Selector>,
}

impl WriteRequest {
    pub fn new(value: impl Into<NGValue>) -> Self {
        Self {
            value: value.into(),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: Option<Selector>) -> Self {
        self.selector = selector;
        self
    }

    #[inline]
    pub fn value(&self) -> &NGValue {
        &self.value
    }

    #[inline]
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }
}

/// Reject any selector on a scalar source, soft-fail style.
///
/// Returns the snapshot the caller should hand back unchanged.
#[inline]
pub fn reject_scalar_selector(selector: Option<&Selector>) -> Option<Snapshot<'static>> {
    selector.map(|_| Snapshot::rejected(DataSourceError::InvalidRange))
}

/// Fail a sub-range write on a scalar sink before any state is touched.
#[inline]
pub fn ensure_whole_write(request: &WriteRequest) -> DataSourceResult<()> {
    match request.selector() {
        Some(_) => Err(DataSourceError::InvalidRange),
        None => Ok(()),
    }
}

/// A data source as registered with the runtime.
///
/// Read-only sources carry no sink at all; the absence of a sink is what
/// marks the node read-only.
#[derive(Clone)]
pub struct DataSourceBinding {
    source: Arc<dyn DataSource>,
    sink: Option<Arc<dyn DataSink>>,
}

impl DataSourceBinding {
    pub fn read_only<S>(source: Arc<S>) -> Self
    where
        S: DataSource + 'static,
    {
        Self { source, sink: None }
    }

    pub fn read_write<S>(source: Arc<S>) -> Self
    where
        S: DataSource + DataSink + 'static,
    {
        let sink: Arc<dyn DataSink> = Arc::clone(&source) as Arc<dyn DataSink>;
        Self {
            source,
            sink: Some(sink),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.source.name()
    }

    #[inline]
    pub fn data_type(&self) -> BuiltinType {
        self.source.data_type()
    }

    #[inline]
    pub fn access_mode(&self) -> AccessMode {
        if self.sink.is_some() {
            AccessMode::ReadWrite
        } else {
            AccessMode::Read
        }
    }

    #[inline]
    pub fn read(
        &self,
        selector: Option<&Selector>,
        source_timestamp: bool,
    ) -> DataSourceResult<Snapshot<'_>> {
        self.source.read(selector, source_timestamp)
    }

    #[inline]
    pub fn release(&self, snapshot: &mut Snapshot<'_>) {
        self.source.release(snapshot)
    }

    #[inline]
    pub fn sink(&self) -> Option<&dyn DataSink> {
        self.sink.as_deref()
    }
}

impl fmt::Debug for DataSourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceBinding")
            .field("name", &self.name())
            .field("data_type", &self.data_type())
            .field("access_mode", &self.access_mode())
            .finish()
    }
}
