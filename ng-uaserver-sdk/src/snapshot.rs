use crate::{DataSourceError, NGValue};
use chrono::{DateTime, Utc};
use std::fmt;

/// Anything a snapshot keeps alive until it is released, typically a guard
/// acquired in shared mode.
trait Held {}
impl<T> Held for T {}

/// One-shot capture of a provider's value for a single read cycle.
///
/// A snapshot owns its value and optionally holds a lease on the provider's
/// guard. The lease is dropped by [`Snapshot::release`] or, on every other
/// exit path, when the snapshot itself is dropped. The lifetime ties the
/// snapshot to the provider it was read from, so it cannot outlive it.
pub struct Snapshot<'a> {
    value: Option<NGValue>,
    status: Option<DataSourceError>,
    source_timestamp: Option<DateTime<Utc>>,
    lease: Option<Box<dyn Held + 'a>>,
}

impl<'a> Snapshot<'a> {
    pub fn new(value: NGValue) -> Self {
        Self {
            value: Some(value),
            status: None,
            source_timestamp: None,
            lease: None,
        }
    }

    /// A well-formed response that carries an error status and no value.
    ///
    /// Used for soft failures such as an unsupported selector: the caller can
    /// still complete its response cycle.
    pub fn rejected(status: DataSourceError) -> Self {
        Self {
            value: None,
            status: Some(status),
            source_timestamp: None,
            lease: None,
        }
    }

    pub fn with_source_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.source_timestamp = Some(ts);
        self
    }

    /// Keep `lease` alive until this snapshot is released.
    pub fn hold<L: 'a>(mut self, lease: L) -> Self {
        self.lease = Some(Box::new(lease));
        self
    }

    #[inline]
    pub fn value(&self) -> Option<&NGValue> {
        self.value.as_ref()
    }

    #[inline]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub fn status(&self) -> Option<&DataSourceError> {
        self.status.as_ref()
    }

    #[inline]
    pub fn is_good(&self) -> bool {
        self.status.is_none()
    }

    #[inline]
    pub fn source_timestamp(&self) -> Option<DateTime<Utc>> {
        self.source_timestamp
    }

    #[inline]
    pub fn is_leased(&self) -> bool {
        self.lease.is_some()
    }

    /// Drop the value and any lease.
    ///
    /// No-op when the snapshot carries no value, so calling it again (or on
    /// a rejected snapshot) never releases anything twice.
    pub fn release(&mut self) {
        if self.value.take().is_none() {
            return;
        }
        self.source_timestamp = None;
        self.lease = None;
    }
}

impl fmt::Debug for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("value", &self.value)
            .field("status", &self.status)
            .field("source_timestamp", &self.source_timestamp)
            .field("leased", &self.is_leased())
            .finish()
    }
}
