use chrono::Utc;
use ng_uaserver_sdk::{
    reject_scalar_selector, BuiltinType, DataSource, DataSourceResult, NGValue, Selector, Snapshot,
};

/// Read-only source backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub const NAME: &'static str = "current time";
}

impl DataSource for SystemClock {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn data_type(&self) -> BuiltinType {
        BuiltinType::DateTime
    }

    fn read(
        &self,
        selector: Option<&Selector>,
        source_timestamp: bool,
    ) -> DataSourceResult<Snapshot<'_>> {
        if let Some(rejected) = reject_scalar_selector(selector) {
            return Ok(rejected);
        }
        let now = Utc::now();
        let snapshot = Snapshot::new(NGValue::Timestamp(now));
        Ok(if source_timestamp {
            snapshot.with_source_timestamp(now)
        } else {
            snapshot
        })
    }
}
