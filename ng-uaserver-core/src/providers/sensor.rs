use chrono::Utc;
use ng_uaserver_sdk::{
    reject_scalar_selector, BuiltinType, DataSource, DataSourceError, DataSourceResult, NGValue,
    Selector, Snapshot,
};
use parking_lot::Mutex;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

/// Sysfs temperature readings are short decimal strings ("48312\n").
const READ_BUFFER: usize = 32;

/// Read-only source backed by a thermal zone pseudo-file.
///
/// The file yields an integer in millidegrees Celsius on every
/// open-seek-read cycle; readings are rescaled to degrees.
#[derive(Debug)]
pub struct TemperatureSensor {
    file: Mutex<File>,
}

impl TemperatureSensor {
    pub const NAME: &'static str = "cpu temperature";

    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Take one reading in degrees Celsius.
    ///
    /// An unparsable reading yields [`DataSourceError::Corrupted`].
    pub fn sample(&self) -> DataSourceResult<f64> {
        let mut raw = Vec::new();
        raw.try_reserve(READ_BUFFER)
            .map_err(|_| DataSourceError::OutOfMemory)?;
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(0))
                .map_err(|e| DataSourceError::io(Self::NAME, e))?;
            file.read_to_end(&mut raw)
                .map_err(|e| DataSourceError::io(Self::NAME, e))?;
        }
        parse_millidegrees(&raw)
    }
}

fn parse_millidegrees(raw: &[u8]) -> DataSourceResult<f64> {
    let corrupted = || DataSourceError::Corrupted {
        provider: TemperatureSensor::NAME.to_string(),
        raw: String::from_utf8_lossy(raw).trim().to_string(),
    };
    let text = std::str::from_utf8(raw).map_err(|_| corrupted())?;
    let millis = text.trim().parse::<f64>().map_err(|_| corrupted())?;
    if !millis.is_finite() {
        return Err(corrupted());
    }
    Ok(millis / 1000.0)
}

impl DataSource for TemperatureSensor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn data_type(&self) -> BuiltinType {
        BuiltinType::Double
    }

    fn read(
        &self,
        selector: Option<&Selector>,
        source_timestamp: bool,
    ) -> DataSourceResult<Snapshot<'_>> {
        if let Some(rejected) = reject_scalar_selector(selector) {
            return Ok(rejected);
        }
        let captured_at = Utc::now();
        let snapshot = Snapshot::new(NGValue::Float64(self.sample()?));
        Ok(if source_timestamp {
            snapshot.with_source_timestamp(captured_at)
        } else {
            snapshot
        })
    }
}
