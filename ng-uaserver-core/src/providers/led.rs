use chrono::Utc;
use ng_uaserver_sdk::{
    ensure_whole_write, reject_scalar_selector, BuiltinType, DataSink, DataSource,
    DataSourceError, DataSourceResult, Guard, NGValue, Selector, Snapshot, WriteRequest,
};
use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, Seek, SeekFrom, Write},
    path::Path,
};
use tracing::{debug, warn};

/// Trigger modes written to the LED trigger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedTriggers {
    /// Mode that hands brightness control to userspace (`none`).
    pub manual: String,
    /// Mode restored on shutdown (`mmc0`).
    pub default: String,
}

impl Default for LedTriggers {
    fn default() -> Self {
        Self {
            manual: "none".to_string(),
            default: "mmc0".to_string(),
        }
    }
}

struct LedState<W> {
    status: bool,
    trigger: W,
    brightness: W,
}

/// Read-write source backed by an LED's trigger and brightness files.
///
/// Reads share the guard for as long as the snapshot lives; a write holds it
/// exclusively across the device update, so no reader ever observes a status
/// the device has not been told about yet.
pub struct StatusLed<W: Write + Seek = File> {
    guard: Guard<LedState<W>>,
    triggers: LedTriggers,
    restored: bool,
}

impl StatusLed<File> {
    /// Open both sysfs files for writing and switch the LED to manual mode.
    pub fn open(
        trigger_path: impl AsRef<Path>,
        brightness_path: impl AsRef<Path>,
        triggers: LedTriggers,
    ) -> io::Result<Self> {
        let trigger = OpenOptions::new().write(true).open(trigger_path)?;
        let brightness = OpenOptions::new().write(true).open(brightness_path)?;
        Self::with_files(trigger, brightness, triggers)
    }
}

impl<W: Write + Seek> StatusLed<W> {
    pub const NAME: &'static str = "status LED";

    /// Take over already-open trigger and brightness handles.
    ///
    /// Writes the manual trigger mode, then turns the LED off. The in-memory
    /// status starts as `false` to match. If the LED cannot be turned off the
    /// default trigger is re-armed before the error is returned.
    pub fn with_files(mut trigger: W, mut brightness: W, triggers: LedTriggers) -> io::Result<Self> {
        trigger.write_all(triggers.manual.as_bytes())?;
        trigger.flush()?;
        if let Err(e) = brightness.write_all(b"0").and_then(|()| brightness.flush()) {
            if let Err(rearm) = Self::rearm(&mut trigger, &triggers.default) {
                warn!("Failed to restore status LED trigger: {}", rearm);
            }
            return Err(e);
        }
        Ok(Self {
            guard: Guard::new(LedState {
                status: false,
                trigger,
                brightness,
            }),
            triggers,
            restored: false,
        })
    }

    #[inline]
    pub fn status(&self) -> bool {
        self.guard.read().status
    }

    /// Re-arm the default trigger mode and close both handles.
    pub fn close(mut self) -> io::Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        let state = self.guard.get_mut();
        Self::rearm(&mut state.trigger, &self.triggers.default)?;
        debug!(trigger = %self.triggers.default, "Status LED trigger restored");
        Ok(())
    }

    fn rearm(trigger: &mut W, mode: &str) -> io::Result<()> {
        trigger.seek(SeekFrom::Start(0))?;
        trigger.write_all(mode.as_bytes())?;
        trigger.flush()
    }

    fn apply(state: &mut LedState<W>, on: bool) -> io::Result<()> {
        state.trigger.seek(SeekFrom::Start(0))?;
        state.brightness.seek(SeekFrom::Start(0))?;
        state.brightness.write_all(if on { b"1" } else { b"0" })?;
        state.brightness.flush()
    }
}

impl<W: Write + Seek> Drop for StatusLed<W> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Failed to restore status LED trigger: {}", e);
        }
    }
}

impl<W: Write + Seek> fmt::Debug for StatusLed<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusLed")
            .field("triggers", &self.triggers)
            .field("restored", &self.restored)
            .finish_non_exhaustive()
    }
}

impl<W> DataSource for StatusLed<W>
where
    W: Write + Seek + Send + Sync,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn data_type(&self) -> BuiltinType {
        BuiltinType::Boolean
    }

    fn read(
        &self,
        selector: Option<&Selector>,
        source_timestamp: bool,
    ) -> DataSourceResult<Snapshot<'_>> {
        if let Some(rejected) = reject_scalar_selector(selector) {
            return Ok(rejected);
        }
        let lease = self.guard.read();
        let snapshot = Snapshot::new(NGValue::Boolean(lease.status));
        let snapshot = if source_timestamp {
            snapshot.with_source_timestamp(Utc::now())
        } else {
            snapshot
        };
        Ok(snapshot.hold(lease))
    }
}

impl<W> DataSink for StatusLed<W>
where
    W: Write + Seek + Send + Sync,
{
    fn write(&self, request: WriteRequest) -> DataSourceResult<()> {
        ensure_whole_write(&request)?;
        let on = request
            .value()
            .as_bool()
            .ok_or_else(|| DataSourceError::TypeMismatch {
                expected: BuiltinType::Boolean,
                actual: request.value().data_type(),
            })?;

        let mut state = self.guard.write();
        Self::apply(&mut state, on).map_err(|e| DataSourceError::io(Self::NAME, e))?;
        state.status = on;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        fs,
        io::Cursor,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    fn sysfs() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let trigger = dir.path().join("trigger");
        let brightness = dir.path().join("brightness");
        fs::write(&trigger, "mmc0").unwrap();
        fs::write(&brightness, "1").unwrap();
        (dir, trigger, brightness)
    }

    #[test]
    fn startup_takes_manual_control_and_turns_off() {
        let (_dir, trigger, brightness) = sysfs();
        let led = StatusLed::open(&trigger, &brightness, LedTriggers::default()).unwrap();
        assert_eq!(fs::read_to_string(&trigger).unwrap(), "none");
        assert_eq!(fs::read_to_string(&brightness).unwrap(), "0");
        assert!(!led.status());
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, trigger, brightness) = sysfs();
        let led = StatusLed::open(&trigger, &brightness, LedTriggers::default()).unwrap();

        for on in [true, false] {
            led.write(WriteRequest::new(on)).unwrap();
            assert_eq!(
                fs::read_to_string(&brightness).unwrap(),
                if on { "1" } else { "0" }
            );
            let mut snap = led.read(None, false).unwrap();
            assert_eq!(snap.value(), Some(&NGValue::Boolean(on)));
            led.release(&mut snap);
        }
    }

    #[test]
    fn source_timestamp_only_when_requested() {
        let led = StatusLed::with_files(
            Cursor::new(Vec::new()),
            Cursor::new(Vec::new()),
            LedTriggers::default(),
        )
        .unwrap();
        let mut plain = led.read(None, false).unwrap();
        assert!(plain.source_timestamp().is_none());
        led.release(&mut plain);

        let before = Utc::now();
        let mut stamped = led.read(None, true).unwrap();
        let ts = stamped.source_timestamp().unwrap();
        assert!(before <= ts && ts <= Utc::now());
        assert_eq!(stamped.value(), Some(&NGValue::Boolean(false)));
        led.release(&mut stamped);
    }

    #[test]
    fn close_restores_default_trigger() {
        let (_dir, trigger, brightness) = sysfs();
        let led = StatusLed::open(&trigger, &brightness, LedTriggers::default()).unwrap();
        led.close().unwrap();
        assert_eq!(fs::read_to_string(&trigger).unwrap(), "mmc0");
    }

    #[test]
    fn drop_restores_default_trigger() {
        let (_dir, trigger, brightness) = sysfs();
        drop(StatusLed::open(&trigger, &brightness, LedTriggers::default()).unwrap());
        assert_eq!(fs::read_to_string(&trigger).unwrap(), "mmc0");
    }

    #[test]
    fn sub_range_and_wrong_type_writes_leave_state_alone() {
        let (_dir, trigger, brightness) = sysfs();
        let led = StatusLed::open(&trigger, &brightness, LedTriggers::default()).unwrap();

        let ranged = WriteRequest::new(true).with_selector(Some(Selector::Index(0)));
        assert_eq!(led.write(ranged), Err(DataSourceError::InvalidRange));
        assert_eq!(
            led.write(WriteRequest::new(3)),
            Err(DataSourceError::TypeMismatch {
                expected: BuiltinType::Boolean,
                actual: BuiltinType::Int32,
            })
        );
        assert!(!led.status());
        assert_eq!(fs::read_to_string(&brightness).unwrap(), "0");
    }

    #[test]
    fn selector_read_is_soft_failure_without_lease() {
        let (_dir, trigger, brightness) = sysfs();
        let led = StatusLed::open(&trigger, &brightness, LedTriggers::default()).unwrap();
        let snap = led.read(Some(&Selector::Range(0, 1)), false).unwrap();
        assert_eq!(snap.status(), Some(&DataSourceError::InvalidRange));
        assert!(!snap.is_leased());
        // Nothing is held, so a write goes straight through.
        led.write(WriteRequest::new(true)).unwrap();
    }

    /// Device handle over a shared buffer that can refuse every write.
    struct Device {
        buf: Arc<parking_lot::Mutex<Cursor<Vec<u8>>>>,
        broken: bool,
    }

    impl Device {
        fn new(broken: bool) -> (Self, Arc<parking_lot::Mutex<Cursor<Vec<u8>>>>) {
            let buf = Arc::new(parking_lot::Mutex::new(Cursor::new(Vec::new())));
            (
                Self {
                    buf: Arc::clone(&buf),
                    broken,
                },
                buf,
            )
        }
    }

    impl Write for Device {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.broken {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            self.buf.lock().write(data)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for Device {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.buf.lock().seek(pos)
        }
    }

    #[test]
    fn failed_startup_rearms_default_trigger() {
        let (trigger, trigger_buf) = Device::new(false);
        let (brightness, _) = Device::new(true);

        let err = StatusLed::with_files(trigger, brightness, LedTriggers::default()).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(trigger_buf.lock().get_ref().as_slice(), b"mmc0");
    }

    /// Device handle that flags every byte it is being written.
    struct Probe {
        in_flight: Arc<AtomicBool>,
        inner: Cursor<Vec<u8>>,
    }

    impl Write for Probe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.in_flight.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_micros(200));
            let n = self.inner.write(buf)?;
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for Probe {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn readers_never_overlap_device_propagation() {
        let in_flight = Arc::new(AtomicBool::new(false));
        let probe = || Probe {
            in_flight: Arc::clone(&in_flight),
            inner: Cursor::new(Vec::new()),
        };
        let led = Arc::new(StatusLed::with_files(probe(), probe(), LedTriggers::default()).unwrap());
        let overlaps = Arc::new(AtomicUsize::new(0));

        let writer = {
            let led = Arc::clone(&led);
            thread::spawn(move || {
                for i in 0..200 {
                    led.write(WriteRequest::new(i % 2 == 0)).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let led = Arc::clone(&led);
                let in_flight = Arc::clone(&in_flight);
                let overlaps = Arc::clone(&overlaps);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let mut snap = led.read(None, false).unwrap();
                        if in_flight.load(Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        led.release(&mut snap);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
