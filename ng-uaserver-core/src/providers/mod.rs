mod clock;
mod led;
mod sensor;

pub use clock::SystemClock;
pub use led::{LedTriggers, StatusLed};
pub use sensor::TemperatureSensor;

use ng_uaserver_error::NGResult;
use ng_uaserver_sdk::DataSourceBinding;
use serde::Deserialize;
use std::{io, path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};

/// Locations of the backing resources.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// DER-encoded server certificate, optional.
    pub certificate_path: PathBuf,
    pub temperature_path: PathBuf,
    pub led_trigger_path: PathBuf,
    pub led_brightness_path: PathBuf,
    pub led_manual_trigger: String,
    pub led_default_trigger: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let triggers = LedTriggers::default();
        Self {
            certificate_path: PathBuf::from("server_cert.der"),
            temperature_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            led_trigger_path: PathBuf::from("/sys/class/leds/led0/trigger"),
            led_brightness_path: PathBuf::from("/sys/class/leds/led0/brightness"),
            led_manual_trigger: triggers.manual,
            led_default_trigger: triggers.default,
        }
    }
}

impl ProviderConfig {
    pub fn led_triggers(&self) -> LedTriggers {
        LedTriggers {
            manual: self.led_manual_trigger.clone(),
            default: self.led_default_trigger.clone(),
        }
    }
}

/// Every value provider opened for this process.
///
/// Optional providers whose backing resource is missing are simply absent.
#[derive(Debug)]
pub struct Providers {
    clock: Arc<SystemClock>,
    sensor: Option<Arc<TemperatureSensor>>,
    led: Option<Arc<StatusLed>>,
}

impl Providers {
    /// Open providers in acquisition order: clock, sensor, LED.
    ///
    /// The sensor gets one probe read; a corrupt reading fails the whole
    /// startup, any other failure only skips the sensor.
    pub fn open(config: &ProviderConfig) -> NGResult<Self> {
        let clock = Arc::new(SystemClock);
        let sensor = Self::open_sensor(config)?;
        let led = Self::open_led(config);
        Ok(Self { clock, sensor, led })
    }

    fn open_sensor(config: &ProviderConfig) -> NGResult<Option<Arc<TemperatureSensor>>> {
        let path = &config.temperature_path;
        let sensor = match TemperatureSensor::open(path) {
            Ok(sensor) => sensor,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "No temperature sensor on this host, skipping");
                return Ok(None);
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to open temperature sensor, skipping: {}", e);
                return Ok(None);
            }
        };

        match sensor.sample() {
            Ok(celsius) => {
                info!(path = %path.display(), celsius, "Temperature sensor ready");
                Ok(Some(Arc::new(sensor)))
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!(path = %path.display(), "Temperature sensor probe failed, skipping: {}", e);
                Ok(None)
            }
        }
    }

    fn open_led(config: &ProviderConfig) -> Option<Arc<StatusLed>> {
        let (trigger, brightness) = (&config.led_trigger_path, &config.led_brightness_path);
        if !trigger.exists() && !brightness.exists() {
            debug!(path = %trigger.display(), "No status LED on this host, skipping");
            return None;
        }
        match StatusLed::open(trigger, brightness, config.led_triggers()) {
            Ok(led) => {
                info!(path = %trigger.display(), "Status LED ready");
                Some(Arc::new(led))
            }
            Err(e) => {
                warn!(
                    trigger = %trigger.display(),
                    brightness = %brightness.display(),
                    "Status LED found but not writable (run with sudo for LED access): {}",
                    e
                );
                None
            }
        }
    }

    #[inline]
    pub fn has_sensor(&self) -> bool {
        self.sensor.is_some()
    }

    #[inline]
    pub fn led(&self) -> Option<&Arc<StatusLed>> {
        self.led.as_ref()
    }

    /// Bindings for every open provider, in acquisition order.
    pub fn bindings(&self) -> Vec<DataSourceBinding> {
        let mut bindings = vec![DataSourceBinding::read_only(Arc::clone(&self.clock))];
        if let Some(sensor) = &self.sensor {
            bindings.push(DataSourceBinding::read_only(Arc::clone(sensor)));
        }
        if let Some(led) = &self.led {
            bindings.push(DataSourceBinding::read_write(Arc::clone(led)));
        }
        bindings
    }

    /// Close providers in reverse acquisition order.
    ///
    /// Returns the number of hardware providers closed, one per provider:
    /// the LED counts once for both of its files and the clock, which holds
    /// no resource, is never counted. A provider still referenced elsewhere
    /// is closed when its last reference drops instead.
    pub fn close(self) -> usize {
        let mut closed = 0;

        if let Some(led) = self.led {
            match Arc::try_unwrap(led) {
                Ok(led) => {
                    if let Err(e) = led.close() {
                        warn!("Failed to restore status LED trigger: {}", e);
                    }
                    closed += 1;
                }
                Err(_) => warn!("Status LED still in use, deferring close"),
            }
        }

        if let Some(sensor) = self.sensor {
            match Arc::try_unwrap(sensor) {
                Ok(sensor) => {
                    drop(sensor);
                    closed += 1;
                }
                Err(_) => warn!("Temperature sensor still in use, deferring close"),
            }
        }

        drop(self.clock);
        info!(closed, "Providers closed");
        closed
    }
}
