use crate::settings::LogConfig;
use ng_uaserver_error::{NGError, NGResult};
use parking_lot::Mutex;
use std::{str::FromStr, sync::Arc};
use tracing::{subscriber::set_global_default, Level};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::DynFilterFn,
    fmt::{self},
    layer::SubscriberExt,
    Layer, Registry,
};

/// Console plus daily rolling file logging, sharing one adjustable level.
pub struct Logger {
    level: Arc<Mutex<Level>>,
    _file_guard: Option<WorkerGuard>,
}

impl Logger {
    pub fn new(level: Option<Level>) -> Self {
        Logger {
            level: Arc::new(Mutex::new(level.unwrap_or(Level::INFO))),
            _file_guard: None,
        }
    }

    /// Build a logger whose level comes from `config.level`.
    pub fn from_config(config: &LogConfig) -> NGResult<Self> {
        Ok(Self::new(Some(parse_level(&config.level)?)))
    }

    #[inline]
    pub fn set_level(&self, new_level: Level) {
        *self.level.lock() = new_level;
    }

    #[inline]
    pub fn get_level(&self) -> Level {
        *self.level.lock()
    }

    /// Install the console and file layers as the global subscriber.
    pub fn initialize(&mut self, config: &LogConfig) -> NGResult<()> {
        let file_appender = rolling::daily(&config.dir, &config.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        self._file_guard = Some(guard);

        let console_filter = {
            let level = Arc::clone(&self.level);
            DynFilterFn::new(move |metadata, _| metadata.level() <= &*level.lock())
        };

        let file_filter = {
            let level = Arc::clone(&self.level);
            DynFilterFn::new(move |metadata, _| metadata.level() <= &*level.lock())
        };

        let console_layer = {
            #[cfg(debug_assertions)]
            let layer = fmt::layer()
                .pretty()
                .with_writer(std::io::stdout)
                .with_file(true)
                .with_line_number(true);

            #[cfg(not(debug_assertions))]
            let layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_file(false)
                .with_line_number(false);

            layer.with_filter(console_filter)
        };

        let file_layer = {
            #[cfg(debug_assertions)]
            let layer = fmt::layer()
                .pretty()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);

            #[cfg(not(debug_assertions))]
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(false)
                .with_line_number(false);

            layer.with_filter(file_filter)
        };

        let subscriber = Registry::default().with(console_layer).with(file_layer);
        set_global_default(subscriber).map_err(|_| NGError::from("Failed to set logger"))?;
        Ok(())
    }
}

fn parse_level(raw: &str) -> NGResult<Level> {
    Level::from_str(raw.trim())
        .map_err(|_| NGError::ConfigurationError(format!("unknown log level '{raw}'")))
}
