use config::{Config, File};
use ng_uaserver_core::ProviderConfig;
use ng_uaserver_error::NGResult;
use ng_uaserver_runtime::ServerConfig;
use serde::Deserialize;
use std::{ops::Deref, path::PathBuf, sync::Arc};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "uaserver.toml";

#[derive(Debug, Clone)]
pub struct Settings(Arc<Inner>);

impl Deref for Settings {
    type Target = Inner;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Settings {
    /// Layer the optional TOML file under `NG__`-prefixed environment variables.
    pub fn new(config_path: &str) -> NGResult<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("NG")
                    .separator("__")
                    .try_parsing(true),
            );
        let inner: Inner = builder.build()?.try_deserialize()?;
        Ok(Self(Arc::new(inner)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inner {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    pub dir: PathBuf,
    /// Prefix of the daily rolling log file.
    pub file_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("logs"),
            file_name: "uaserver.log".to_string(),
        }
    }
}
