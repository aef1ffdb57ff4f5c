//! Process plumbing shared by the server binary: logging, layered settings
//! and the interrupt-to-flag bridge.
pub mod logger;
pub mod settings;
pub mod shutdown;

pub use logger::Logger;
pub use ng_uaserver_error::{NGError, NGResult};
pub use settings::{LogConfig, Settings, DEFAULT_CONFIG_FILE_NAME};
pub use shutdown::install_interrupt_handler;
