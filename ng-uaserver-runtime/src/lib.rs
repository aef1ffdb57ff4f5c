mod codec;
mod config;
mod server;

pub use config::ServerConfig;
pub use server::{install_server_certificate, OpcuaServerRuntime};
