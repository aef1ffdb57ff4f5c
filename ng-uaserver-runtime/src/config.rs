use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OPC UA server endpoint and identity.
///
/// Every field has a default so an empty configuration yields a working
/// anonymous server on `opc.tcp://0.0.0.0:16664/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname / IP to bind, e.g. "0.0.0.0"
    pub host: String,

    pub port: u16,

    pub application_name: String,

    /// OPC UA application URI (must be stable).
    pub application_uri: String,

    pub product_uri: String,

    /// Namespace holding every application node.
    ///
    /// Keep this distinct from `application_uri`: the diagnostics node
    /// manager registers the application URI as its own namespace.
    pub namespace_uri: String,

    /// PKI root; the server certificate lives at `{pki_dir}/own/cert.der`.
    pub pki_dir: PathBuf,

    /// Private key path, relative to `pki_dir`.
    pub private_key_path: PathBuf,

    /// How often the serve loop checks the running flag (ms).
    pub stop_poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 16664,
            application_name: "NG UA Server".to_string(),
            application_uri: "urn:ng:uaserver".to_string(),
            product_uri: "urn:ng:uaserver".to_string(),
            namespace_uri: "urn:ng:uaserver:demo".to_string(),
            pki_dir: PathBuf::from("pki"),
            private_key_path: PathBuf::from("private/private.pem"),
            stop_poll_interval_ms: 50,
        }
    }
}
