//! OPC UA server runtime adapter.
//!
//! Runs an in-process OPC UA server (async-opcua-server) and implements the
//! registration contract on top of it:
//! - objects and static variables go straight into the address space
//! - data-source variables get read (and, when writable, write) callbacks
//!   that drive the binding on every client request
use crate::{
    codec::{
        default_scalar, map_data_type, map_status, range_to_selector, static_variant,
        value_to_variant, variant_to_value,
    },
    config::ServerConfig,
};
use async_trait::async_trait;
use ng_uaserver_error::{NGError, NGResult};
use ng_uaserver_sdk::{
    AccessMode, DataSourceBinding, DataSourceError, DataSourceNode, NodeKey, ObjectNode,
    RunningFlag, ServeStatus, ServerRuntime, StaticValue, ValueShape, VariableNode, WriteRequest,
};
use opcua::{
    crypto::{SecurityPolicy, X509},
    server::{
        address_space::{AccessLevel, ObjectBuilder, VariableBuilder},
        diagnostics::NamespaceMetadata,
        node_manager::memory::{simple_node_manager, SimpleNodeManager},
        Server, ServerBuilder, ServerHandle, ANONYMOUS_USER_TOKEN_ID,
    },
    types::{
        DataValue, DateTime, MessageSecurityMode, NodeId, NumericRange, ObjectId, ObjectTypeId,
        StatusCode, TimestampsToReturn,
    },
};
use std::{fs, net::IpAddr, path::Path, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const ENDPOINT_PATH: &str = "/";
const OWN_CERTIFICATE: &str = "own/cert.der";

pub struct OpcuaServerRuntime {
    server: Server,
    handle: ServerHandle,
    node_manager: Arc<SimpleNodeManager>,
    namespace_index: u16,
    token: CancellationToken,
    stop_poll_interval: Duration,
}

impl OpcuaServerRuntime {
    /// Build the server without starting it.
    ///
    /// A valid certificate is installed as the server's own certificate.
    /// Without one, or when it cannot be installed, a self-signed sample
    /// keypair is generated into the PKI directory on first run. Must be
    /// called inside the Tokio runtime.
    pub fn build(config: &ServerConfig, certificate: Option<&[u8]>) -> NGResult<Self> {
        if config.port == 0 {
            return Err(NGError::ConfigurationError(
                "invalid port: must be in range 1..=65535".to_string(),
            ));
        }

        let installed = match certificate {
            Some(der) => match install_server_certificate(&config.pki_dir, der) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Ignoring server certificate, using a sample keypair: {}", e);
                    false
                }
            },
            None => false,
        };

        let token = CancellationToken::new();
        let user_token_ids: &[&str] = &[ANONYMOUS_USER_TOKEN_ID];
        let (server, handle) = ServerBuilder::new()
            .application_name(config.application_name.clone())
            .application_uri(config.application_uri.clone())
            .product_uri(config.product_uri.clone())
            .create_sample_keypair(!installed)
            .certificate_path(OWN_CERTIFICATE)
            .private_key_path(config.private_key_path.clone())
            .pki_dir(config.pki_dir.clone())
            .host(config.host.clone())
            .port(config.port)
            .discovery_urls(default_discovery_urls(&config.host, config.port, ENDPOINT_PATH))
            .add_endpoint(
                "no_security",
                (
                    ENDPOINT_PATH,
                    SecurityPolicy::None,
                    MessageSecurityMode::None,
                    user_token_ids,
                ),
            )
            .add_endpoint(
                "basic256sha256_sign_encrypt",
                (
                    ENDPOINT_PATH,
                    SecurityPolicy::Basic256Sha256,
                    MessageSecurityMode::SignAndEncrypt,
                    user_token_ids,
                ),
            )
            .default_endpoint("no_security")
            .with_node_manager(simple_node_manager(
                NamespaceMetadata {
                    namespace_uri: config.namespace_uri.clone(),
                    ..Default::default()
                },
                "ng-uaserver",
            ))
            .token(token.clone())
            .build()
            .map_err(NGError::InitializationError)?;

        let node_manager = handle
            .node_managers()
            .get_of_type::<SimpleNodeManager>()
            .ok_or_else(|| {
                NGError::InitializationError("failed to locate the application node manager".into())
            })?;
        let namespace_index = handle
            .get_namespace_index(&config.namespace_uri)
            .ok_or_else(|| {
                NGError::InitializationError(format!(
                    "namespace {} was not registered",
                    config.namespace_uri
                ))
            })?;

        info!(
            host = %config.host,
            port = config.port,
            namespace_index,
            "OPC UA server built"
        );
        Ok(Self {
            server,
            handle,
            node_manager,
            namespace_index,
            token,
            stop_poll_interval: Duration::from_millis(config.stop_poll_interval_ms.max(1)),
        })
    }

    fn node_id(&self, key: &NodeKey) -> NodeId {
        match key {
            NodeKey::ObjectsFolder => ObjectId::ObjectsFolder.into(),
            NodeKey::Numeric(id) => NodeId::new(self.namespace_index, *id),
            NodeKey::String(s) => NodeId::new(self.namespace_index, s.to_string()),
        }
    }
}

#[async_trait]
impl ServerRuntime for OpcuaServerRuntime {
    fn add_object(&mut self, node: ObjectNode) -> NGResult<()> {
        let id = self.node_id(&node.id);
        let parent = self.node_id(&node.parent);
        let mut as_write = self.node_manager.address_space().write();
        let browse = node.browse_name.as_str();
        let inserted = ObjectBuilder::new(&id, browse, browse)
            .has_type_definition(ObjectTypeId::FolderType)
            .organized_by(parent)
            .insert(&mut *as_write);
        ensure_inserted(inserted, &node.id)
    }

    fn add_variable(&mut self, node: VariableNode) -> NGResult<()> {
        let id = self.node_id(&node.id);
        let parent = self.node_id(&node.parent);
        let value = static_variant(&node.value)?;
        let access = map_access_level(AccessMode::Read);

        let browse = node.browse_name.as_str();
        let mut builder = VariableBuilder::new(&id, browse, browse)
            .data_type(map_data_type(node.value.data_type()))
            .value(value)
            .access_level(access)
            .user_access_level(access)
            .organized_by(parent);
        if let StaticValue::Default {
            shape: ValueShape::Array(len),
            ..
        } = &node.value
        {
            builder = builder.value_rank(1).array_dimensions(&[*len]);
        }

        let mut as_write = self.node_manager.address_space().write();
        ensure_inserted(builder.insert(&mut *as_write), &node.id)
    }

    fn add_data_source_variable(&mut self, node: DataSourceNode) -> NGResult<()> {
        let id = self.node_id(&node.id);
        let parent = self.node_id(&node.parent);
        let name = node.browse_name().to_string();
        let access = map_access_level(node.binding.access_mode());

        {
            let mut as_write = self.node_manager.address_space().write();
            let inserted = VariableBuilder::new(&id, name.as_str(), name.as_str())
                .data_type(map_data_type(node.binding.data_type()))
                .value(default_scalar(node.binding.data_type()))
                .access_level(access)
                .user_access_level(access)
                .organized_by(parent)
                .insert(&mut *as_write);
            ensure_inserted(inserted, &node.id)?;
        }

        let manager = self.node_manager.inner();
        let binding = node.binding.clone();
        manager.add_read_callback(id.clone(), move |range, timestamps, _max_age| {
            read_binding(&binding, range, timestamps)
        });
        if node.binding.sink().is_some() {
            let binding = node.binding;
            manager.add_write_callback(id, move |value, range| write_binding(&binding, value, range));
        }
        debug!(node = %node.id, name = %name, "Data source variable registered");
        Ok(())
    }

    async fn serve(self, running: RunningFlag) -> ServeStatus {
        let Self {
            server,
            handle,
            node_manager,
            token,
            stop_poll_interval,
            ..
        } = self;

        let watcher = tokio::spawn(watch_running_flag(running, token.clone(), stop_poll_interval));
        info!("OPC UA server running");
        let result = server.run().await;

        token.cancel();
        if let Err(e) = watcher.await {
            warn!("Running flag watcher failed: {}", e);
        }
        drop(node_manager);
        drop(handle);

        match result {
            Ok(()) => {
                info!("OPC UA server stopped");
                ServeStatus::GOOD
            }
            Err(e) => {
                error!("OPC UA server failed: {}", e);
                ServeStatus::BAD_INTERNAL_ERROR
            }
        }
    }
}

/// Cancel `token` once `running` is cleared.
///
/// Returns early when the server stops on its own.
async fn watch_running_flag(running: RunningFlag, token: CancellationToken, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                if !running.is_running() {
                    info!("Running flag cleared, stopping OPC UA server");
                    token.cancel();
                    return;
                }
            }
        }
    }
}

fn ensure_inserted(inserted: bool, key: &NodeKey) -> NGResult<()> {
    if inserted {
        Ok(())
    } else {
        Err(NGError::RegistrationError(format!(
            "node {key} already exists or its parent is missing"
        )))
    }
}

fn read_binding(
    binding: &DataSourceBinding,
    range: &NumericRange,
    timestamps: TimestampsToReturn,
) -> Result<DataValue, StatusCode> {
    let selector = match range_to_selector(range) {
        Ok(selector) => selector,
        Err(e) => return Ok(rejected_value(&e)),
    };
    let wants_source = matches!(
        timestamps,
        TimestampsToReturn::Source | TimestampsToReturn::Both
    );

    let mut snapshot = binding
        .read(selector.as_ref(), wants_source)
        .map_err(|e| operation_failed(binding.name(), e))?;
    let data_value = match snapshot.status() {
        Some(status) => rejected_value(status),
        None => DataValue {
            value: snapshot.value().map(value_to_variant),
            status: Some(StatusCode::Good),
            source_timestamp: snapshot.source_timestamp().map(DateTime::from),
            server_timestamp: Some(DateTime::now()),
            ..Default::default()
        },
    };
    binding.release(&mut snapshot);
    Ok(data_value)
}

fn rejected_value(status: &DataSourceError) -> DataValue {
    DataValue {
        value: None,
        status: Some(map_status(status)),
        server_timestamp: Some(DateTime::now()),
        ..Default::default()
    }
}

fn write_binding(binding: &DataSourceBinding, value: DataValue, range: &NumericRange) -> StatusCode {
    let Some(sink) = binding.sink() else {
        return StatusCode::BadNotWritable;
    };
    let Some(variant) = value.value else {
        return StatusCode::BadNothingToDo;
    };

    let result = range_to_selector(range).and_then(|selector| {
        let request = WriteRequest::new(variant_to_value(&variant)?).with_selector(selector);
        sink.write(request)
    });
    match result {
        Ok(()) => StatusCode::Good,
        Err(e) => operation_failed(binding.name(), e),
    }
}

/// Map a per-operation failure to its status code.
///
/// Corrupt backing data means a broken deployment: the process exits.
fn operation_failed(provider: &str, err: DataSourceError) -> StatusCode {
    if err.is_fatal() {
        error!(provider, "Fatal data source failure, terminating: {}", err);
        std::process::exit(1);
    }
    warn!(provider, "Data source operation failed: {}", err);
    map_status(&err)
}

fn map_access_level(mode: AccessMode) -> AccessLevel {
    match mode {
        AccessMode::Read => AccessLevel::CURRENT_READ,
        AccessMode::ReadWrite => AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE,
    }
}

/// Validate a DER certificate and install it as the server's own certificate.
pub fn install_server_certificate(pki_dir: &Path, der: &[u8]) -> NGResult<()> {
    X509::from_der(der).map_err(|e| {
        NGError::ConfigurationError(format!("invalid server certificate DER: {e}"))
    })?;
    let path = pki_dir.join(OWN_CERTIFICATE);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, der)?;
    info!(path = %path.display(), "Server certificate installed");
    Ok(())
}

fn default_discovery_urls(host: &str, port: u16, endpoint_path: &str) -> Vec<String> {
    // For bind-all addresses, advertise loopback (clients cannot connect to 0.0.0.0).
    let is_wildcard = matches!(host, "0.0.0.0" | "::" | "0:0:0:0:0:0:0:0");
    let path = if endpoint_path.starts_with('/') {
        endpoint_path
    } else {
        "/"
    };

    if is_wildcard {
        return vec![
            format!("opc.tcp://localhost:{port}{path}"),
            format!("opc.tcp://127.0.0.1:{port}{path}"),
            format!("opc.tcp://[::1]:{port}{path}"),
        ];
    }

    let host_for_url = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{host}]"),
        _ => host.to_string(),
    };

    vec![format!("opc.tcp://{host_for_url}:{port}{path}")]
}
