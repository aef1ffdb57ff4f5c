#![allow(dead_code)]

use async_trait::async_trait;
use ng_uaserver_core::ProviderConfig;
use ng_uaserver_error::NGResult;
use ng_uaserver_sdk::{
    AccessMode, DataSourceNode, NodeKey, ObjectNode, RunningFlag, ServeStatus, ServerRuntime,
    VariableNode,
};
use parking_lot::Mutex;
use std::{
    path::Path,
    sync::{Arc, Once},
    time::Duration,
};
use tracing::Level;

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Provider paths pointing into `dir`, where nothing exists yet.
pub fn provider_config(dir: &Path) -> ProviderConfig {
    ProviderConfig {
        certificate_path: dir.join("server_cert.der"),
        temperature_path: dir.join("temp"),
        led_trigger_path: dir.join("trigger"),
        led_brightness_path: dir.join("brightness"),
        ..Default::default()
    }
}

/// A registered data source, minus its binding.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSource {
    pub id: NodeKey,
    pub parent: NodeKey,
    pub name: String,
    pub access: AccessMode,
}

/// Everything a [`RecordingRuntime`] saw.
#[derive(Debug, Default)]
pub struct Recording {
    pub objects: Vec<ObjectNode>,
    pub variables: Vec<VariableNode>,
    pub sources: Vec<RecordedSource>,
    pub iterations: usize,
    pub served: bool,
}

type ServeHook = Box<dyn FnOnce(&[DataSourceNode]) + Send>;

/// In-memory runtime that records registrations and polls the running flag.
pub struct RecordingRuntime {
    recording: Arc<Mutex<Recording>>,
    nodes: Vec<DataSourceNode>,
    stop_after: Option<usize>,
    tick: Duration,
    on_serve: Option<ServeHook>,
}

impl RecordingRuntime {
    pub fn new() -> (Self, Arc<Mutex<Recording>>) {
        let recording = Arc::new(Mutex::new(Recording::default()));
        let runtime = Self {
            recording: Arc::clone(&recording),
            nodes: Vec::new(),
            stop_after: None,
            tick: Duration::from_millis(5),
            on_serve: None,
        };
        (runtime, recording)
    }

    /// Clear the running flag itself after `n` processing iterations.
    pub fn stop_after(mut self, n: usize) -> Self {
        self.stop_after = Some(n);
        self
    }

    /// Run `hook` against the registered data sources when serving starts.
    pub fn on_serve(mut self, hook: impl FnOnce(&[DataSourceNode]) + Send + 'static) -> Self {
        self.on_serve = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl ServerRuntime for RecordingRuntime {
    fn add_object(&mut self, node: ObjectNode) -> NGResult<()> {
        self.recording.lock().objects.push(node);
        Ok(())
    }

    fn add_variable(&mut self, node: VariableNode) -> NGResult<()> {
        self.recording.lock().variables.push(node);
        Ok(())
    }

    fn add_data_source_variable(&mut self, node: DataSourceNode) -> NGResult<()> {
        self.recording.lock().sources.push(RecordedSource {
            id: node.id.clone(),
            parent: node.parent.clone(),
            name: node.browse_name().to_string(),
            access: node.binding.access_mode(),
        });
        self.nodes.push(node);
        Ok(())
    }

    async fn serve(mut self, running: RunningFlag) -> ServeStatus {
        self.recording.lock().served = true;
        if let Some(hook) = self.on_serve.take() {
            hook(&self.nodes);
        }
        loop {
            if !running.is_running() {
                break;
            }
            let iterations = {
                let mut rec = self.recording.lock();
                rec.iterations += 1;
                rec.iterations
            };
            if self.stop_after.is_some_and(|n| iterations >= n) {
                running.stop();
            }
            tokio::time::sleep(self.tick).await;
        }
        ServeStatus::GOOD
    }
}
