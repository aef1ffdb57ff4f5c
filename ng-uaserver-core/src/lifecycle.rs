//! Process lifecycle: open providers, register nodes, serve, tear down.
//!
//! States advance strictly forward, one step at a time:
//! `Initializing -> Running -> Draining -> Stopped`.
use crate::{
    node_id::sanitize_node_id,
    populator::populate,
    providers::{ProviderConfig, Providers},
};
use ng_uaserver_error::{NGError, NGResult};
use ng_uaserver_sdk::{
    BuiltinType, DataSourceNode, NGValue, NodeKey, RunningFlag, ServeStatus, ServerRuntime,
    StaticValue, VariableNode,
};
use std::fmt;
use tracing::{info, instrument, warn};

pub const ANSWER_NODE_ID: &str = "the.answer";
pub const ANSWER_BROWSE_NAME: &str = "the answer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Running,
    Draining,
    Stopped,
}

impl LifecycleState {
    fn next(self) -> Option<Self> {
        match self {
            LifecycleState::Initializing => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::Draining),
            LifecycleState::Draining => Some(LifecycleState::Stopped),
            LifecycleState::Stopped => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Status returned by the runtime's serve loop.
    pub status: ServeStatus,
    /// Hardware providers closed during `Stopped` (LED and sensor, one each).
    pub closed: usize,
}

#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Initializing,
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn advance(&mut self, to: LifecycleState) -> NGResult<()> {
        if self.state.next() != Some(to) {
            return Err(NGError::Msg(format!(
                "invalid lifecycle transition {} -> {}",
                self.state, to
            )));
        }
        info!(from = %self.state, to = %to, "Lifecycle transition");
        self.state = to;
        Ok(())
    }

    /// Drive the whole process lifetime around `runtime`.
    ///
    /// Fails before `Running` when a provider reports corrupt data or
    /// registration fails; providers opened so far are closed either way.
    #[instrument(name = "lifecycle-run", skip_all)]
    pub async fn run<R>(
        mut self,
        config: &ProviderConfig,
        mut runtime: R,
        running: RunningFlag,
    ) -> NGResult<RunSummary>
    where
        R: ServerRuntime,
    {
        info!("Initializing providers");
        let providers = Providers::open(config)?;

        if let Err(e) = register(&mut runtime, &providers) {
            drop(runtime);
            let closed = providers.close();
            warn!(closed, "Startup aborted: {}", e);
            return Err(e);
        }

        self.advance(LifecycleState::Running)?;
        let status = runtime.serve(running).await;

        self.advance(LifecycleState::Draining)?;
        info!(status = %format!("{:#010x}", status.bits()), "Server runtime released");

        self.advance(LifecycleState::Stopped)?;
        let closed = providers.close();
        Ok(RunSummary { status, closed })
    }
}

fn register<R>(runtime: &mut R, providers: &Providers) -> NGResult<()>
where
    R: ServerRuntime + ?Sized,
{
    for binding in providers.bindings() {
        let id = NodeKey::string(sanitize_node_id(binding.name()));
        info!(node = %id, access = ?binding.access_mode(), "Registering data source");
        runtime.add_data_source_variable(DataSourceNode {
            id,
            parent: NodeKey::ObjectsFolder,
            binding,
        })?;
    }

    runtime.add_variable(VariableNode {
        id: NodeKey::string(ANSWER_NODE_ID),
        browse_name: ANSWER_BROWSE_NAME.to_string(),
        parent: NodeKey::ObjectsFolder,
        value: StaticValue::Value(NGValue::Int32(42)),
    })?;

    populate(runtime, &BuiltinType::ALL)?;
    Ok(())
}
