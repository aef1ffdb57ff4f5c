pub mod certificate;
pub mod lifecycle;
pub mod node_id;
pub mod populator;
pub mod providers;

pub use certificate::load_certificate;
pub use lifecycle::{Lifecycle, LifecycleState, RunSummary};
pub use providers::{ProviderConfig, Providers};
