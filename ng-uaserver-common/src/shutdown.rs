use ng_uaserver_sdk::RunningFlag;
use tokio::{signal::ctrl_c, task::JoinHandle};
use tracing::{error, info};

/// Bridge Ctrl-C (SIGINT) to the running flag.
///
/// The spawned task only clears the flag; the serve loop notices it on its
/// next poll. No other signal is handled.
pub fn install_interrupt_handler(running: RunningFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        match ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                running.stop();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    })
}
