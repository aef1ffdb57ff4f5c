use clap::Parser;
use ng_uaserver_common::{
    install_interrupt_handler, Logger, NGError, NGResult, Settings, DEFAULT_CONFIG_FILE_NAME,
};
use ng_uaserver_core::{load_certificate, Lifecycle, RunSummary};
use ng_uaserver_runtime::OpcuaServerRuntime;
use ng_uaserver_sdk::RunningFlag;
use std::{env::current_dir, path::PathBuf, process::ExitCode};
use tracing::{error, info};

/// NG UA Server - OPC UA server exposing host sensors and actuators
///
/// Publishes the system clock, the CPU temperature and a writable status LED
/// as live variables, next to a demo tree covering every builtin type.
#[derive(Parser)]
#[command(name = "ng-uaserver")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NG UA Server", long_about = None)]
struct Cli {
    /// Sets a custom config file with full path
    ///
    /// If not specified, the server will look for 'uaserver.toml'
    /// in the current working directory.
    #[arg(short, long, env = "NG_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Held for the whole process so buffered file logs are flushed on exit.
    let mut logger = None;

    match run(cli, &mut logger).await {
        Ok(summary) => {
            info!(
                status = %format!("{:#010x}", summary.status.bits()),
                closed = summary.closed,
                "Server stopped"
            );
            ExitCode::from(summary.status.exit_code())
        }
        Err(e) => {
            if logger.is_some() {
                error!("Server failed: {}", e);
            } else {
                eprintln!("Server failed: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, logger: &mut Option<Logger>) -> NGResult<RunSummary> {
    let config_path = match cli.config {
        Some(p) => p,
        None => {
            let dir = current_dir()
                .map_err(|e| NGError::from(format!("Failed to get current directory: {e}")))?;
            dir.join(DEFAULT_CONFIG_FILE_NAME)
        }
    };
    let settings = Settings::new(&config_path.to_string_lossy())?;

    let mut log = Logger::from_config(&settings.log)?;
    log.initialize(&settings.log)?;
    *logger = Some(log);
    info!(config = %config_path.display(), "Starting NG UA Server");

    let certificate = load_certificate(&settings.providers.certificate_path);
    let runtime = OpcuaServerRuntime::build(&settings.server, certificate.as_deref())?;

    let running = RunningFlag::new();
    install_interrupt_handler(running.clone());

    Lifecycle::new()
        .run(&settings.providers, runtime, running)
        .await
}
