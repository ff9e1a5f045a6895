mod exit;
mod logging;

use std::future::Future;

use clap::Parser;
use lodestone_server::{Server, ServerConfig};
use lodestone_transport::DEFAULT_ENDPOINT;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::exit::{internal_error, server_error, CliError, CliResult, SUCCESS};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "lodestone", version, about = "Local-socket protobuf compute server")]
struct Cli {
    /// Endpoint name (placed in the temp dir) or socket path.
    #[arg(
        long,
        value_name = "NAME",
        env = "LODESTONE_SOCKET",
        default_value = DEFAULT_ENDPOINT
    )]
    socket: String,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: &Cli) -> CliResult<i32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| internal_error("runtime setup failed", err))?;

    runtime.block_on(async {
        let server = Server::bind(ServerConfig::from_endpoint_name(&cli.socket))
            .map_err(|err| server_error("bind failed", err))?;
        let shutdown = shutdown_signal()?;
        server.run_until(shutdown).await;
        Ok::<_, CliError>(SUCCESS)
    })
}

/// Resolves on SIGINT or SIGTERM.
fn shutdown_signal() -> CliResult<impl Future<Output = ()>> {
    let mut terminate = signal(SignalKind::terminate())
        .map_err(|err| internal_error("signal handler setup failed", err))?;

    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    })
}
