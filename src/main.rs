use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use stabler::config::Config;
use stabler::release::gateway::Gateway;
use stabler::release::gateways::HttpGateway;
use stabler::server::{AppState, run_server};

#[derive(Parser)]
#[command(name = "stabler")]
#[command(version, about = "Rollback and upgrade BlueOS to stable releases")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the catalog cache and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
    /// Refresh the stable catalog once and print the timestamp
    Sync,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let _guard = stabler::logging::init(&config.log_dir(), cli.log_json)
        .context("failed to initialize logging")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            runtime.block_on(run_server(config))
        }
        Command::Sync => runtime.block_on(async {
            let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&config)?);
            let state = AppState::new(&config, gateway);
            let timestamp = state.catalog.refresh().await?;
            println!("{}", timestamp);
            Ok::<_, anyhow::Error>(())
        }),
    }
}
