use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vaani_relay::api::ApiServer;
use vaani_relay::Config;

/// Vaani - voice relay gateway for a multilingual loan assistant
#[derive(Parser)]
#[command(name = "vaani", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,vaani_relay=info",
        1 => "info,vaani_relay=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!(
        port = config.server.port,
        strategy = ?config.language.strategy,
        target = ?config.language.target,
        "starting vaani relay"
    );

    let server = ApiServer::new(&config)?;
    server.run().await?;

    Ok(())
}
