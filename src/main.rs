use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vimond::core::config::VimondConfig;
use vimond::core::kernel::CallContext;
use vimond::core::traits::{AssetSource, OrderSource, PlatformSource};
use vimond::restapi::build_connector;

/// Upper bound on a whole command, across all of its requests
const COMMAND_DEADLINE: Duration = Duration::from_secs(10 * 60);

/// Prefix of the environment variables read for defaults
const ENV_PREFIX: &str = "VIMOND";

#[derive(Parser)]
#[command(name = "vimond", version, about = "Command line client for the Vimond REST API", long_about = None)]
struct Cli {
    /// API key and secret as <key>:<secret>
    #[arg(long, global = true)]
    auth: Option<String>,
    /// Use the staging environment instead of production
    #[arg(long, global = true, conflicts_with = "base_url")]
    stage: bool,
    /// Base URL of the API, overriding the environment
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetches one or more assets
    Assets {
        platform: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Fetches current orders for the given user
    CurrentOrders { platform: String, user_id: String },
    /// Fetches one or more orders
    Orders {
        platform: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Lists available platforms
    Platforms,
    /// Fetches video file data for the given asset(s)
    VideoFiles {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vimond: {:#}\n", err);
            eprintln!("{}", Cli::command().render_usage());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let connector = build_connector(&config)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let ctx = CallContext::with_timeout(COMMAND_DEADLINE).with_cancellation(shutdown);

    match cli.command {
        Commands::Assets { platform, ids } => {
            for id in &ids {
                let asset = connector
                    .asset(&ctx, &platform, id)
                    .await
                    .with_context(|| format!("error fetching asset ({})", id))?;
                print_json(&asset)?;
            }
        }
        Commands::CurrentOrders { platform, user_id } => {
            let orders = connector
                .current_orders(&ctx, &platform, &user_id)
                .await
                .context("error fetching current orders")?;
            print_json(&orders)?;
        }
        Commands::Orders { platform, ids } => {
            for id in &ids {
                let order = connector
                    .order(&ctx, &platform, id)
                    .await
                    .with_context(|| format!("error fetching order ({})", id))?;
                print_json(&order)?;
            }
        }
        Commands::Platforms => {
            let platforms = connector
                .platforms(&ctx)
                .await
                .context("error fetching platforms")?;
            print_json(&platforms)?;
        }
        Commands::VideoFiles { ids } => {
            for id in &ids {
                let videofiles = connector
                    .videofiles(&ctx, id)
                    .await
                    .with_context(|| format!("error fetching video file data ({})", id))?;
                print_json(&videofiles)?;
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<VimondConfig> {
    #[cfg(feature = "env-file")]
    let mut config = VimondConfig::from_env_file(ENV_PREFIX)?;
    #[cfg(not(feature = "env-file"))]
    let mut config = VimondConfig::from_env(ENV_PREFIX)?;

    if cli.stage {
        config = config.stage();
    }

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }

    if let Some(auth) = &cli.auth {
        let mut parts = auth.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(api_key), Some(secret), None) => {
                config = config.with_credentials(api_key.to_string(), secret.to_string());
            }
            _ => bail!("error parsing auth flag"),
        }
    }

    Ok(config)
}

/// One JSON document per line on stdout
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        );
    let _ = subscriber.try_init();
}
