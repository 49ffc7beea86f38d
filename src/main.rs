use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pullrequestd::bootstrap::bootstrap;
use pullrequestd::cache::DependencyCache;
use pullrequestd::config::Config;
use pullrequestd::github::GitHubHost;
use pullrequestd::server::{AppState, Security, build_router};

/// Caches cross-repository pull request dependencies declared in PR descriptions.
#[derive(Parser)]
#[command(name = "pullrequestd", version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bootstrap the cache and serve webhooks and snapshots
    Start {
        /// Path to the JSON config file
        #[arg(short, long, value_parser = existing_file)]
        config: PathBuf,
    },

    /// Print version
    Version,
}

fn existing_file(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{raw} does not exist or is not a file"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            println!("pullrequestd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Start { config } => start(&config).await,
    }
}

async fn start(config_path: &Path) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pullrequestd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(config_path)?;
    let depends_on = &config.pull_request_depends_on;
    let filter = depends_on.filter();

    let host = GitHubHost::from_token(
        config.github_token.clone(),
        depends_on.owner.clone(),
        depends_on.organization,
    )
    .context("failed to build GitHub client")?
    .with_retries(config.bootstrap_retries);

    let cache = DependencyCache::new();
    info!(owner = %host.owner(), "Bootstrapping dependency cache");
    bootstrap(&host, &filter, &cache).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port()?));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, tracked = cache.len(), "Listening");

    let state = AppState::new(cache, filter, Security::from_config(&config));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
            }
        }
    });

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;

    Ok(())
}
