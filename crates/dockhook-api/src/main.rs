//! dockhook webhook server.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dockhook_api::{AppState, routes, startup};
use dockhook_config::{ProcessEnv, load_repositories};
use dockhook_deployer::Deployer;
use dockhook_executor::ProcessRunner;
use dockhook_preflight::{ConfigValidator, GitHubApi, SystemProbe};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dockhook-server")]
#[command(about = "Deploy Docker Compose projects on GitHub webhooks", long_about = None)]
struct Cli {
    /// Repository configuration file
    #[arg(long, env = "DOCKHOOK_CONFIG", default_value = "dockhook.kdl")]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, env = "DOCKHOOK_LISTEN", default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Directory holding the working trees
    #[arg(long, env = "DOCKHOOK_WORK_DIR", default_value = "./repositories")]
    work_dir: PathBuf,

    /// Per-stage time limit in seconds
    #[arg(long, env = "DOCKHOOK_STAGE_TIMEOUT")]
    stage_timeout: Option<u64>,

    /// Token for GitHub API probes
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[arg(long, env = "DOCKHOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Validate the environment and configuration, print the results as JSON, then exit
    #[arg(long)]
    check: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let repositories = load_repositories(&cli.config, &ProcessEnv)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let repositories = Arc::new(repositories);
    info!(count = repositories.len(), "Loaded repository configuration");

    let runner = Arc::new(ProcessRunner::new());
    let system = SystemProbe::new(runner.clone());
    let github = Arc::new(GitHubApi::new(cli.github_token.clone()));

    info!("Validating configuration");
    let validator = ConfigValidator::new(system.clone(), github, repositories.clone());
    let results = validator.validate_all().await;
    if cli.check {
        println!("{}", startup::report(&results)?);
    }
    startup::gate(&results)?;

    if cli.check {
        return Ok(());
    }

    let deployer = Deployer::new(runner, repositories, &cli.work_dir)
        .with_stage_timeout(cli.stage_timeout.map(Duration::from_secs));
    let state = AppState::new(Arc::new(deployer), system);

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    info!("Starting server on {}", cli.listen);
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
