//! `mnemod`: memory service entry point
//!
//! `mnemod serve` runs the HTTP service (the default); `mnemod job ...` runs
//! one lifecycle job and exits, for invocation from a scheduler.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use mnemo_core::config::Settings;
use mnemo_core::types::SummaryMode;
use mnemo_service::{http, jobs, AppState};

#[derive(Parser)]
#[command(name = "mnemod", version, about = "Multi-tenant long-term memory service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Run a lifecycle job once and exit
    Job {
        #[command(subcommand)]
        job: JobCommand,
    },
}

#[derive(Subcommand)]
enum JobCommand {
    /// Summarize every active scope of a tenant
    Summarize {
        #[arg(long)]
        tenant: String,
        #[arg(long, default_value_t = 50)]
        max_entries: i64,
        /// brief | full
        #[arg(long, default_value = "brief")]
        mode: String,
    },
    /// Tag frequently referenced task outcomes as promoted
    Promote {
        #[arg(long)]
        tenant: String,
        #[arg(long, default_value_t = 3)]
        min_references: i64,
        #[arg(long, default_value_t = 30)]
        lookback_days: i32,
    },
    /// Delete old non-promoted chat turns
    Prune {
        #[arg(long)]
        tenant: String,
        #[arg(long, default_value_t = 30)]
        older_than_days: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    setup_tracing(&settings.log_level);

    info!("starting memory service");
    let state = AppState::initialize(settings).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Job { job } => run_job(&state, job).await,
    }
}

async fn serve(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.settings.host, state.settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "memory service listening");
    axum::serve(listener, http::router(state)).await?;
    Ok(())
}

async fn run_job(state: &AppState, job: JobCommand) -> Result<()> {
    match job {
        JobCommand::Summarize {
            tenant,
            max_entries,
            mode,
        } => {
            let mode = SummaryMode::parse(&mode)?;
            let created = jobs::summarize_active_scopes(state, &tenant, max_entries, mode).await?;
            info!(tenant, created = created.len(), "summarize job finished");
        }
        JobCommand::Promote {
            tenant,
            min_references,
            lookback_days,
        } => {
            let promoted =
                jobs::promote_high_value(state, &tenant, min_references, lookback_days).await?;
            info!(tenant, promoted = promoted.len(), "promote job finished");
        }
        JobCommand::Prune {
            tenant,
            older_than_days,
        } => {
            let per_scope = jobs::prune_old_chat_turns(state, &tenant, older_than_days).await?;
            let total: u64 = per_scope.values().sum();
            info!(tenant, total_deleted = total, "prune job finished");
        }
    }
    Ok(())
}

/// Tracing setup: `RUST_LOG` wins, then `LOG_LEVEL`, default info
///
/// Output goes to stderr so stdout stays clean for program output.
fn setup_tracing(log_level: &str) {
    use std::io;
    use tracing_subscriber::EnvFilter;

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    } else {
        let level: tracing::Level = log_level.parse().unwrap_or(tracing::Level::INFO);
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }
}
