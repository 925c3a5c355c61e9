use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quiz_core::model::SessionId;
use services::{AppServices, Clock};

mod cli;
mod db;
mod play;

use cli::{Cli, Command};

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("QUIZ_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Use the caller's session id, or issue a fresh unguessable one.
fn resolve_session_id(explicit: Option<&str>) -> SessionId {
    match explicit {
        Some(id) if !id.trim().is_empty() => SessionId::new(id.trim()),
        _ => {
            let id = SessionId::new(uuid::Uuid::new_v4().simple().to_string());
            eprintln!("session: {id}  (pass --session {id} to resume)");
            id
        }
    }
}

async fn build_services(cli: &Cli) -> anyhow::Result<AppServices> {
    let catalog = storage::load_catalog(&cli.catalog)
        .with_context(|| format!("cannot start without a valid catalog ({})", cli.catalog.display()))?;
    let catalog = Arc::new(catalog);
    let clock = Clock::default();

    match cli.db_url.as_deref() {
        Some(raw) => {
            let url = db::normalize_sqlite_url(raw);
            db::prepare_sqlite_file(&url)?;
            AppServices::new_sqlite(&url, catalog, clock, cli.settings())
                .await
                .with_context(|| format!("failed to open session store {url}"))
        }
        None => Ok(AppServices::in_memory(catalog, clock, cli.settings())),
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let services = build_services(&cli).await?;
    let quiz = services.quiz();
    let session_id = resolve_session_id(cli.session_id.as_deref());

    match cli.selected_command() {
        Command::Play => {
            if cli.db_url.is_none() {
                tracing::debug!("no --db given; progress lasts until the process exits");
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            play::run(&quiz, &session_id, stdin, tokio::io::stdout()).await?;
        }
        Command::Progress => {
            let summary = quiz.progress(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("quiz error: {error:#}");
        std::process::exit(1);
    }
}
