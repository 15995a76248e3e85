//! Lectern CLI
//!
//! Runs the results API server, and optionally a demo bridge session that
//! exercises the full content-to-average data path in process.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use lectern_bridge::{channel_pair, LessonBridge};
use lectern_host::{CapabilityRouter, SessionContext};
use lectern_results::{create_router, AppState, ResultsService};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;

use config::LecternConfig;

/// Lectern - interactive lesson host
///
/// Serves the interaction-results API consumed by the content bridge's
/// persistence capability.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: lectern.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Port for the results API server (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Run one in-process bridge session before serving, printing the
    /// returned class statistics
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Lectern starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads config, optionally runs the demo session, then serves the API.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }

    if args.demo {
        run_demo_session(&config).await?;
        return Ok(());
    }

    serve(&config).await
}

/// Loads configuration from the given path or the working directory.
fn load_config(path: Option<&str>) -> anyhow::Result<LecternConfig> {
    let config = match path {
        Some(path) => LecternConfig::load_from_file(Path::new(path))?,
        None => LecternConfig::load()?,
    };
    tracing::debug!(port = config.port, "configuration loaded");
    Ok(config)
}

/// Serves the results API until interrupted.
async fn serve(config: &LecternConfig) -> anyhow::Result<()> {
    let state = AppState::new(ResultsService::new());
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "results API listening");

    axum::serve(listener, router)
        .await
        .context("results API server failed")?;
    Ok(())
}

/// Wires a channel pair, a capability router, and a bridge client, then
/// saves one score end to end.
async fn run_demo_session(config: &LecternConfig) -> anyhow::Result<()> {
    let (content, host) = channel_pair();

    let ctx = SessionContext {
        user_id: "demo-student".to_string(),
        tenant_id: None,
        lesson_id: "demo-lesson".to_string(),
        stage_id: "stage-1".to_string(),
        substage_id: "substage-1".to_string(),
        interaction_type_id: "quiz".to_string(),
    };
    let router = CapabilityRouter::new(ctx).with_limits(config.store.store_limits());
    let server = router.spawn(host);

    let bridge = LessonBridge::connect(content, config.bridge.bridge_config())
        .await
        .context("bridge never became ready")?;

    bridge.show_snack("Lesson loaded", Some(1500)).await?;
    let outcome = bridge
        .save_user_progress(80.0, true, Some(42.0), serde_json::json!({"demo": true}))
        .await?;

    println!("progress saved for {}", outcome.progress.user_id);
    println!("  attempts:  {}", outcome.progress.attempts);
    println!("  score:     {}", outcome.progress.score);
    if let Some(stats) = outcome.stats {
        println!("  average:   {}", stats.class_average);
        println!("  attempts (class): {}", stats.total_attempts);
        println!("  percentile: {}", stats.percentile);
    }

    drop(bridge);
    server.abort();
    Ok(())
}
