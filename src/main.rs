use anyhow::{Context, Result};
use clap::Parser;
use pylae::{
    create_router, AppState, ArtifactSink, CaptureSourceFactory, Config, ReplayController,
    ReplayService,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Instant-replay capture buffer
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/pylae")]
    config: String,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if args.debug {
        cfg.replay.debug = true;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    let default_level = if cfg.replay.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Pylae v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let source = CaptureSourceFactory::create(cfg.capture.kind, cfg.synthetic_config());
    let controller = ReplayController::new(cfg.replay_config(), source)
        .context("Invalid replay configuration")?;
    let (replay, service_task) = ReplayService::spawn(controller);

    let sink = ArtifactSink::new(&cfg.output.recordings_path)?;
    let app = create_router(AppState::new(replay.clone(), sink));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    replay.shutdown().await.ok();
    service_task.await.context("Replay service panicked")?;

    Ok(())
}
