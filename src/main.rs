use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;

use deckplay::media::store::FsMediaStore;
use deckplay::player::PlaybackController;
use deckplay::process::handle::SystemLauncher;
use deckplay::{cli, config, http};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wait for the first Ctrl+C (graceful shutdown).
/// On a second Ctrl+C the process exits immediately.
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\ndeckplay: forced exit");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = config::Config::resolve(file_config, &args);

    if let Err(e) = std::fs::create_dir_all(&config.media_dir) {
        eprintln!(
            "error: cannot create media directory {}: {}",
            config.media_dir.display(),
            e
        );
        std::process::exit(1);
    }
    if !config.media_dir.is_dir() {
        eprintln!("error: not a directory: {}", config.media_dir.display());
        std::process::exit(1);
    }

    tracing::info!(
        "deckplay {} serving {} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.media_dir.display(),
        config.port
    );
    tracing::info!("Using {} and {}", config.ffmpeg, config.ffprobe);

    let store = Arc::new(FsMediaStore::new(
        config.media_dir.clone(),
        config.ffprobe.clone(),
    ));
    let controller = PlaybackController::new(
        Arc::new(SystemLauncher),
        store.clone(),
        config.commands(),
        config.player_settings(),
    );

    let state = http::state::AppState {
        controller: controller.clone(),
        store,
    };
    let app = http::build_router(state);

    let host = if config.localhost { "127.0.0.1" } else { "0.0.0.0" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });
    tracing::info!("Listening on http://{}", addr);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);

    let mut http_rx = shutdown_tx.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_rx.recv().await;
            })
            .await
            .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
    });

    wait_for_shutdown().await;
    tracing::info!("Shutting down, stopping ffmpeg processes...");

    let _ = shutdown_tx.send(());
    controller.shutdown().await;

    // Open WebSocket sessions keep the server alive; do not wait on them forever.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), server).await;

    tracing::info!("Goodbye.");
}
