pub mod files;
pub mod reply;
pub mod state;
pub mod transport;
pub mod ws;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::http::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/state", get(transport::get_state))
        // Media selection
        .route("/files", get(files::list_files))
        .route("/select", post(files::select_file))
        .route(
            "/upload",
            post(files::upload_file).layer(DefaultBodyLimit::disable()),
        )
        // Transport
        .route("/play", post(transport::play))
        .route("/pause", post(transport::pause))
        .route("/resume", post(transport::resume))
        .route("/toggle", post(transport::toggle))
        .route("/stop", post(transport::stop))
        .route("/seek", post(transport::seek))
        .route("/volume", post(transport::volume))
        // Secondary output
        .route("/secondary/start", post(transport::start_secondary))
        .route("/secondary/stop", post(transport::stop_secondary))
        .route("/capture/start", post(transport::start_capture))
        // Push channel
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
