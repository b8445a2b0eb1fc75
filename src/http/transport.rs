//! Transport endpoints: thin wrappers that decode the request, call the
//! controller and wrap the resulting snapshot.

use axum::body::Bytes;
use axum::extract::State;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{PlayerError, Result};
use crate::http::reply::Reply;
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub filename: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    pub position: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    pub volume: f64,
}

/// Decode a required JSON body.
pub fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| PlayerError::InvalidRequest(e.to_string()))
}

/// Decode an optional JSON body; an empty body yields the default.
pub fn optional_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    json_body(body)
}

/// Requested volume to the controller's integer domain. Out-of-range values
/// saturate and are clamped by the controller.
pub fn volume_arg(volume: f64) -> i64 {
    volume.round() as i64
}

pub async fn get_state(State(state): State<AppState>) -> Reply {
    Reply::success(state.controller.state().await)
}

/// POST /play: body `{"position": seconds}` is optional; without it playback
/// starts from the current position.
pub async fn play(State(state): State<AppState>, body: Bytes) -> Result<Reply> {
    let request: PlayRequest = optional_json_body(&body)?;
    let position = match request.position {
        Some(position) => position,
        None => state.controller.state().await.position,
    };
    Ok(Reply::success(state.controller.play(position).await?))
}

pub async fn pause(State(state): State<AppState>) -> Result<Reply> {
    Ok(Reply::success(state.controller.pause().await?))
}

pub async fn resume(State(state): State<AppState>) -> Result<Reply> {
    Ok(Reply::success(state.controller.resume().await?))
}

pub async fn toggle(State(state): State<AppState>) -> Result<Reply> {
    Ok(Reply::success(state.controller.toggle_pause().await?))
}

pub async fn stop(State(state): State<AppState>) -> Result<Reply> {
    Ok(Reply::success(state.controller.stop().await?))
}

pub async fn seek(State(state): State<AppState>, body: Bytes) -> Result<Reply> {
    let request: SeekRequest = json_body(&body)?;
    Ok(Reply::success(state.controller.seek(request.position).await?))
}

pub async fn volume(State(state): State<AppState>, body: Bytes) -> Result<Reply> {
    let request: VolumeRequest = json_body(&body)?;
    let snapshot = state.controller.set_volume(volume_arg(request.volume)).await?;
    Ok(Reply::success(snapshot))
}

pub async fn start_secondary(State(state): State<AppState>, body: Bytes) -> Result<Reply> {
    let request: FileRequest = json_body(&body)?;
    let path = state.store.resolve(&request.filename)?;
    let snapshot = state.controller.start_secondary_output(&path).await?;
    Ok(Reply::success(snapshot).with_message(format!("secondary output started: {}", request.filename)))
}

pub async fn stop_secondary(State(state): State<AppState>) -> Result<Reply> {
    Ok(Reply::success(state.controller.stop_secondary_output().await?))
}

pub async fn start_capture(State(state): State<AppState>) -> Result<Reply> {
    let snapshot = state.controller.start_capture_output().await?;
    Ok(Reply::success(snapshot).with_message("capture output started"))
}
