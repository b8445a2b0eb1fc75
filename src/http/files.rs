use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{PlayerError, Result};
use crate::http::reply::Reply;
use crate::http::state::AppState;
use crate::http::transport::{json_body, FileRequest};
use crate::media::store::MediaFile;

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<MediaFile>,
}

/// GET /files: the media directory listing.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileList>> {
    let store = state.store.clone();
    let files = tokio::task::spawn_blocking(move || store.list())
        .await
        .map_err(std::io::Error::other)??;
    tracing::debug!("Listing {} media files", files.len());
    Ok(Json(FileList { files }))
}

/// POST /select: `{"filename": "..."}` relative to the media directory.
pub async fn select_file(State(state): State<AppState>, body: Bytes) -> Result<Reply> {
    let request: FileRequest = json_body(&body)?;
    let path = state.store.resolve(&request.filename)?;
    let snapshot = state.controller.select_media(&path).await?;
    Ok(Reply::success(snapshot).with_message(format!("selected {}", request.filename)))
}

/// POST /upload: multipart field `file`, streamed to disk and then selected.
pub async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> Result<Reply> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| PlayerError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_owned)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PlayerError::InvalidRequest("no file selected".to_string()))?;
        let path = state.store.upload_path(&name)?;

        let mut file = tokio::fs::File::create(&path).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| PlayerError::InvalidRequest(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        tracing::info!("Uploaded {} ({} bytes)", path.display(), written);

        let snapshot = state.controller.select_media(&path).await?;
        return Ok(Reply::success(snapshot).with_message(format!("uploaded {name}")));
    }

    Err(PlayerError::InvalidRequest("no file part".to_string()))
}
