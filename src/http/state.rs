use std::sync::Arc;

use crate::media::store::FsMediaStore;
use crate::player::PlaybackController;

/// Shared application state injected into all route handlers via axum::extract::State.
/// Both fields are cheap to clone; the controller serializes access internally.
#[derive(Clone)]
pub struct AppState {
    pub controller: PlaybackController,
    pub store: Arc<FsMediaStore>,
}
