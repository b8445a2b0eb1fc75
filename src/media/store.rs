use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{PlayerError, Result};
use crate::media::mime::{is_image, is_video};

/// What the controller needs from media storage.
#[async_trait]
pub trait MediaStore: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Duration of the media in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;
}

/// One entry of the media directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub is_video: bool,
    pub is_image: bool,
}

/// Media store backed by a single flat directory, with durations probed by ffprobe.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    ffprobe: String,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>, ffprobe: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a client-supplied file name to a path inside the media directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let safe = sanitize_file_name(name)
            .ok_or_else(|| PlayerError::InvalidRequest(format!("invalid file name: {name:?}")))?;
        Ok(self.root.join(safe))
    }

    /// Destination for an uploaded file. Same rules as [`FsMediaStore::resolve`].
    pub fn upload_path(&self, name: &str) -> Result<PathBuf> {
        self.resolve(name)
    }

    /// List regular files directly inside the media directory, sorted by name.
    pub fn list(&self) -> Result<Vec<MediaFile>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(MediaFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                modified,
                is_video: is_video(entry.path()),
                is_image: is_image(entry.path()),
            });
        }

        Ok(files)
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Extract `format.duration` from `ffprobe -of json` output.
pub fn parse_probe_output(json: &str) -> Result<f64> {
    let parsed: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| PlayerError::ProbeFailed(format!("unreadable ffprobe output: {e}")))?;
    let raw = parsed
        .format
        .duration
        .ok_or_else(|| PlayerError::ProbeFailed("no duration reported".to_string()))?;
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PlayerError::ProbeFailed(format!("bad duration value {raw:?}")))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(PlayerError::ProbeFailed(format!("bad duration value {raw:?}")));
    }
    Ok(seconds)
}

#[async_trait]
impl MediaStore for FsMediaStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = tokio::process::Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| PlayerError::ProbeFailed(format!("{}: {}", self.ffprobe, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlayerError::ProbeFailed(format!(
                "{} exited with {}: {}",
                self.ffprobe,
                output.status,
                stderr.trim()
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reduce an arbitrary name to a safe single path component.
///
/// Directory parts are dropped, and characters outside `[A-Za-z0-9._-]` become `_`.
/// Leading dots are stripped so hidden files and `..` cannot be produced.
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return None;
    }
    Some(cleaned.to_string())
}
