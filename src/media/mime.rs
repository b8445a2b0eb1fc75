use std::path::Path;

/// Media kind, decided by file extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    /// Classify a path by its extension (case-insensitive).
    ///
    /// Returns `None` for anything ffmpeg is not expected to play here.
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();

        let kind = match ext.as_str() {
            "mp4" | "m4v" | "mov" | "mkv" | "avi" | "webm" | "ts" | "m2ts" | "mts" | "mpg"
            | "mpeg" | "wmv" | "flv" | "ogv" | "3gp" => MediaKind::Video,

            "mp3" | "flac" | "wav" | "m4a" | "aac" | "ogg" | "oga" | "opus" | "wma" | "aiff"
            | "aif" => MediaKind::Audio,

            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "tif" | "tiff" | "webp" => MediaKind::Image,

            _ => return None,
        };

        Some(kind)
    }
}

pub fn is_video(path: &Path) -> bool {
    MediaKind::of(path) == Some(MediaKind::Video)
}

/// Still images need special handling: a looped input for playback, and a
/// pre-rendered clip for the secondary output.
pub fn is_image(path: &Path) -> bool {
    MediaKind::of(path) == Some(MediaKind::Image)
}
