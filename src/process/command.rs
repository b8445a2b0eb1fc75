//! Argument vectors for every external invocation.
//!
//! The controller never assembles ffmpeg flags itself. It describes a [`Job`]
//! and [`FfmpegCommands::build`] turns it into a [`CommandSpec`].

use std::fmt;
use std::path::{Path, PathBuf};

use crate::media::mime::is_image;

/// Length of the clip rendered from a still image for the secondary output.
pub const IMAGE_CLIP_SECONDS: u32 = 10;
pub const IMAGE_CLIP_WIDTH: u32 = 1920;
pub const IMAGE_CLIP_HEIGHT: u32 = 1080;

/// What the process is for. Used for logging and by test launchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    Playback,
    SecondaryOutput,
    CaptureOutput,
    ImageClip,
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessRole::Playback => "playback",
            ProcessRole::SecondaryOutput => "secondary",
            ProcessRole::CaptureOutput => "capture",
            ProcessRole::ImageClip => "image-clip",
        };
        f.write_str(label)
    }
}

/// Where the process's stderr goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostics {
    /// Piped, readable through `ProcessHandle::take_diagnostics`.
    Capture,
    Inherit,
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub role: ProcessRole,
    pub program: String,
    pub args: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl CommandSpec {
    /// Value following `flag` in the argument list, if present.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Live capture source feeding the secondary output.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSource {
    pub device: String,
    pub video_size: String,
    pub framerate: u32,
}

impl Default for CaptureSource {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            video_size: "3840x2160".to_string(),
            framerate: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Job<'a> {
    /// Primary playback from `seek` seconds at `volume` percent.
    Playback { media: &'a Path, seek: f64, volume: u8 },
    /// Motion video to the secondary output device.
    SecondaryOutput { media: &'a Path },
    /// Capture device to the secondary output device.
    CaptureOutput,
    /// Render a still image into a short looping clip at `output`.
    ImageClip { image: &'a Path, output: &'a Path },
}

/// Deployment-specific ffmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommands {
    ffmpeg: String,
    primary_output: String,
    secondary_device: String,
    capture: CaptureSource,
}

impl Default for FfmpegCommands {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegCommands {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            primary_output: "pipe:1".to_string(),
            secondary_device: "DeckLink Output".to_string(),
            capture: CaptureSource::default(),
        }
    }

    pub fn with_primary_output(mut self, target: impl Into<String>) -> Self {
        self.primary_output = target.into();
        self
    }

    pub fn with_secondary_device(mut self, device: impl Into<String>) -> Self {
        self.secondary_device = device.into();
        self
    }

    pub fn with_capture(mut self, capture: CaptureSource) -> Self {
        self.capture = capture;
        self
    }

    pub fn build(&self, job: Job<'_>) -> CommandSpec {
        match job {
            Job::Playback { media, seek, volume } => self.playback(media, seek, volume),
            Job::SecondaryOutput { media } => self.secondary_output(media),
            Job::CaptureOutput => self.capture_output(),
            Job::ImageClip { image, output } => self.image_clip(image, output),
        }
    }

    fn spec(&self, role: ProcessRole, args: Vec<String>, diagnostics: Diagnostics) -> CommandSpec {
        CommandSpec {
            role,
            program: self.ffmpeg.clone(),
            args,
            diagnostics,
        }
    }

    fn playback(&self, media: &Path, seek: f64, volume: u8) -> CommandSpec {
        let still = is_image(media);
        let mut args = strings(&["-hide_banner", "-nostdin", "-re"]);

        if still {
            args.extend(strings(&["-loop", "1"]));
        }
        args.extend([
            "-ss".to_string(),
            format_seconds(seek),
            "-i".to_string(),
            path_arg(media),
        ]);
        args.extend(strings(&["-vf", "format=yuv420p", "-f", "matroska", "-c:v", "h264"]));
        if !still {
            args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-af".to_string(),
                format!("volume={:.2}", f64::from(volume) / 100.0),
            ]);
        }
        args.push(self.primary_output.clone());

        self.spec(ProcessRole::Playback, args, Diagnostics::Capture)
    }

    fn secondary_output(&self, media: &Path) -> CommandSpec {
        let mut args = strings(&["-hide_banner", "-nostdin", "-re", "-i"]);
        args.push(path_arg(media));
        args.extend(self.decklink_tail());
        self.spec(ProcessRole::SecondaryOutput, args, Diagnostics::Capture)
    }

    fn capture_output(&self) -> CommandSpec {
        let mut args = strings(&["-hide_banner", "-nostdin", "-f", "v4l2"]);
        args.extend([
            "-framerate".to_string(),
            self.capture.framerate.to_string(),
            "-video_size".to_string(),
            self.capture.video_size.clone(),
            "-i".to_string(),
            self.capture.device.clone(),
        ]);
        args.extend(self.decklink_tail());
        self.spec(ProcessRole::CaptureOutput, args, Diagnostics::Capture)
    }

    fn image_clip(&self, image: &Path, output: &Path) -> CommandSpec {
        let (w, h) = (IMAGE_CLIP_WIDTH, IMAGE_CLIP_HEIGHT);
        let mut args = strings(&["-hide_banner", "-nostdin", "-y", "-loop", "1", "-i"]);
        args.push(path_arg(image));
        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-t".to_string(),
            IMAGE_CLIP_SECONDS.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-vf".to_string(),
            format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
            ),
            path_arg(output),
        ]);
        self.spec(ProcessRole::ImageClip, args, Diagnostics::Inherit)
    }

    fn decklink_tail(&self) -> Vec<String> {
        let mut tail = strings(&[
            "-vf",
            "format=uyvy422",
            "-f",
            "decklink",
            "-c:v",
            "rawvideo",
            "-c:a",
            "pcm_s16le",
        ]);
        tail.push(self.secondary_device.clone());
        tail
    }
}

/// Where the rendered clip for `image` is written.
pub fn image_clip_path(image: &Path) -> PathBuf {
    let mut name = image.as_os_str().to_owned();
    name.push(".mp4");
    PathBuf::from(name)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds.max(0.0))
}
