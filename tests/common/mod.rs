#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, DuplexStream};

use deckplay::error::{PlayerError, Result};
use deckplay::media::store::MediaStore;
use deckplay::player::{PlaybackController, PlaybackState, PlayerSettings};
use deckplay::process::command::{CommandSpec, FfmpegCommands, ProcessRole};
use deckplay::process::handle::{DiagnosticStream, ProcessHandle, ProcessLauncher, RunOutput};

// ── Fake processes ────────────────────────────────────────────────────────────

#[derive(Default)]
struct LaunchLog {
    spawned: Vec<CommandSpec>,
    runs: Vec<CommandSpec>,
    live: Vec<(usize, ProcessRole)>,
    max_live_playback: usize,
    pauses: usize,
    resumes: usize,
}

struct FakeShared {
    log: Mutex<LaunchLog>,
    /// Write ends of each live process's stderr. Dropping one is the process exiting.
    feeds: tokio::sync::Mutex<HashMap<usize, DuplexStream>>,
    suspend: bool,
    fail_spawn: AtomicBool,
    run_success: AtomicBool,
}

/// Launcher whose processes are in-memory pipes. Tests write ffmpeg output
/// into them and "crash" them by closing the pipe.
pub struct FakeLauncher {
    shared: Arc<FakeShared>,
}

impl FakeLauncher {
    pub fn new() -> Arc<Self> {
        Self::build(true)
    }

    /// Processes that cannot be suspended, like on a platform without job control.
    pub fn without_suspend() -> Arc<Self> {
        Self::build(false)
    }

    fn build(suspend: bool) -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::new(FakeShared {
                log: Mutex::new(LaunchLog::default()),
                feeds: tokio::sync::Mutex::new(HashMap::new()),
                suspend,
                fail_spawn: AtomicBool::new(false),
                run_success: AtomicBool::new(true),
            }),
        })
    }

    pub fn set_fail_spawn(&self, fail: bool) {
        self.shared.fail_spawn.store(fail, Ordering::SeqCst);
    }

    pub fn set_run_success(&self, success: bool) {
        self.shared.run_success.store(success, Ordering::SeqCst);
    }

    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.shared.log.lock().unwrap().spawned.clone()
    }

    pub fn spawned_as(&self, role: ProcessRole) -> Vec<CommandSpec> {
        self.spawned().into_iter().filter(|s| s.role == role).collect()
    }

    pub fn last_spawned(&self, role: ProcessRole) -> CommandSpec {
        self.spawned_as(role)
            .pop()
            .unwrap_or_else(|| panic!("no {role} process was spawned"))
    }

    pub fn runs(&self) -> Vec<CommandSpec> {
        self.shared.log.lock().unwrap().runs.clone()
    }

    pub fn live(&self, role: ProcessRole) -> usize {
        let log = self.shared.log.lock().unwrap();
        log.live.iter().filter(|(_, r)| *r == role).count()
    }

    pub fn max_live_playback(&self) -> usize {
        self.shared.log.lock().unwrap().max_live_playback
    }

    pub fn pauses(&self) -> usize {
        self.shared.log.lock().unwrap().pauses
    }

    pub fn resumes(&self) -> usize {
        self.shared.log.lock().unwrap().resumes
    }

    fn latest_live(&self, role: ProcessRole) -> usize {
        let log = self.shared.log.lock().unwrap();
        log.live
            .iter()
            .rev()
            .find(|(_, r)| *r == role)
            .map(|(id, _)| *id)
            .unwrap_or_else(|| panic!("no live {role} process"))
    }

    /// Write raw stderr output of the newest live process with `role`.
    pub async fn emit(&self, role: ProcessRole, text: &str) {
        let id = self.latest_live(role);
        let mut feeds = self.shared.feeds.lock().await;
        let feed = feeds.get_mut(&id).expect("process stderr already closed");
        feed.write_all(text.as_bytes()).await.unwrap();
        feed.flush().await.unwrap();
    }

    /// Make the newest live process with `role` exit on its own.
    pub async fn crash(&self, role: ProcessRole) {
        let id = self.latest_live(role);
        self.shared.feeds.lock().await.remove(&id);
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        if self.shared.fail_spawn.load(Ordering::SeqCst) {
            return Err(PlayerError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }

        let (reader, writer) = tokio::io::duplex(64 * 1024);
        let id = {
            let mut log = self.shared.log.lock().unwrap();
            let id = log.spawned.len();
            log.spawned.push(spec.clone());
            log.live.push((id, spec.role));
            let playing = log
                .live
                .iter()
                .filter(|(_, r)| *r == ProcessRole::Playback)
                .count();
            log.max_live_playback = log.max_live_playback.max(playing);
            id
        };
        self.shared.feeds.lock().await.insert(id, writer);

        Ok(Box::new(FakeProcess {
            shared: Arc::clone(&self.shared),
            id,
            stderr: Some(reader),
            terminated: false,
        }))
    }

    async fn run(&self, spec: &CommandSpec) -> Result<RunOutput> {
        self.shared.log.lock().unwrap().runs.push(spec.clone());
        let success = self.shared.run_success.load(Ordering::SeqCst);
        Ok(RunOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            stderr: if success {
                String::new()
            } else {
                "Error opening input file\n".to_string()
            },
        })
    }
}

struct FakeProcess {
    shared: Arc<FakeShared>,
    id: usize,
    stderr: Option<DuplexStream>,
    terminated: bool,
}

#[async_trait]
impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        (!self.terminated).then_some(self.id as u32 + 1000)
    }

    fn take_diagnostics(&mut self) -> Option<DiagnosticStream> {
        self.stderr.take().map(|s| Box::new(s) as DiagnosticStream)
    }

    fn supports_suspend(&self) -> bool {
        self.shared.suspend
    }

    fn pause(&mut self) -> Result<()> {
        self.shared.log.lock().unwrap().pauses += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.shared.log.lock().unwrap().resumes += 1;
        Ok(())
    }

    async fn terminate(&mut self, _grace: Duration) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.shared.feeds.lock().await.remove(&self.id);
        let mut log = self.shared.log.lock().unwrap();
        log.live.retain(|(id, _)| *id != self.id);
    }
}

// ── Fake media store ──────────────────────────────────────────────────────────

/// Known files and their durations. `None` makes the probe fail.
#[derive(Default)]
pub struct FakeStore {
    files: HashMap<PathBuf, Option<f64>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, duration: Option<f64>) -> Self {
        self.files.insert(PathBuf::from(path), duration);
        self
    }
}

#[async_trait]
impl MediaStore for FakeStore {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        match self.files.get(path) {
            Some(Some(duration)) => Ok(*duration),
            _ => Err(PlayerError::ProbeFailed("no duration reported".to_string())),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

pub const CLIP: &str = "/media/clip.mp4";
pub const STILL: &str = "/media/photo.png";
pub const BROKEN: &str = "/media/broken.mkv";

pub fn test_settings() -> PlayerSettings {
    PlayerSettings {
        grace_timeout: Duration::from_millis(200),
        broadcast_interval: Duration::ZERO,
    }
}

pub fn default_store() -> FakeStore {
    FakeStore::new()
        .with(CLIP, Some(120.0))
        .with(STILL, Some(0.0))
        .with(BROKEN, None)
}

pub fn make_controller(launcher: &Arc<FakeLauncher>, store: FakeStore) -> PlaybackController {
    PlaybackController::new(
        launcher.clone(),
        Arc::new(store),
        FfmpegCommands::default(),
        test_settings(),
    )
}

/// Poll the controller until `pred` holds, or fail after two seconds.
pub async fn wait_for_state<F>(controller: &PlaybackController, mut pred: F) -> PlaybackState
where
    F: FnMut(&PlaybackState) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let state = controller.state().await;
        if pred(&state) {
            return state;
        }
        if Instant::now() > deadline {
            panic!("state never reached the expected shape: {state:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until `cond` holds, or fail after two seconds.
pub async fn wait_until<F>(what: &str, mut cond: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
