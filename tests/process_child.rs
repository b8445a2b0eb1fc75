#![cfg(unix)]

use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;

use deckplay::error::PlayerError;
use deckplay::process::command::{CommandSpec, Diagnostics, ProcessRole};
use deckplay::process::handle::{ProcessHandle, ProcessLauncher, SystemLauncher};

fn sh(script: &str) -> CommandSpec {
    CommandSpec {
        role: ProcessRole::Playback,
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        diagnostics: Diagnostics::Capture,
    }
}

#[tokio::test]
async fn test_terminate_stops_cooperative_process() {
    let mut handle = SystemLauncher.spawn(&sh("exec sleep 30")).await.unwrap();
    assert!(handle.id().is_some());

    let started = Instant::now();
    handle.terminate(Duration::from_secs(5)).await;
    assert!(started.elapsed() < Duration::from_secs(5), "SIGTERM should be enough");
    assert!(handle.id().is_none(), "process should be reaped");

    // Second call is a no-op.
    handle.terminate(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_terminate_kills_after_grace() {
    let mut handle = SystemLauncher
        .spawn(&sh("trap '' TERM; exec sleep 30"))
        .await
        .unwrap();
    // Let the shell install the trap before signalling.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let grace = Duration::from_millis(300);
    let started = Instant::now();
    handle.terminate(grace).await;
    let elapsed = started.elapsed();
    assert!(elapsed >= grace, "process ignoring SIGTERM exited early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "kill took too long: {elapsed:?}");
    assert!(handle.id().is_none());
}

#[tokio::test]
async fn test_suspended_process_still_terminates() {
    let mut handle = SystemLauncher.spawn(&sh("exec sleep 30")).await.unwrap();
    assert!(handle.supports_suspend());
    handle.pause().unwrap();
    handle.resume().unwrap();
    handle.pause().unwrap();

    let started = Instant::now();
    handle.terminate(Duration::from_secs(5)).await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(handle.id().is_none());
}

#[tokio::test]
async fn test_diagnostics_stream_carries_stderr() {
    let mut handle = SystemLauncher
        .spawn(&sh("printf 'frame=1 fps=24\\r' >&2"))
        .await
        .unwrap();
    let mut stream = handle.take_diagnostics().expect("stderr should be piped");
    assert!(handle.take_diagnostics().is_none());

    let mut output = String::new();
    stream.read_to_string(&mut output).await.unwrap();
    assert_eq!(output, "frame=1 fps=24\r");
    handle.terminate(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let spec = CommandSpec {
        program: "/nonexistent/deckplay-ffmpeg".to_string(),
        ..sh("")
    };
    match SystemLauncher.spawn(&spec).await {
        Err(PlayerError::Spawn { program, .. }) => assert_eq!(program, spec.program),
        Err(other) => panic!("expected a spawn error, got {other:?}"),
        Ok(_) => panic!("spawning a missing binary succeeded"),
    }
}

#[tokio::test]
async fn test_run_reports_failure() {
    let output = SystemLauncher
        .run(&sh("echo 'Error opening input' >&2; exit 3"))
        .await
        .unwrap();
    assert!(!output.success);
    assert_eq!(output.code, Some(3));
    assert!(output.stderr.contains("Error opening input"));

    let output = SystemLauncher.run(&sh("exit 0")).await.unwrap();
    assert!(output.success);
}
