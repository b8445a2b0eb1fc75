//! External process plumbing.
//!
//! * `command`: builds ffmpeg argument vectors for each kind of job.
//! * `handle`: owns spawned processes (signals, graceful termination) and the
//!   launcher seam they are created through.

pub mod command;
pub mod handle;
