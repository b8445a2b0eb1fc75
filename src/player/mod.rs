pub mod controller;
mod monitor;
pub mod state;

pub use controller::{PlaybackController, PlayerSettings};
pub use state::{PlaybackState, PlayerPhase};
