//! Test fixtures for infile integration tests.

#[allow(dead_code)]
pub mod orders;
#[allow(dead_code)]
pub mod recording;
#[allow(dead_code)]
pub mod sample;

pub use recording::RecordingBridge;
pub use sample::*;
