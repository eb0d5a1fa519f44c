//! sesnot - Voice-driven bilingual note taking
//!
//! Core library for a hands-free note recorder that understands
//! English and Turkish voice commands: record, play back, save and
//! retrieve spoken notes. Host applications inject the speech engine,
//! audio devices and optional AI collaborators behind traits and
//! drive the [`pipeline::Pipeline`] with events.

pub mod audio;
pub mod config;
pub mod dispatch;
pub mod feedback;
pub mod grammar;
pub mod i18n;
pub mod notes;
pub mod pipeline;
pub mod query;
pub mod speech;
pub mod state;
pub mod titling;
pub mod transcript;

pub use pipeline::{KeyCommand, Pipeline};
pub use state::RecordingState;

/// Crate version, surfaced to hosts for display and logging.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialise tracing with an env-filter.
///
/// The `SESNOT_LOG` variable overrides the default `info` level
/// (e.g. `SESNOT_LOG=sesnot=debug`). Safe to call once per process.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("SESNOT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!("sesnot {} logging initialised", VERSION);
}
