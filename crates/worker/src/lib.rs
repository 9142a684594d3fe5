//! `proxwatch-worker` library crate.
//!
//! Holds the engine steps, the scheduler and configuration. The binary
//! entrypoint lives in `main.rs`; the modules are public for integration
//! testing.

pub mod config;
pub mod context;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod shutdown;

pub use context::{EngineContext, EngineSettings};
pub use error::EngineError;
pub use scheduler::{Scheduler, SchedulerState};
