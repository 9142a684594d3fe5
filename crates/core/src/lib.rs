//! Pure domain logic for proxwatch.
//!
//! Nothing in this crate performs I/O. Storage lives in `proxwatch-db`,
//! outbound HTTP in `proxwatch-transport`, and the engine that ties them
//! together in `proxwatch-worker`.

pub mod error;
pub mod failure_codes;
pub mod geo;
pub mod observation;
pub mod proximity;
pub mod types;
