//! The four cycle steps plus the upstream failure limiter.
//!
//! Each step reads what it needs fresh from storage, so a cycle that dies
//! half-way resumes naturally on the next run.

pub mod debounce;
pub mod failure_limiter;
pub mod forward;
pub mod ingest;
pub mod proximity;
