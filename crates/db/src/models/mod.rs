//! Row types and insert DTOs, one module per table.

pub mod alert;
pub mod proximity;
pub mod sample;
pub mod upstream_failure;
