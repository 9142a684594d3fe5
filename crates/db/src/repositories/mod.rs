//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&SqlitePool` as the first argument. Every method is a single
//! statement or its own transaction, so a failure part-way through a cycle
//! never leaves a half-written entity behind.

pub mod alert_repo;
pub mod forwarding_repo;
pub mod ledger_repo;
pub mod proximity_repo;
pub mod upstream_failure_repo;

pub use alert_repo::AlertRepo;
pub use forwarding_repo::ForwardingRepo;
pub use ledger_repo::LedgerRepo;
pub use proximity_repo::ProximityRepo;
pub use upstream_failure_repo::UpstreamFailureRepo;
