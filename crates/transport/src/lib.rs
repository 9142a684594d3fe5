//! External collaborators of the proxwatch engine.
//!
//! Each collaborator is a trait so the engine can be driven by fakes in
//! tests, plus one HTTP implementation used by the binary:
//!
//! - [`LocationSource`] / [`HttpFeedSource`] -- polls raw observations.
//! - [`PositionRelay`] / [`OsmAndRelay`] -- forwards one position per sample.
//! - [`NotificationTransport`] / [`PushDelivery`] -- sends push messages.
//!
//! Every outbound request carries a bounded timeout; a timeout surfaces as
//! an ordinary error of that call.

pub mod push;
pub mod relay;
pub mod source;

pub use push::{LogOnlyTransport, NotificationTransport, PushDelivery, PushError};
pub use relay::{OsmAndRelay, PositionRelay, RelayError, RelayPosition};
pub use source::{HttpFeedSource, LocationSource, UpstreamError};
