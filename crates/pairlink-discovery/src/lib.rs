//! PairLink Discovery
//!
//! Makes the server discoverable on the local network:
//! - mDNS service advertisement (primary)
//! - UDP probe responder (pure-userspace fallback)
//!
//! Discovery is a convenience layer, not a security boundary: failure leaves
//! the server reachable by manual address entry, never unreachable.

pub mod announcer;
pub mod error;
pub mod mdns;
pub mod responder;

pub use announcer::{AlertSink, Announcer};
pub use error::{DiscoveryError, Result};
pub use responder::{fallback_service_name, instance_suffix, ProbeResponder};
