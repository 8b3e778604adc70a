//! PairLink Session Registry
//!
//! Owns the live mapping between device identities and their connections.
//! The transport layer drives it with connection lifecycle events; the
//! hosting process reads disconnects back out of the event channel.
//!
//! The registry is a routing table, not a message broker: messages addressed
//! to an unknown or stale device are dropped, never queued.

pub mod registry;

pub use registry::{DeviceRegistry, RegistryEvent};
