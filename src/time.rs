//! Shared time types.
//!
//! The simulator works in simulated seconds throughout. `Date` is an
//! absolute point in simulated time (always `>= 0.0`), `Duration` is a
//! span. Both are plain `f64` aliases: time is represented as floating point
//! seconds rather than through a dedicated duration type.

/// An absolute simulated timestamp, in seconds since the start of the run.
pub type Date = f64;

/// A span of simulated time, in seconds.
pub type Duration = f64;

/// Identifier of a node in the topology. Nodes are numbered `0..num_nodes`.
pub type NodeId = u32;

/// Monotonic identifier of a bundle, unique for the lifetime of a run.
pub type BundleId = u64;

/// Monotonic identifier of an LTP session, unique for the lifetime of a run.
pub type SessionId = u64;
