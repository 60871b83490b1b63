//! The immutable `Contact` tuple: a flat, `Copy` struct of endpoints,
//! start/end times, a bandwidth, and a loss rate. This simulator books no
//! persistent volume against a contact manager — the LTP engine derives
//! transmit time and loss directly from these fields.

use serde::{Deserialize, Serialize};

use crate::time::{Date, Duration, NodeId};

/// A bounded time window during which two nodes can exchange data.
/// Contacts are treated as bidirectional for routing queries,
/// but each direction draws its own independent loss outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub start: Date,
    pub end: Date,
    pub bandwidth_bps: f64,
    pub error_rate: f64,
}

impl Contact {
    pub fn new(
        node_a: NodeId,
        node_b: NodeId,
        start: Date,
        end: Date,
        bandwidth_bps: f64,
        error_rate: f64,
    ) -> Self {
        Self { node_a, node_b, start, end, bandwidth_bps, error_rate }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_up_at(&self, t: Date) -> bool {
        t >= self.start && t <= self.end
    }

    /// The pair of endpoints in a fixed order, for adjacency bookkeeping.
    pub fn pair(&self) -> (NodeId, NodeId) {
        if self.node_a <= self.node_b {
            (self.node_a, self.node_b)
        } else {
            (self.node_b, self.node_a)
        }
    }

    /// Whether this contact connects `u` and `v` (in either direction).
    pub fn connects(&self, u: NodeId, v: NodeId) -> bool {
        (self.node_a == u && self.node_b == v) || (self.node_a == v && self.node_b == u)
    }

    /// The neighbor reachable from `from` over this contact, if `from` is one
    /// of its endpoints.
    pub fn other(&self, from: NodeId) -> Option<NodeId> {
        if self.node_a == from {
            Some(self.node_b)
        } else if self.node_b == from {
            Some(self.node_a)
        } else {
            None
        }
    }

    /// Transmit time for `bytes` over this contact's bandwidth.
    pub fn transmit_time(&self, bytes: u64) -> Duration {
        (bytes as f64 * 8.0) / self.bandwidth_bps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_at_is_inclusive() {
        let c = Contact::new(0, 1, 10.0, 20.0, 1_000.0, 0.0);
        assert!(c.is_up_at(10.0));
        assert!(c.is_up_at(20.0));
        assert!(!c.is_up_at(9.9));
        assert!(!c.is_up_at(20.1));
    }

    #[test]
    fn other_returns_peer() {
        let c = Contact::new(3, 7, 0.0, 1.0, 1.0, 0.0);
        assert_eq!(c.other(3), Some(7));
        assert_eq!(c.other(7), Some(3));
        assert_eq!(c.other(9), None);
    }
}
