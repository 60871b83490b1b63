//! The Bundle data model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::time::{BundleId, Date, Duration, NodeId};

/// QoS priority, CRITICAL highest. The derived `Ord` follows declaration
/// order, so `Priority::Critical < Priority::Low` — "larger enum value =
/// less important", the convention the bundle store's eviction logic relies
/// on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    Critical = 0,
    High = 1,
    Normal = 2,
    Low = 3,
}

/// A unit of application data routed end-to-end over the simulated network.
///
/// Immutable after creation except `hop_count` and `visited`, which only
/// ever grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub id: BundleId,
    pub source: NodeId,
    pub destination: NodeId,
    pub size: u64,
    pub priority: Priority,
    pub creation_time: Date,
    pub ttl: Duration,
    pub hop_count: u32,
    pub visited: HashSet<NodeId>,

    /// Spray-and-wait token budget for this copy. `None` under
    /// epidemic/predictive routing. Survives session failure: tokens are an
    /// attribute of the bundle copy, not of any one session.
    pub spray_tokens: Option<u32>,
}

impl Bundle {
    pub fn new(
        id: BundleId,
        source: NodeId,
        destination: NodeId,
        size: u64,
        priority: Priority,
        creation_time: Date,
        ttl: Duration,
        spray_tokens: Option<u32>,
    ) -> Self {
        let mut visited = HashSet::new();
        visited.insert(source);
        Self {
            id,
            source,
            destination,
            size,
            priority,
            creation_time,
            ttl,
            hop_count: 0,
            visited,
            spray_tokens,
        }
    }

    /// Absolute deadline: `creation_time + ttl`.
    pub fn deadline(&self) -> Date {
        self.creation_time + self.ttl
    }

    pub fn is_expired(&self, t: Date) -> bool {
        t > self.deadline()
    }

    /// Records that `node` now holds (or has forwarded through) this copy.
    pub fn mark_visited(&mut self, node: NodeId) {
        self.visited.insert(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_critical_first() {
        let mut ps = vec![Priority::Low, Priority::Critical, Priority::Normal, Priority::High];
        ps.sort();
        assert_eq!(ps, vec![Priority::Critical, Priority::High, Priority::Normal, Priority::Low]);
    }

    #[test]
    fn deadline_is_creation_plus_ttl() {
        let b = Bundle::new(1, 0, 1, 1024, Priority::Normal, 10.0, 20.0, None);
        assert_eq!(b.deadline(), 30.0);
        assert!(!b.is_expired(30.0));
        assert!(b.is_expired(30.5));
    }
}
