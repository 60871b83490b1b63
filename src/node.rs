//! Node: the composition of a Bundle Store, a
//! routing policy reference, and per-peer LTP session state. Node itself is
//! plain data — event handling lives in `crate::sim`, which owns the clock,
//! the plan, and the global session table and is the only place allowed to
//! mutate more than one node at a time.

use std::collections::HashSet;

use crate::config::Config;
use crate::routing::RouterPolicy;
use crate::store::BundleStore;
use crate::time::{BundleId, NodeId};

/// Per-node counters feeding the Metrics Collector.
#[derive(Debug, Clone, Default)]
pub struct NodeStats {
    pub bundles_generated: u64,
    pub bundles_delivered: u64,
    pub bundles_dropped_eviction: u64,
    pub bundles_dropped_expiry: u64,
    pub bundles_transmitted: u64,
    pub bundles_received: u64,
    pub segments_sent: u64,
    pub segments_lost: u64,
    pub retransmissions: u64,
    pub cumulative_latency: f64,
    pub sessions_opened: u64,
    pub sessions_delivered: u64,
    pub sessions_failed: u64,
}

pub struct Node {
    pub id: NodeId,
    pub store: BundleStore,
    pub router: RouterPolicy,
    /// Bundle ids already delivered or forwarded by this node, suppressing
    /// re-flooding of epidemic/spray-and-wait copies.
    pub seen_by: HashSet<BundleId>,
    pub stats: NodeStats,
}

impl Node {
    pub fn new(id: NodeId, config: &Config) -> Self {
        Self {
            id,
            store: BundleStore::new(config.max_buffer_size),
            router: RouterPolicy::from_kind(config.router_kind),
            seen_by: HashSet::new(),
            stats: NodeStats::default(),
        }
    }

    pub fn has_seen(&self, id: BundleId) -> bool {
        self.seen_by.contains(&id)
    }

    pub fn mark_seen(&mut self, id: BundleId) {
        self.seen_by.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_starts_with_empty_store_and_stats() {
        let config = Config::default();
        let node = Node::new(3, &config);
        assert_eq!(node.id, 3);
        assert_eq!(node.store.len(), 0);
        assert_eq!(node.stats.bundles_generated, 0);
        assert!(!node.has_seen(1));
    }
}
