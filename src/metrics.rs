//! Metrics Collector: running counters per node and
//! globally, plus periodic buffer-utilization snapshots. Aggregates the
//! per-node [`crate::node::NodeStats`] counters rather than duplicating them
//! — this module's own job is the global rollup, the snapshot timeline, and
//! the derived ratios (delivery ratio, average latency, average buffer
//! utilization) built on top of them.

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeStats};
use crate::time::{Date, NodeId};

/// One row of the output timeline: a
/// [`MetricsCollector::snapshot`] taken at a `MetricsSnapshot` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub timestamp: Date,
    pub delivered: u64,
    pub generated: u64,
    pub avg_latency: f64,
    pub avg_buffer_utilization: f64,
}

/// The per-node output record emitted at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerNodeRecord {
    pub id: NodeId,
    pub generated: u64,
    pub delivered: u64,
    pub transmitted: u64,
    pub received: u64,
    pub dropped_eviction: u64,
    pub dropped_expiry: u64,
    pub final_buffer_occupancy: usize,
}

/// The final summary record emitted at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub bundles_generated: u64,
    pub bundles_delivered: u64,
    pub bundles_dropped_eviction: u64,
    pub bundles_dropped_expiry: u64,
    pub segments_sent: u64,
    pub segments_lost: u64,
    pub retransmissions: u64,
    pub sessions_opened: u64,
    pub sessions_delivered: u64,
    pub sessions_failed: u64,
    pub cumulative_latency: f64,
    /// `delivered / generated`, `0.0` when nothing was generated.
    pub delivery_ratio: f64,
    /// `cumulative_latency / delivered`, `0.0` when nothing was
    /// delivered.
    pub average_latency: f64,
    /// Mean buffer utilization over every node and every snapshot taken
    /// during the run.
    pub average_buffer_utilization: f64,
}

/// Accumulates running counters and periodic snapshots over the course of a
/// run. Owned exclusively by the simulation driver — it is never mutated from inside an event handler callback
/// other than the driver's own dispatch loop.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    timeline: Vec<SnapshotRecord>,
    /// Sum of per-snapshot buffer-utilization means, for the final
    /// mean-of-means in [`MetricsCollector::summarize`].
    utilization_accumulator: f64,
    utilization_samples: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeline(&self) -> &[SnapshotRecord] {
        &self.timeline
    }

    /// Records one `MetricsSnapshot` event: rolls up every
    /// node's current counters and buffer occupancy into one timeline row.
    pub fn snapshot(&mut self, t: Date, nodes: &[Node]) {
        let generated: u64 = nodes.iter().map(|n| n.stats.bundles_generated).sum();
        let delivered: u64 = nodes.iter().map(|n| n.stats.bundles_delivered).sum();
        let cumulative_latency: f64 = nodes.iter().map(|n| n.stats.cumulative_latency).sum();
        let avg_latency = if delivered > 0 { cumulative_latency / delivered as f64 } else { 0.0 };

        let utilizations: Vec<f64> = nodes
            .iter()
            .map(|n| n.store.len() as f64 / n.store.capacity().max(1) as f64)
            .collect();
        let avg_buffer_utilization = if utilizations.is_empty() {
            0.0
        } else {
            utilizations.iter().sum::<f64>() / utilizations.len() as f64
        };

        self.utilization_accumulator += avg_buffer_utilization;
        self.utilization_samples += 1;

        self.timeline.push(SnapshotRecord {
            timestamp: t,
            delivered,
            generated,
            avg_latency,
            avg_buffer_utilization,
        });
    }

    /// Builds the final summary record by rolling up every
    /// node's terminal counters.
    pub fn summarize(&self, nodes: &[Node]) -> SummaryRecord {
        let mut s = SummaryRecord::default();
        for n in nodes {
            let st: &NodeStats = &n.stats;
            s.bundles_generated += st.bundles_generated;
            s.bundles_delivered += st.bundles_delivered;
            s.bundles_dropped_eviction += st.bundles_dropped_eviction;
            s.bundles_dropped_expiry += st.bundles_dropped_expiry;
            s.segments_sent += st.segments_sent;
            s.segments_lost += st.segments_lost;
            s.retransmissions += st.retransmissions;
            s.sessions_opened += st.sessions_opened;
            s.sessions_delivered += st.sessions_delivered;
            s.sessions_failed += st.sessions_failed;
            s.cumulative_latency += st.cumulative_latency;
        }
        s.delivery_ratio = if s.bundles_generated > 0 {
            s.bundles_delivered as f64 / s.bundles_generated as f64
        } else {
            0.0
        };
        s.average_latency = if s.bundles_delivered > 0 {
            s.cumulative_latency / s.bundles_delivered as f64
        } else {
            0.0
        };
        s.average_buffer_utilization = if self.utilization_samples > 0 {
            self.utilization_accumulator / self.utilization_samples as f64
        } else {
            0.0
        };
        s
    }

    /// Builds the per-node output records.
    pub fn per_node(&self, nodes: &[Node]) -> Vec<PerNodeRecord> {
        nodes
            .iter()
            .map(|n| PerNodeRecord {
                id: n.id,
                generated: n.stats.bundles_generated,
                delivered: n.stats.bundles_delivered,
                transmitted: n.stats.bundles_transmitted,
                received: n.stats.bundles_received,
                dropped_eviction: n.stats.bundles_dropped_eviction,
                dropped_expiry: n.stats.bundles_dropped_expiry,
                final_buffer_occupancy: n.store.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn snapshot_with_no_nodes_is_inert() {
        let mut m = MetricsCollector::new();
        m.snapshot(0.0, &[]);
        assert_eq!(m.timeline().len(), 1);
        assert_eq!(m.timeline()[0].avg_buffer_utilization, 0.0);
    }

    #[test]
    fn summarize_rolls_up_every_node() {
        let config = Config::default();
        let mut nodes = vec![Node::new(0, &config), Node::new(1, &config)];
        nodes[0].stats.bundles_generated = 5;
        nodes[0].stats.bundles_delivered = 3;
        nodes[0].stats.cumulative_latency = 30.0;
        nodes[1].stats.bundles_generated = 5;
        nodes[1].stats.bundles_delivered = 1;
        nodes[1].stats.cumulative_latency = 10.0;

        let m = MetricsCollector::new();
        let summary = m.summarize(&nodes);
        assert_eq!(summary.bundles_generated, 10);
        assert_eq!(summary.bundles_delivered, 4);
        assert_eq!(summary.delivery_ratio, 0.4);
        assert_eq!(summary.average_latency, 10.0);
    }
}
