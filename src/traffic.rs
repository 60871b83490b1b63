//! Application Source: generates new bundles at
//! each node at a configured mean rate, with destination, size, and
//! priority each drawn from their own named RNG stream so that changing one
//! distribution never perturbs another.

use rand::Rng;

use crate::bundle::{Bundle, Priority};
use crate::config::{Config, RouterKind};
use crate::rng::SimRng;
use crate::time::{BundleId, Date, Duration, NodeId};

const PRIORITIES: [Priority; 4] =
    [Priority::Critical, Priority::High, Priority::Normal, Priority::Low];

/// Issues globally-unique, monotonically increasing bundle ids.
pub struct TrafficGenerator {
    next_id: BundleId,
}

impl TrafficGenerator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Draws the next inter-arrival gap for a node generating bundles at
    /// `config.bundle_generation_rate` bundles/sec (exponential
    /// distribution).
    pub fn next_interarrival(&self, config: &Config, rng: &mut SimRng) -> Duration {
        if config.bundle_generation_rate <= 0.0 {
            return f64::INFINITY;
        }
        let u: f64 = rng.traffic().gen_range(f64::EPSILON..1.0);
        -u.ln() / config.bundle_generation_rate
    }

    /// Produces one new bundle at `source` at time `t`, drawing destination,
    /// size, and priority from their respective streams. Destinations are
    /// uniform over every node other than `source`.
    pub fn generate(
        &mut self,
        config: &Config,
        rng: &mut SimRng,
        source: NodeId,
        t: Date,
    ) -> Bundle {
        let id = self.next_id;
        self.next_id += 1;

        let destination = loop {
            let d = rng.dest().gen_range(0..config.num_nodes);
            if d != source {
                break d;
            }
        };
        let (min_size, max_size) = config.bundle_size_range;
        let size = rng.size().gen_range(min_size..=max_size);
        let priority = PRIORITIES[rng.priority().gen_range(0..PRIORITIES.len())];
        let spray_tokens =
            (config.router_kind == RouterKind::SprayAndWait).then_some(config.spray_token_budget);

        Bundle::new(id, source, destination, size, priority, t, config.bundle_ttl, spray_tokens)
    }
}

impl Default for TrafficGenerator {
    fn default() -> Self {
        Self::new()
    }
}
