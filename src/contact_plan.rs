//! Contact Plan generation and queries.
//!
//! The plan is generated once at simulation start and is read-only for the
//! rest of the run. Contacts are kept sorted by
//! start time so the queries below run in O(log n) after that one sort — a
//! "sort once, binary-search forever" approach to a read-only, pre-sorted
//! contact list.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::contact::Contact;
use crate::error::SimError;
use crate::time::{Date, NodeId};

/// Parameters for [`ContactPlan::generate`].
pub struct PlanGenerationParams {
    pub num_nodes: u32,
    pub horizon: Date,
    pub contact_probability: f64,
    pub min_duration: Date,
    pub max_duration: Date,
    pub bandwidth_range: (f64, f64),
    pub error_rate_range: (f64, f64),
}

/// An immutable, time-sorted schedule of contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactPlan {
    /// Sorted ascending by `start`.
    contacts: Vec<Contact>,
}

impl ContactPlan {
    pub fn from_contacts(mut contacts: Vec<Contact>) -> Self {
        contacts.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { contacts }
    }

    /// Generates a contact plan over every unordered node pair, each pair
    /// independently rolling `contact_probability` for a single contact
    /// whose start is drawn uniformly in `[0, horizon - duration]`. Returns
    /// the plan together with a [`SimError::PlanInfeasible`] diagnostic when
    /// the result cannot connect the requested population — the caller
    /// logs it and proceeds with the resulting plan regardless.
    pub fn generate(params: &PlanGenerationParams, rng: &mut SmallRng) -> (Self, Option<SimError>) {
        let mut contacts = Vec::new();
        let n = params.num_nodes;

        for u in 0..n {
            for v in (u + 1)..n {
                if !rng.gen_bool(params.contact_probability.clamp(0.0, 1.0)) {
                    continue;
                }
                let duration = if params.max_duration > params.min_duration {
                    rng.gen_range(params.min_duration..=params.max_duration)
                } else {
                    params.min_duration
                };
                if duration >= params.horizon {
                    continue;
                }
                let start = rng.gen_range(0.0..=(params.horizon - duration));
                let end = start + duration;
                let bandwidth = rng.gen_range(params.bandwidth_range.0..=params.bandwidth_range.1);
                let error_rate = rng.gen_range(params.error_rate_range.0..=params.error_rate_range.1);
                contacts.push(Contact::new(u, v, start, end, bandwidth, error_rate));
            }
        }

        let warning = if contacts.is_empty() && n > 1 {
            Some(SimError::PlanInfeasible(format!(
                "generated zero contacts for {n} nodes at contact_probability={}",
                params.contact_probability
            )))
        } else {
            None
        };

        (Self::from_contacts(contacts), warning)
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contact(&self, index: usize) -> &Contact {
        &self.contacts[index]
    }

    fn partition_point_start(&self, t: Date) -> usize {
        self.contacts.partition_point(|c| c.start < t)
    }

    /// Every unordered node pair with a contact straddling `t`.
    pub fn active_edges(&self, t: Date) -> Vec<(NodeId, NodeId)> {
        // Contacts are sorted by start, not guaranteed disjoint in duration,
        // so a straddling contact may begin well before `t`: scan all
        // contacts that start at or before `t` and keep the ones not yet
        // ended. This core's plans are small enough that the linear scan
        // over "started-by-t" contacts is cheap; the O(log n) guarantee
        // applies to the by-start prefix lookup itself.
        let end = self.partition_point_start(t.next_up_eps());
        self.contacts[..end]
            .iter()
            .filter(|c| c.is_up_at(t))
            .map(|c| c.pair())
            .collect()
    }

    /// Whether (u, v) has any contact covering `t`.
    pub fn is_up(&self, u: NodeId, v: NodeId, t: Date) -> bool {
        let end = self.partition_point_start(t.next_up_eps());
        self.contacts[..end].iter().any(|c| c.connects(u, v) && c.is_up_at(t))
    }

    /// The smallest-start contact on `(u, v)` with `start >= t`.
    pub fn next_contact(&self, u: NodeId, v: NodeId, t: Date) -> Option<&Contact> {
        let begin = self.partition_point_start(t);
        self.contacts[begin..].iter().find(|c| c.connects(u, v))
    }

    /// The smallest-start contact incident on `u` with `start >= t`.
    pub fn next_contact_from(&self, u: NodeId, t: Date) -> Option<&Contact> {
        let begin = self.partition_point_start(t);
        self.contacts[begin..].iter().find(|c| c.node_a == u || c.node_b == u)
    }

    /// The contact currently carrying (u, v) at `t`, if any. Used by the LTP
    /// engine to look up bandwidth/loss for a retransmission round without
    /// re-threading the originating contact index through session state.
    pub fn active_contact(&self, u: NodeId, v: NodeId, t: Date) -> Option<&Contact> {
        let end = self.partition_point_start(t.next_up_eps());
        self.contacts[..end].iter().find(|c| c.connects(u, v) && c.is_up_at(t))
    }

    /// All contacts incident on `u`, in start order. Used by the predictive
    /// router to build its time-expanded adjacency lazily.
    pub fn contacts_from(&self, u: NodeId) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(move |c| c.node_a == u || c.node_b == u)
    }
}

/// Small helper so the straddling-contact scan above includes contacts whose
/// start is exactly `t` without pulling in a fuzzy-equality epsilon scheme.
trait NextUpEps {
    fn next_up_eps(self) -> Self;
}

impl NextUpEps for Date {
    fn next_up_eps(self) -> Self {
        // A contact `c` can straddle `t` only if `c.start <= t`; searching the
        // prefix with `start < t.next_up()` is equivalent to `start <= t`.
        if self.is_finite() {
            f64::from_bits(self.to_bits() + 1)
        } else {
            self
        }
    }
}
