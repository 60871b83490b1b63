//! The simulation driver: the single
//! `Sim` that owns the clock, the plan, the node table, the session
//! table, the RNG streams, and the metrics collector, and is the only place
//! allowed to dispatch an event handler that touches more than one node at a
//! time. Every other module in this crate is plain data and pure queries;
//! this module is where the scheduler, the contact plan, the bundle stores,
//! and the LTP session engine actually interact.

use tracing::{debug, warn};

use crate::bundle::Bundle;
use crate::clock::{Clock, Event};
use crate::config::Config;
use crate::contact::Contact;
use crate::contact_plan::{ContactPlan, PlanGenerationParams};
use crate::error::{SimError, SimResult};
use crate::ltp::{Feedback, SessionTable};
use crate::metrics::{MetricsCollector, PerNodeRecord, SnapshotRecord, SummaryRecord};
use crate::node::Node;
use crate::rng::SimRng;
use crate::routing::RouterPolicy;
use crate::time::{BundleId, Date, NodeId, SessionId};
use crate::traffic::TrafficGenerator;

/// Everything produced by a completed run.
#[derive(Debug, Clone)]
pub struct SimOutput {
    pub summary: SummaryRecord,
    pub timeline: Vec<SnapshotRecord>,
    pub per_node: Vec<PerNodeRecord>,
    /// Non-fatal diagnostics raised during the run.
    pub warnings: Vec<SimError>,
}

/// The simulation driver. Constructing one validates `config` and generates
/// the contact plan; running it drains the event queue to completion.
pub struct Sim {
    config: Config,
    clock: Clock,
    plan: ContactPlan,
    rng: SimRng,
    nodes: Vec<Node>,
    sessions: SessionTable,
    metrics: MetricsCollector,
    traffic: TrafficGenerator,
    /// The bundle copy currently committed to an in-flight session, keyed by
    /// session id. Removed from the sender's store for the duration of the
    /// attempt and either reinserted (suspended/failed) or consumed
    /// (delivered) when the session closes.
    in_flight: std::collections::HashMap<SessionId, Bundle>,
    warnings: Vec<SimError>,
}

impl Sim {
    /// Builds a simulation with a freshly-generated contact plan
    /// and schedules the initial contact, traffic, and metrics events.
    /// Returns `SimError::Config` if `config` fails validation.
    pub fn new(config: Config) -> SimResult<Self> {
        config.validate()?;
        let mut rng = SimRng::new(config.random_seed);
        let params = PlanGenerationParams {
            num_nodes: config.num_nodes,
            horizon: config.horizon(),
            contact_probability: config.contact_probability,
            min_duration: config.min_contact_duration,
            max_duration: config.max_contact_duration,
            bandwidth_range: config.bandwidth_range,
            error_rate_range: (config.base_error_rate, config.base_error_rate),
        };
        let (plan, warning) = ContactPlan::generate(&params, rng.plan());
        let mut sim = Self::with_plan(config, plan, rng);
        if let Some(w) = warning {
            warn!("{w}");
            sim.warnings.push(w);
        }
        sim.schedule_initial_events();
        Ok(sim)
    }

    /// Builds a simulation over a caller-supplied plan, bypassing generation
    /// entirely. Used by golden-scenario tests that need an exact,
    /// hand-built topology.
    pub fn with_plan(config: Config, plan: ContactPlan, rng: SimRng) -> Self {
        let nodes = (0..config.num_nodes).map(|id| Node::new(id, &config)).collect();
        let clock = Clock::new(config.horizon());
        Self {
            config,
            clock,
            plan,
            rng,
            nodes,
            sessions: SessionTable::new(),
            metrics: MetricsCollector::new(),
            traffic: TrafficGenerator::new(),
            in_flight: std::collections::HashMap::new(),
            warnings: Vec::new(),
        }
    }

    fn schedule_initial_events(&mut self) {
        for (idx, contact) in self.plan.contacts().to_vec().iter().enumerate() {
            self.clock.schedule_at(contact.start, Event::ContactStart(idx));
        }
        for node in 0..self.config.num_nodes {
            self.clock.schedule_at(0.0, Event::BundleGeneration(node));
        }
        self.clock.schedule_at(self.config.metrics_snapshot_interval, Event::MetricsSnapshot);
    }

    /// Injects a bundle directly into `node`'s store, bypassing the traffic
    /// generator. Used by tests that need an exact, hand-built bundle rather
    /// than one drawn from configured distributions.
    pub fn inject_bundle(&mut self, node: NodeId, bundle: Bundle) {
        self.admit_new_bundle(node, bundle);
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn now(&self) -> Date {
        self.clock.now()
    }

    /// Drains the event queue to completion. Exhaustion of the
    /// queue before the horizon is `SchedulerUnderflow`: normal termination,
    /// recorded as a warning rather than a failure.
    pub fn run(&mut self) -> SimOutput {
        while let Some((t, event)) = self.clock.pop() {
            self.dispatch(t, event);
        }
        if self.clock.now() < self.config.horizon() {
            self.warnings.push(SimError::SchedulerUnderflow(self.clock.now()));
        }
        let summary = self.metrics.summarize(&self.nodes);
        let per_node = self.metrics.per_node(&self.nodes);
        SimOutput {
            summary,
            timeline: self.metrics.timeline().to_vec(),
            per_node,
            warnings: self.warnings.clone(),
        }
    }

    fn dispatch(&mut self, t: Date, event: Event) {
        match event {
            Event::ContactStart(idx) => self.on_contact_start(idx, t),
            Event::ContactEnd(idx) => self.on_contact_end(idx, t),
            Event::BundleGeneration(node) => self.on_bundle_generation(node, t),
            Event::SegmentArrival { session, seg, receiver: _, generation } => {
                self.on_segment_arrival(session, seg, generation, t)
            }
            Event::AckArrival { session, sender: _, feedback, generation } => {
                self.on_ack_arrival(session, feedback, generation, t)
            }
            Event::CheckpointTimeout { session, generation } => {
                self.on_checkpoint_timeout(session, generation, t)
            }
            Event::BundleExpiry(id) => self.on_bundle_expiry(id, t),
            Event::MetricsSnapshot => self.on_metrics_snapshot(t),
        }
    }

    // ---- contact lifecycle ----------------------------------------------

    fn on_contact_start(&mut self, idx: usize, t: Date) {
        let c = *self.plan.contact(idx);
        self.try_open_session(c.node_a, c.node_b, &c, t);
        self.try_open_session(c.node_b, c.node_a, &c, t);
        // Scheduled here, after opening sessions, rather than upfront at
        // setup: this contact's own `ContactEnd` must sort after any
        // `SegmentArrival`s this start just scheduled (lower seq) so a
        // segment landing exactly at `t_end` is delivered before the
        // contact is torn down, not silently lost to the tie-break.
        self.clock.schedule_at(c.end, Event::ContactEnd(idx));
    }

    fn on_contact_end(&mut self, idx: usize, t: Date) {
        let c = *self.plan.contact(idx);
        self.suspend_direction(c.node_a, c.node_b, t);
        self.suspend_direction(c.node_b, c.node_a, t);
    }

    /// Ends whatever session (if any) is active from `sender` to `receiver`
    /// because their contact just ended.
    fn suspend_direction(&mut self, sender: NodeId, receiver: NodeId, t: Date) {
        let Some(session_id) = self.sessions.active_for(sender, receiver) else { return };
        let Some(bundle) = self.in_flight.remove(&session_id) else {
            self.sessions.discard(session_id);
            return;
        };
        let has_future_contact = self
            .plan
            .next_contact(sender, receiver, t)
            .is_some_and(|nc| nc.start <= bundle.deadline());

        self.sessions.discard(session_id);
        if !has_future_contact {
            self.nodes[sender as usize].stats.sessions_failed += 1;
            debug!(session = session_id, "session closed failed: contact ended with no further opportunity");
        }
        self.readmit_or_expire(sender, bundle, t);
    }

    /// Attempts to open a new outbound session from `sender` to `receiver`
    /// over `contact`. No-ops if a session is
    /// already active in this direction or no eligible bundle is queued.
    fn try_open_session(&mut self, sender: NodeId, receiver: NodeId, contact: &Contact, t: Date) {
        if self.sessions.active_for(sender, receiver).is_some() {
            return;
        }
        let propagation_delay = self.config.propagation_delay();
        let plan = &self.plan;
        let router = self.nodes[sender as usize].router;
        let Some(bundle_id) = self.nodes[sender as usize].store.peek_for_peer(receiver, |b| {
            router.select_next_hop(b, sender, plan, t, propagation_delay)
        }) else {
            return;
        };
        let Some(bundle) = self.nodes[sender as usize].store.remove(bundle_id) else { return };

        let session_id =
            self.sessions.open(sender, receiver, bundle.id, bundle.size, self.config.ltp_segment_size, t);
        self.nodes[sender as usize].stats.sessions_opened += 1;
        self.in_flight.insert(session_id, bundle);
        self.transmit_round(session_id, contact, t);
    }

    // ---- bundle lifecycle -------------------------------------------------

    fn on_bundle_generation(&mut self, node: NodeId, t: Date) {
        if self.config.bundle_generation_rate <= 0.0 {
            return;
        }
        let bundle = self.traffic.generate(&self.config, &mut self.rng, node, t);
        let next_gap = self.traffic.next_interarrival(&self.config, &mut self.rng);
        if next_gap.is_finite() {
            self.clock.schedule(next_gap, Event::BundleGeneration(node));
        }
        self.admit_new_bundle(node, bundle);
    }

    /// Admits a freshly-generated (or directly injected) bundle. `generated`
    /// counts a bundle only once it is actually admitted somewhere, not
    /// merely attempted — a bundle rejected outright on its own first
    /// admission never counts.
    fn admit_new_bundle(&mut self, node: NodeId, bundle: Bundle) {
        let id = bundle.id;
        let deadline = bundle.deadline();
        match self.nodes[node as usize].store.admit(bundle) {
            crate::store::AdmitResult::Admitted => {
                self.nodes[node as usize].stats.bundles_generated += 1;
                self.clock.schedule_at(deadline, Event::BundleExpiry(id));
            }
            crate::store::AdmitResult::Evicted(victim) if victim.id == id => {
                // Rejected outright: never admitted anywhere, so it never
                // counts toward `generated`.
            }
            crate::store::AdmitResult::Evicted(_victim) => {
                self.nodes[node as usize].stats.bundles_generated += 1;
                self.nodes[node as usize].stats.bundles_dropped_eviction += 1;
                self.clock.schedule_at(deadline, Event::BundleExpiry(id));
            }
        }
    }

    /// Re-admits `bundle` to `sender`'s store after a suspended or failed
    /// session. A second eviction here (the store filled up
    /// while the bundle was in flight) counts the same as any other
    /// eviction.
    fn readmit(&mut self, sender: NodeId, bundle: Bundle) {
        if let crate::store::AdmitResult::Evicted(_) = self.nodes[sender as usize].store.admit(bundle) {
            self.nodes[sender as usize].stats.bundles_dropped_eviction += 1;
        }
    }

    /// Like [`Sim::readmit`], but for a bundle that just spent time sitting
    /// in `self.in_flight` rather than in any store: the one-shot
    /// `BundleExpiry` event scheduled at admission time fires at the
    /// bundle's deadline and finds nothing to remove while the bundle is
    /// mid-transfer, so a bundle that has gone overdue in flight must be
    /// charged to `dropped_expiry` here instead of silently re-entering a
    /// store past its deadline.
    fn readmit_or_expire(&mut self, sender: NodeId, bundle: Bundle, t: Date) {
        if bundle.is_expired(t) {
            self.nodes[sender as usize].stats.bundles_dropped_expiry += 1;
            return;
        }
        self.readmit(sender, bundle);
    }

    /// Purges every resident copy of the expired bundle `id` — epidemic and
    /// spray-and-wait routing can leave several simultaneous copies of one
    /// logical bundle across different stores — but charges
    /// `bundles_dropped_expiry` only once, since only one logical bundle
    /// expired.
    fn on_bundle_expiry(&mut self, id: BundleId, t: Date) {
        let mut charged = false;
        for node in &mut self.nodes {
            if let Some(bundle) = node.store.remove(id) {
                debug_assert!(bundle.is_expired(t) || bundle.deadline() <= t);
                if !charged {
                    node.stats.bundles_dropped_expiry += 1;
                    charged = true;
                }
            }
        }
    }

    fn on_metrics_snapshot(&mut self, t: Date) {
        self.metrics.snapshot(t, &self.nodes);
        let next = t + self.config.metrics_snapshot_interval;
        if next <= self.config.horizon() {
            self.clock.schedule_at(next, Event::MetricsSnapshot);
        }
    }

    // ---- LTP session engine ------------------------------------------------

    /// Emits every segment of the current round back-to-back, drawing an independent loss outcome per segment from the
    /// `"loss"` RNG stream, then transitions to CHECKPOINTED and schedules
    /// the fallback `CheckpointTimeout`.
    fn transmit_round(&mut self, session_id: SessionId, contact: &Contact, t_round_start: Date) {
        let propagation_delay = self.config.propagation_delay();
        let Some(session) = self.sessions.get(session_id) else { return };
        let sender = session.sender;
        let receiver = session.receiver;
        let generation = session.generation;
        let to_send = session.to_send().to_vec();

        let mut cursor = t_round_start;
        for idx in &to_send {
            let len = self.sessions.get(session_id).unwrap().segment_len(*idx);
            let tx_time = contact.transmit_time(len);
            let arrival = cursor + tx_time + propagation_delay;
            cursor += tx_time;

            self.nodes[sender as usize].stats.segments_sent += 1;
            let lost = self.rng.loss().gen_bool_clamped(contact.error_rate);
            if lost {
                self.nodes[sender as usize].stats.segments_lost += 1;
            } else {
                self.clock.schedule_at(
                    arrival,
                    Event::SegmentArrival { session: session_id, seg: *idx, receiver, generation },
                );
            }
        }

        let checkpoint_time = cursor + self.config.retransmission_timeout();
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.begin_checkpoint(t_round_start);
            self.clock.schedule_at(
                checkpoint_time,
                Event::CheckpointTimeout { session: session_id, generation: session.generation },
            );
        }
    }

    fn on_segment_arrival(&mut self, session_id: SessionId, seg: u32, generation: u32, t: Date) {
        let Some(session) = self.sessions.get_mut(session_id) else { return };
        if session.is_stale(generation) {
            return;
        }
        session.mark_received(seg, t);
        if session.is_round_last(seg) {
            self.evaluate_checkpoint(session_id, t);
        }
    }

    fn on_checkpoint_timeout(&mut self, session_id: SessionId, generation: u32, t: Date) {
        let Some(session) = self.sessions.get(session_id) else { return };
        if session.is_stale(generation) {
            return;
        }
        self.evaluate_checkpoint(session_id, t);
    }

    /// Checks the session's completeness and sends the appropriate feedback
    /// (report or ack) exactly once per round.
    fn evaluate_checkpoint(&mut self, session_id: SessionId, t: Date) {
        let propagation_delay = self.config.propagation_delay();
        let Some(session) = self.sessions.get_mut(session_id) else { return };
        if session.feedback_sent() {
            return;
        }
        session.mark_feedback_sent();
        let generation = session.generation;
        let feedback =
            if session.is_complete() { Feedback::Ack } else { Feedback::Report(session.missing()) };
        self.clock.schedule_at(
            t + propagation_delay,
            Event::AckArrival { session: session_id, sender: session.sender, feedback, generation },
        );
    }

    fn on_ack_arrival(&mut self, session_id: SessionId, feedback: Feedback, generation: u32, t: Date) {
        let Some(session) = self.sessions.get(session_id) else { return };
        if session.is_stale(generation) {
            return;
        }
        match feedback {
            Feedback::Ack => self.complete_session(session_id, t),
            Feedback::Report(missing) => self.retry_or_fail_session(session_id, missing, t),
        }
    }

    /// Finalizes a delivered session: the
    /// transferred copy's hop count and visited set grow, the receiver
    /// admits it (or records delivery if it's the destination), and the
    /// sender's own local copy is retained or dropped per its router's
    /// replication policy.
    fn complete_session(&mut self, session_id: SessionId, t: Date) {
        let Some(session) = self.sessions.get_mut(session_id) else { return };
        session.close_delivered(t);
        let sender = session.sender;
        let receiver = session.receiver;
        self.sessions.discard(session_id);

        let Some(local_copy) = self.in_flight.remove(&session_id) else { return };
        self.nodes[sender as usize].stats.bundles_transmitted += 1;
        self.nodes[sender as usize].stats.sessions_delivered += 1;

        let mut forwarded = local_copy.clone();
        forwarded.hop_count += 1;
        forwarded.mark_visited(receiver);
        if let RouterPolicy::SprayAndWait = self.nodes[sender as usize].router {
            let tokens = local_copy.spray_tokens.unwrap_or(1);
            forwarded.spray_tokens = Some(tokens.div_ceil(2));
        }

        if receiver == forwarded.destination {
            self.nodes[receiver as usize].stats.bundles_received += 1;
            if !self.nodes[receiver as usize].has_seen(forwarded.id) {
                self.nodes[receiver as usize].mark_seen(forwarded.id);
                let latency = t - forwarded.creation_time;
                self.nodes[receiver as usize].stats.bundles_delivered += 1;
                self.nodes[receiver as usize].stats.cumulative_latency += latency;
            }
        } else {
            self.nodes[receiver as usize].stats.bundles_received += 1;
            if !self.nodes[receiver as usize].has_seen(forwarded.id) {
                self.nodes[receiver as usize].mark_seen(forwarded.id);
                self.nodes[receiver as usize].store.admit(forwarded);
            }
        }

        self.retain_local_copy(sender, receiver, local_copy, t);
    }

    /// Whether (and how) the sender keeps its own copy after a successful
    /// forward, per router.
    fn retain_local_copy(&mut self, sender: NodeId, receiver: NodeId, local_copy: Bundle, t: Date) {
        if receiver == local_copy.destination {
            return;
        }
        match self.nodes[sender as usize].router {
            RouterPolicy::Epidemic => {
                self.readmit_or_expire(sender, local_copy, t);
            }
            RouterPolicy::SprayAndWait => {
                let tokens = local_copy.spray_tokens.unwrap_or(1);
                let remaining = tokens / 2;
                if remaining >= 1 {
                    let mut kept = local_copy;
                    kept.spray_tokens = Some(remaining);
                    self.readmit_or_expire(sender, kept, t);
                }
            }
            RouterPolicy::Predictive => {
                // Single-copy forwarding: the sender has nothing left to keep.
            }
        }
    }

    /// Applies a receiver's report: reopens the session for the missing
    /// segments, or closes it failed if any segment's retry count now
    /// exceeds `max_ltp_retries`.
    fn retry_or_fail_session(&mut self, session_id: SessionId, missing: Vec<u32>, t: Date) {
        let sender;
        let receiver;
        let peak;
        {
            let Some(session) = self.sessions.get_mut(session_id) else { return };
            peak = session.retransmit(&missing, t);
            sender = session.sender;
            receiver = session.receiver;
        }
        self.nodes[sender as usize].stats.retransmissions += 1;

        if peak > self.config.max_ltp_retries {
            if let Some(s) = self.sessions.get_mut(session_id) {
                s.close_failed(t);
            }
            self.sessions.discard(session_id);
            self.nodes[sender as usize].stats.sessions_failed += 1;
            if let Some(bundle) = self.in_flight.remove(&session_id) {
                self.readmit_or_expire(sender, bundle, t);
            }
            return;
        }

        if let Some(contact) = self.plan.active_contact(sender, receiver, t) {
            let contact = *contact;
            self.transmit_round(session_id, &contact, t);
        } else {
            // Contact vanished between the report being sent and arriving;
            // treated like any other mid-transfer interruption.
            self.suspend_direction(sender, receiver, t);
        }
    }
}

/// `rand`'s `gen_bool` panics outside `[0, 1]`; simulation inputs only
/// promise a *probability*, so callers clamp rather than propagate a panic
/// for a configuration edge (e.g. `base_error_rate` exactly `1.0`).
trait GenBoolClamped {
    fn gen_bool_clamped(&mut self, p: f64) -> bool;
}

impl GenBoolClamped for rand::rngs::SmallRng {
    fn gen_bool_clamped(&mut self, p: f64) -> bool {
        use rand::Rng;
        self.gen_bool(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Bundle, Priority};
    use crate::config::RouterKind;
    use crate::contact::Contact;

    fn base_config() -> Config {
        let mut c = Config::default();
        c.bundle_generation_rate = 0.0; // tests inject bundles explicitly
        c.num_nodes = 2;
        c
    }

    /// Golden scenario 1: two nodes, one reliable 100s contact at
    /// t=10, a single 2048-byte CRITICAL bundle created at t=0. Expect 2
    /// segments, delivery around t≈12.
    #[test]
    fn golden_scenario_1_reliable_two_segment_delivery() {
        let mut config = base_config();
        config.simulation_time = 200.0;
        config.ltp_segment_size = 1024;
        let plan = ContactPlan::from_contacts(vec![Contact::new(0, 1, 10.0, 110.0, 8192.0, 0.0)]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();

        let bundle = Bundle::new(0, 0, 1, 2048, Priority::Critical, 0.0, 500.0, None);
        sim.inject_bundle(0, bundle);

        let output = sim.run();
        assert_eq!(output.summary.bundles_delivered, 1);
        assert_eq!(output.summary.segments_sent, 2);
        assert_eq!(output.summary.segments_lost, 0);
        assert!((output.summary.average_latency - 12.0).abs() < 1.0);
    }

    /// Golden scenario 4: capacity-2 store holding two NORMAL
    /// bundles; a CRITICAL arrival evicts the later-deadline NORMAL bundle.
    #[test]
    fn golden_scenario_4_buffer_eviction() {
        let mut config = base_config();
        config.max_buffer_size = 2;
        let plan = ContactPlan::from_contacts(vec![]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();

        sim.inject_bundle(0, Bundle::new(1, 0, 1, 100, Priority::Normal, 0.0, 50.0, None));
        sim.inject_bundle(0, Bundle::new(2, 0, 1, 100, Priority::Normal, 0.0, 100.0, None));
        sim.inject_bundle(0, Bundle::new(3, 0, 1, 100, Priority::Critical, 0.0, 10.0, None));

        let output = sim.run();
        assert_eq!(output.per_node[0].dropped_eviction, 1);
        assert_eq!(output.per_node[0].final_buffer_occupancy, 2);
    }

    /// Golden scenario 5: TTL 20 bundle with no contact ever
    /// arriving; expires untouched.
    #[test]
    fn golden_scenario_5_ttl_expiry_with_no_contact() {
        let mut config = base_config();
        config.simulation_time = 200.0;
        let plan = ContactPlan::from_contacts(vec![]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();
        sim.inject_bundle(0, Bundle::new(0, 0, 1, 100, Priority::Normal, 0.0, 20.0, None));

        let output = sim.run();
        assert_eq!(output.summary.bundles_delivered, 0);
        assert_eq!(output.summary.bundles_dropped_expiry, 1);
    }

    /// Golden scenario: zero-contact plan still runs cleanly to completion;
    /// the bundle sits in its source store at the horizon, uncounted as
    /// delivered, dropped, or expired, depending on TTL.
    #[test]
    fn zero_contact_plan_is_not_a_crash() {
        let mut config = base_config();
        config.bundle_ttl = 10_000.0;
        config.simulation_time = 50.0;
        let plan = ContactPlan::from_contacts(vec![]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();
        sim.inject_bundle(0, Bundle::new(0, 0, 1, 100, Priority::Normal, 0.0, 10_000.0, None));

        let output = sim.run();
        assert_eq!(output.summary.bundles_generated, 1);
        assert_eq!(output.summary.bundles_delivered, 0);
    }

    /// Golden scenario: all-loss contact (err=1.0) exhausts retries and the
    /// session closes failed; the bundle is retained at the sender.
    #[test]
    fn all_loss_contact_exhausts_retries_and_fails() {
        let mut config = base_config();
        config.simulation_time = 5_000.0;
        config.bundle_ttl = 4_000.0;
        config.max_ltp_retries = 2;
        let plan = ContactPlan::from_contacts(vec![Contact::new(0, 1, 10.0, 4_000.0, 8192.0, 1.0)]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();
        sim.inject_bundle(0, Bundle::new(0, 0, 1, 1024, Priority::Normal, 0.0, 4_000.0, None));

        let output = sim.run();
        assert_eq!(output.summary.bundles_delivered, 0);
        assert!(output.summary.sessions_failed >= 1);
    }

    /// Predictive routing over two non-overlapping chained contacts:
    /// A→B at [0,50], B→C at [60,110].
    #[test]
    fn predictive_routes_across_chained_contacts() {
        let mut config = Config::default();
        config.num_nodes = 3;
        config.bundle_generation_rate = 0.0;
        config.router_kind = RouterKind::Predictive;
        config.simulation_time = 200.0;
        config.ltp_segment_size = 8192;
        let plan = ContactPlan::from_contacts(vec![
            Contact::new(0, 1, 0.0, 50.0, 8192.0, 0.0),
            Contact::new(1, 2, 60.0, 110.0, 8192.0, 0.0),
        ]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();
        sim.inject_bundle(0, Bundle::new(0, 0, 2, 1024, Priority::Normal, 0.0, 1000.0, None));

        let output = sim.run();
        assert_eq!(output.summary.bundles_delivered, 1);
    }

    /// Golden scenario 3's second half: the same chained topology
    /// must also deliver under epidemic routing, by forwarding to the relay
    /// during the first contact and onward to the destination during the
    /// second.
    #[test]
    fn epidemic_also_delivers_across_chained_contacts() {
        let mut config = Config::default();
        config.num_nodes = 3;
        config.bundle_generation_rate = 0.0;
        config.router_kind = RouterKind::Epidemic;
        config.simulation_time = 200.0;
        config.ltp_segment_size = 8192;
        let plan = ContactPlan::from_contacts(vec![
            Contact::new(0, 1, 0.0, 50.0, 8192.0, 0.0),
            Contact::new(1, 2, 60.0, 110.0, 8192.0, 0.0),
        ]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();
        sim.inject_bundle(0, Bundle::new(0, 0, 2, 1024, Priority::Normal, 0.0, 1000.0, None));

        let output = sim.run();
        assert_eq!(output.summary.bundles_delivered, 1);
    }

    /// Golden scenario 6: spray-and-wait token budget is conserved
    /// across a hop — the forwarded copy and the copy retained at the
    /// sender split `L` as `ceil(L/2)` / `floor(L/2)`, so the total number of
    /// tokens in circulation never exceeds the original budget.
    #[test]
    fn spray_and_wait_conserves_token_budget_across_a_hop() {
        let mut config = Config::default();
        config.num_nodes = 3;
        config.bundle_generation_rate = 0.0;
        config.router_kind = RouterKind::SprayAndWait;
        config.spray_token_budget = 4;
        config.simulation_time = 100.0;
        config.ltp_segment_size = 8192;
        // Node 2 (the bundle's destination) never comes into contact, so
        // the run exercises only the spray phase, not the wait phase.
        let plan = ContactPlan::from_contacts(vec![Contact::new(0, 1, 0.0, 50.0, 8192.0, 0.0)]);
        let rng = SimRng::new(1);
        let mut sim = Sim::with_plan(config, plan, rng);
        sim.schedule_initial_events();
        sim.inject_bundle(0, Bundle::new(0, 0, 2, 1024, Priority::Normal, 0.0, 1000.0, Some(4)));

        let output = sim.run();
        assert_eq!(output.summary.bundles_delivered, 0);

        let tokens_at_0: u32 = sim_tokens_in_store(sim.nodes(), 0);
        let tokens_at_1: u32 = sim_tokens_in_store(sim.nodes(), 1);
        assert_eq!(tokens_at_0 + tokens_at_1, 4);
        assert_eq!(tokens_at_0, 2);
        assert_eq!(tokens_at_1, 2);
    }

    fn sim_tokens_in_store(nodes: &[crate::node::Node], id: NodeId) -> u32 {
        nodes[id as usize].store.iter().filter_map(|b| b.spray_tokens).sum()
    }
}
