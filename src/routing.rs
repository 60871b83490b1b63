//! The Router: one trait-level contract, `select_next_hop`, behind a tagged
//! variant rather than a trait object — avoiding a per-bundle heap
//! allocation for the router on every routing decision.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::bundle::Bundle;
use crate::config::RouterKind;
use crate::contact_plan::ContactPlan;
use crate::time::{Date, NodeId};
use crate::topology::Topology;

/// The three routing policies, dispatched by match rather than
/// dynamic dispatch.
#[derive(Debug, Clone, Copy)]
pub enum RouterPolicy {
    Epidemic,
    SprayAndWait,
    Predictive,
}

impl RouterPolicy {
    pub fn from_kind(kind: RouterKind) -> Self {
        match kind {
            RouterKind::Epidemic => RouterPolicy::Epidemic,
            RouterKind::SprayAndWait => RouterPolicy::SprayAndWait,
            RouterKind::Predictive => RouterPolicy::Predictive,
        }
    }

    /// Picks a next hop for `bundle` currently held at `node_id`, or `None`
    /// if no progress is possible at `t` (the bundle then stays stored).
    pub fn select_next_hop(
        &self,
        bundle: &Bundle,
        node_id: NodeId,
        plan: &ContactPlan,
        t: Date,
        propagation_delay: Date,
    ) -> Option<NodeId> {
        match self {
            RouterPolicy::Epidemic => epidemic_next_hop(bundle, node_id, plan, t),
            RouterPolicy::SprayAndWait => spray_and_wait_next_hop(bundle, node_id, plan, t),
            RouterPolicy::Predictive => {
                predictive_next_hop(bundle, node_id, plan, t, propagation_delay)
            }
        }
    }
}

/// Active neighbors of `node_id` not already in `bundle.visited`, lowest id
/// first — the natural tie-break for any policy that just needs "some"
/// eligible neighbor.
fn eligible_neighbors(bundle: &Bundle, node_id: NodeId, plan: &ContactPlan, t: Date) -> Vec<NodeId> {
    Topology::new(plan)
        .active_neighbors(node_id, t)
        .into_iter()
        .filter(|n| !bundle.visited.contains(n))
        .collect()
}

/// Floods to any currently-reachable neighbor the bundle hasn't visited.
/// Duplicate-receipt suppression across copies of the same logical bundle is
/// a per-node concern (`seen_by`), not this function's job.
fn epidemic_next_hop(bundle: &Bundle, node_id: NodeId, plan: &ContactPlan, t: Date) -> Option<NodeId> {
    eligible_neighbors(bundle, node_id, plan, t).into_iter().next()
}

/// Spray-and-wait: while tokens remain above 1, sprays to any
/// eligible neighbor exactly as epidemic does (token-splitting on handoff
/// is the sender's concern, not the next-hop decision). Once a copy is down
/// to its last token, it only ever moves directly to the destination.
fn spray_and_wait_next_hop(
    bundle: &Bundle,
    node_id: NodeId,
    plan: &ContactPlan,
    t: Date,
) -> Option<NodeId> {
    match bundle.spray_tokens {
        Some(1) => {
            if Topology::new(plan).is_up(node_id, bundle.destination, t) {
                Some(bundle.destination)
            } else {
                None
            }
        }
        _ => eligible_neighbors(bundle, node_id, plan, t).into_iter().next(),
    }
}

/// Contact-graph predictive routing: a Dijkstra-style earliest-arrival search
/// over the time-expanded contact graph, tie-broken by fewest hops, then
/// lowest node id. Computed fresh per call rather than memoized per
/// (destination, plan-version):
/// the plan is immutable for the run, but earliest arrival is a function of
/// the query time `t`, which varies on every call, so there is nothing
/// stable to cache beyond the static adjacency `ContactPlan` already
/// provides via `contacts_from` (see DESIGN.md).
fn predictive_next_hop(
    bundle: &Bundle,
    node_id: NodeId,
    plan: &ContactPlan,
    t: Date,
    propagation_delay: Date,
) -> Option<NodeId> {
    if node_id == bundle.destination {
        return None;
    }
    let first_hop = earliest_arrival_first_hop(plan, node_id, bundle.destination, t, propagation_delay)?;
    if bundle.visited.contains(&first_hop) {
        None
    } else {
        Some(first_hop)
    }
}

/// `(time, hops, first_hop)` tuples compare lexicographically, which is
/// exactly the tie-break order this router wants: earliest arrival, then
/// fewest hops, then lowest node id (since `first_hop` is only ever compared
/// once time and hops are equal).
type DistEntry = (Date, u32, NodeId);

#[derive(Debug, Clone, Copy, PartialEq)]
struct PqItem {
    time: Date,
    hops: u32,
    node: NodeId,
}
impl Eq for PqItem {}
impl Ord for PqItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.node.cmp(&self.node))
    }
}
impl PartialOrd for PqItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Earliest-arrival Dijkstra from `(source, t0)` to `dest` over the
/// time-expanded contact graph. Returns the first hop taken on the optimal
/// path, or `None` if `dest` is unreachable before the plan runs out of
/// contacts.
fn earliest_arrival_first_hop(
    plan: &ContactPlan,
    source: NodeId,
    dest: NodeId,
    t0: Date,
    propagation_delay: Date,
) -> Option<NodeId> {
    let mut best: HashMap<NodeId, DistEntry> = HashMap::new();
    best.insert(source, (t0, 0, source));
    let mut heap = BinaryHeap::new();
    heap.push(PqItem { time: t0, hops: 0, node: source });

    while let Some(PqItem { time, hops, node }) = heap.pop() {
        let Some(&(best_time, best_hops, _)) = best.get(&node) else { continue };
        if time > best_time || (time == best_time && hops > best_hops) {
            continue;
        }
        if node == dest {
            break;
        }

        for contact in plan.contacts_from(node) {
            if contact.end < time {
                continue;
            }
            let neighbor = match contact.other(node) {
                Some(n) => n,
                None => continue,
            };
            let departure = time.max(contact.start);
            if departure > contact.end {
                continue;
            }
            let arrival = departure + propagation_delay;
            let first_hop = if node == source { neighbor } else { best[&node].2 };
            let candidate = (arrival, hops + 1, first_hop);

            let better = match best.get(&neighbor) {
                None => true,
                Some(&existing) => candidate < existing,
            };
            if better {
                best.insert(neighbor, candidate);
                heap.push(PqItem { time: arrival, hops: hops + 1, node: neighbor });
            }
        }
    }

    best.get(&dest).map(|&(_, _, first_hop)| first_hop).filter(|&h| h != source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Bundle, Priority};
    use crate::contact::Contact;

    fn chain_plan() -> ContactPlan {
        ContactPlan::from_contacts(vec![
            Contact::new(0, 1, 0.0, 50.0, 1_000.0, 0.0),
            Contact::new(1, 2, 60.0, 110.0, 1_000.0, 0.0),
        ])
    }

    #[test]
    fn epidemic_picks_lowest_id_eligible_neighbor() {
        let plan = ContactPlan::from_contacts(vec![
            Contact::new(0, 2, 0.0, 10.0, 100.0, 0.0),
            Contact::new(0, 1, 0.0, 10.0, 100.0, 0.0),
        ]);
        let b = Bundle::new(1, 0, 9, 100, Priority::Normal, 0.0, 100.0, None);
        let hop = epidemic_next_hop(&b, 0, &plan, 5.0);
        assert_eq!(hop, Some(1));
    }

    #[test]
    fn spray_wait_phase_only_targets_destination() {
        let plan = ContactPlan::from_contacts(vec![
            Contact::new(0, 1, 0.0, 10.0, 100.0, 0.0),
            Contact::new(0, 2, 0.0, 10.0, 100.0, 0.0),
        ]);
        let mut b = Bundle::new(1, 0, 2, 100, Priority::Normal, 0.0, 100.0, Some(1));
        b.spray_tokens = Some(1);
        assert_eq!(spray_and_wait_next_hop(&b, 0, &plan, 5.0), Some(2));
    }

    #[test]
    fn predictive_chooses_first_hop_of_chain() {
        let plan = chain_plan();
        let b = Bundle::new(1, 0, 2, 100, Priority::Normal, 0.0, 1000.0, None);
        let hop = predictive_next_hop(&b, 0, &plan, 0.0, 0.0);
        assert_eq!(hop, Some(1));
    }

    #[test]
    fn predictive_returns_none_when_unreachable() {
        let plan = ContactPlan::from_contacts(vec![Contact::new(0, 1, 0.0, 10.0, 100.0, 0.0)]);
        let b = Bundle::new(1, 0, 9, 100, Priority::Normal, 0.0, 1000.0, None);
        assert_eq!(predictive_next_hop(&b, 0, &plan, 0.0, 0.0), None);
    }
}
