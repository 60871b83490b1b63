//! The Topology Oracle: derives, from the Contact
//! Plan and the current time, the set of active directed edges consumed by
//! routing. A thin query layer over [`ContactPlan`] — it holds no state of
//! its own, since the plan is immutable and the oracle's whole job is to
//! answer "what does the graph look like right now".

use crate::contact_plan::ContactPlan;
use crate::time::{Date, NodeId};

pub struct Topology<'a> {
    plan: &'a ContactPlan,
}

impl<'a> Topology<'a> {
    pub fn new(plan: &'a ContactPlan) -> Self {
        Self { plan }
    }

    /// Nodes directly reachable from `node` at time `t`, in ascending id
    /// order for deterministic router tie-breaking.
    pub fn active_neighbors(&self, node: NodeId, t: Date) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self
            .plan
            .contacts()
            .iter()
            .filter(|c| c.is_up_at(t))
            .filter_map(|c| c.other(node))
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    pub fn is_up(&self, u: NodeId, v: NodeId, t: Date) -> bool {
        self.plan.is_up(u, v, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;

    #[test]
    fn active_neighbors_are_sorted_and_deduped() {
        let plan = ContactPlan::from_contacts(vec![
            Contact::new(0, 2, 0.0, 10.0, 100.0, 0.0),
            Contact::new(0, 1, 0.0, 10.0, 100.0, 0.0),
        ]);
        let topo = Topology::new(&plan);
        assert_eq!(topo.active_neighbors(0, 5.0), vec![1, 2]);
        assert!(topo.active_neighbors(3, 5.0).is_empty());
    }
}
