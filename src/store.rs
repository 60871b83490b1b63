//! The Bundle Store: a bounded priority buffer with
//! admission and eviction. Not a FIFO — priority and deadline together define
//! a total order, ties broken by bundle id for determinism. At the scale
//! this core operates at (tens to low hundreds of bundles per node), the
//! straightforward approach of keeping bundles in a flat `Vec` and scanning
//! it on admission/selection is the honest one: the "hard part" here is
//! getting eviction and tie-breaking exactly right, not micro-optimizing a
//! buffer the size of a handful of kilobytes.

use crate::bundle::{Bundle, Priority};
use crate::time::{BundleId, Date, NodeId};

/// The outcome of [`BundleStore::admit`].
#[derive(Debug)]
pub enum AdmitResult {
    /// The incoming bundle was inserted with no eviction.
    Admitted,
    /// A bundle was evicted to make room, or (when the incoming bundle was
    /// not strictly better than every resident) the incoming bundle itself
    /// was rejected — in that case the evicted bundle *is* the one passed
    /// to `admit`.
    Evicted(Bundle),
}

/// Total order key: lower sorts first (highest priority, earliest deadline,
/// lowest id breaks ties). The store's preferred bundle is the minimum under
/// this key; the eviction victim is the maximum.
fn rank(b: &Bundle) -> (u8, u64, BundleId) {
    (b.priority as u8, b.deadline().to_bits(), b.id)
}

pub struct BundleStore {
    capacity: usize,
    bundles: Vec<Bundle>,
}

impl BundleStore {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, bundles: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: BundleId) -> bool {
        self.bundles.iter().any(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter()
    }

    /// Admits `b`, evicting the lowest-priority, latest-deadline resident if
    /// the store is full and `b` outranks it. If `b` does not strictly
    /// outrank the worst resident, `b` itself is rejected.
    pub fn admit(&mut self, b: Bundle) -> AdmitResult {
        if self.bundles.len() < self.capacity {
            self.bundles.push(b);
            return AdmitResult::Admitted;
        }

        let victim_idx = self
            .bundles
            .iter()
            .enumerate()
            .max_by_key(|(_, x)| rank(x))
            .map(|(i, _)| i)
            .expect("capacity > 0 implies a full store is non-empty");

        if self.bundles[victim_idx].priority > b.priority {
            let evicted = self.bundles.swap_remove(victim_idx);
            self.bundles.push(b);
            AdmitResult::Evicted(evicted)
        } else {
            AdmitResult::Evicted(b)
        }
    }

    /// Removes and returns the bundle with `id`, if present.
    pub fn remove(&mut self, id: BundleId) -> Option<Bundle> {
        let idx = self.bundles.iter().position(|b| b.id == id)?;
        Some(self.bundles.swap_remove(idx))
    }

    /// Removes and returns every bundle whose deadline has passed `t`.
    pub fn expire(&mut self, t: Date) -> Vec<Bundle> {
        let (expired, remaining): (Vec<Bundle>, Vec<Bundle>) =
            self.bundles.drain(..).partition(|b| b.deadline() <= t);
        self.bundles = remaining;
        expired
    }

    /// The highest-priority bundle (by the total order above) for which
    /// `next_hop(bundle) == Some(peer)`, skipping bundles whose visited set
    /// already contains `peer`.
    pub fn peek_for_peer(
        &self,
        peer: NodeId,
        mut next_hop: impl FnMut(&Bundle) -> Option<NodeId>,
    ) -> Option<BundleId> {
        self.bundles
            .iter()
            .filter(|b| !b.visited.contains(&peer))
            .filter(|b| next_hop(b) == Some(peer))
            .min_by_key(|b| rank(b))
            .map(|b| b.id)
    }

    pub fn get(&self, id: BundleId) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BundleId) -> Option<&mut Bundle> {
        self.bundles.iter_mut().find(|b| b.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(id: BundleId, priority: Priority, deadline_ttl: f64) -> Bundle {
        Bundle::new(id, 0, 9, 100, priority, 0.0, deadline_ttl, None)
    }

    #[test]
    fn admit_under_capacity_never_evicts() {
        let mut s = BundleStore::new(2);
        assert!(matches!(s.admit(bundle(1, Priority::Low, 10.0)), AdmitResult::Admitted));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn eviction_picks_worst_priority_latest_deadline() {
        let mut s = BundleStore::new(2);
        s.admit(bundle(1, Priority::Normal, 10.0));
        s.admit(bundle(2, Priority::Normal, 20.0));

        match s.admit(bundle(3, Priority::Critical, 5.0)) {
            AdmitResult::Evicted(victim) => assert_eq!(victim.id, 2),
            AdmitResult::Admitted => panic!("expected an eviction"),
        }
        assert_eq!(s.len(), 2);
        assert!(s.contains(1));
        assert!(s.contains(3));
        assert!(!s.contains(2));
    }

    #[test]
    fn incoming_bundle_rejected_when_not_strictly_better() {
        let mut s = BundleStore::new(1);
        s.admit(bundle(1, Priority::Critical, 10.0));

        match s.admit(bundle(2, Priority::Normal, 10.0)) {
            AdmitResult::Evicted(rejected) => assert_eq!(rejected.id, 2),
            AdmitResult::Admitted => panic!("expected rejection"),
        }
        assert!(s.contains(1));
        assert!(!s.contains(2));
    }

    #[test]
    fn expire_removes_only_past_deadline() {
        let mut s = BundleStore::new(5);
        s.admit(bundle(1, Priority::Normal, 10.0));
        s.admit(bundle(2, Priority::Normal, 100.0));
        let expired = s.expire(20.0);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, 1);
        assert!(s.contains(2));
    }

    #[test]
    fn admit_then_remove_restores_prior_state() {
        let mut s = BundleStore::new(3);
        s.admit(bundle(1, Priority::Normal, 10.0));
        s.admit(bundle(2, Priority::High, 10.0));
        let before: Vec<BundleId> = s.iter().map(|b| b.id).collect();

        s.admit(bundle(3, Priority::Low, 10.0));
        s.remove(3);

        let after: Vec<BundleId> = s.iter().map(|b| b.id).collect();
        assert_eq!(
            before.iter().collect::<std::collections::HashSet<_>>(),
            after.iter().collect::<std::collections::HashSet<_>>()
        );
    }
}
