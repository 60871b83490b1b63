//! LTP segment and session engine — the largest single piece of this core.
//! Sessions are an explicit state machine, with transitions driven purely by
//! method calls from the scheduler's event handlers in `crate::sim`: this
//! module owns segmentation arithmetic and session bookkeeping only, not
//! scheduling — it never touches the clock, a contact, or an RNG stream.

use std::collections::{HashMap, HashSet};

use crate::time::{BundleId, Date, NodeId, SessionId};

/// The four kinds a segment can carry. Segments carry no payload in this
/// simulator, only a length and a kind; `Segment` below exists
/// mainly to document that shape, since transmission is otherwise modeled
/// as scheduled events keyed by session + index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Data,
    Report,
    Ack,
    Checkpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub session: SessionId,
    pub seq: u32,
    pub len: u64,
    pub kind: SegmentKind,
}

/// What a receiver sends back to a sender: either a report of missing
/// segment indices (sorted ascending) or a final acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Report(Vec<u32>),
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Checkpointed,
    ClosedDelivered,
    ClosedFailed,
}

/// One sender→receiver transfer of a single bundle copy over one contact
/// direction.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub sender: NodeId,
    pub receiver: NodeId,
    pub bundle_id: BundleId,
    pub seg_size: u64,
    total_size: u64,
    n: u32,
    /// Segment indices the receiver has successfully received.
    delivered: HashSet<u32>,
    /// Per-segment retransmission counts, indexed by segment number.
    retry_count: Vec<u32>,
    /// Segment indices queued for transmission in the current OPEN round:
    /// all of `0..n` on first open, only the reported-missing subset on a
    /// retransmission round.
    to_send: Vec<u32>,
    /// Index of the last segment emitted in the current round — the
    /// checkpoint-bearing segment whose arrival (or whose loss, covered by
    /// the `CheckpointTimeout` fallback) triggers the receiver's report or
    /// ack.
    round_last: Option<u32>,
    /// Whether feedback (report or ack) has already been sent for the
    /// current round, so a `CheckpointTimeout` arriving after the
    /// checkpoint-bearing segment already triggered one does not send a
    /// second, duplicate round of feedback.
    feedback_sent: bool,
    pub state: SessionState,
    /// Bumped on suspend/discard so events scheduled against a prior
    /// incarnation of this session id recognize themselves as stale and
    /// no-op.
    pub generation: u32,
    pub start_time: Date,
    pub last_activity: Date,
}

impl Session {
    pub fn open(
        id: SessionId,
        sender: NodeId,
        receiver: NodeId,
        bundle_id: BundleId,
        total_size: u64,
        seg_size: u64,
        t: Date,
    ) -> Self {
        let n = total_size.div_ceil(seg_size).max(1) as u32;
        Self {
            id,
            sender,
            receiver,
            bundle_id,
            seg_size,
            total_size,
            n,
            delivered: HashSet::new(),
            retry_count: vec![0; n as usize],
            to_send: (0..n).collect(),
            round_last: None,
            feedback_sent: false,
            state: SessionState::Open,
            generation: 0,
            start_time: t,
            last_activity: t,
        }
    }

    pub fn n_segments(&self) -> u32 {
        self.n
    }

    /// Byte length of segment `idx`: `seg_size`, except the last segment
    /// which carries the remainder.
    pub fn segment_len(&self, idx: u32) -> u64 {
        debug_assert!(idx < self.n);
        if idx + 1 == self.n {
            let full = self.seg_size * (self.n as u64 - 1);
            self.total_size - full
        } else {
            self.seg_size
        }
    }

    /// Segments to transmit in the current OPEN round, in ascending order.
    pub fn to_send(&self) -> &[u32] {
        &self.to_send
    }

    /// Records that the receiver has segment `idx`.
    pub fn mark_received(&mut self, idx: u32, t: Date) {
        self.delivered.insert(idx);
        self.last_activity = t;
    }

    pub fn is_complete(&self) -> bool {
        self.delivered.len() as u32 == self.n
    }

    /// Segment indices the receiver has not yet seen, ascending.
    pub fn missing(&self) -> Vec<u32> {
        let mut m: Vec<u32> = (0..self.n).filter(|i| !self.delivered.contains(i)).collect();
        m.sort_unstable();
        m
    }

    pub fn begin_checkpoint(&mut self, t: Date) {
        self.state = SessionState::Checkpointed;
        self.round_last = self.to_send.last().copied();
        self.feedback_sent = false;
        self.last_activity = t;
    }

    /// Whether `idx` is the checkpoint-bearing segment of the current round.
    pub fn is_round_last(&self, idx: u32) -> bool {
        self.round_last == Some(idx)
    }

    /// Whether this round's feedback (report or ack) has already been sent,
    /// so the `SegmentArrival`/`CheckpointTimeout` race only
    /// fires feedback once.
    pub fn feedback_sent(&self) -> bool {
        self.feedback_sent
    }

    pub fn mark_feedback_sent(&mut self) {
        self.feedback_sent = true;
    }

    /// Reopens the session for a retransmission round over `missing`,
    /// bumping each retransmitted segment's retry counter. Returns the
    /// highest retry count reached by any segment in this round, for the
    /// caller to compare against `max_ltp_retries`.
    pub fn retransmit(&mut self, missing: &[u32], t: Date) -> u32 {
        self.state = SessionState::Open;
        self.to_send = missing.to_vec();
        self.last_activity = t;
        for &idx in missing {
            self.retry_count[idx as usize] += 1;
        }
        missing.iter().map(|&i| self.retry_count[i as usize]).max().unwrap_or(0)
    }

    pub fn close_delivered(&mut self, t: Date) {
        self.state = SessionState::ClosedDelivered;
        self.last_activity = t;
    }

    pub fn close_failed(&mut self, t: Date) {
        self.state = SessionState::ClosedFailed;
        self.last_activity = t;
    }

    /// Suspends the session (contact ended mid-transfer): bumps the
    /// generation so events already in flight for this session no-op on
    /// arrival.
    pub fn suspend(&mut self) -> u32 {
        self.generation += 1;
        self.generation
    }

    pub fn is_stale(&self, generation: u32) -> bool {
        generation != self.generation
    }
}

/// Tracks every live session, keyed by id, plus which session (if any) is
/// the active outbound one for each ordered (sender, receiver) pair — at
/// most one OPEN or CHECKPOINTED session per direction at a time.
#[derive(Default)]
pub struct SessionTable {
    sessions: HashMap<SessionId, Session>,
    active_by_pair: HashMap<(NodeId, NodeId), SessionId>,
    next_id: SessionId,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_for(&self, sender: NodeId, receiver: NodeId) -> Option<SessionId> {
        self.active_by_pair.get(&(sender, receiver)).copied()
    }

    pub fn open(
        &mut self,
        sender: NodeId,
        receiver: NodeId,
        bundle_id: BundleId,
        total_size: u64,
        seg_size: u64,
        t: Date,
    ) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;
        let session = Session::open(id, sender, receiver, bundle_id, total_size, seg_size, t);
        self.sessions.insert(id, session);
        self.active_by_pair.insert((sender, receiver), id);
        id
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Removes `id` from the active-pair slot (the session itself may be
    /// kept around briefly for inspection by the caller, or dropped).
    pub fn vacate(&mut self, id: SessionId) {
        if let Some(session) = self.sessions.get(&id) {
            let key = (session.sender, session.receiver);
            if self.active_by_pair.get(&key) == Some(&id) {
                self.active_by_pair.remove(&key);
            }
        }
    }

    pub fn discard(&mut self, id: SessionId) -> Option<Session> {
        self.vacate(id);
        if let Some(session) = self.sessions.get_mut(&id) {
            session.suspend();
        }
        self.sessions.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmentation_counts_and_sums_to_total_size() {
        let s = Session::open(0, 0, 1, 0, 2048, 1024, 0.0);
        assert_eq!(s.n_segments(), 2);
        let total: u64 = (0..s.n_segments()).map(|i| s.segment_len(i)).sum();
        assert_eq!(total, 2048);
    }

    #[test]
    fn short_last_segment_is_the_remainder() {
        let s = Session::open(0, 0, 1, 0, 2001, 1024, 0.0);
        assert_eq!(s.n_segments(), 2);
        assert_eq!(s.segment_len(0), 1024);
        assert_eq!(s.segment_len(1), 2001 - 1024);
    }

    #[test]
    fn report_then_retransmit_workflow() {
        let mut s = Session::open(0, 0, 1, 0, 2048, 1024, 0.0);
        s.mark_received(0, 1.0);
        assert!(!s.is_complete());
        assert_eq!(s.missing(), vec![1]);

        s.begin_checkpoint(1.0);
        let peak = s.retransmit(&s.missing(), 1.5);
        assert_eq!(peak, 1);
        assert_eq!(s.to_send(), &[1]);

        s.mark_received(1, 2.0);
        assert!(s.is_complete());
    }

    #[test]
    fn retry_count_accumulates_across_rounds() {
        let mut s = Session::open(0, 0, 1, 0, 1024, 1024, 0.0);
        let peak1 = s.retransmit(&[0], 1.0);
        let peak2 = s.retransmit(&[0], 2.0);
        assert_eq!(peak1, 1);
        assert_eq!(peak2, 2);
    }

    #[test]
    fn suspend_bumps_generation_and_marks_stale() {
        let mut s = Session::open(0, 0, 1, 0, 1024, 1024, 0.0);
        assert!(!s.is_stale(0));
        let g = s.suspend();
        assert_eq!(g, 1);
        assert!(s.is_stale(0));
        assert!(!s.is_stale(1));
    }

    #[test]
    fn session_table_enforces_one_active_per_direction() {
        let mut table = SessionTable::new();
        let a = table.open(0, 1, 10, 1024, 1024, 0.0);
        assert_eq!(table.active_for(0, 1), Some(a));
        table.vacate(a);
        assert_eq!(table.active_for(0, 1), None);
        let b = table.open(0, 1, 11, 1024, 1024, 5.0);
        assert_ne!(a, b);
        assert_eq!(table.active_for(0, 1), Some(b));
    }
}
