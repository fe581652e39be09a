use rand::Rng;

use crate::raft::log::Log;

/// A peer's role, tagged with the data that only makes sense in that
/// role. Leader-only fields (`next_index`, `match_index`) live inside
/// `Role::Leader` so they cannot be read while the peer is a follower or
/// candidate — see spec.md §9's "role as tagged state" redesign note.
#[derive(Debug)]
pub enum Role {
    Follower {
        leader: Option<u64>,
    },
    Candidate,
    Leader {
        next_index: Vec<u64>,
        match_index: Vec<u64>,
    },
}

impl Role {
    pub fn is_leader(&self) -> bool {
        matches!(self, Role::Leader { .. })
    }

    pub fn is_candidate(&self) -> bool {
        matches!(self, Role::Candidate)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Follower { .. } => "follower",
            Role::Candidate => "candidate",
            Role::Leader { .. } => "leader",
        }
    }
}

/// The persistent + volatile state of one Raft peer (spec.md §3).
/// Owned exclusively by its `Node` and mutated only under that node's
/// lock.
pub struct PeerState {
    pub me: u64,
    pub num_peers: usize,

    /// Persistent state, must round-trip through `Persister`.
    pub current_term: u64,
    pub voted_for: Option<u64>,
    pub log: Log,

    /// Volatile state.
    pub commit_index: u64,
    pub last_applied: u64,
    pub current_leader: Option<u64>,
    pub role: Role,
}

impl PeerState {
    pub fn new(me: u64, num_peers: usize) -> PeerState {
        PeerState {
            me,
            num_peers,
            current_term: 0,
            voted_for: None,
            log: Log::new(),
            commit_index: 0,
            last_applied: 0,
            current_leader: None,
            role: Role::Follower { leader: None },
        }
    }

    pub fn is_leader(&self) -> bool {
        self.role.is_leader()
    }

    /// Invariant I6: any RPC carrying a higher term forces an immediate
    /// step-down to follower and term adoption, before any further
    /// handler logic runs. Returns `true` if a step-down happened.
    pub fn observe_term(&mut self, term: u64) -> bool {
        if term > self.current_term {
            self.current_term = term;
            self.voted_for = None;
            self.current_leader = None;
            self.role = Role::Follower { leader: None };
            true
        } else {
            false
        }
    }

    /// Transitions to `Candidate` for a fresh term: +1 term, vote for
    /// self. Returns the new term.
    pub fn become_candidate(&mut self) -> u64 {
        self.current_term += 1;
        self.voted_for = Some(self.me);
        self.current_leader = None;
        self.role = Role::Candidate;
        self.current_term
    }

    /// Transitions to `Leader`, initializing per-follower replication
    /// progress to just past our own last log entry (I3: sets
    /// `current_leader = Some(me)`).
    pub fn become_leader(&mut self) {
        let next = self.log.last_index() + 1;
        self.role = Role::Leader {
            next_index: vec![next; self.num_peers],
            match_index: vec![0; self.num_peers],
        };
        self.current_leader = Some(self.me);
    }

    /// Step-down driven by an observed higher term or an external
    /// cancellation signal (a valid leader's heartbeat arriving during
    /// a campaign). Does not touch the term by itself; callers that
    /// observed a higher term should call `observe_term` first.
    pub fn become_follower(&mut self, leader: Option<u64>) {
        self.role = Role::Follower { leader };
        self.current_leader = leader;
    }

    /// Invariant I2/I3: grants at most one vote per term, and only to
    /// a log that is at least as up-to-date as ours (the fixed rule —
    /// last-log comparison, not `commit_index`; see spec.md §9 bug #1).
    pub fn try_grant_vote(
        &mut self,
        candidate_id: u64,
        candidate_last_log_term: u64,
        candidate_last_log_index: u64,
    ) -> bool {
        let already_voted_for_someone_else =
            matches!(self.voted_for, Some(v) if v != candidate_id);
        if already_voted_for_someone_else {
            return false;
        }
        if !self.log.is_candidate_up_to_date(candidate_last_log_term, candidate_last_log_index) {
            return false;
        }
        self.voted_for = Some(candidate_id);
        true
    }
}

/// Picks a fresh randomized election timeout in
/// `[min, min + range)`, per spec.md §4.2.
pub fn random_election_timeout(min_ms: u64, range_ms: u64) -> std::time::Duration {
    let extra = if range_ms == 0 { 0 } else { rand::thread_rng().gen_range(0..range_ms) };
    std::time::Duration::from_millis(min_ms + extra)
}
