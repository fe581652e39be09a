use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex, Notify};

use crate::config::RaftConfig;
use crate::raft::campaign::{run_campaign_round, CampaignOutcome};
use crate::raft::client::RaftPeerRpc;
use crate::raft::election::ElectionClock;
use crate::raft::persister::{Persister, PersistedState};
use crate::raft::proto::{AppendEntriesArgs, AppendEntriesReply, RequestVoteArgs, RequestVoteReply};
use crate::raft::state::{random_election_timeout, PeerState};

/// Delivered once per committed log entry, in increasing
/// `command_index` order (spec.md §6). Driving commit-index advancement
/// and delivery is the apply pipeline's job, which is out of this
/// crate's scope beyond "send on this channel" — see spec.md §1.
#[derive(Debug, Clone)]
pub struct ApplyMsg {
    pub command_valid: bool,
    pub command: Vec<u8>,
    pub command_index: u64,
}

/// A single Raft peer: the `Make`/`GetState`/`Start`/`Kill` contract
/// from spec.md §4.1, plus the `RequestVote`/`AppendEntries` handlers.
pub struct Node {
    pub(crate) state: Mutex<PeerState>,
    pub(crate) peers: Vec<Arc<dyn RaftPeerRpc>>,
    pub(crate) me: u64,
    persister: Arc<dyn Persister>,
    #[allow(dead_code)]
    apply_tx: mpsc::UnboundedSender<ApplyMsg>,
    killed: AtomicBool,
    pub(crate) config: RaftConfig,
    election_clock: ElectionClock,
    pub(crate) campaign_cancel: Notify,
    /// Prevents the election clock from spawning a second concurrent
    /// campaign while one is already retrying for this peer.
    campaigning: AtomicBool,
}

impl Node {
    /// Creates a new peer, restores persisted state if any, and spawns
    /// its background election clock in the `Follower` role. Returns
    /// immediately, per spec.md §4.1's `Make` contract.
    pub fn new(
        peers: Vec<Arc<dyn RaftPeerRpc>>,
        me: u64,
        persister: Arc<dyn Persister>,
        apply_tx: mpsc::UnboundedSender<ApplyMsg>,
        config: RaftConfig,
    ) -> Arc<Node> {
        let mut state = PeerState::new(me, peers.len() + 1);
        if let Ok(Some(persisted)) = persister.read_raft_state() {
            state.current_term = persisted.current_term;
            state.voted_for = persisted.voted_for;
            state.log = persisted.log;
        }

        let node = Arc::new(Node {
            state: Mutex::new(state),
            peers,
            me,
            persister,
            apply_tx,
            killed: AtomicBool::new(false),
            config,
            election_clock: ElectionClock::new(),
            campaign_cancel: Notify::new(),
            campaigning: AtomicBool::new(false),
        });

        let clock_node = Arc::clone(&node);
        tokio::spawn(async move {
            let node = clock_node;
            node.election_clock
                .run(&node.config, &node.killed, || {
                    let node = Arc::clone(&node);
                    async move { node.on_election_timeout().await }.boxed()
                })
                .await;
        });

        node
    }

    /// Snapshot of `(current_term, is_leader)` under the lock.
    pub async fn get_state(&self) -> (u64, bool) {
        let state = self.state.lock().await;
        (state.current_term, state.is_leader())
    }

    /// Appends `command` to the log if we're the leader; otherwise a
    /// no-op. Replicating the entry to followers and advancing
    /// `commit_index` is the collaborator named in spec.md §4.1 — this
    /// method only satisfies the return contract and the local append.
    pub async fn start(&self, command: Vec<u8>) -> (u64, u64, bool) {
        let mut state = self.state.lock().await;
        if !state.is_leader() {
            return (0, 0, false);
        }
        let term = state.current_term;
        let index = state.log.append(term, command);
        self.persist(&state);
        (index, term, true)
    }

    /// Idempotent shutdown: after this returns (and any in-flight
    /// suspension points observe it), no further outbound RPC or
    /// `ApplyMsg` is produced (P5).
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// `Raft.RequestVote` (spec.md §4.1, §6).
    pub async fn request_vote(&self, args: RequestVoteArgs) -> RequestVoteReply {
        let mut state = self.state.lock().await;

        if args.term < state.current_term {
            return RequestVoteReply { term: state.current_term, vote_granted: false };
        }

        // I6: adopt a higher term and step down before deciding.
        state.observe_term(args.term);

        let granted = state.try_grant_vote(args.candidate_id, args.last_log_term, args.last_log_index);
        let current_term = state.current_term;
        drop(state);

        if granted {
            self.reset_election_timer();
        }

        log::debug!(
            "peer {} RequestVote(term={}, candidate={}) -> granted={}",
            self.me, args.term, args.candidate_id, granted
        );

        RequestVoteReply { term: current_term, vote_granted: granted }
    }

    /// `Raft.AppendEntries` (spec.md §4.1, §6). Log consistency and
    /// entry installation are collaborator responsibilities (marked
    /// `TODO` in the source this is generalized from); the handler's
    /// obligation here is the role/term bookkeeping and suppressing
    /// concurrent elections.
    pub async fn append_entries(&self, args: AppendEntriesArgs) -> AppendEntriesReply {
        let mut state = self.state.lock().await;

        if args.term < state.current_term {
            return AppendEntriesReply { term: state.current_term, success: false };
        }

        // I6 first. Note: voted_for is only cleared by observe_term
        // when the term actually advances — clearing it unconditionally
        // here was the source's bug (spec.md §9, bug #4).
        state.observe_term(args.term);
        state.become_follower(Some(args.leader_id));
        let current_term = state.current_term;
        drop(state);

        self.reset_election_timer();
        // Cancels any campaign this peer is currently running: a valid
        // leader's heartbeat at term >= ours is the "external cancel"
        // from spec.md §4.3.
        self.campaign_cancel.notify_one();

        AppendEntriesReply { term: current_term, success: true }
    }

    fn reset_election_timer(&self) {
        self.election_clock.reset();
    }

    fn persist(&self, state: &PeerState) {
        let snapshot = PersistedState {
            current_term: state.current_term,
            voted_for: state.voted_for,
            log: state.log.clone(),
        };
        if let Err(err) = self.persister.save_raft_state(&snapshot) {
            log::error!("peer {} failed to persist state: {}", self.me, err);
        }
    }

    /// Consumes a stale pending cancel permit, if any, so a new
    /// campaign round doesn't inherit a cancel meant for an earlier one.
    pub(crate) fn drain_stale_campaign_cancel(&self) {
        while self.campaign_cancel.notified().now_or_never().is_some() {}
    }

    async fn on_election_timeout(self: Arc<Self>) {
        if self.is_killed() {
            return;
        }
        {
            let state = self.state.lock().await;
            if state.is_leader() {
                return;
            }
        }
        if self.campaigning.swap(true, Ordering::AcqRel) {
            // Already retrying an election; the outer clock firing
            // again just means we haven't won or stepped down yet.
            return;
        }
        tokio::spawn(Node::run_campaign_loop(self));
    }

    /// Drives repeated candidacy for this peer: each round is one
    /// `Campaign` (spec.md §4.3); on `Undecided` it retries after a
    /// fresh randomized backoff (the role-transition table's "Candidate,
    /// election timeout with no majority -> Candidate (new term)").
    async fn run_campaign_loop(self: Arc<Self>) {
        loop {
            if self.is_killed() {
                break;
            }

            let (term, role) = {
                let mut state = self.state.lock().await;
                if state.is_leader() {
                    break;
                }
                let term = state.become_candidate();
                self.persist(&state);
                (term, state.role.name())
            };
            log::info!("peer {} transitioned to {} for term {}", self.me, role, term);
            self.reset_election_timer();

            match run_campaign_round(self.clone(), term).await {
                CampaignOutcome::Won => {
                    let mut state = self.state.lock().await;
                    // Re-check the term after reacquiring the lock
                    // (spec.md §5: racy-tally fix) — another RPC may
                    // have moved us on since the vote was counted.
                    if state.current_term == term && state.role.is_candidate() {
                        state.become_leader();
                        self.persist(&state);
                        log::info!("peer {} transitioned to {} for term {}", self.me, state.role.name(), term);
                        tokio::spawn(Node::run_heartbeats(self.clone(), term));
                    }
                    break;
                }
                CampaignOutcome::SteppedDown => break,
                CampaignOutcome::Undecided => {
                    let still_candidate = {
                        let state = self.state.lock().await;
                        state.role.is_candidate() && state.current_term == term
                    };
                    if !still_candidate || self.is_killed() {
                        break;
                    }
                    let backoff = random_election_timeout(
                        self.config.min_election_timeout_ms,
                        self.config.election_timeout_range_ms,
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
        self.campaigning.store(false, Ordering::Release);
    }

    /// Detached heartbeat sender: observes the role on each tick and
    /// self-terminates on step-down, per spec.md §5's resource policy.
    /// Never joined.
    async fn run_heartbeats(self: Arc<Self>, term: u64) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.heartbeat_interval_ms));
        loop {
            ticker.tick().await;
            if self.is_killed() {
                return;
            }
            let args = {
                let state = self.state.lock().await;
                if !state.is_leader() || state.current_term != term {
                    return;
                }
                AppendEntriesArgs {
                    term,
                    leader_id: self.me,
                    prev_log_index: state.log.last_index(),
                    prev_log_term: state.log.last_term(),
                    entries: vec![],
                    leader_commit: state.commit_index,
                }
            };
            for peer in self.peers.clone() {
                let node = self.clone();
                let args = args.clone();
                tokio::spawn(async move {
                    if let Ok(reply) = peer.append_entries(args).await {
                        if reply.term > term {
                            let mut state = node.state.lock().await;
                            state.observe_term(reply.term);
                        }
                    }
                });
            }
        }
    }
}
