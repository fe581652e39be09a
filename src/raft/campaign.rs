use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::raft::node::Node;
use crate::raft::proto::RequestVoteArgs;

/// How one election round ended.
pub enum CampaignOutcome {
    /// Strict majority of the full cluster granted their vote.
    Won,
    /// A higher term was observed, or a valid leader's heartbeat
    /// arrived mid-campaign; the peer has already stepped down.
    SteppedDown,
    /// The per-election deadline elapsed without a majority and
    /// without a newer term being observed; the caller should retry
    /// with a fresh randomized backoff.
    Undecided,
}

/// Orchestrates one election round for `term`, grounded in the
/// teacher's `Raft::solicit_votes` (`FuturesUnordered` fan-out over
/// peer clients), generalized to the full policy in spec.md §4.3:
/// strict majority of the cluster size `N` (fixing the majority-of-
/// responders bug), early termination on a higher observed term or an
/// external cancel, and no double-counted or leaked replies.
pub async fn run_campaign_round(node: Arc<Node>, term: u64) -> CampaignOutcome {
    // Drain any stale cancel signal left over from a previous round so
    // it can't spuriously abort this one (the signal is a single-slot,
    // lossy flag — see spec.md §9).
    node.drain_stale_campaign_cancel();

    let (last_log_index, last_log_term) = {
        let state = node.state.lock().await;
        (state.log.last_index(), state.log.last_term())
    };

    let cluster_size = node.peers.len() as u64 + 1;
    let quorum = cluster_size / 2 + 1;
    let mut granted: u64 = 1; // ourself
    if granted >= quorum {
        // Cluster of size 1 (B2): win immediately, no peers to ask.
        return CampaignOutcome::Won;
    }

    let args = RequestVoteArgs {
        term,
        candidate_id: node.me,
        last_log_index,
        last_log_term,
    };

    let mut pending = FuturesUnordered::new();
    for peer in &node.peers {
        let peer = peer.clone();
        let args = args.clone();
        pending.push(async move { peer.request_vote(args).await });
    }

    let deadline = tokio::time::sleep(Duration::from_millis(node.config.min_election_timeout_ms));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            _ = node.campaign_cancel.notified() => {
                return CampaignOutcome::SteppedDown;
            }
            reply = pending.next() => {
                match reply {
                    None => return CampaignOutcome::Undecided,
                    Some(Ok(reply)) => {
                        if reply.term > term {
                            let mut state = node.state.lock().await;
                            state.observe_term(reply.term);
                            return CampaignOutcome::SteppedDown;
                        }
                        if reply.vote_granted {
                            granted += 1;
                            if granted >= quorum {
                                return CampaignOutcome::Won;
                            }
                        }
                        // A reply that neither raises the term nor
                        // grants the vote changes nothing (transient
                        // RPC failures are likewise ignored — spec.md §7).
                    }
                    Some(Err(_)) => {
                        // Transient RPC failure: ignored, retried next tick by
                        // the outer election clock, never surfaced (spec.md §7).
                    }
                }
            }
            _ = &mut deadline => {
                return CampaignOutcome::Undecided;
            }
        }
    }
}
