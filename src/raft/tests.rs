//! Multi-peer scenario tests exercising election behavior end to end,
//! wiring several `Node`s together through an in-process mock transport
//! instead of real sockets (spec.md §1 scopes transport simulation out;
//! the handler policy under test does not care what carries the bytes).

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::config::RaftConfig;
use crate::error::{Error, Result};
use crate::raft::client::RaftPeerRpc;
use crate::raft::node::{ApplyMsg, Node};
use crate::raft::persister::MemoryPersister;
use crate::raft::proto::{AppendEntriesArgs, AppendEntriesReply, RequestVoteArgs, RequestVoteReply};

/// Routes calls straight into another in-process `Node`'s RPC handlers.
/// The cell is filled in after all nodes in a cluster exist, since each
/// peer's client list must name the others before any of them are built.
struct LoopbackPeer {
    target: Arc<OnceLock<Arc<Node>>>,
}

impl RaftPeerRpc for LoopbackPeer {
    fn request_vote(&self, args: RequestVoteArgs) -> BoxFuture<'_, Result<RequestVoteReply>> {
        let target = self.target.clone();
        async move {
            let node = target.get().expect("peer initialized before first RPC").clone();
            Ok(node.request_vote(args).await)
        }
        .boxed()
    }

    fn append_entries(&self, args: AppendEntriesArgs) -> BoxFuture<'_, Result<AppendEntriesReply>> {
        let target = self.target.clone();
        async move {
            let node = target.get().expect("peer initialized before first RPC").clone();
            Ok(node.append_entries(args).await)
        }
        .boxed()
    }
}

/// A peer that can never be reached, modeling a crashed or partitioned
/// server without tearing down the `Node` that would otherwise sit there.
struct UnreachablePeer;

impl RaftPeerRpc for UnreachablePeer {
    fn request_vote(&self, _args: RequestVoteArgs) -> BoxFuture<'_, Result<RequestVoteReply>> {
        async { Err(Error::Transport("peer unreachable".into())) }.boxed()
    }

    fn append_entries(&self, _args: AppendEntriesArgs) -> BoxFuture<'_, Result<AppendEntriesReply>> {
        async { Err(Error::Transport("peer unreachable".into())) }.boxed()
    }
}

fn fast_config() -> RaftConfig {
    RaftConfig { min_election_timeout_ms: 100, election_timeout_range_ms: 50, heartbeat_interval_ms: 20 }
}

/// Builds `n` fully interconnected peers, each backed by its own
/// `MemoryPersister` and wired to the others via `LoopbackPeer`.
fn build_cluster(n: usize, config: RaftConfig) -> Vec<Arc<Node>> {
    let cells: Vec<Arc<OnceLock<Arc<Node>>>> = (0..n).map(|_| Arc::new(OnceLock::new())).collect();
    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let peers: Vec<Arc<dyn RaftPeerRpc>> = (0..n)
            .filter(|&j| j != i)
            .map(|j| Arc::new(LoopbackPeer { target: cells[j].clone() }) as Arc<dyn RaftPeerRpc>)
            .collect();
        let (apply_tx, _apply_rx) = tokio::sync::mpsc::unbounded_channel::<ApplyMsg>();
        let node = Node::new(peers, i as u64, Arc::new(MemoryPersister::new()), apply_tx, config.clone());
        cells[i].set(node.clone()).ok().expect("each cell is set exactly once");
        nodes.push(node);
    }
    nodes
}

async fn all_states(nodes: &[Arc<Node>]) -> Vec<(u64, bool)> {
    futures::future::join_all(nodes.iter().map(|n| n.get_state())).await
}

/// B2: a single-node cluster is its own majority and becomes leader on
/// its very first election, with no peers to wait on.
#[tokio::test(start_paused = true)]
async fn b2_single_node_becomes_leader_immediately() {
    let nodes = build_cluster(1, fast_config());
    tokio::time::sleep(Duration::from_millis(500)).await;
    let (_, is_leader) = nodes[0].get_state().await;
    assert!(is_leader);
}

/// B3: a two-node cluster where the other peer is permanently
/// unreachable can never reach a majority and must never elect a leader.
#[tokio::test(start_paused = true)]
async fn b3_two_node_cluster_stalls_without_a_majority() {
    let (apply_tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let peers: Vec<Arc<dyn RaftPeerRpc>> = vec![Arc::new(UnreachablePeer)];
    let node = Node::new(peers, 0, Arc::new(MemoryPersister::new()), apply_tx, fast_config());

    tokio::time::sleep(Duration::from_secs(3)).await;
    let (_, is_leader) = node.get_state().await;
    assert!(!is_leader, "no majority exists; this peer must not be able to declare itself leader");
}

/// S1: with no failures, a quiet cluster elects exactly one leader and
/// every peer agrees on the term governing it (P1, P3).
#[tokio::test(start_paused = true)]
async fn s1_quiet_cluster_elects_exactly_one_leader() {
    let nodes = build_cluster(3, fast_config());
    tokio::time::sleep(Duration::from_secs(2)).await;

    let states = all_states(&nodes).await;
    let leaders: Vec<_> = states.iter().filter(|(_, is_leader)| *is_leader).collect();
    assert_eq!(leaders.len(), 1, "expected exactly one leader, observed {states:?}");
}

/// S2: killing the current leader forces a re-election; the new leader
/// that emerges must carry a strictly higher term than the old one (P2).
#[tokio::test(start_paused = true)]
async fn s2_crashed_leader_is_replaced_by_a_higher_term_leader() {
    let nodes = build_cluster(5, fast_config());
    tokio::time::sleep(Duration::from_secs(2)).await;

    let before = all_states(&nodes).await;
    let (leader_idx, (first_term, _)) =
        before.iter().enumerate().find(|(_, (_, is_leader))| *is_leader).expect("a leader was elected");
    let first_term = *first_term;
    nodes[leader_idx].kill();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let after: Vec<(u64, bool)> = futures::future::join_all(
        nodes.iter().enumerate().filter(|(i, _)| *i != leader_idx).map(|(_, n)| n.get_state()),
    )
    .await;
    let new_leaders: Vec<_> = after.iter().filter(|(_, is_leader)| *is_leader).collect();
    assert_eq!(new_leaders.len(), 1, "expected exactly one surviving leader, observed {after:?}");
    assert!(new_leaders[0].0 > first_term, "new leader's term must exceed the crashed leader's term");
}

/// S3: contention among several simultaneously-starting candidates must
/// still converge to a single leader within a bounded number of retries,
/// thanks to randomized election timeouts breaking the tie.
#[tokio::test(start_paused = true)]
async fn s3_contested_election_converges_to_one_leader() {
    let config = RaftConfig { min_election_timeout_ms: 80, election_timeout_range_ms: 40, heartbeat_interval_ms: 15 };
    let nodes = build_cluster(4, config);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let states = all_states(&nodes).await;
    let leaders: Vec<_> = states.iter().filter(|(_, is_leader)| *is_leader).collect();
    assert_eq!(leaders.len(), 1, "expected convergence to one leader, observed {states:?}");
}

/// P5: once `kill` has taken effect, a peer's election clock stops
/// producing further campaigns, so its term never advances again no
/// matter how much more virtual time passes.
#[tokio::test(start_paused = true)]
async fn p5_killed_peer_term_never_advances_again() {
    let nodes = build_cluster(1, fast_config());
    tokio::time::sleep(Duration::from_millis(500)).await;
    let (term_at_kill, is_leader) = nodes[0].get_state().await;
    assert!(is_leader);

    nodes[0].kill();
    tokio::time::sleep(Duration::from_secs(5)).await;
    let (term_after, _) = nodes[0].get_state().await;
    assert_eq!(term_after, term_at_kill, "a killed peer must not keep campaigning for new terms");
}
