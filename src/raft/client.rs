use futures::future::BoxFuture;
use futures::FutureExt;
use tonic::transport::Channel;

use crate::error::{Error, Result};
use crate::raft::proto::raft_service_client::RaftServiceClient;
use crate::raft::proto::{AppendEntriesArgs, AppendEntriesReply, RequestVoteArgs, RequestVoteReply};

/// The peer-to-peer side of the RPC surface: what `Campaign` and the
/// leader's heartbeat sender call to reach another peer. A trait rather
/// than a concrete `tonic` client so tests can wire peers together
/// in-process without a real transport (transport simulation is a named
/// collaborator, out of this crate's scope — spec.md §1).
pub trait RaftPeerRpc: Send + Sync {
    fn request_vote(&self, args: RequestVoteArgs) -> BoxFuture<'_, Result<RequestVoteReply>>;
    fn append_entries(&self, args: AppendEntriesArgs) -> BoxFuture<'_, Result<AppendEntriesReply>>;
}

/// A thin wrapper around the generated `tonic` client, in the same
/// shape as the teacher's `raft::client::KvClient` — holds a cloneable
/// channel-backed client and exposes typed async methods — but wired to
/// the peer-to-peer `RequestVote`/`AppendEntries` surface instead of a
/// session-based client API (session/register/execute semantics are out
/// of this spec's scope).
#[derive(Clone)]
pub struct PeerClient {
    inner: RaftServiceClient<Channel>,
}

impl PeerClient {
    pub fn new(channel: Channel) -> PeerClient {
        PeerClient { inner: RaftServiceClient::new(channel) }
    }
}

impl RaftPeerRpc for PeerClient {
    fn request_vote(&self, args: RequestVoteArgs) -> BoxFuture<'_, Result<RequestVoteReply>> {
        let mut client = self.inner.clone();
        async move {
            client
                .request_vote(args)
                .await
                .map(|resp| resp.into_inner())
                .map_err(Error::from)
        }
        .boxed()
    }

    fn append_entries(&self, args: AppendEntriesArgs) -> BoxFuture<'_, Result<AppendEntriesReply>> {
        let mut client = self.inner.clone();
        async move {
            client
                .append_entries(args)
                .await
                .map(|resp| resp.into_inner())
                .map_err(Error::from)
        }
        .boxed()
    }
}
