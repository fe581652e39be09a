use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::raft::node::Node;
use crate::raft::proto::raft_service_server::RaftService;
use crate::raft::proto::{AppendEntriesArgs, AppendEntriesReply, RequestVoteArgs, RequestVoteReply};

/// The thinnest possible adapter from the generated `tonic` service
/// trait to `Node`: decoding/encoding only, no policy. The policy
/// itself lives in `Node::request_vote`/`Node::append_entries` so it
/// stays unit-testable without a network.
pub struct RaftGrpcService {
    node: Arc<Node>,
}

impl RaftGrpcService {
    pub fn new(node: Arc<Node>) -> RaftGrpcService {
        RaftGrpcService { node }
    }
}

#[tonic::async_trait]
impl RaftService for RaftGrpcService {
    async fn request_vote(
        &self,
        request: Request<RequestVoteArgs>,
    ) -> Result<Response<RequestVoteReply>, Status> {
        let reply = self.node.request_vote(request.into_inner()).await;
        Ok(Response::new(reply))
    }

    async fn append_entries(
        &self,
        request: Request<AppendEntriesArgs>,
    ) -> Result<Response<AppendEntriesReply>, Status> {
        let reply = self.node.append_entries(request.into_inner()).await;
        Ok(Response::new(reply))
    }
}
