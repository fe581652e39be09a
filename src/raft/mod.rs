//! The Raft peer state machine: term-monotonic leader election,
//! heartbeat suppression of elections, and the RPC handlers that drive
//! role transitions safely under concurrent delivery (spec.md §1, §4.1).

mod campaign;
pub mod client;
mod election;
mod log;
mod node;
mod persister;
mod proto;
mod service;
mod state;

pub use client::{PeerClient, RaftPeerRpc};
pub use log::{Log, LogEntry};
pub use node::{ApplyMsg, Node};
pub use persister::{MemoryPersister, PersistedState, Persister};
pub use proto::{
    raft_service_client::RaftServiceClient, raft_service_server::RaftServiceServer,
    AppendEntriesArgs, AppendEntriesReply, RequestVoteArgs, RequestVoteReply,
};
pub use service::RaftGrpcService;
pub use state::{PeerState, Role};

#[cfg(test)]
mod tests;
