//! Generated wire types for the `Raft.RequestVote` / `Raft.AppendEntries`
//! RPC surface (spec.md §6), built from `proto/raft.proto` by
//! `tonic-build` (see `build.rs`).

tonic::include_proto!("distcore.raft");
