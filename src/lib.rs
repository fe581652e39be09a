//! Two coordination cores that share a concurrency discipline:
//! replicated-log leader election (`raft`) and dynamic-worker task
//! dispatch (`mapreduce`). See spec.md §1 for the shared rationale —
//! both are concurrent state machines coordinating over lossy RPC, with
//! timeouts, retries, and ordering guarantees.

pub mod config;
pub mod error;
pub mod mapreduce;
pub mod raft;
