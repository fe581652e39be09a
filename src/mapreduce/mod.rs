//! The MapReduce task scheduler: a two-phase task dispatcher that
//! multiplexes a dynamic stream of worker addresses against a fixed set
//! of tasks, retrying failed tasks on other workers and returning once
//! every task has succeeded exactly once (spec.md §1, §4.4).

mod scheduler;
mod task;
mod worker_pool;

pub use scheduler::{schedule, WorkerTransport};
pub use task::{reduce_file_name, Phase, TaskDescriptor};
pub use worker_pool::WorkerPool;
