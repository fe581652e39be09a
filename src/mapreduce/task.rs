use std::path::PathBuf;

/// Which half of a MapReduce job a task belongs to (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Map,
    Reduce,
}

/// One unit of work handed to a worker via `WorkerTransport::do_task` —
/// the `DoTaskArgs` collaborator contract from spec.md §6.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub job_name: String,
    pub phase: Phase,
    pub task_number: usize,
    /// Input file for this task; only set for `Phase::Map`.
    pub input_file: Option<String>,
    /// Size of the other phase: `nReduce` for a Map task, the number of
    /// map tasks for a Reduce task.
    pub n_other: usize,
}

/// The naming contract a reduce task uses to find one intermediate file
/// per map task, grounded in the original `common_reduce.go`'s
/// `reduceName` convention. Producing or reading the file is the user
/// map/reduce application's concern and stays out of this crate's scope.
pub fn reduce_file_name(job_name: &str, map_task: usize, reduce_task: usize) -> PathBuf {
    PathBuf::from(format!("mrtmp.{job_name}-{map_task}-{reduce_task}"))
}
