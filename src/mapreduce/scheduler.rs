use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, Notify};

use crate::mapreduce::task::{Phase, TaskDescriptor};
use crate::mapreduce::worker_pool::WorkerPool;

/// The `call(addr, "Worker.DoTask", args) -> bool` collaborator from
/// spec.md §6, as an async trait so the scheduler is unit-testable
/// without a real RPC transport (transport simulation is out of this
/// crate's scope — spec.md §1).
pub trait WorkerTransport: Send + Sync {
    fn do_task(&self, addr: String, task: TaskDescriptor) -> BoxFuture<'static, bool>;
}

/// Drives one map or reduce phase to completion, a direct generalization
/// of `schedule()`/`dispatchTask()` from
/// `examples/original_source/src/mapreduce/schedule.go` into idiomatic
/// async Rust: the `mpsc` channel below *is* the Go `taskChan`, the
/// `WorkerPool` *is* `registerChan`, and the spawned per-dispatch tasks
/// are the Go dispatcher's per-task goroutines.
///
/// Returns once every task of `0..n_tasks` has produced exactly one
/// success. `make_input_file(task_number)` supplies the Map-phase input
/// file name, or `None` for Reduce tasks (spec.md §3's task descriptor).
pub async fn schedule(
    job_name: &str,
    phase: Phase,
    n_tasks: usize,
    n_other: usize,
    make_input_file: impl Fn(usize) -> Option<String>,
    pool: Arc<WorkerPool>,
    transport: Arc<dyn WorkerTransport>,
) {
    log::info!("schedule: {} {:?} tasks ({} I/Os)", n_tasks, phase, n_other);
    if n_tasks == 0 {
        return;
    }

    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<TaskDescriptor>();
    for i in 0..n_tasks {
        let descriptor = TaskDescriptor {
            job_name: job_name.to_string(),
            phase,
            task_number: i,
            input_file: make_input_file(i),
            n_other,
        };
        task_tx.send(descriptor).expect("task_rx is held by the dispatcher spawned below");
    }

    let remaining = Arc::new(AtomicUsize::new(n_tasks));
    let done = Arc::new(Notify::new());

    let dispatcher = tokio::spawn({
        let pool = pool.clone();
        let transport = transport.clone();
        let remaining = remaining.clone();
        let done = done.clone();
        let retry_tx = task_tx.clone();
        async move {
            while let Some(task) = task_rx.recv().await {
                let pool = pool.clone();
                let transport = transport.clone();
                let remaining = remaining.clone();
                let done = done.clone();
                let retry_tx = retry_tx.clone();
                tokio::spawn(async move {
                    let addr = match pool.acquire().await {
                        Some(addr) => addr,
                        None => return,
                    };
                    if transport.do_task(addr.clone(), task.clone()).await {
                        // Success path is the only path that decrements,
                        // so a task can never be counted twice (R2).
                        if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                            done.notify_one();
                        }
                        pool.register(addr);
                    } else {
                        // Worker presumed dead: re-enqueue the task, do
                        // not return the worker to the pool.
                        let _ = retry_tx.send(task);
                    }
                });
            }
        }
    });

    done.notified().await;
    dispatcher.abort();
    log::info!("schedule: {:?} done", phase);
}
