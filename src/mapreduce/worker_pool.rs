use tokio::sync::{mpsc, Mutex};

/// An unbounded FIFO of worker RPC addresses (spec.md §4.5). Producers
/// are external worker registration and the scheduler returning a
/// worker after a successful dispatch; the consumer is the scheduler,
/// one receive per dispatch. Wrapped in a struct rather than a bare
/// channel pair so both sides share one typed handle.
pub struct WorkerPool {
    tx: mpsc::UnboundedSender<String>,
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool::new()
    }
}

impl WorkerPool {
    pub fn new() -> WorkerPool {
        let (tx, rx) = mpsc::unbounded_channel();
        WorkerPool { tx, rx: Mutex::new(rx) }
    }

    /// Makes `addr` available to the next `acquire()` call.
    pub fn register(&self, addr: String) {
        // Can only fail if the pool itself has already been dropped,
        // since the receiver lives exactly as long as `self`.
        let _ = self.tx.send(addr);
    }

    /// Waits for the next available worker address. Blocks indefinitely
    /// when none is free — the scheduler must tolerate long waits, not
    /// busy-poll (spec.md §4.4).
    pub async fn acquire(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}
