use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use tokio::sync::Notify;

use crate::config::RaftConfig;
use crate::raft::state::random_election_timeout;

/// A single-slot, idempotent, level-triggered election timer (spec.md
/// §4.2 and §9's redesign note replacing the source's buffered reset
/// channel). `reset()` pushes the deadline out with a freshly
/// randomized interval; on deadline fire with no intervening reset,
/// `run` invokes `on_timeout` once.
#[derive(Default)]
pub struct ElectionClock {
    reset_signal: Notify,
}

impl ElectionClock {
    pub fn new() -> ElectionClock {
        ElectionClock { reset_signal: Notify::new() }
    }

    /// Moves the deadline forward with a freshly randomized interval.
    /// Idempotent: a reset that arrives while another is already
    /// pending collapses into one (`Notify::notify_one` keeps at most
    /// a single outstanding permit).
    pub fn reset(&self) {
        self.reset_signal.notify_one();
    }

    /// Runs until `killed` is observed. `on_timeout` fires once per
    /// deadline that elapses without an intervening `reset()`.
    pub async fn run(
        &self,
        config: &RaftConfig,
        killed: &AtomicBool,
        mut on_timeout: impl FnMut() -> BoxFuture<'static, ()>,
    ) {
        loop {
            if killed.load(Ordering::SeqCst) {
                return;
            }
            let timeout = random_election_timeout(
                config.min_election_timeout_ms,
                config.election_timeout_range_ms,
            );
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    if killed.load(Ordering::SeqCst) {
                        return;
                    }
                    on_timeout().await;
                }
                _ = self.reset_signal.notified() => {
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn fires_on_timeout_when_never_reset() {
        let clock = ElectionClock::new();
        let killed = Arc::new(AtomicBool::new(false));
        let fires = Arc::new(AtomicU32::new(0));
        let config = RaftConfig { min_election_timeout_ms: 10, election_timeout_range_ms: 0, heartbeat_interval_ms: 1 };

        let killed_inner = killed.clone();
        let fires_inner = fires.clone();
        let run = clock.run(&config, &killed, move || {
            let fires_inner = fires_inner.clone();
            killed_inner.store(true, Ordering::SeqCst);
            Box::pin(async move {
                fires_inner.fetch_add(1, Ordering::SeqCst);
            })
        });
        tokio::time::timeout(Duration::from_secs(1), run).await.unwrap();
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_suppresses_timeout() {
        let clock = Arc::new(ElectionClock::new());
        let killed = Arc::new(AtomicBool::new(false));
        let fires = Arc::new(AtomicU32::new(0));
        let config = RaftConfig { min_election_timeout_ms: 50, election_timeout_range_ms: 0, heartbeat_interval_ms: 1 };

        let resetter_clock = clock.clone();
        let resetter_killed = killed.clone();
        let resetter = tokio::spawn(async move {
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_millis(10)).await;
                resetter_clock.reset();
            }
            resetter_killed.store(true, Ordering::SeqCst);
        });

        let fires_clone = fires.clone();
        clock
            .run(&config, &killed, move || {
                let fires_clone = fires_clone.clone();
                Box::pin(async move {
                    fires_clone.fetch_add(1, Ordering::SeqCst);
                })
            })
            .await;
        resetter.await.unwrap();
        assert_eq!(fires.load(Ordering::SeqCst), 0);
    }
}
