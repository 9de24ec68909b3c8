//! Completion tracking for chain-wide resets.
//!
//! A reset fans out across every loader in a chain, and parts of the cleanup
//! may outlive the call that started it (work moved onto spawned tasks). The
//! barrier counts participants without knowing them ahead of time: whoever
//! takes part grabs a [`ResetToken`], and [`ResetCompletion::wait`] resolves
//! once every token has been dropped.

use tokio::sync::mpsc;

/// Entry side of a reset barrier.
///
/// Cloning is cheap; a clone counts like the original, so a barrier handed
/// to a spawned task keeps the barrier open until that task lets go of it.
#[derive(Debug, Clone)]
pub struct ResetBarrier {
    counter: mpsc::Sender<()>,
}

/// Participation marker in an in-flight reset. Dropping it signals that this
/// participant's cleanup is finished.
#[derive(Debug)]
pub struct ResetToken {
    _counter: mpsc::Sender<()>,
}

/// Completion side of a reset barrier; see [`ResetCompletion::wait`].
#[derive(Debug)]
pub struct ResetCompletion {
    drained: mpsc::Receiver<()>,
}

impl ResetBarrier {
    /// A fresh barrier with no participants, paired with its completion
    /// handle.
    pub fn new() -> (Self, ResetCompletion) {
        let (counter, drained) = mpsc::channel(1);
        (Self { counter }, ResetCompletion { drained })
    }

    /// Registers one participant. The barrier stays open until the returned
    /// token is dropped.
    pub fn enter(&self) -> ResetToken {
        ResetToken { _counter: self.counter.clone() }
    }
}

impl ResetCompletion {
    /// Resolves once every barrier handle and token has been dropped.
    ///
    /// If nothing ever entered, this resolves immediately once the barrier
    /// itself is gone. Nothing is ever sent through the channel; closure of
    /// the sender side is the signal.
    pub async fn wait(mut self) {
        while self.drained.recv().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn wait_resolves_immediately_without_participants() {
        let (barrier, completion) = ResetBarrier::new();
        drop(barrier);
        completion.wait().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn wait_pends_until_every_token_is_dropped() {
        let (barrier, completion) = ResetBarrier::new();
        let first = barrier.enter();
        let second = barrier.enter();
        drop(barrier);

        let released = Arc::new(AtomicBool::new(false));
        let waiter = {
            let released = released.clone();
            tokio::spawn(async move {
                completion.wait().await;
                released.store(true, Ordering::SeqCst);
            })
        };

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!released.load(Ordering::SeqCst), "one token still outstanding");

        drop(second);
        waiter.await.unwrap();
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn token_moved_into_a_spawned_task_keeps_the_barrier_open() {
        let (barrier, completion) = ResetBarrier::new();
        let token = barrier.enter();
        drop(barrier);

        let cleanup = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(token);
        });

        completion.wait().await;
        cleanup.await.unwrap();
    }
}
