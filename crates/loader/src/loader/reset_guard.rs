use crate::error::{ErrorKind, LoadError, LoadResult};
use crate::loader::{Link, Loader};
use crate::request::Request;
use crate::reset::ResetBarrier;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Keeps dispatch and reset from overlapping.
///
/// While a reset of the successor chain is in flight, every `load` arriving
/// at this stage fails fast with `ResetInProgress` instead of queuing. A
/// second reset started during the first is a no-op; the flag clears only
/// once the entire successor subtree has finished its cleanup, so loads
/// resume against fully quiesced state.
#[derive(Debug, Default)]
pub struct ResetGuard {
    resetting: Arc<Mutex<bool>>,
    next: Link,
}

impl ResetGuard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Loader for ResetGuard {
    fn next(&self) -> &Link {
        &self.next
    }

    async fn load(&self, request: Request) -> LoadResult {
        // The lock covers only the flag check, never the forward.
        {
            let resetting = self.resetting.lock().await;
            if *resetting {
                return Err(LoadError::new(ErrorKind::ResetInProgress, request));
            }
        }

        self.next().forward(request).await
    }

    async fn reset_with(&self, barrier: &ResetBarrier) {
        {
            let mut resetting = self.resetting.lock().await;
            if *resetting {
                debug!("reset already in flight, ignoring");
                return;
            }
            if self.next().get().is_none() {
                return;
            }
            *resetting = true;
        }

        let token = barrier.enter();
        let (child_barrier, child_completion) = ResetBarrier::new();

        if let Some(next) = self.next().get() {
            next.reset_with(&child_barrier).await;
        }
        drop(child_barrier);

        // The flag clears only after the subtree has fully quiesced; the
        // caller's token is released right after, so the outer completion
        // cannot fire with the guard still closed.
        let resetting = Arc::clone(&self.resetting);
        tokio::spawn(async move {
            child_completion.wait().await;
            *resetting.lock().await = false;
            drop(token);
        });
    }
}
