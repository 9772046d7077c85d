use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use super::{Scheduler, TimerHandle, TimerTask};

/// Scheduler that runs tasks on a tokio runtime.
///
/// Each task is a spawned future racing a sleep against a cancellation token. Tasks run on the
/// runtime's worker threads, which is why [`TimerTask`] must be `Send`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running in.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        self.handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => task(),
            }
        });

        TimerHandle::new(move || cancel.cancel())
    }
}
