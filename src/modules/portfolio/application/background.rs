use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::shared::api::RemoteError;

/// Best-effort backend pushes that run detached from the caller.
///
/// Dropping the set does not cancel anything; the handles are kept only so
/// callers can wait for the pending pushes with [`BackgroundTasks::settle`].
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `push`; a failure is logged and otherwise ignored.
    pub fn spawn<F>(&mut self, label: String, push: F)
    where
        F: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        self.handles.retain(|handle| !handle.is_finished());

        let handle = tokio::spawn(async move {
            match push.await {
                Ok(()) => debug!("Background {} completed", label),
                Err(e) => warn!("Background {} failed: {}", label, e),
            }
        });
        self.handles.push(handle);
    }

    pub fn pending(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub async fn settle(&mut self) {
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                error!("Background task did not complete: {}", e);
            }
        }
    }
}
