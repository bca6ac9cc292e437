use super::RescopeEngine;
use super::coordinator::CoordinatorHandle;
use crate::error::Result;
use crate::project::watcher::FsWatcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl RescopeEngine {
    /// Watch the workspace root and feed changes to a new change coordinator.
    /// Both tasks exit when `cancel_token` is cancelled.
    pub async fn start_watch_with_token(
        self: Arc<Self>,
        cancel_token: CancellationToken,
    ) -> Result<CoordinatorHandle> {
        let root = self.root.clone();
        let mut watcher = FsWatcher::new(&root)?;
        let handle = self.start_coordinator(cancel_token.clone());
        let forward = handle.clone();

        tokio::spawn(async move {
            tracing::info!("Started watching {}", root.display());
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        break;
                    }
                    batch = watcher.next_events() => {
                        let Some(batch) = batch else {
                            break;
                        };
                        if batch.into_iter().any(|event| forward.submit(event).is_err()) {
                            break;
                        }
                    }
                }
            }
            tracing::info!("File watcher task ended for {}", root.display());
        });

        Ok(handle)
    }

    /// Watch with a child of the engine-wide cancellation token.
    pub async fn watch(self: Arc<Self>) -> Result<CoordinatorHandle> {
        let cancel_token = self.cancel_token.child_token();
        self.start_watch_with_token(cancel_token).await
    }
}
