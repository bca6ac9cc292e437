//! Turns filesystem events into debounced, per-project rebuild cycles.

use super::RescopeEngine;
use crate::error::{RescopeError, Result};
use crate::project::watcher::FsEvent;
use rescope_api::{EngineEvent, EngineWatchHandle, ProjectId};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub mod change;
pub mod scheduler;

pub use change::{DirtySet, classify};
pub use scheduler::{ProjectPhase, RescanScheduler};

/// Feeds events to a running coordinator and stops it.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<FsEvent>,
    cancel: CancellationToken,
}

impl CoordinatorHandle {
    pub fn submit(&self, event: FsEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| RescopeError::Internal("change coordinator has stopped".to_string()))
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl EngineWatchHandle for CoordinatorHandle {
    fn stop(&self) {
        self.cancel.cancel();
    }
}

/// A finished cycle and the projects it dirtied in turn.
struct CycleDone {
    project: ProjectId,
    follow_up: Vec<ProjectId>,
}

impl RescopeEngine {
    /// Start a coordinator that consumes events submitted through the returned handle.
    ///
    /// It stops when `cancel_token` is cancelled or the engine is dropped.
    pub fn start_coordinator(self: &Arc<Self>, cancel_token: CancellationToken) -> CoordinatorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::downgrade(self);
        let debounce = self.config.debounce();
        tokio::spawn(run(engine, rx, cancel_token.clone(), debounce));
        CoordinatorHandle {
            tx,
            cancel: cancel_token,
        }
    }

    pub fn classify(&self, event: &FsEvent) -> Option<(ProjectId, DirtySet)> {
        classify(&self.root, &self.catalog, self.manifest_file(), event)
    }

    /// Run one rebuild cycle and notify subscribers once it has been written to the cache.
    ///
    /// Returns the projects that inherit from this one when their view may have changed.
    pub(crate) async fn run_cycle(&self, project: &ProjectId, dirty: DirtySet) -> Vec<ProjectId> {
        let mut follow_up = Vec::new();

        if dirty.manifest {
            match self.reload_manifest(project).await {
                Ok(outcome) => {
                    follow_up.extend(outcome.affected);
                    if outcome.removed {
                        return follow_up;
                    }
                }
                Err(err) => {
                    tracing::error!("Failed to reload manifest of {}: {}", project, err);
                    return follow_up;
                }
            }
        }

        let previous_hash = self
            .state
            .read()
            .await
            .cache
            .peek(project)
            .map(|e| e.content_hash);

        match self.refresh_project(project, &dirty).await {
            Ok(entry) if !entry.is_failed() => {
                if previous_hash != Some(entry.content_hash) {
                    let mut state = self.state.write().await;
                    let descendants = state.graph.descendants(project);
                    state.cache.invalidate_many(&descendants);
                    follow_up.extend(descendants);
                }
                let cycle = self.next_cycle();
                tracing::info!("Rescanned {} (cycle {})", project, cycle);
                self.publish(EngineEvent::ResourcesChanged {
                    project: project.clone(),
                    cycle,
                });
            }
            // Failures are already recorded as warnings; the next event retries.
            Ok(_) => tracing::debug!("Cycle for {} ended in a scan failure", project),
            Err(err) => tracing::debug!("Cycle for {} produced no entry: {}", project, err),
        }

        follow_up.sort();
        follow_up.dedup();
        follow_up
    }
}

async fn run(
    engine: Weak<RescopeEngine>,
    mut events: mpsc::UnboundedReceiver<FsEvent>,
    cancel_token: CancellationToken,
    debounce: Duration,
) {
    tracing::info!("Change coordinator started (debounce {:?})", debounce);
    let mut scheduler = RescanScheduler::new(debounce);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<CycleDone>();

    loop {
        let deadline = scheduler
            .next_deadline()
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            _ = cancel_token.cancelled() => {
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                if let Some((project, dirty)) = engine.classify(&event) {
                    tracing::trace!("{:?} {} dirties {}", event.kind, event.path.display(), project);
                    scheduler.record(project, dirty, Instant::now());
                }
            }
            Some(done) = done_rx.recv() => {
                let now = Instant::now();
                scheduler.complete(&done.project);
                for project in done.follow_up {
                    scheduler.record(project, DirtySet::full(), now);
                }
            }
            _ = tokio::time::sleep_until(deadline), if scheduler.has_pending() => {
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                for (project, dirty) in scheduler.take_due(Instant::now()) {
                    let engine = engine.clone();
                    let done_tx = done_tx.clone();
                    tokio::spawn(async move {
                        let follow_up = engine.run_cycle(&project, dirty).await;
                        let _ = done_tx.send(CycleDone { project, follow_up });
                    });
                }
            }
        }
    }

    tracing::info!("Change coordinator stopped");
}
