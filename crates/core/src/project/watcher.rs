use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// One filesystem change, as consumed by the change coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Translate a notify event. Access events are dropped.
    pub fn from_notify(event: &Event) -> Vec<FsEvent> {
        let kind = match event.kind {
            EventKind::Access(_) => return Vec::new(),
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                return vec![
                    FsEvent::new(event.paths[0].clone(), ChangeKind::Deleted),
                    FsEvent::new(event.paths[1].clone(), ChangeKind::Created),
                ];
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Deleted,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Created,
            EventKind::Modify(ModifyKind::Name(_)) => {
                return event
                    .paths
                    .iter()
                    .map(|p| {
                        let kind = if p.exists() {
                            ChangeKind::Created
                        } else {
                            ChangeKind::Deleted
                        };
                        FsEvent::new(p.clone(), kind)
                    })
                    .collect();
            }
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => ChangeKind::Modified,
        };
        event
            .paths
            .iter()
            .map(|p| FsEvent::new(p.clone(), kind))
            .collect()
    }
}

/// Recursive watcher over the workspace root.
pub struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    pub fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next batch of translated events. `None` once the watcher is gone.
    pub async fn next_events(&mut self) -> Option<Vec<FsEvent>> {
        loop {
            match self.rx.recv().await? {
                Ok(event) => return Some(FsEvent::from_notify(&event)),
                Err(err) => tracing::warn!("Watcher error: {}", err),
            }
        }
    }
}
