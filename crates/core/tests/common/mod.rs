#![allow(dead_code)]

use rescope_api::{EngineEvent, ProjectId, ResourceKey, ResourcePath, ResourceTypeId};
use rescope_core::{EngineConfig, RescopeEngine};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

pub const SCRIPTS: &str = "script-python";
pub const QUERIES: &str = "named-query";

/// A throwaway workspace on disk.
pub struct Workspace {
    _dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn project(&self, id: &str, parent: Option<&str>) -> PathBuf {
        let manifest = match parent {
            Some(parent) => format!(r#"{{"title": "{id}", "parent": "{parent}"}}"#),
            None => format!(r#"{{"title": "{id}"}}"#),
        };
        self.write(&format!("{id}/project.json"), &manifest)
    }

    /// A resource of a built-in type with its manifest. Returns the primary file.
    pub fn resource(&self, project: &str, type_id: &str, path: &str, primary: &str, content: &str) -> PathBuf {
        let dir = format!("{project}/ignition/{type_id}/{path}");
        self.write(&format!("{dir}/resource.json"), r#"{"scope": "G"}"#);
        self.write(&format!("{dir}/{primary}"), content)
    }

    pub fn script(&self, project: &str, path: &str, source: &str) -> PathBuf {
        self.resource(project, SCRIPTS, path, "code.py", source)
    }

    pub fn query(&self, project: &str, path: &str, sql: &str) -> PathBuf {
        self.resource(project, QUERIES, path, "query.sql", sql)
    }

    pub fn config() -> EngineConfig {
        EngineConfig {
            debounce_ms: 50,
            ..EngineConfig::default()
        }
    }

    pub fn engine_with(&self, config: EngineConfig) -> Arc<RescopeEngine> {
        Arc::new(
            RescopeEngine::builder(self.root.clone())
                .with_provider(rescope_builtin::builtin_caps())
                .with_config(config)
                .build()
                .unwrap(),
        )
    }

    /// Engine with a short debounce and every project discovered.
    pub async fn open(&self) -> Arc<RescopeEngine> {
        let engine = self.engine_with(Self::config());
        engine.discover().await.unwrap();
        engine
    }
}

pub fn pid(id: &str) -> ProjectId {
    ProjectId::new(id)
}

pub fn key(type_id: &str, path: &str) -> ResourceKey {
    ResourceKey::new(ResourceTypeId::new(type_id.to_string()), ResourcePath::new(path))
}

/// Wait for the next completed cycle of `project`, skipping other events.
pub async fn next_change(rx: &mut broadcast::Receiver<EngineEvent>, project: &ProjectId) -> u64 {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(EngineEvent::ResourcesChanged { project: p, cycle }) if &p == project => {
                    return cycle;
                }
                Ok(_) => continue,
                Err(e) => panic!("event stream ended: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a rescan")
}

/// Count completed cycles of `project` within `window`.
pub async fn count_changes(
    rx: &mut broadcast::Receiver<EngineEvent>,
    project: &ProjectId,
    window: Duration,
) -> usize {
    let mut count = 0;
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(event) = tokio::time::timeout_at(deadline, rx.recv()).await {
        if let Ok(EngineEvent::ResourcesChanged { project: p, .. }) = event {
            if &p == project {
                count += 1;
            }
        }
    }
    count
}
