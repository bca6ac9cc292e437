//! The resolution engine: project registry, cache and the on-demand build path.

use crate::cache::{CacheEntry, CacheStats, IndexCache};
use crate::catalog::ResourceTypeCatalog;
use crate::config::EngineConfig;
use crate::error::{RescopeError, Result, ScanError};
use crate::project::{discover_projects, read_project};
use crate::symbols::query_completions;
use dashmap::DashMap;
use rescope_api::{
    CompletionItem, EffectiveResourceSet, EngineEvent, MergedIndex, Project, ProjectId, Warning,
    WarningKind,
};
use rescope_plugin::{ManifestCap, ProviderCaps};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock, broadcast};

mod build;
pub mod coordinator;
mod state;
mod watch;

use build::{LayerBuilder, ProjectLayer, compose_entry};
use coordinator::DirtySet;
use state::WorkspaceState;

const EVENT_CAPACITY: usize = 256;

/// Resolves effective resources and script symbols for every project in a workspace.
///
/// Reads are served from the [`IndexCache`]; a miss builds the project on demand.
/// Rebuilds of one project are serialized through a per-project scan gate, while reads
/// of other projects proceed.
pub struct RescopeEngine {
    /// Workspace root; each direct child directory with a manifest is a project.
    root: PathBuf,
    config: EngineConfig,
    catalog: Arc<ResourceTypeCatalog>,
    manifest: Arc<dyn ManifestCap>,
    state: RwLock<WorkspaceState>,
    scan_gates: DashMap<ProjectId, Arc<Mutex<()>>>,
    events: broadcast::Sender<EngineEvent>,
    /// Completed coordinator cycles.
    cycles: AtomicU64,
    /// Cancellation token for background tasks (watcher, coordinator)
    cancel_token: tokio_util::sync::CancellationToken,
}

pub struct RescopeEngineBuilder {
    root: PathBuf,
    config: Option<EngineConfig>,
    providers: Vec<ProviderCaps>,
    manifest: Option<Arc<dyn ManifestCap>>,
}

impl RescopeEngineBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: None,
            providers: Vec::new(),
            manifest: None,
        }
    }

    pub fn with_provider(mut self, caps: ProviderCaps) -> Self {
        self.providers.push(caps);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the manifest reader contributed by providers.
    pub fn with_manifest_reader(mut self, reader: Arc<dyn ManifestCap>) -> Self {
        self.manifest = Some(reader);
        self
    }

    pub fn build(self) -> Result<RescopeEngine> {
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => EngineConfig::load(&root)?,
        };
        let catalog = ResourceTypeCatalog::from_providers(&self.providers)?;
        let manifest = self
            .manifest
            .or_else(|| self.providers.iter().find_map(|caps| caps.manifest.clone()))
            .ok_or_else(|| RescopeError::Config("no manifest reader registered".to_string()))?;

        tracing::info!(
            "Engine for {} with {} resource types",
            root.display(),
            catalog.len()
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cache = IndexCache::new(config.cache_ttl(), config.cache_capacity);
        Ok(RescopeEngine {
            root,
            config,
            catalog: Arc::new(catalog),
            manifest,
            state: RwLock::new(WorkspaceState::new(cache)),
            scan_gates: DashMap::new(),
            events,
            cycles: AtomicU64::new(0),
            cancel_token: tokio_util::sync::CancellationToken::new(),
        })
    }
}

impl RescopeEngine {
    pub fn builder(root: impl Into<PathBuf>) -> RescopeEngineBuilder {
        RescopeEngineBuilder::new(root.into())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ResourceTypeCatalog {
        &self.catalog
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Read every project manifest under the root and rebuild the inheritance graph.
    pub async fn discover(&self) -> Result<Vec<ProjectId>> {
        let root = self.root.clone();
        let reader = self.manifest.clone();
        let found = tokio::task::spawn_blocking(move || discover_projects(&root, reader.as_ref()))
            .await
            .map_err(|e| RescopeError::Internal(e.to_string()))??;
        let ids: Vec<ProjectId> = found.iter().map(|p| p.id.clone()).collect();

        let mut events = Vec::new();
        {
            let mut state = self.state.write().await;
            let stale: Vec<ProjectId> = state
                .projects
                .keys()
                .filter(|id| !ids.contains(id))
                .cloned()
                .collect();
            for id in stale {
                state.remove_project(&id);
                events.push(EngineEvent::ProjectRemoved { project: id });
            }

            state.reset_graph();
            for project in &found {
                state.graph.add_project(&project.id);
            }
            let mut changed = Vec::new();
            for project in found {
                let id = project.id.clone();
                let outcome = state.apply_manifest(project);
                if outcome.added {
                    events.push(EngineEvent::ProjectAdded {
                        project: id.clone(),
                    });
                }
                if outcome.added || outcome.parent_changed {
                    changed.push(id);
                }
                events.extend(outcome.warnings.into_iter().map(EngineEvent::Warning));
            }
            // Descendants are only complete once every link is in place.
            for id in changed {
                let descendants = state.graph.descendants(&id);
                state.cache.invalidate_many(&descendants);
            }
        }

        tracing::info!("Discovered {} projects under {}", ids.len(), self.root.display());
        for event in events {
            self.publish(event);
        }
        Ok(ids)
    }

    pub async fn project(&self, id: &ProjectId) -> Option<Project> {
        self.state.read().await.projects.get(id).cloned()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.values().cloned().collect()
    }

    /// Ancestors nearest first, truncated at the first missing one.
    pub async fn ancestor_chain(&self, id: &ProjectId) -> Result<Vec<ProjectId>> {
        let state = self.state.read().await;
        if !state.projects.contains_key(id) {
            return Err(RescopeError::NotFound(id.clone()));
        }
        Ok(state.graph.ancestor_chain(id))
    }

    pub async fn effective_resources(&self, id: &ProjectId) -> Result<Arc<EffectiveResourceSet>> {
        Ok(self.entry(id).await?.effective.clone())
    }

    pub async fn merged_index(&self, id: &ProjectId) -> Result<Arc<MergedIndex>> {
        Ok(self.entry(id).await?.merged.clone())
    }

    pub async fn query_completions(
        &self,
        id: &ProjectId,
        prefix: &str,
    ) -> Result<Vec<CompletionItem>> {
        let entry = self.entry(id).await?;
        Ok(query_completions(&entry.merged, prefix))
    }

    /// Warnings for one project, or for the whole workspace.
    pub async fn warnings(&self, id: Option<&ProjectId>) -> Result<Vec<Warning>> {
        let state = self.state.read().await;
        if let Some(id) = id {
            if !state.projects.contains_key(id) {
                return Err(RescopeError::NotFound(id.clone()));
            }
        }
        Ok(state.warnings(id))
    }

    pub async fn invalidate(&self, id: Option<&ProjectId>) {
        let removed = self.state.write().await.cache.invalidate(id);
        tracing::debug!("Invalidated {} cache entries", removed);
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.state.read().await.cache.stats()
    }

    /// The cached build of a project, building it on a miss.
    pub async fn entry(&self, id: &ProjectId) -> Result<Arc<CacheEntry>> {
        if let Some(entry) = self.state.write().await.cache.get(id) {
            return Ok(entry);
        }

        let gate = self.scan_gate(id);
        let _guard = gate.lock().await;
        // Someone else may have finished the build while we waited.
        if let Some(entry) = self.state.read().await.cache.peek(id) {
            return Ok(entry);
        }
        self.rebuild_locked(id, &DirtySet::full()).await
    }

    /// Rebuild a project now, regardless of the cache.
    pub(crate) async fn refresh_project(
        &self,
        id: &ProjectId,
        dirty: &DirtySet,
    ) -> Result<Arc<CacheEntry>> {
        let gate = self.scan_gate(id);
        let _guard = gate.lock().await;
        self.rebuild_locked(id, dirty).await
    }

    fn scan_gate(&self, id: &ProjectId) -> Arc<Mutex<()>> {
        self.scan_gates
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Caller holds the project's scan gate.
    async fn rebuild_locked(&self, id: &ProjectId, dirty: &DirtySet) -> Result<Arc<CacheEntry>> {
        let (dir, chain, previous, ancestors) = {
            let state = self.state.read().await;
            let project = state
                .projects
                .get(id)
                .ok_or_else(|| RescopeError::NotFound(id.clone()))?;
            let chain = state.graph.chain(id);
            let ancestors: Vec<(ProjectId, Option<PathBuf>, Option<Arc<CacheEntry>>)> = chain
                .ancestors
                .iter()
                .map(|a| {
                    (
                        a.clone(),
                        state.projects.get(a).map(|p| p.base_path.clone()),
                        state.cache.peek(a),
                    )
                })
                .collect();
            (
                project.base_path.clone(),
                chain,
                state.cache.peek(id),
                ancestors,
            )
        };

        let catalog = self.catalog.clone();
        let follow_hidden = self.config.follow_hidden;
        let project = id.clone();
        let incremental = dirty.is_incremental().then(|| dirty.resources.clone());

        let entry = tokio::task::spawn_blocking(move || -> Result<CacheEntry> {
            let builder = LayerBuilder::new(&catalog, follow_hidden);

            let own = match (incremental, previous.as_deref()) {
                (Some(keys), Some(prev)) => {
                    let base = ProjectLayer::from_entry(prev);
                    match builder.patch(&project, &dir, &base, &keys)? {
                        Some(layer) => layer,
                        None => builder.build(&project, &dir, Some(&base.modules))?,
                    }
                }
                (_, prev) => builder.build(&project, &dir, prev.map(|p| p.modules.as_ref()))?,
            };

            let mut missing = chain.missing;
            let mut layers = Vec::new();
            for (ancestor, ancestor_dir, cached) in ancestors {
                let layer = match (cached, ancestor_dir) {
                    (Some(entry), _) => ProjectLayer::from_entry(&entry),
                    (None, Some(ancestor_dir)) => {
                        match builder.build(&ancestor, &ancestor_dir, None) {
                            Ok(layer) => layer,
                            Err(err) => {
                                tracing::warn!("Ancestor {} of {} unavailable: {}", ancestor, project, err);
                                missing = Some(ancestor);
                                break;
                            }
                        }
                    }
                    (None, None) => {
                        missing = Some(ancestor);
                        break;
                    }
                };
                layers.push((ancestor, layer));
            }

            Ok(compose_entry(&project, own, &layers, missing))
        })
        .await
        .map_err(|e| RescopeError::Internal(e.to_string()))?;

        let entry = match entry {
            Ok(entry) => Arc::new(entry),
            Err(RescopeError::Scan(err)) => return Ok(self.record_failure(id, &err).await),
            Err(err) => return Err(err),
        };

        let mut state = self.state.write().await;
        if state.projects.contains_key(id) {
            state.build_warnings.insert(id.clone(), entry.warnings.clone());
            state.cache.put(entry.clone());
        }
        tracing::debug!(
            "Built {}: {} effective entries, {} modules",
            id,
            entry.effective.len(),
            entry.merged.len()
        );
        Ok(entry)
    }

    /// A failed scan drops the stale entry and answers with an empty, uncached one that
    /// carries the failure, so readers never see old data.
    async fn record_failure(&self, id: &ProjectId, err: &ScanError) -> Arc<CacheEntry> {
        tracing::warn!("Scan of {} failed: {}", id, err);
        let warning = Warning::project(
            id.clone(),
            WarningKind::ScanFailed {
                reason: err.to_string(),
            },
        );
        {
            let mut state = self.state.write().await;
            state.cache.invalidate(Some(id));
            if state.projects.contains_key(id) {
                state.build_warnings.insert(id.clone(), vec![warning.clone()]);
            }
        }
        self.publish(EngineEvent::Warning(warning.clone()));
        Arc::new(CacheEntry::failed(id.clone(), warning))
    }

    /// Re-read one project's manifest after it changed on disk.
    pub(crate) async fn reload_manifest(&self, id: &ProjectId) -> Result<state::ManifestOutcome> {
        let dir = self.root.join(id.as_str());
        let reader = self.manifest.clone();
        let found = tokio::task::spawn_blocking(move || {
            dir.join(reader.manifest_file())
                .is_file()
                .then(|| read_project(&dir, reader.as_ref()))
                .flatten()
        })
        .await
        .map_err(|e| RescopeError::Internal(e.to_string()))?;

        let outcome = {
            let mut state = self.state.write().await;
            match found {
                Some(project) => state.apply_manifest(project),
                None => state.remove_project(id),
            }
        };

        if outcome.added {
            tracing::info!("Project {} added", id);
            self.publish(EngineEvent::ProjectAdded {
                project: id.clone(),
            });
        }
        if outcome.removed {
            tracing::info!("Project {} removed", id);
            self.publish(EngineEvent::ProjectRemoved {
                project: id.clone(),
            });
        }
        for warning in &outcome.warnings {
            self.publish(EngineEvent::Warning(warning.clone()));
        }
        Ok(outcome)
    }

    pub(crate) fn next_cycle(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn manifest_file(&self) -> &str {
        self.manifest.manifest_file()
    }
}

impl Drop for RescopeEngine {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
