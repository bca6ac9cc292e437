use crate::cache::IndexCache;
use crate::inheritance::InheritanceGraph;
use crate::project::DiscoveredProject;
use rescope_api::{Project, ProjectId, Warning, WarningKind};
use std::collections::BTreeMap;

/// Mutable workspace state, guarded by the engine's lock.
pub(crate) struct WorkspaceState {
    pub projects: BTreeMap<ProjectId, Project>,
    pub graph: InheritanceGraph,
    /// Parents as written in each manifest, including links the graph rejected.
    pub declared_parents: BTreeMap<ProjectId, Option<ProjectId>>,
    pub cache: IndexCache,
    /// Manifest problems: unreadable manifests, rejected parents.
    pub project_warnings: BTreeMap<ProjectId, Vec<Warning>>,
    /// Warnings from each project's latest build.
    pub build_warnings: BTreeMap<ProjectId, Vec<Warning>>,
}

/// Effect of applying or removing one project manifest.
#[derive(Debug, Default)]
pub(crate) struct ManifestOutcome {
    pub added: bool,
    pub removed: bool,
    pub parent_changed: bool,
    /// Projects whose view changed with this manifest: descendants, and projects whose
    /// rejected parent link could now be made. Their cache entries were dropped.
    pub affected: Vec<ProjectId>,
    pub warnings: Vec<Warning>,
}

impl WorkspaceState {
    pub fn new(cache: IndexCache) -> Self {
        Self {
            projects: BTreeMap::new(),
            graph: InheritanceGraph::new(),
            declared_parents: BTreeMap::new(),
            cache,
            project_warnings: BTreeMap::new(),
            build_warnings: BTreeMap::new(),
        }
    }

    /// Register or update a project from its manifest.
    ///
    /// A parent that would close a cycle is rejected with a warning and the previous
    /// link stays in place.
    pub fn apply_manifest(&mut self, found: DiscoveredProject) -> ManifestOutcome {
        let DiscoveredProject { id, dir, manifest } = found;
        let mut outcome = ManifestOutcome::default();

        let manifest = match manifest {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!("Unreadable manifest for {}: {}", id, err);
                outcome.warnings.push(Warning::project(
                    id.clone(),
                    WarningKind::MalformedManifest {
                        reason: err.to_string(),
                    },
                ));
                Default::default()
            }
        };

        outcome.added = !self.projects.contains_key(&id);
        let old_parent = self.projects.get(&id).and_then(|p| p.parent_id.clone());

        self.graph.add_project(&id);
        self.declared_parents
            .insert(id.clone(), manifest.parent.clone());
        if let Err(err) = self.graph.set_parent(&id, manifest.parent.as_ref()) {
            tracing::warn!("{}", err);
            outcome.warnings.push(Warning::project(
                id.clone(),
                WarningKind::CycleDetected { parent: err.parent },
            ));
        }
        let parent = self.graph.parent_of(&id);
        outcome.parent_changed = !outcome.added && old_parent != parent;

        self.projects.insert(
            id.clone(),
            Project {
                id: id.clone(),
                title: manifest.title,
                parent_id: parent,
                base_path: dir,
            },
        );

        if outcome.warnings.is_empty() {
            self.project_warnings.remove(&id);
        } else {
            self.project_warnings
                .insert(id.clone(), outcome.warnings.clone());
        }

        if outcome.added || outcome.parent_changed {
            outcome.affected = self.graph.descendants(&id);
            self.cache.invalidate(Some(&id));
            self.cache.invalidate_many(&outcome.affected);
        }
        outcome.affected.extend(self.relink_rejected());
        outcome.affected.sort();
        outcome.affected.dedup();
        outcome
    }

    pub fn remove_project(&mut self, id: &ProjectId) -> ManifestOutcome {
        if self.projects.remove(id).is_none() {
            return ManifestOutcome::default();
        }
        let mut affected = self.graph.descendants(id);
        self.graph.remove_project(id);
        self.declared_parents.remove(id);
        self.cache.invalidate(Some(id));
        self.cache.invalidate_many(&affected);
        self.project_warnings.remove(id);
        self.build_warnings.remove(id);
        affected.extend(self.relink_rejected());
        affected.sort();
        affected.dedup();

        ManifestOutcome {
            removed: true,
            affected,
            ..Default::default()
        }
    }

    /// Retry declared parent links that were rejected for closing a cycle.
    ///
    /// Returns every project whose view changed: the relinked ones and their descendants.
    fn relink_rejected(&mut self) -> Vec<ProjectId> {
        let pending: Vec<(ProjectId, ProjectId)> = self
            .declared_parents
            .iter()
            .filter_map(|(id, declared)| {
                let declared = declared.as_ref()?;
                (self.graph.parent_of(id).as_ref() != Some(declared))
                    .then(|| (id.clone(), declared.clone()))
            })
            .collect();

        let mut changed = Vec::new();
        for (id, parent) in pending {
            if self.graph.set_parent(&id, Some(&parent)).is_err() {
                continue;
            }
            tracing::info!("Parent link {} -> {} no longer closes a cycle", id, parent);
            if let Some(project) = self.projects.get_mut(&id) {
                project.parent_id = Some(parent);
            }
            let cleared = match self.project_warnings.get_mut(&id) {
                Some(warnings) => {
                    warnings.retain(|w| !matches!(w.kind, WarningKind::CycleDetected { .. }));
                    warnings.is_empty()
                }
                None => false,
            };
            if cleared {
                self.project_warnings.remove(&id);
            }

            let descendants = self.graph.descendants(&id);
            self.cache.invalidate(Some(&id));
            self.cache.invalidate_many(&descendants);
            changed.push(id);
            changed.extend(descendants);
        }
        changed
    }

    /// Forget all parent links before a full re-read of every manifest.
    pub fn reset_graph(&mut self) {
        self.graph = InheritanceGraph::new();
    }

    pub fn warnings(&self, project: Option<&ProjectId>) -> Vec<Warning> {
        let select = |id: &ProjectId| project.is_none_or(|p| p == id);
        self.project_warnings
            .iter()
            .chain(self.build_warnings.iter())
            .filter(|(id, _)| select(id))
            .flat_map(|(_, warnings)| warnings.iter().cloned())
            .collect()
    }
}
