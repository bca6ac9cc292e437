//! Blocking build steps: scan a project, index its scripts, resolve it against its
//! ancestors.

use crate::cache::CacheEntry;
use crate::catalog::ResourceTypeCatalog;
use crate::error::ScanError;
use crate::inheritance::{AncestorLayer, InheritanceResolver};
use crate::project::{ProjectScanner, content_hash};
use crate::symbols::{ModuleLayer, SymbolIndexer, merge_module_indexes};
use rayon::prelude::*;
use rescope_api::{
    ModuleIndex, ProjectId, Resource, ResourceKey, ResourceKind, ResourceSet, ScriptModule,
    Warning, WarningKind,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// One project's own contribution, before inheritance.
#[derive(Debug, Clone)]
pub(crate) struct ProjectLayer {
    pub resources: Arc<ResourceSet>,
    pub modules: Arc<ModuleIndex>,
    pub content_hash: u64,
    pub warnings: Vec<Warning>,
}

impl ProjectLayer {
    /// Recover the own layer of a cached build.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            resources: entry.scanned.clone(),
            modules: entry.modules.clone(),
            content_hash: entry.content_hash,
            warnings: entry
                .warnings
                .iter()
                .filter(|w| !matches!(w.kind, WarningKind::MissingAncestor { .. }))
                .cloned()
                .collect(),
        }
    }
}

pub(crate) struct LayerBuilder<'a> {
    catalog: &'a ResourceTypeCatalog,
    follow_hidden: bool,
}

impl<'a> LayerBuilder<'a> {
    pub fn new(catalog: &'a ResourceTypeCatalog, follow_hidden: bool) -> Self {
        Self {
            catalog,
            follow_hidden,
        }
    }

    fn scanner(&self) -> ProjectScanner<'a> {
        ProjectScanner::new(self.catalog).follow_hidden(self.follow_hidden)
    }

    /// Full scan. Modules whose source is unchanged since `previous` are reused.
    pub fn build(
        &self,
        project: &ProjectId,
        dir: &Path,
        previous: Option<&ModuleIndex>,
    ) -> Result<ProjectLayer, ScanError> {
        let output = self.scanner().scan(project, dir)?;

        let targets: Vec<(&Resource, &str)> = output
            .resources
            .values()
            .filter_map(|r| self.indexed_primary(r).map(|primary| (r, primary)))
            .collect();
        let results: Vec<Result<Arc<ScriptModule>, Warning>> = targets
            .par_iter()
            .map(|(resource, primary)| index_one(project, resource, primary, previous))
            .collect();

        let mut modules = ModuleIndex::new();
        let mut warnings = output.warnings;
        for result in results {
            match result {
                Ok(module) => {
                    modules.insert(module.qualified_path.clone(), module);
                }
                Err(warning) => warnings.push(warning),
            }
        }

        Ok(ProjectLayer {
            resources: Arc::new(output.resources),
            modules: Arc::new(modules),
            content_hash: output.content_hash,
            warnings,
        })
    }

    /// Rescan only `keys` on top of `base`.
    ///
    /// Returns `None` when a key no longer names a directory of the same kind; the caller
    /// then falls back to a full scan.
    pub fn patch(
        &self,
        project: &ProjectId,
        dir: &Path,
        base: &ProjectLayer,
        keys: &BTreeSet<ResourceKey>,
    ) -> Result<Option<ProjectLayer>, ScanError> {
        let scanner = self.scanner();
        let mut resources = (*base.resources).clone();
        let mut modules = (*base.modules).clone();
        let mut warnings: Vec<Warning> = base
            .warnings
            .iter()
            .filter(|w| w.resource.as_ref().is_none_or(|k| !keys.contains(k)))
            .cloned()
            .collect();

        for key in keys {
            let Some((resource, issues)) = scanner.scan_resource(project, dir, key)? else {
                return Ok(None);
            };
            if resources.get(key).map(|r| r.kind) != Some(resource.kind) {
                return Ok(None);
            }
            warnings.extend(issues);

            modules.retain(|_, m| &m.resource != key);
            if let Some(primary) = self.indexed_primary(&resource) {
                match index_one(project, &resource, primary, Some(&base.modules)) {
                    Ok(module) => {
                        modules.insert(module.qualified_path.clone(), module);
                    }
                    Err(warning) => warnings.push(warning),
                }
            }
            resources.insert(key.clone(), resource);
        }

        Ok(Some(ProjectLayer {
            content_hash: content_hash(&resources),
            resources: Arc::new(resources),
            modules: Arc::new(modules),
            warnings,
        }))
    }

    fn indexed_primary(&self, resource: &Resource) -> Option<&'a str> {
        if resource.kind != ResourceKind::Resource {
            return None;
        }
        let catalog: &'a ResourceTypeCatalog = self.catalog;
        let ty = catalog.get(&resource.key.type_id)?;
        ty.is_indexed()
            .then(|| ty.descriptor().primary_file.as_str())
    }
}

fn index_one(
    project: &ProjectId,
    resource: &Resource,
    primary: &str,
    previous: Option<&ModuleIndex>,
) -> Result<Arc<ScriptModule>, Warning> {
    let qualified_path = resource.key.path.to_dotted();
    let reusable = previous
        .and_then(|modules| modules.get(&qualified_path))
        .filter(|module| {
            module.resource == resource.key
                && resource
                    .file(primary)
                    .is_some_and(|f| f.content_hash == module.content_hash)
        });
    if let Some(module) = reusable {
        return Ok(module.clone());
    }

    SymbolIndexer::index_resource(resource, primary)
        .map(Arc::new)
        .map_err(|w| {
            tracing::warn!("Symbol extraction failed for {}: {}", resource.key, w);
            Warning::resource(
                project.clone(),
                resource.key.clone(),
                WarningKind::SymbolParseFailure {
                    reason: w.reason,
                },
            )
        })
}

/// Resolve a project's own layer against its ancestors (nearest first).
pub(crate) fn compose_entry(
    project: &ProjectId,
    own: ProjectLayer,
    ancestors: &[(ProjectId, ProjectLayer)],
    missing: Option<ProjectId>,
) -> CacheEntry {
    let resource_layers: Vec<AncestorLayer<'_>> = ancestors
        .iter()
        .map(|(id, layer)| AncestorLayer {
            project: id,
            resources: &layer.resources,
        })
        .collect();
    let module_layers: Vec<ModuleLayer<'_>> = ancestors
        .iter()
        .map(|(id, layer)| ModuleLayer {
            project: id,
            modules: &layer.modules,
        })
        .collect();

    let effective = InheritanceResolver::resolve(project, &own.resources, &resource_layers);
    let merged = merge_module_indexes(&effective, &own.modules, &module_layers);

    let mut warnings = own.warnings;
    if let Some(ancestor) = missing {
        warnings.push(Warning::project(
            project.clone(),
            WarningKind::MissingAncestor { ancestor },
        ));
    }

    CacheEntry {
        project: project.clone(),
        scanned: own.resources,
        effective: Arc::new(effective),
        modules: own.modules,
        merged: Arc::new(merged),
        content_hash: own.content_hash,
        warnings,
    }
}
