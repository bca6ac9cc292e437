use crate::catalog::ResourceTypeCatalog;
use crate::project::watcher::{ChangeKind, FsEvent};
use rescope_api::{ProjectId, ResourceKey};
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// What has to be redone for one project in its next cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    /// Rescan the whole project.
    pub full: bool,
    /// Re-read the project manifest before scanning.
    pub manifest: bool,
    /// Resource directories whose files were modified in place.
    pub resources: BTreeSet<ResourceKey>,
}

impl DirtySet {
    pub fn full() -> Self {
        Self {
            full: true,
            ..Self::default()
        }
    }

    pub fn manifest() -> Self {
        Self {
            full: true,
            manifest: true,
            ..Self::default()
        }
    }

    pub fn resource(key: ResourceKey) -> Self {
        Self {
            resources: BTreeSet::from([key]),
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: DirtySet) {
        self.full |= other.full;
        self.manifest |= other.manifest;
        self.resources.extend(other.resources);
    }

    /// Only in-place edits of existing resources are pending.
    pub fn is_incremental(&self) -> bool {
        !self.full && !self.manifest && !self.resources.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.full && !self.manifest && self.resources.is_empty()
    }
}

/// Map a filesystem event under `root` onto the project it dirties.
///
/// The first path component below the root names the project. Returns `None` for
/// changes that cannot affect any resource set.
pub fn classify(
    root: &Path,
    catalog: &ResourceTypeCatalog,
    manifest_file: &str,
    event: &FsEvent,
) -> Option<(ProjectId, DirtySet)> {
    let relative = event.path.strip_prefix(root).ok()?;
    let mut components = relative.components();
    let project = match components.next()? {
        Component::Normal(name) => ProjectId::new(name.to_str()?),
        _ => return None,
    };
    let rest = components.as_path();

    // The project directory itself, or its manifest.
    if rest.as_os_str().is_empty() || rest == Path::new(manifest_file) {
        return Some((project, DirtySet::manifest()));
    }

    let Some((ty, logical)) = catalog.locate(rest) else {
        // A whole type tree moved in or out at once; no per-file events follow.
        return (event.kind != ChangeKind::Modified && catalog.encloses_base_dir(rest))
            .then(|| (project, DirtySet::full()));
    };
    if event.kind != ChangeKind::Modified {
        return Some((project, DirtySet::full()));
    }
    let Some(dir) = logical.parent().filter(|p| !p.is_root()) else {
        return Some((project, DirtySet::full()));
    };
    let name = logical.name();
    if ty.is_primary(name) || ty.is_manifest(name) || ty.matches(&logical.to_path_buf()) {
        Some((project, DirtySet::resource(ResourceKey::new(ty.id().clone(), dir))))
    } else {
        None
    }
}
