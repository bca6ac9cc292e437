use crate::catalog::{ResourceType, ResourceTypeCatalog};
use crate::error::ScanError;
use ignore::WalkBuilder;
use rayon::prelude::*;
use rescope_api::{
    ManifestState, ProjectId, Resource, ResourceFile, ResourceKey, ResourceKind, ResourcePath,
    ResourceSet, Warning, WarningKind,
};
use std::collections::BTreeMap;
use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xxhash_rust::xxh3::Xxh3;

/// A project's own resources as found on disk.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub resources: ResourceSet,
    pub warnings: Vec<Warning>,
    pub content_hash: u64,
}

/// Files matched inside each directory of one type, keyed by logical path.
type DirFiles = BTreeMap<ResourcePath, BTreeMap<String, PathBuf>>;

/// Walks a project directory and builds its [`ResourceSet`].
///
/// Does not follow inheritance; merging is the resolver's job.
pub struct ProjectScanner<'a> {
    catalog: &'a ResourceTypeCatalog,
    follow_hidden: bool,
}

impl<'a> ProjectScanner<'a> {
    pub fn new(catalog: &'a ResourceTypeCatalog) -> Self {
        Self {
            catalog,
            follow_hidden: false,
        }
    }

    pub fn follow_hidden(mut self, follow: bool) -> Self {
        self.follow_hidden = follow;
        self
    }

    pub fn scan(&self, project: &ProjectId, project_dir: &Path) -> Result<ScanOutput, ScanError> {
        if !project_dir.is_dir() {
            return Err(ScanError::NotFound(project_dir.to_path_buf()));
        }

        let mut pending: Vec<(&Arc<ResourceType>, ResourcePath, BTreeMap<String, PathBuf>)> =
            Vec::new();
        for ty in self.catalog.iter() {
            let base = ty.base_dir(project_dir);
            if !base.is_dir() {
                continue;
            }
            for (path, files) in self.collect(ty, &base) {
                pending.push((ty, path, files));
            }
        }

        let records = pending
            .into_par_iter()
            .map(|(ty, path, files)| {
                let files = hash_files(files)?;
                Ok(build_record(ty, path, files))
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        let mut output = ScanOutput::default();
        for (resource, issues) in records {
            for kind in issues {
                output
                    .warnings
                    .push(Warning::resource(project.clone(), resource.key.clone(), kind));
            }
            output.resources.insert(resource.key.clone(), resource);
        }
        output.content_hash = content_hash(&output.resources);

        tracing::debug!(
            "Scanned {}: {} entries, {} warnings",
            project,
            output.resources.len(),
            output.warnings.len()
        );
        Ok(output)
    }

    /// Rescan a single resource directory.
    ///
    /// Returns `None` when the directory no longer exists or the type is unknown.
    pub fn scan_resource(
        &self,
        project: &ProjectId,
        project_dir: &Path,
        key: &ResourceKey,
    ) -> Result<Option<(Resource, Vec<Warning>)>, ScanError> {
        if !project_dir.is_dir() {
            return Err(ScanError::NotFound(project_dir.to_path_buf()));
        }
        let Some(ty) = self.catalog.get(&key.type_id) else {
            return Ok(None);
        };
        let dir = ty.base_dir(project_dir).join(key.path.to_path_buf());
        if key.path.is_root() || !dir.is_dir() {
            return Ok(None);
        }

        let mut files = BTreeMap::new();
        for entry in fs::read_dir(&dir).map_err(|e| ScanError::io(&dir, e))? {
            let entry = entry.map_err(|e| ScanError::io(&dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_file || (!self.follow_hidden && name.starts_with('.')) {
                continue;
            }
            let relative = key.path.to_path_buf().join(&name);
            if belongs_to(ty, &name, &relative) {
                files.insert(name, entry.path());
            }
        }

        let (resource, issues) = build_record(ty, key.path.clone(), hash_files(files)?);
        let warnings = issues
            .into_iter()
            .map(|kind| Warning::resource(project.clone(), key.clone(), kind))
            .collect();
        Ok(Some((resource, warnings)))
    }

    fn collect(&self, ty: &ResourceType, base: &Path) -> DirFiles {
        let mut dirs = DirFiles::new();
        let walker = WalkBuilder::new(base)
            .standard_filters(false)
            .hidden(!self.follow_hidden)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", base.display(), err);
                    continue;
                }
            };
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(base) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            let Some(file_type) = entry.file_type() else {
                continue;
            };

            let logical = ResourcePath::from_relative(relative);
            if file_type.is_dir() {
                dirs.entry(logical).or_default();
            } else if file_type.is_file() {
                // Files directly in the base directory belong to no resource.
                let Some(parent) = logical.parent().filter(|p| !p.is_root()) else {
                    continue;
                };
                let name = logical.name().to_string();
                if belongs_to(ty, &name, relative) {
                    dirs.entry(parent).or_default().insert(name, path.to_path_buf());
                }
            }
        }
        dirs
    }
}

fn belongs_to(ty: &ResourceType, name: &str, relative: &Path) -> bool {
    ty.is_primary(name) || ty.is_manifest(name) || ty.matches(relative)
}

fn hash_files(
    files: BTreeMap<String, PathBuf>,
) -> Result<BTreeMap<String, ResourceFile>, ScanError> {
    let mut hashed = BTreeMap::new();
    for (name, path) in files {
        match hash_file(&path) {
            Ok(content_hash) => {
                hashed.insert(name, ResourceFile { path, content_hash });
            }
            // Deleted between listing and reading; the deletion raises its own event.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(ScanError::io(&path, err)),
        }
    }
    Ok(hashed)
}

fn hash_file(path: &Path) -> io::Result<u64> {
    let content = fs::read(path)?;
    let mut hasher = Xxh3::new();
    hasher.write(&content);
    Ok(hasher.finish())
}

fn read_manifest_state(path: &Path) -> ManifestState {
    let parsed = fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| {
            serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|e| e.to_string())
        });
    match parsed {
        Ok(serde_json::Value::Object(_)) => ManifestState::Present,
        Ok(_) => ManifestState::Malformed("expected a JSON object".to_string()),
        Err(reason) => ManifestState::Malformed(reason),
    }
}

/// Classify one directory and report its issues.
fn build_record(
    ty: &ResourceType,
    path: ResourcePath,
    files: BTreeMap<String, ResourceFile>,
) -> (Resource, Vec<WarningKind>) {
    let descriptor = ty.descriptor();
    let has_primary = files.contains_key(&descriptor.primary_file);
    let manifest = match descriptor
        .manifest_file
        .as_ref()
        .and_then(|name| files.get(name))
    {
        Some(file) => read_manifest_state(&file.path),
        None => ManifestState::Missing,
    };

    let kind = if has_primary {
        ResourceKind::Resource
    } else if manifest != ManifestState::Missing {
        ResourceKind::OrphanedManifest
    } else {
        ResourceKind::Folder
    };

    let mut issues = Vec::new();
    if let ManifestState::Malformed(reason) = &manifest {
        issues.push(WarningKind::MalformedManifest {
            reason: reason.clone(),
        });
    }
    match kind {
        ResourceKind::OrphanedManifest => issues.push(WarningKind::OrphanedManifest),
        ResourceKind::Resource
            if descriptor.manifest_required && manifest == ManifestState::Missing =>
        {
            issues.push(WarningKind::MissingManifest)
        }
        _ => {}
    }

    let resource = Resource {
        key: ResourceKey::new(ty.id().clone(), path),
        kind,
        origin: Default::default(),
        files,
        manifest,
    };
    (resource, issues)
}

/// Fingerprint of a resource set. Independent of where the project lives on disk.
pub fn content_hash(resources: &ResourceSet) -> u64 {
    let mut hasher = Xxh3::new();
    for (key, resource) in resources {
        hasher.write(key.type_id.as_str().as_bytes());
        hasher.write_u8(0);
        hasher.write(key.path.as_str().as_bytes());
        hasher.write_u8(0);
        hasher.write_u8(match resource.kind {
            ResourceKind::Resource => 1,
            ResourceKind::Folder => 2,
            ResourceKind::OrphanedManifest => 3,
        });
        hasher.write_u8(match resource.manifest {
            ManifestState::Missing => 0,
            ManifestState::Present => 1,
            ManifestState::Malformed(_) => 2,
        });
        for (name, file) in &resource.files {
            hasher.write(name.as_bytes());
            hasher.write_u64(file.content_hash);
        }
    }
    hasher.finish()
}
