//! Registry of resource types contributed by providers.
//!
//! Built once when the engine is assembled and immutable afterwards.

use crate::error::{RescopeError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use rescope_api::{ResourcePath, ResourceTypeId};
use rescope_plugin::{ProviderCaps, ResourceTypeDescriptor};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A registered resource type with its compiled file matcher.
#[derive(Debug)]
pub struct ResourceType {
    descriptor: ResourceTypeDescriptor,
    matcher: GlobSet,
    base_segments: Vec<String>,
}

impl ResourceType {
    pub fn new(descriptor: ResourceTypeDescriptor) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in descriptor.effective_patterns() {
            let glob = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    RescopeError::Config(format!(
                        "invalid pattern '{}' for type '{}': {}",
                        pattern, descriptor.id, e
                    ))
                })?;
            builder.add(glob);
        }
        let matcher = builder
            .build()
            .map_err(|e| RescopeError::Config(e.to_string()))?;
        let base_segments = descriptor
            .base_dir
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            descriptor,
            matcher,
            base_segments,
        })
    }

    pub fn id(&self) -> &ResourceTypeId {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &ResourceTypeDescriptor {
        &self.descriptor
    }

    /// Directory holding this type inside `project_dir`.
    pub fn base_dir(&self, project_dir: &Path) -> PathBuf {
        let mut dir = project_dir.to_path_buf();
        dir.extend(&self.base_segments);
        dir
    }

    /// Whether a file, given relative to the base directory, belongs to a resource of this type.
    pub fn matches(&self, relative: &Path) -> bool {
        self.matcher.is_match(relative)
    }

    pub fn is_primary(&self, file_name: &str) -> bool {
        self.descriptor.primary_file == file_name
    }

    pub fn is_manifest(&self, file_name: &str) -> bool {
        self.descriptor.manifest_file.as_deref() == Some(file_name)
    }

    pub fn is_indexed(&self) -> bool {
        self.descriptor.indexed
    }
}

#[derive(Debug, Default)]
pub struct ResourceTypeCatalog {
    types: Vec<Arc<ResourceType>>,
    by_id: HashMap<ResourceTypeId, usize>,
}

impl ResourceTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_providers(providers: &[ProviderCaps]) -> Result<Self> {
        let mut catalog = Self::new();
        for caps in providers {
            for descriptor in caps.resource_types.resource_types() {
                catalog.register(descriptor)?;
            }
        }
        Ok(catalog)
    }

    pub fn register(&mut self, descriptor: ResourceTypeDescriptor) -> Result<()> {
        if self.by_id.contains_key(&descriptor.id) {
            return Err(RescopeError::Config(format!(
                "resource type '{}' registered twice",
                descriptor.id
            )));
        }
        let ty = ResourceType::new(descriptor)?;
        self.by_id.insert(ty.id().clone(), self.types.len());
        self.types.push(Arc::new(ty));
        Ok(())
    }

    pub fn get(&self, id: &ResourceTypeId) -> Option<&Arc<ResourceType>> {
        self.by_id.get(id).map(|&i| &self.types[i])
    }

    /// Types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceType>> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn categories(&self) -> BTreeMap<&str, Vec<&ResourceTypeId>> {
        let mut out: BTreeMap<&str, Vec<&ResourceTypeId>> = BTreeMap::new();
        for ty in &self.types {
            out.entry(ty.descriptor.category.as_str())
                .or_default()
                .push(ty.id());
        }
        out
    }

    /// Whether `project_relative` names a directory strictly above some type's base
    /// directory, e.g. `ignition` for `ignition/script-python`.
    pub fn encloses_base_dir(&self, project_relative: &Path) -> bool {
        let segments = normal_segments(project_relative);
        !segments.is_empty()
            && self.types.iter().any(|ty| {
                segments.len() < ty.base_segments.len()
                    && segments.iter().zip(&ty.base_segments).all(|(a, b)| a == b)
            })
    }

    /// Map a path relative to a project directory onto the type whose base directory
    /// contains it, returning the remainder as a logical path.
    ///
    /// The longest matching base directory wins. Paths equal to a base directory map to
    /// the root path.
    pub fn locate(&self, project_relative: &Path) -> Option<(&Arc<ResourceType>, ResourcePath)> {
        let segments = normal_segments(project_relative);

        self.types
            .iter()
            .filter(|ty| {
                segments.len() >= ty.base_segments.len()
                    && segments
                        .iter()
                        .zip(&ty.base_segments)
                        .all(|(a, b)| a == b)
            })
            .max_by_key(|ty| ty.base_segments.len())
            .map(|ty| {
                let rest = &segments[ty.base_segments.len()..];
                (ty, ResourcePath::from_segments(rest.iter().map(String::as_str)))
            })
    }
}

fn normal_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
