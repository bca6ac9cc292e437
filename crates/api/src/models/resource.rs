use super::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Resource type identifier, e.g. `script-python`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTypeId(Cow<'static, str>);

impl ResourceTypeId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceTypeId {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Slash-separated logical path of a resource, relative to its type's base directory.
///
/// The empty path denotes the type's base directory itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a slash-separated string: empty segments are dropped.
    pub fn new(path: &str) -> Self {
        Self::from_segments(path.split(['/', '\\']))
    }

    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let joined = segments
            .into_iter()
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Build a logical path from a platform path relative to a type's base directory.
    pub fn from_relative(relative: &Path) -> Self {
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self::from_segments(segments.iter().map(String::as_str))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, or the empty string for the root path.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Containing folder. The root path has no parent; top-level paths return the root.
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    pub fn join(&self, segment: &str) -> ResourcePath {
        if self.is_root() {
            Self::new(segment)
        } else {
            Self::new(&format!("{}/{}", self.0, segment))
        }
    }

    /// True when `self` lies strictly beneath `folder`.
    pub fn is_within(&self, folder: &ResourcePath) -> bool {
        if folder.is_root() {
            return !self.is_root();
        }
        self.0.len() > folder.0.len()
            && self.0.starts_with(folder.as_str())
            && self.0.as_bytes()[folder.0.len()] == b'/'
    }

    /// Dotted form used for script module qualified paths.
    pub fn to_dotted(&self) -> String {
        self.0.replace('/', ".")
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a resource within one project's own resource set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub type_id: ResourceTypeId,
    pub path: ResourcePath,
}

impl ResourceKey {
    pub fn new(type_id: ResourceTypeId, path: ResourcePath) -> Self {
        Self { type_id, path }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_id, self.path)
    }
}

/// Where a resource in an effective set comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "origin", content = "source")]
pub enum Origin {
    #[default]
    Local,
    Inherited(ProjectId),
}

impl Origin {
    pub fn is_inherited(&self) -> bool {
        matches!(self, Origin::Inherited(_))
    }

    pub fn source_project(&self) -> Option<&ProjectId> {
        match self {
            Origin::Local => None,
            Origin::Inherited(source) => Some(source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A directory holding the type's primary file.
    Resource,
    /// A directory without a primary file, kept so inheritable structure stays visible.
    Folder,
    /// A directory holding a resource manifest but no primary file.
    OrphanedManifest,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManifestState {
    Missing,
    Present,
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceFile {
    pub path: PathBuf,
    pub content_hash: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub key: ResourceKey,
    pub kind: ResourceKind,
    pub origin: Origin,
    pub files: BTreeMap<String, ResourceFile>,
    pub manifest: ManifestState,
}

impl Resource {
    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }

    pub fn has_manifest(&self) -> bool {
        !matches!(self.manifest, ManifestState::Missing)
    }

    pub fn source_project(&self) -> Option<&ProjectId> {
        self.origin.source_project()
    }

    pub fn file(&self, name: &str) -> Option<&ResourceFile> {
        self.files.get(name)
    }

    /// Copy of this record carrying a different origin.
    pub fn with_origin(&self, origin: Origin) -> Resource {
        Resource {
            origin,
            ..self.clone()
        }
    }
}

/// A project's own, unmerged resources.
pub type ResourceSet = BTreeMap<ResourceKey, Resource>;

/// A project's shadow-resolved view: one record per key, tagged with its nearest definer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveResourceSet {
    project: ProjectId,
    entries: BTreeMap<ResourceKey, Resource>,
}

impl EffectiveResourceSet {
    pub fn from_entries(project: ProjectId, entries: BTreeMap<ResourceKey, Resource>) -> Self {
        Self { project, entries }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&Resource> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.values()
    }

    pub fn entries(&self) -> &BTreeMap<ResourceKey, Resource> {
        &self.entries
    }

    pub fn of_type<'a>(&'a self, type_id: &'a ResourceTypeId) -> impl Iterator<Item = &'a Resource> {
        self.entries
            .values()
            .filter(move |r| &r.key.type_id == type_id)
    }

    /// Resources whose path lies strictly beneath `folder` for one type.
    pub fn descendants<'a>(
        &'a self,
        type_id: &'a ResourceTypeId,
        folder: &'a ResourcePath,
    ) -> impl Iterator<Item = &'a Resource> {
        self.of_type(type_id).filter(move |r| r.key.path.is_within(folder))
    }

    /// Direct children of `folder` for one type, as a tree consumer would list them.
    pub fn children<'a>(
        &'a self,
        type_id: &'a ResourceTypeId,
        folder: &'a ResourcePath,
    ) -> impl Iterator<Item = &'a Resource> {
        self.descendants(type_id, folder)
            .filter(move |r| r.key.path.parent().as_ref() == Some(folder))
    }

    /// Ownership of a folder in the merged tree.
    ///
    /// A folder is inherited only when the folder record itself (if any) and every resource
    /// beneath it come from one single source project. Anything else, including descendants
    /// inherited from different ancestors, reports as local.
    pub fn folder_origin(&self, type_id: &ResourceTypeId, folder: &ResourcePath) -> Origin {
        let own = self
            .entries
            .get(&ResourceKey::new(type_id.clone(), folder.clone()));
        let mut source: Option<&ProjectId> = None;

        for resource in own.into_iter().chain(self.descendants(type_id, folder)) {
            match &resource.origin {
                Origin::Local => return Origin::Local,
                Origin::Inherited(project) => match source {
                    None => source = Some(project),
                    Some(existing) if existing == project => {}
                    Some(_) => return Origin::Local,
                },
            }
        }

        match source {
            Some(project) => Origin::Inherited(project.clone()),
            None => Origin::Local,
        }
    }
}
