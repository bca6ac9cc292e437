use crate::manifest::{ManifestError, ProjectManifest};
use std::path::Path;

/// Reads the manifest that marks a directory as a project.
pub trait ManifestCap: Send + Sync {
    /// File name of the project manifest, e.g. `project.json`.
    fn manifest_file(&self) -> &str;

    fn read_manifest(&self, project_dir: &Path) -> Result<ProjectManifest, ManifestError>;
}
