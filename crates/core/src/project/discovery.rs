use crate::error::Result;
use rescope_api::ProjectId;
use rescope_plugin::{ManifestCap, ManifestError, ProjectManifest};
use std::fs;
use std::path::{Path, PathBuf};

/// A project directory found under the workspace root.
#[derive(Debug)]
pub struct DiscoveredProject {
    pub id: ProjectId,
    pub dir: PathBuf,
    pub manifest: std::result::Result<ProjectManifest, ManifestError>,
}

/// Direct children of `root` that carry a project manifest, sorted by id.
pub fn discover_projects(root: &Path, reader: &dyn ManifestCap) -> Result<Vec<DiscoveredProject>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let dir = entry.path();
        if !dir.join(reader.manifest_file()).is_file() {
            continue;
        }
        match read_project(&dir, reader) {
            Some(project) => found.push(project),
            None => tracing::warn!("Skipping project directory without a usable name: {}", dir.display()),
        }
    }
    found.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(found)
}

/// Read one project directory's manifest. The id is the directory name.
pub fn read_project(dir: &Path, reader: &dyn ManifestCap) -> Option<DiscoveredProject> {
    Some(DiscoveredProject {
        id: ProjectId::from_dir(dir)?,
        dir: dir.to_path_buf(),
        manifest: reader.read_manifest(dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescope_builtin::JsonManifestReader;
    use tempfile::tempdir;

    #[test]
    fn test_only_directories_with_manifest_are_projects() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in ["zeta", "alpha", "plain"] {
            fs::create_dir_all(root.join(name)).unwrap();
        }
        fs::write(root.join("zeta/project.json"), r#"{"parent": "alpha"}"#).unwrap();
        fs::write(root.join("alpha/project.json"), "{ broken").unwrap();
        fs::write(root.join("project.json"), "{}").unwrap();

        let found = discover_projects(root, &JsonManifestReader).unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);

        assert!(matches!(found[0].manifest, Err(ManifestError::Malformed { .. })));
        assert_eq!(
            found[1].manifest.as_ref().unwrap().parent,
            Some(ProjectId::new("alpha"))
        );
        assert_eq!(found[1].dir, root.join("zeta"));
    }
}
