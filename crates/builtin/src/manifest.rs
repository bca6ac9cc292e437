use rescope_api::ProjectId;
use rescope_plugin::{ManifestCap, ManifestError, ProjectManifest};
use serde::Deserialize;
use std::path::Path;

/// File that marks a directory as a project.
pub const PROJECT_MANIFEST: &str = "project.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawManifest {
    title: Option<String>,
    parent: Option<String>,
}

/// Reads `project.json` as `{ "title": ..., "parent": ... }`.
///
/// Unknown keys are ignored. An empty `parent` means no parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonManifestReader;

impl JsonManifestReader {
    pub fn parse(path: &Path, content: &str) -> Result<ProjectManifest, ManifestError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| ManifestError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(ProjectManifest {
            title: raw.title.filter(|t| !t.trim().is_empty()),
            parent: raw
                .parent
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .map(ProjectId::new),
        })
    }
}

impl ManifestCap for JsonManifestReader {
    fn manifest_file(&self) -> &str {
        PROJECT_MANIFEST
    }

    fn read_manifest(&self, project_dir: &Path) -> Result<ProjectManifest, ManifestError> {
        let path = project_dir.join(PROJECT_MANIFEST);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path));
            }
            Err(e) => return Err(ManifestError::Io(e)),
        };
        Self::parse(&path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_reads_title_and_parent() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("project.json"),
            r#"{"title": "Line 1", "parent": "global", "enabled": true}"#,
        )
        .unwrap();

        let manifest = JsonManifestReader.read_manifest(dir.path()).unwrap();
        assert_eq!(manifest.title.as_deref(), Some("Line 1"));
        assert_eq!(manifest.parent, Some(ProjectId::new("global")));
    }

    #[test]
    fn test_empty_parent_is_root() {
        let manifest =
            JsonManifestReader::parse(Path::new("project.json"), r#"{"parent": ""}"#).unwrap();
        assert_eq!(manifest, ProjectManifest::default());
    }

    #[test]
    fn test_malformed_and_missing() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            JsonManifestReader.read_manifest(dir.path()),
            Err(ManifestError::NotFound(_))
        ));

        fs::write(dir.path().join("project.json"), "{ not json").unwrap();
        assert!(matches!(
            JsonManifestReader.read_manifest(dir.path()),
            Err(ManifestError::Malformed { .. })
        ));
    }
}
