use rescope_api::ProjectId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Contents of a project manifest that matter for inheritance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub title: Option<String>,
    pub parent: Option<ProjectId>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    NotFound(PathBuf),
    #[error("I/O error reading manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed manifest {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
