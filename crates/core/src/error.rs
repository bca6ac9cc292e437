use rescope_api::ProjectId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RescopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("Project not found: {0}")]
    NotFound(ProjectId),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of one scan attempt. Fatal to that attempt only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("project directory not found: {0}")]
    NotFound(PathBuf),
    #[error("I/O error scanning {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl ScanError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        ScanError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("setting the parent of '{project}' to '{parent}' would create an inheritance cycle")]
pub struct CycleError {
    pub project: ProjectId,
    pub parent: ProjectId,
}

/// A script module whose symbols could not be extracted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct ParseWarning {
    pub path: PathBuf,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, RescopeError>;
