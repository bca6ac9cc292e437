use super::project::ProjectId;
use super::resource::ResourceKey;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// The declared parent (or a further ancestor) is not a known project.
    MissingAncestor { ancestor: ProjectId },
    /// The declared parent would close an inheritance cycle and was rejected.
    CycleDetected { parent: ProjectId },
    OrphanedManifest,
    MissingManifest,
    MalformedManifest { reason: String },
    SymbolParseFailure { reason: String },
    ScanFailed { reason: String },
}

/// A non-fatal issue attached to a project and, when it applies, one of its resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Warning {
    pub project: ProjectId,
    pub resource: Option<ResourceKey>,
    pub kind: WarningKind,
}

impl Warning {
    pub fn project(project: ProjectId, kind: WarningKind) -> Self {
        Self {
            project,
            resource: None,
            kind,
        }
    }

    pub fn resource(project: ProjectId, resource: ResourceKey, kind: WarningKind) -> Self {
        Self {
            project,
            resource: Some(resource),
            kind,
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::MissingAncestor { ancestor } => {
                write!(f, "ancestor project '{}' not found", ancestor)
            }
            WarningKind::CycleDetected { parent } => {
                write!(f, "parent '{}' would create an inheritance cycle", parent)
            }
            WarningKind::OrphanedManifest => write!(f, "manifest without a primary file"),
            WarningKind::MissingManifest => write!(f, "resource is missing its manifest"),
            WarningKind::MalformedManifest { reason } => write!(f, "malformed manifest: {}", reason),
            WarningKind::SymbolParseFailure { reason } => {
                write!(f, "symbols not extracted: {}", reason)
            }
            WarningKind::ScanFailed { reason } => write!(f, "scan failed: {}", reason),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.project)?;
        if let Some(resource) = &self.resource {
            write!(f, " {}", resource)?;
        }
        write!(f, " {}", self.kind)
    }
}
