use super::project::ProjectId;
use super::warning::Warning;
use serde::{Deserialize, Serialize};

/// Notifications published by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A rescan cycle for the project completed and its cache entry was replaced.
    ResourcesChanged { project: ProjectId, cycle: u64 },
    ProjectAdded { project: ProjectId },
    ProjectRemoved { project: ProjectId },
    Warning(Warning),
}
