use crate::ApiResult;
use crate::models::{EffectiveResourceSet, Project, ProjectId, Warning};
use async_trait::async_trait;
use std::sync::Arc;

/// Inheritance-resolved resource view for tree and validation consumers.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// Effective resources of a project. Scans the project when nothing is cached.
    async fn effective_resources(&self, project: &ProjectId)
    -> ApiResult<Arc<EffectiveResourceSet>>;

    /// Warnings for one project, or for the whole workspace when `None`.
    async fn warnings(&self, project: Option<&ProjectId>) -> ApiResult<Vec<Warning>>;
}

#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn project(&self, project: &ProjectId) -> Option<Project>;

    async fn projects(&self) -> Vec<Project>;

    /// Ancestors ordered nearest to furthest. Fails for unknown projects.
    async fn ancestor_chain(&self, project: &ProjectId) -> ApiResult<Vec<ProjectId>>;
}
