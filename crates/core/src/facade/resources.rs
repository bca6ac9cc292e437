use super::EngineHandle;
use async_trait::async_trait;
use rescope_api::{
    ApiResult, EffectiveResourceSet, Project, ProjectId, ProjectService, ResourceService, Warning,
};
use std::sync::Arc;

#[async_trait]
impl ResourceService for EngineHandle {
    async fn effective_resources(
        &self,
        project: &ProjectId,
    ) -> ApiResult<Arc<EffectiveResourceSet>> {
        Ok(self.engine.effective_resources(project).await?)
    }

    async fn warnings(&self, project: Option<&ProjectId>) -> ApiResult<Vec<Warning>> {
        Ok(self.engine.warnings(project).await?)
    }
}

#[async_trait]
impl ProjectService for EngineHandle {
    async fn project(&self, project: &ProjectId) -> Option<Project> {
        self.engine.project(project).await
    }

    async fn projects(&self) -> Vec<Project> {
        self.engine.projects().await
    }

    async fn ancestor_chain(&self, project: &ProjectId) -> ApiResult<Vec<ProjectId>> {
        Ok(self.engine.ancestor_chain(project).await?)
    }
}
