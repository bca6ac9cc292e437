use super::EngineHandle;
use async_trait::async_trait;
use rescope_api::{ApiResult, CompletionItem, CompletionService, ProjectId};

#[async_trait]
impl CompletionService for EngineHandle {
    async fn query_completions(
        &self,
        project: &ProjectId,
        dotted_prefix: &str,
    ) -> ApiResult<Vec<CompletionItem>> {
        Ok(self.engine.query_completions(project, dotted_prefix).await?)
    }
}
