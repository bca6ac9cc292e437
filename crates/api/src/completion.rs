use crate::ApiResult;
use crate::models::{CompletionItem, ProjectId};
use async_trait::async_trait;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Completion candidates for a dotted prefix such as `utils.hel` or `utils.helpers.`.
    async fn query_completions(
        &self,
        project: &ProjectId,
        dotted_prefix: &str,
    ) -> ApiResult<Vec<CompletionItem>>;
}
