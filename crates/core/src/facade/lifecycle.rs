use super::EngineHandle;
use async_trait::async_trait;
use rescope_api::{ApiResult, EngineEvent, EngineLifecycle, EngineWatchHandle, ProjectId};
use std::sync::Arc;
use tokio::sync::broadcast;

#[async_trait]
impl EngineLifecycle for EngineHandle {
    async fn discover(&self) -> ApiResult<Vec<ProjectId>> {
        Ok(self.engine.discover().await?)
    }

    async fn invalidate(&self, project: Option<&ProjectId>) {
        self.engine.invalidate(project).await
    }

    async fn start_watch(&self) -> ApiResult<Arc<dyn EngineWatchHandle>> {
        let handle = self.engine.clone().watch().await?;
        Ok(Arc::new(handle))
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.subscribe()
    }
}
