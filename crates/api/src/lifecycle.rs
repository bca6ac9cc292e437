use crate::ApiResult;
use crate::models::{EngineEvent, ProjectId};
use async_trait::async_trait;
use tokio::sync::broadcast;

pub trait EngineWatchHandle: Send + Sync {
    fn stop(&self);
}

#[async_trait]
pub trait EngineLifecycle: Send + Sync {
    /// Discover projects under the workspace root and apply their declared parents.
    async fn discover(&self) -> ApiResult<Vec<ProjectId>>;

    /// Drop cached state for one project, or for every project when `None`.
    async fn invalidate(&self, project: Option<&ProjectId>);

    /// Watch the workspace and keep cached state fresh.
    async fn start_watch(&self) -> ApiResult<std::sync::Arc<dyn EngineWatchHandle>>;

    /// Subscribe to change notifications and warnings.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}
