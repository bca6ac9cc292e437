use std::sync::Arc;

use crate::error::RescopeError;
use crate::runtime::RescopeEngine as InternalEngine;
use rescope_api::ApiError;

mod completion;
mod lifecycle;
mod resources;

/// Engine handle - the api-facing surface of the engine.
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) engine: Arc<InternalEngine>,
}

impl EngineHandle {
    pub fn from_engine(engine: Arc<InternalEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<InternalEngine> {
        &self.engine
    }
}

impl From<RescopeError> for ApiError {
    fn from(err: RescopeError) -> Self {
        match err {
            RescopeError::NotFound(id) => ApiError::NotFound(format!("project '{}'", id)),
            RescopeError::Config(msg) => ApiError::InvalidArgument(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
