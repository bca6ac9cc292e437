pub mod completion;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod resources;

// Re-export commonly used types
pub use completion::CompletionService;
pub use error::{ApiError, ApiResult};
pub use lifecycle::{EngineLifecycle, EngineWatchHandle};
pub use models::*;
pub use resources::{ProjectService, ResourceService};

/// Composite trait representing the full engine API.
/// Clients can depend on a single trait instead of the individual services.
pub trait RescopeEngine:
    ResourceService + ProjectService + CompletionService + EngineLifecycle
{
}

impl<T> RescopeEngine for T where
    T: ResourceService + ProjectService + CompletionService + EngineLifecycle
{
}
