use rescope_core::{EngineConfig, EngineHandle, RescopeEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

/// Bootstraps an engine for `root` with the built-in resource types.
///
/// Configuration comes from `<root>/.rescope.json` and `RESCOPE_*` environment variables.
pub fn build_default_engine(root: PathBuf) -> rescope_core::Result<EngineHandle> {
    build_engine(root, None)
}

/// Same as [`build_default_engine`], with an explicit configuration.
pub fn build_engine(
    root: PathBuf,
    config: Option<EngineConfig>,
) -> rescope_core::Result<EngineHandle> {
    let mut builder = RescopeEngine::builder(root).with_provider(rescope_builtin::builtin_caps());
    if let Some(config) = config {
        builder = builder.with_config(config);
    }
    let engine = builder.build()?;
    Ok(EngineHandle::from_engine(Arc::new(engine)))
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    rescope_core::logging::init_logging(component, to_stderr)
}
