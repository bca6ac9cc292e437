pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod facade;
pub mod inheritance;
pub mod logging;
pub mod project;
pub mod runtime;
pub mod symbols;

pub use config::EngineConfig;
pub use error::{RescopeError, Result};
pub use facade::EngineHandle;
pub use runtime::{RescopeEngine, RescopeEngineBuilder};
