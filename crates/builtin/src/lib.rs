pub mod cap;
pub mod manifest;
pub mod types;

pub use cap::builtin_caps;
pub use manifest::{JsonManifestReader, PROJECT_MANIFEST};

/// Provider for the resource types every gateway project understands.
pub struct BuiltinProvider {
    _private: (),
}

impl BuiltinProvider {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for BuiltinProvider {
    fn default() -> Self {
        Self::new()
    }
}
