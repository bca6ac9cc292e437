pub mod cap;
pub mod descriptor;
pub mod manifest;
pub mod registration;

pub use cap::*;
pub use descriptor::ResourceTypeDescriptor;
pub use manifest::{ManifestError, ProjectManifest};
pub use registration::ProviderCaps;

/// Metadata for a provider plugin.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}
