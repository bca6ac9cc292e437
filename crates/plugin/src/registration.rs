use crate::PluginInfo;
use crate::cap::{ManifestCap, ResourceTypeCap};
use std::sync::Arc;

/// Capabilities contributed by one provider.
#[derive(Clone)]
pub struct ProviderCaps {
    pub info: PluginInfo,
    pub resource_types: Arc<dyn ResourceTypeCap>,
    pub manifest: Option<Arc<dyn ManifestCap>>,
}
