use crate::BuiltinProvider;
use crate::manifest::JsonManifestReader;
use rescope_plugin::{PluginInfo, ProviderCaps};
use std::sync::Arc;

pub fn builtin_caps() -> ProviderCaps {
    let plugin = Arc::new(BuiltinProvider::new());
    ProviderCaps {
        info: PluginInfo {
            id: "builtin".to_string(),
            name: "Built-in resource types".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Scripts, queries, views, windows and reports".to_string()),
        },
        resource_types: plugin,
        manifest: Some(Arc::new(JsonManifestReader)),
    }
}
