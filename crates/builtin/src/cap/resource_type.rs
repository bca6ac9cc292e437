use crate::BuiltinProvider;
use rescope_plugin::{ResourceTypeCap, ResourceTypeDescriptor};

impl ResourceTypeCap for BuiltinProvider {
    fn resource_types(&self) -> Vec<ResourceTypeDescriptor> {
        crate::types::builtin_types()
    }
}
