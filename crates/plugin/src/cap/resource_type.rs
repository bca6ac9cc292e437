use crate::descriptor::ResourceTypeDescriptor;

/// Supplies resource-type descriptors to the catalog.
pub trait ResourceTypeCap: Send + Sync {
    fn resource_types(&self) -> Vec<ResourceTypeDescriptor>;
}
