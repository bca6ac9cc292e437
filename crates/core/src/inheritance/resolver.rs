use rescope_api::{EffectiveResourceSet, Origin, ProjectId, ResourceSet};

/// One ancestor's own resources, as input to resolution.
#[derive(Debug, Clone, Copy)]
pub struct AncestorLayer<'a> {
    pub project: &'a ProjectId,
    pub resources: &'a ResourceSet,
}

/// Merges a project's own resources with its ancestors', nearest definer first.
pub struct InheritanceResolver;

impl InheritanceResolver {
    /// `ancestors` must be ordered nearest first.
    ///
    /// Each key is taken from the first layer that defines it: the project itself, then
    /// each ancestor in turn. Own records report `Local`; inherited ones name their source.
    pub fn resolve(
        project: &ProjectId,
        own: &ResourceSet,
        ancestors: &[AncestorLayer<'_>],
    ) -> EffectiveResourceSet {
        let mut entries: ResourceSet = own
            .iter()
            .map(|(key, resource)| (key.clone(), resource.with_origin(Origin::Local)))
            .collect();

        for layer in ancestors {
            for (key, resource) in layer.resources {
                if entries.contains_key(key) {
                    continue;
                }
                entries.insert(
                    key.clone(),
                    resource.with_origin(Origin::Inherited(layer.project.clone())),
                );
            }
        }

        EffectiveResourceSet::from_entries(project.clone(), entries)
    }
}
