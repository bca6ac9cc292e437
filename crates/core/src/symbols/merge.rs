use rescope_api::{
    EffectiveResourceSet, IndexedModule, MergedIndex, ModuleIndex, Origin, ProjectId, ResourceKind,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct ModuleLayer<'a> {
    pub project: &'a ProjectId,
    pub modules: &'a ModuleIndex,
}

/// Combine module indexes along an ancestor chain (nearest first).
///
/// A module is taken only from the layer that supplies its resource in `effective`, so
/// shadowing is per module: a nearer module replaces a farther one of the same path
/// entirely. A nearer script that yielded no module, or a nearer folder at the same key,
/// hides the farther module as well.
pub fn merge_module_indexes(
    effective: &EffectiveResourceSet,
    own: &ModuleIndex,
    ancestors: &[ModuleLayer<'_>],
) -> MergedIndex {
    let layers = std::iter::once((Origin::Local, own)).chain(
        ancestors
            .iter()
            .map(|layer| (Origin::Inherited(layer.project.clone()), layer.modules)),
    );

    let mut merged: BTreeMap<String, IndexedModule> = BTreeMap::new();
    for (origin, modules) in layers {
        for (path, module) in modules {
            let supplied = effective
                .get(&module.resource)
                .is_some_and(|r| r.kind == ResourceKind::Resource && r.origin == origin);
            if supplied {
                merged
                    .entry(path.clone())
                    .or_insert_with(|| IndexedModule {
                        module: module.clone(),
                        origin: origin.clone(),
                    });
            }
        }
    }

    MergedIndex::from_modules(merged)
}

/// Effective set in which every module of every layer is backed by a plain resource.
#[cfg(test)]
pub(crate) fn effective_for(
    project: &ProjectId,
    own: &ModuleIndex,
    ancestors: &[ModuleLayer<'_>],
) -> EffectiveResourceSet {
    use crate::inheritance::{AncestorLayer, InheritanceResolver};
    use rescope_api::{ManifestState, Resource, ResourceSet};

    fn as_resources(modules: &ModuleIndex) -> ResourceSet {
        modules
            .values()
            .map(|m| {
                let resource = Resource {
                    key: m.resource.clone(),
                    kind: ResourceKind::Resource,
                    origin: Origin::Local,
                    files: BTreeMap::new(),
                    manifest: ManifestState::Present,
                };
                (resource.key.clone(), resource)
            })
            .collect()
    }

    let sets: Vec<ResourceSet> = ancestors.iter().map(|l| as_resources(l.modules)).collect();
    let layers: Vec<AncestorLayer<'_>> = ancestors
        .iter()
        .zip(&sets)
        .map(|(l, resources)| AncestorLayer {
            project: l.project,
            resources,
        })
        .collect();
    InheritanceResolver::resolve(project, &as_resources(own), &layers)
}
