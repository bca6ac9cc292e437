use indexmap::IndexMap;
use rescope_api::{CompletionItem, MergedIndex};

/// Completions for a dotted prefix such as `utils.helpers.Lo`.
///
/// The text before the last dot names the context: a package (yields child packages and
/// modules), a module (also yields its top-level symbols) or `module.Class` (yields the
/// class's methods). The text after the last dot filters labels case-insensitively.
/// Prefix matches rank ahead of substring matches, containers ahead of symbols, then
/// alphabetical.
pub fn query_completions(index: &MergedIndex, prefix: &str) -> Vec<CompletionItem> {
    let (context, partial) = prefix.rsplit_once('.').unwrap_or(("", prefix));
    let needle = partial.to_lowercase();

    let scope = if context.is_empty() {
        String::new()
    } else {
        format!("{}.", context)
    };

    let mut containers: IndexMap<String, CompletionItem> = IndexMap::new();
    for (path, indexed) in index.modules() {
        let Some(rest) = path.strip_prefix(scope.as_str()) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let qualified = match rest.split_once('.') {
            Some((segment, _)) => {
                let qualified = format!("{}{}", scope, segment);
                containers
                    .entry(qualified.clone())
                    .or_insert_with(|| CompletionItem::package(segment, qualified.clone()));
                continue;
            }
            None => format!("{}{}", scope, rest),
        };
        // A module and a package of the same name list once, as the module.
        containers.insert(
            qualified.clone(),
            CompletionItem::module(rest, qualified, indexed.origin.clone()),
        );
    }

    let mut symbols = Vec::new();
    if let Some(indexed) = index.module(context) {
        symbols.extend(
            indexed
                .module
                .top_level()
                .map(|s| CompletionItem::symbol(s, indexed.origin.clone())),
        );
    } else if let Some((module_path, class_name)) = context.rsplit_once('.') {
        if let Some(indexed) = index.module(module_path) {
            if let Some((class_index, _)) = indexed.module.find_class(class_name) {
                symbols.extend(
                    indexed
                        .module
                        .members_of(class_index)
                        .map(|s| CompletionItem::symbol(s, indexed.origin.clone())),
                );
            }
        }
    }

    let mut ranked: Vec<(u8, String, CompletionItem)> = containers
        .into_values()
        .chain(symbols)
        .filter_map(|item| {
            let label = item.label.to_lowercase();
            let rank = if label.starts_with(&needle) {
                0
            } else if label.contains(&needle) {
                1
            } else {
                return None;
            };
            Some((rank, label, item))
        })
        .collect();

    ranked.sort_by(|(ra, la, a), (rb, lb, b)| {
        ra.cmp(rb)
            .then_with(|| b.kind.is_container().cmp(&a.kind.is_container()))
            .then_with(|| la.cmp(lb))
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.into_iter().map(|(_, _, item)| item).collect()
}
