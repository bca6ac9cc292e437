use crate::view::ResourceRow;
use rescope_api::{ProjectId, Resource, ResourceService};
use rescope_core::EngineHandle;
use std::collections::BTreeMap;
use tabled::Table;

pub async fn run(
    engine: &EngineHandle,
    project: &ProjectId,
    type_id: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let set = engine.effective_resources(project).await?;
    let resources: Vec<&Resource> = set
        .iter()
        .filter(|r| type_id.is_none_or(|t| r.key.type_id.as_str() == t))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&resources)?);
        return Ok(());
    }

    if resources.is_empty() {
        println!("No resources in {}.", project);
        return Ok(());
    }

    // Group by catalog category, as a resource tree would.
    let catalog = engine.engine().catalog();
    let mut grouped: BTreeMap<&str, Vec<ResourceRow>> = BTreeMap::new();
    for resource in resources {
        let category = catalog
            .get(&resource.key.type_id)
            .map(|t| t.descriptor().category.as_str())
            .unwrap_or("Other");
        grouped
            .entry(category)
            .or_default()
            .push(ResourceRow::from(resource));
    }
    for (category, rows) in grouped {
        println!("{}", category);
        println!("{}", Table::new(rows));
    }
    Ok(())
}
