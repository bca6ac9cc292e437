use crate::view::ProjectRow;
use rescope_api::{ProjectService, ResourceService};
use rescope_core::EngineHandle;
use tabled::Table;

pub async fn run(engine: &EngineHandle) -> anyhow::Result<()> {
    let projects = engine.projects().await;
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(projects.len());
    for project in &projects {
        let counts = match engine.effective_resources(&project.id).await {
            Ok(set) => Some((set.len(), set.iter().filter(|r| r.origin.is_inherited()).count())),
            Err(e) => {
                tracing::warn!("Could not resolve {}: {}", project.id, e);
                None
            }
        };
        let warnings = engine.warnings(Some(&project.id)).await?.len();
        rows.push(ProjectRow::new(project, counts, warnings));
    }
    println!("{}", Table::new(rows));

    let stats = engine.engine().cache_stats().await;
    println!(
        "Cache: {} entries, {} hits, {} misses",
        stats.entries, stats.hits, stats.misses
    );
    Ok(())
}
