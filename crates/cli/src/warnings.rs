use crate::view::WarningRow;
use rescope_api::{ProjectId, ProjectService, ResourceService};
use rescope_core::EngineHandle;
use tabled::Table;

pub async fn run(engine: &EngineHandle, project: Option<&ProjectId>) -> anyhow::Result<()> {
    // Build warnings only exist once a project has been resolved.
    let targets: Vec<ProjectId> = match project {
        Some(id) => vec![id.clone()],
        None => engine.projects().await.into_iter().map(|p| p.id).collect(),
    };
    for id in &targets {
        if let Err(e) = engine.effective_resources(id).await {
            tracing::debug!("Resolving {} failed: {}", id, e);
        }
    }

    let warnings = engine.warnings(project).await?;
    if warnings.is_empty() {
        println!("No warnings.");
    } else {
        let rows: Vec<WarningRow> = warnings.iter().map(WarningRow::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}
