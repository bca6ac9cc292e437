use crate::view::CompletionRow;
use rescope_api::{CompletionService, ProjectId};
use rescope_core::EngineHandle;
use tabled::Table;

pub async fn run(
    engine: &EngineHandle,
    project: &ProjectId,
    prefix: &str,
    json: bool,
) -> anyhow::Result<()> {
    let items = engine.query_completions(project, prefix).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No completions for '{}'.", prefix);
    } else {
        let rows: Vec<CompletionRow> = items.iter().map(CompletionRow::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}
