use rescope_api::{ProjectId, ProjectService};
use rescope_core::EngineHandle;

pub async fn run(engine: &EngineHandle, project: &ProjectId) -> anyhow::Result<()> {
    let chain = engine.ancestor_chain(project).await?;
    let mut line = project.to_string();
    for ancestor in &chain {
        line.push_str(" -> ");
        line.push_str(ancestor.as_str());
    }
    println!("{}", line);
    if chain.is_empty() {
        println!("{} inherits from no project.", project);
    }
    Ok(())
}
