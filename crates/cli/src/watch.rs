use rescope_api::{EngineEvent, EngineLifecycle, ResourceService};
use rescope_core::EngineHandle;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

pub async fn run(engine: &EngineHandle) -> anyhow::Result<()> {
    let mut events = engine.subscribe();
    let handle = engine.start_watch().await?;
    info!("Watching {}. Press Ctrl+C to stop.", engine.engine().root().display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            event = events.recv() => {
                match event {
                    Ok(EngineEvent::ResourcesChanged { project, cycle }) => {
                        let count = engine
                            .effective_resources(&project)
                            .await
                            .map(|set| set.len())
                            .unwrap_or(0);
                        println!("#{} {} rescanned ({} effective resources)", cycle, project, count);
                    }
                    Ok(EngineEvent::ProjectAdded { project }) => println!("+ {}", project),
                    Ok(EngineEvent::ProjectRemoved { project }) => println!("- {}", project),
                    Ok(EngineEvent::Warning(warning)) => println!("! {}", warning),
                    Err(RecvError::Lagged(n)) => tracing::warn!("Skipped {} events", n),
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    handle.stop();
    info!("Watcher stopped.");
    Ok(())
}
