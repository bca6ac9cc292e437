mod chain;
mod complete;
mod resources;
mod scan;
mod view;
mod warnings;
mod watch;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rescope_api::{EngineLifecycle, ProjectId};
use rescope_core::EngineHandle;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rescope",
    version,
    about = "Resolve inherited project resources and script symbols",
    long_about = "Rescope scans a workspace of projects, resolves each project's effective resources \
                  through its inheritance chain, and indexes project-library scripts for completion."
)]
pub struct Cli {
    /// Workspace root holding one directory per project. Defaults to current directory.
    #[arg(long, short, global = true, value_name = "WORKSPACE")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover projects and summarize each one's effective resources
    Scan,
    /// List a project's effective resources
    Resources {
        #[arg(value_name = "PROJECT")]
        project: String,
        /// Only resources of this type, e.g. script-python
        #[arg(long = "type", value_name = "TYPE")]
        type_id: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Complete a dotted script path, e.g. `utils.helpers.Lo`
    Complete {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "PREFIX", default_value = "")]
        prefix: String,
        #[arg(long)]
        json: bool,
    },
    /// Show a project's ancestor chain, nearest first
    Chain {
        #[arg(value_name = "PROJECT")]
        project: String,
    },
    /// Show warnings for one project or the whole workspace
    Warnings {
        #[arg(value_name = "PROJECT")]
        project: Option<String>,
    },
    /// Watch the workspace and report rescans until Ctrl+C
    Watch,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Watch => "watch",
        _ => "cli",
    };
    let _guard = rescope_runtime::init_logging(component, matches!(cli.command, Commands::Watch));

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let engine = open(root).await?;
        match cli.command {
            Commands::Scan => scan::run(&engine).await,
            Commands::Resources {
                project,
                type_id,
                json,
            } => resources::run(&engine, &ProjectId::new(project), type_id.as_deref(), json).await,
            Commands::Complete {
                project,
                prefix,
                json,
            } => complete::run(&engine, &ProjectId::new(project), &prefix, json).await,
            Commands::Chain { project } => chain::run(&engine, &ProjectId::new(project)).await,
            Commands::Warnings { project } => {
                warnings::run(&engine, project.map(ProjectId::new).as_ref()).await
            }
            Commands::Watch => watch::run(&engine).await,
        }
    })
}

async fn open(root: PathBuf) -> anyhow::Result<EngineHandle> {
    let engine = rescope_runtime::build_default_engine(root.clone())
        .with_context(|| format!("cannot open workspace {}", root.display()))?;
    let projects = engine.discover().await?;
    tracing::info!("Opened {} with {} projects", root.display(), projects.len());
    Ok(engine)
}
