mod config;
mod demo;
mod interactive;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{LoggingConfig, TaxflowConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxflow_agent::generation_from_config;
use taxflow_core::{ContextProvider, Metadata};
use taxflow_orchestrator::{Orchestrator, Workflow};
use taxflow_rag::{load_documents_from_dir, TaxDocumentRag, DEFAULT_EXTENSIONS};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taxflow", about = "Taxflow: multi-agent tax task orchestration")]
struct Cli {
    /// Path to config file (defaults to ./taxflow.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overrides the config and LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    /// Directory of tax documents to ingest before running
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run three tasks in parallel and print their status
    Demo,
    /// Run a workflow and print its report as JSON
    Workflow {
        /// Workflow JSON file (built-in two-step workflow when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show the agent status table
    Status,
    /// Print orchestrator statistics as JSON
    Stats,
    /// Read commands from stdin
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = TaxflowConfig::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.set("logging.level", level)?;
    }
    config.validate()?;

    let _log_guard = init_logging(&config.logging)?;
    info!(
        provider = ?config.model.provider,
        model = %config.model.model_id,
        "Configuration loaded"
    );

    let rag = Arc::new(TaxDocumentRag::new(&config.rag)?);
    let docs_dir = cli
        .docs_dir
        .clone()
        .unwrap_or_else(|| config.paths.tax_documents.clone());
    seed_documents(&rag, &[docs_dir, config.paths.tax_rules.clone()]).await?;

    let context: Arc<dyn ContextProvider> = rag;
    let orchestrator = Orchestrator::new(
        config.orchestrator.clone(),
        Some(context),
        generation_from_config(&config.model),
    );

    let outcome = run(&orchestrator, cli.command).await;
    orchestrator.shutdown().await;
    outcome
}

async fn run(orchestrator: &Orchestrator, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Demo => {
            let tasks = demo::demo_tasks();
            println!("Executing {} tasks in parallel...", tasks.len());
            let results = orchestrator.execute_parallel(tasks).await;
            print!("{}", output::format_results(&results));
        }
        Commands::Workflow { file } => {
            let workflow = match file {
                Some(path) => read_workflow(&path).await?,
                None => demo::demo_workflow(),
            };
            let report = orchestrator.execute_workflow(workflow).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Status => {
            print!("{}", output::format_status(&orchestrator.agent_status().await));
        }
        Commands::Stats => {
            let stats = orchestrator.statistics().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive::run(orchestrator, stdin, tokio::io::stdout()).await?;
        }
    }
    Ok(())
}

async fn read_workflow(path: &Path) -> anyhow::Result<Workflow> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read workflow '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid workflow JSON in '{}'", path.display()))
}

/// Ingests every existing directory in `dirs`, or a few sample rule texts
/// when none of them yields a document.
async fn seed_documents(rag: &TaxDocumentRag, dirs: &[PathBuf]) -> anyhow::Result<()> {
    let (mut contents, mut metadata): (Vec<String>, Vec<Metadata>) = dirs
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| load_documents_from_dir(dir, DEFAULT_EXTENSIONS))
        .filter(|doc| !doc.content.trim().is_empty())
        .map(|doc| {
            let metadata = doc.metadata();
            (doc.content, metadata)
        })
        .unzip();

    if contents.is_empty() {
        info!("No documents found, loading sample rules");
        contents = demo::sample_documents();
        metadata = vec![Metadata::new(); contents.len()];
    }

    let chunks = rag
        .ingest_documents(&contents, Some(metadata.as_slice()))
        .await?;
    info!(documents = contents.len(), chunks, "Documents ingested");
    Ok(())
}

/// Stderr output (text or JSON) plus an optional non-blocking file writer.
///
/// `RUST_LOG` wins over the configured level. The returned guard flushes the
/// file writer when dropped.
fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let text = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });
    let json = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    let (file, guard) = match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory '{}'", dir.display()))?;
            let name = path
                .file_name()
                .context("logging.file must name a file")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(file)
        .init();
    Ok(guard)
}
