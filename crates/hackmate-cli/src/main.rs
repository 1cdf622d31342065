//! HackMate CLI - turn a one-line brief into a hackathon project plan

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hackmate_core::agents::AgentEnvelope;
use hackmate_core::artifacts::{self, SlideDeck};
use hackmate_core::cache::{self, Cache, CacheKeys};
use hackmate_core::config::Config;
use hackmate_core::health::{self, HealthStatus};
use hackmate_core::llm::GeminiClient;
use hackmate_core::orchestrator::{self, Aggregate, Orchestrator, OrchestratorSettings};
use hackmate_core::project::{DEFAULT_TIME_HOURS, ProjectId, ProjectRequest};
use tracing::debug;

#[derive(Parser)]
#[command(name = "hackmate")]
#[command(author, version, about = "Hackathon co-pilot: seven agents, one brief", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a project by running every agent on a brief
    Create {
        /// Project title
        #[arg(short, long)]
        title: String,
        /// One-line description of what to build
        #[arg(short, long)]
        brief: String,
        /// Time budget in hours
        #[arg(long, default_value_t = DEFAULT_TIME_HOURS)]
        hours: u32,
    },

    /// Show a previously generated project
    Show {
        /// Project ID (8 hex characters)
        project_id: String,
    },

    /// Render the presentation agent's output as an HTML deck
    Slides {
        /// Project ID (8 hex characters)
        project_id: String,
        /// Artifacts directory
        #[arg(short, long, default_value = "artifacts")]
        out: PathBuf,
    },

    /// Save a code snippet as a project artifact
    SaveCode {
        /// Project ID (8 hex characters)
        project_id: String,
        /// File name (sanitized; defaults to code.txt)
        #[arg(short, long)]
        filename: Option<String>,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Artifacts directory
        #[arg(short, long, default_value = "artifacts")]
        out: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset to defaults
    Reset,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let directive = if cli.quiet {
        "hackmate=warn"
    } else {
        "hackmate=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Create {
            title,
            brief,
            hours,
        } => {
            let request = ProjectRequest::new(title, brief).with_time_hours(hours);
            cmd_create(request, cli.format, cli.quiet).await
        }

        Commands::Show { project_id } => cmd_show(&project_id, cli.format, cli.quiet).await,

        Commands::Slides { project_id, out } => cmd_slides(&project_id, &out, cli.quiet).await,

        Commands::SaveCode {
            project_id,
            filename,
            input,
            out,
        } => cmd_save_code(
            &project_id,
            filename.as_deref(),
            input.as_deref(),
            &out,
            cli.quiet,
        ),

        Commands::Config { action } => cmd_config(action, cli.format, cli.quiet),

        Commands::Doctor => cmd_doctor(cli.format, cli.quiet).await,
    }
}

/// Attach the error code and remediation hint to a core error
fn with_hint(err: hackmate_core::Error) -> anyhow::Error {
    match err.suggestion() {
        Some(hint) => anyhow::anyhow!("[{}] {}\n  hint: {}", err.code(), err, hint),
        None => anyhow::anyhow!("[{}] {}", err.code(), err),
    }
}

fn parse_project_id(raw: &str) -> anyhow::Result<ProjectId> {
    raw.parse().map_err(with_hint)
}

async fn cmd_create(
    request: ProjectRequest,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    request.validate().map_err(with_hint)?;

    let config = Config::load()?;
    let client = GeminiClient::from_config(&config.llm).map_err(with_hint)?;
    let cache = cache::connect(&config.cache).await;
    let orchestrator = Orchestrator::new(
        Arc::new(client),
        cache,
        OrchestratorSettings::from_config(&config),
    );
    debug!(orchestrator = ?orchestrator, "Orchestrator ready");

    let result = orchestrator.create_project(request).await;
    orchestrator.shutdown().await;
    let aggregate = result.map_err(with_hint)?;

    print_aggregate(&aggregate, format, quiet)
}

async fn load_cached(project_id: &ProjectId) -> anyhow::Result<Aggregate> {
    let config = Config::load()?;
    if !config.cache.backend.persists() {
        anyhow::bail!(
            "cache.backend is '{}', so projects from earlier runs are not kept\n  \
             hint: hackmate config set cache.backend sqlite",
            config.cache.backend
        );
    }

    let cache = cache::connect(&config.cache).await;
    let keys = CacheKeys::from_config(&config.cache);

    let loaded = orchestrator::load_aggregate(cache.as_ref(), &keys, project_id).await;
    cache.close().await;

    loaded
        .map_err(with_hint)?
        .ok_or_else(|| with_hint(hackmate_core::Error::ProjectNotFound(project_id.to_string())))
}

async fn cmd_show(project_id: &str, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let project_id = parse_project_id(project_id)?;
    let aggregate = load_cached(&project_id).await?;
    print_aggregate(&aggregate, format, quiet)
}

async fn cmd_slides(project_id: &str, out: &Path, quiet: bool) -> anyhow::Result<()> {
    let project_id = parse_project_id(project_id)?;
    let aggregate = load_cached(&project_id).await?;

    let deck = SlideDeck::from_presentation(&aggregate.agents.presentation);
    if deck.is_empty() {
        anyhow::bail!("The presentation agent produced nothing to render for {project_id}");
    }

    let path = artifacts::write_slides(out, &project_id, &deck).map_err(with_hint)?;
    if quiet {
        println!("{}", path.display());
    } else {
        println!("Wrote {} slides to {}", deck.len(), path.display());
    }
    Ok(())
}

fn cmd_save_code(
    project_id: &str,
    filename: Option<&str>,
    input: Option<&Path>,
    out: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    let project_id = parse_project_id(project_id)?;

    let content = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read code from stdin")?;
            buf
        }
    };

    let path = artifacts::save_code(out, &project_id, filename, &content).map_err(with_hint)?;
    if quiet {
        println!("{}", path.display());
    } else {
        println!("Saved {} bytes to {}", content.len(), path.display());
    }
    Ok(())
}

fn print_aggregate(aggregate: &Aggregate, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(aggregate)?);
        return Ok(());
    }

    if quiet {
        println!("{}", aggregate.project_id);
        return Ok(());
    }

    println!(
        "Project {}: {} ({}h)",
        aggregate.project_id, aggregate.title, aggregate.time_hours
    );
    println!("  {}", aggregate.brief);
    println!();

    for (kind, envelope) in aggregate.agents.iter() {
        let (mark, detail) = match envelope {
            AgentEnvelope::Success(output) if output.parsed.is_some() => ("[OK]", "structured"),
            AgentEnvelope::Success(_) => ("[OK]", "text only"),
            AgentEnvelope::Failure(failure) => ("[!!]", failure.error.as_str()),
        };
        println!("{} {:<13} {}", mark, kind.as_str(), detail);
    }

    if let Some(link) = aggregate.agents.presentation.slides_link() {
        println!();
        println!("Slides: {}", link);
    }

    let failures = aggregate.agents.failures();
    if failures > 0 {
        println!();
        println!("{} of 7 agents failed", failures);
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            match format {
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = items
                        .into_iter()
                        .map(|(key, value)| (key, serde_json::Value::String(value)))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputFormat::Text => {
                    for (key, value) in items {
                        println!("{} = {}", key, value);
                    }
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let report = health::doctor(&config).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text if !quiet => {
            println!("HackMate Health Check");
            println!("=====================");
            println!();
            for check in &report.checks {
                let mark = match check.status {
                    HealthStatus::Ok => "[OK]",
                    HealthStatus::Warning => "[--]",
                    HealthStatus::Error => "[!!]",
                };
                match &check.message {
                    Some(message) => println!("{} {}: {}", mark, check.name, message),
                    None => println!("{} {}", mark, check.name),
                }
            }
            println!();
            println!("Overall: {}", report.overall_status.as_str());
        }
        OutputFormat::Text => {}
    }

    if report.overall_status == HealthStatus::Error {
        anyhow::bail!("Health check failed");
    }
    Ok(())
}
