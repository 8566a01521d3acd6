//! inkloop - bounded multi-role essay writing
//!
//! ## Commands
//!
//! - `run`: write an essay on a topic and print or save the final draft
//! - `models`: list the catalogued models and which credentials are set
//! - `check`: validate configuration and bind every provider without running

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inkloop_core::{
    EventSink, ModelId, Orchestrator, Role, RoleModels, RunConfig, RunEvent, RunOutcome,
    RunSummary, StepEvent, TerminationReason,
};
use inkloop_providers::{catalog, Credentials, ProviderRegistry};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "inkloop")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Editor, researcher, writer and critic drafting an essay together", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the writing loop on a topic
    Run(RunArgs),

    /// List selectable models
    Models,

    /// Validate configuration and bind providers without running
    Check(ConfigArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Write the final draft here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append every run event to this file as JSON lines
    #[arg(long)]
    events_jsonl: Option<PathBuf>,
}

/// Run configuration: an optional TOML file with flags layered on top.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Essay topic (overrides the config file)
    topic: Option<String>,

    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model for every role, as provider:model
    #[arg(long, env = "INKLOOP_MODEL")]
    model: Option<String>,

    #[arg(long, env = "INKLOOP_EDITOR_MODEL")]
    editor_model: Option<String>,

    #[arg(long, env = "INKLOOP_RESEARCHER_MODEL")]
    researcher_model: Option<String>,

    #[arg(long, env = "INKLOOP_WRITER_MODEL")]
    writer_model: Option<String>,

    #[arg(long, env = "INKLOOP_CRITIC_MODEL")]
    critic_model: Option<String>,

    /// Planning rounds before writing starts
    #[arg(long)]
    max_editing: Option<u32>,

    /// Critique rounds before the run stops
    #[arg(long)]
    max_critique: Option<u32>,

    #[arg(long)]
    max_writing: Option<u32>,

    /// Target essay length in words
    #[arg(long)]
    max_length: Option<u32>,

    /// Search results fetched per research query
    #[arg(long)]
    max_results: Option<usize>,

    /// Abort a role step after this many seconds (0 disables)
    #[arg(long)]
    step_timeout: Option<u64>,
}

impl ConfigArgs {
    fn build(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        if let Some(model) = &self.model {
            config.models = RoleModels::uniform(model.as_str());
        }
        let per_role = [
            (Role::Editor, &self.editor_model),
            (Role::Researcher, &self.researcher_model),
            (Role::Writer, &self.writer_model),
            (Role::Critic, &self.critic_model),
        ];
        for (role, model) in per_role {
            if let Some(model) = model {
                *config.models.for_role_mut(role) = ModelId::new(model.as_str());
            }
        }

        let bounds = &mut config.bounds;
        if let Some(n) = self.max_editing {
            bounds.max_editing_iterations = n;
        }
        if let Some(n) = self.max_critique {
            bounds.max_critique_iterations = n;
        }
        if let Some(n) = self.max_writing {
            bounds.max_writing_iterations = n;
        }
        if let Some(n) = self.max_length {
            bounds.max_essay_length = n;
        }
        if let Some(n) = self.max_results {
            config.research.max_results_per_query = n;
        }
        if let Some(secs) = self.step_timeout {
            config.step_timeout_secs = Some(secs);
        }

        config.validate().context("Invalid run configuration")?;
        Ok(config)
    }
}

fn load_config_file(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    RunConfig::from_toml_str(&text).with_context(|| format!("Failed to parse {:?}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    inkloop_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Models => cmd_models(),
        Commands::Check(args) => cmd_check(&args),
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let config = args.config.build()?;
    let registry =
        ProviderRegistry::from_env().context("Failed to load provider configuration")?;
    let orchestrator =
        Orchestrator::from_resolver(config, &registry).context("Failed to bind providers")?;

    let outcome = execute(
        &orchestrator,
        args.output.as_deref(),
        args.events_jsonl.as_deref(),
    )
    .await?;

    if !outcome.approved {
        warn!(
            steps = outcome.steps,
            "critique limit reached before the editor approved the draft"
        );
    }
    Ok(())
}

/// Drive one run, stream progress, and deliver the draft.
async fn execute(
    orchestrator: &Orchestrator,
    output: Option<&Path>,
    events_jsonl: Option<&Path>,
) -> Result<RunOutcome> {
    let jsonl = events_jsonl
        .map(|path| {
            File::create(path)
                .map(BufWriter::new)
                .with_context(|| format!("Failed to create events file {:?}", path))
        })
        .transpose()?;
    let mut sink = ProgressSink::new(jsonl);

    let outcome = orchestrator.run(&mut sink).await.context("Run failed")?;
    sink.finish().context("Failed to write run events")?;

    match output {
        Some(path) => {
            std::fs::write(path, &outcome.draft)
                .with_context(|| format!("Failed to write draft to {:?}", path))?;
            info!(path = ?path, "draft written");
        }
        None => println!("{}", outcome.draft),
    }
    Ok(outcome)
}

fn cmd_models() -> Result<()> {
    let credentials = Credentials::from_env();
    println!("{:<40} {:<20} CREDENTIAL", "MODEL", "NAME");
    for entry in catalog() {
        let status = if credentials.for_provider(entry.provider).is_some() {
            "set"
        } else {
            "missing"
        };
        println!(
            "{:<40} {:<20} {} {}",
            entry.id().to_string(),
            entry.display_name,
            entry.provider.key_var(),
            status
        );
    }
    Ok(())
}

fn cmd_check(args: &ConfigArgs) -> Result<()> {
    let config = args.build()?;
    let registry =
        ProviderRegistry::from_env().context("Failed to load provider configuration")?;
    let orchestrator =
        Orchestrator::from_resolver(config, &registry).context("Failed to bind providers")?;

    let config = orchestrator.config();
    println!("topic: {}", config.topic);
    for role in Role::ALL {
        println!(
            "  {:<11} {:<40} {}",
            role.to_string(),
            config.models.for_role(role).to_string(),
            role.description()
        );
    }
    println!("  {:<11} {}", "search", orchestrator.bindings().retriever.name());
    println!("step budget: {}", config.bounds.step_budget());
    println!("ok");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress output
// ---------------------------------------------------------------------------

/// Prints one line per step to stderr and optionally mirrors every event
/// as JSON lines. The first write error is kept and reported by `finish`.
struct ProgressSink<W: Write> {
    jsonl: Option<W>,
    write_error: Option<std::io::Error>,
}

impl<W: Write> ProgressSink<W> {
    fn new(jsonl: Option<W>) -> Self {
        Self {
            jsonl,
            write_error: None,
        }
    }

    fn finish(self) -> std::io::Result<()> {
        if let Some(e) = self.write_error {
            return Err(e);
        }
        if let Some(mut w) = self.jsonl {
            w.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> EventSink for ProgressSink<W> {
    fn emit(&mut self, event: RunEvent) {
        match &event {
            RunEvent::Step(step) => eprintln!("{}", render_step(step)),
            RunEvent::Finished(summary) => eprintln!("{}", render_summary(summary)),
        }
        if self.write_error.is_some() {
            return;
        }
        if let Some(w) = self.jsonl.as_mut() {
            if let Err(e) = write_json_line(w, &event) {
                self.write_error = Some(e);
            }
        }
    }
}

fn write_json_line<W: Write>(w: &mut W, event: &RunEvent) -> std::io::Result<()> {
    serde_json::to_writer(&mut *w, event)?;
    w.write_all(b"\n")
}

fn render_step(step: &StepEvent) -> String {
    let role = match step.phase {
        Some(phase) => format!("{} ({})", step.role, phase),
        None => step.role.to_string(),
    };
    format!(
        "[{:>2}] {:<28} -> {:<30} {}",
        step.seq,
        role,
        step.next.to_string(),
        step.counters
    )
}

fn render_summary(summary: &RunSummary) -> String {
    let verdict = match summary.termination {
        TerminationReason::Approved => "approved by the editor",
        TerminationReason::CritiqueCapReached => "critique limit reached, not approved",
    };
    format!("finished after {} steps: {}", summary.steps, verdict)
}
