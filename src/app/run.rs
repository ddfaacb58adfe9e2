use super::session::ToolSession;
use crate::agent::diagram::{DEFAULT_DIAGRAM_PATH, write_mermaid};
use crate::agent::{
    ActingRole, ActingSettings, ConsoleSink, ControlLoop, CriticSettings, PromptTemplates,
    ReviewingRole, Role, RoutingDecision, RunState, TerminationPolicy, UpdateSink,
};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::llm::{Provider, create_provider};
use crate::tools::CapabilityProvider;
use crate::transcript::{DEFAULT_INSTRUCTION, SopDocument, Transcript};
use anyhow::{Result, anyhow};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Options for the two-role `run` command.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub sop: Option<PathBuf>,
    pub instruction: Option<String>,
    pub max_revisions: Option<u32>,
    pub model: Option<String>,
    pub json: bool,
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run {
            sop,
            instruction,
            max_revisions,
            model,
            json,
        } => {
            run_sop(
                config,
                RunOptions {
                    sop,
                    instruction,
                    max_revisions,
                    model,
                    json,
                },
            )
            .await
        }
        Commands::Solo { sop } => run_solo(&config, sop.as_deref()).await,
        Commands::Graph { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_DIAGRAM_PATH));
            write_mermaid(&path)?;
            println!("Saved Mermaid diagram as {}", path.display());
            Ok(())
        }
        Commands::Tools => list_tools(&config).await,
    }
}

/// Pick the SOP: explicit file, then `sop_path` from config, then the example.
pub fn resolve_sop(explicit: Option<&Path>, config: &Config) -> Result<SopDocument> {
    match explicit.map(Path::to_path_buf).or_else(|| config.sop_path()) {
        Some(path) => SopDocument::from_file(&path),
        None => Ok(SopDocument::example()),
    }
}

fn apply_run_overrides(config: &mut Config, options: &RunOptions) {
    if let Some(max_revisions) = options.max_revisions {
        config.control.max_revisions = max_revisions;
    }
    if let Some(model) = &options.model {
        config.acting.model = Some(model.clone());
        config.critic.model = Some(model.clone());
    }
}

/// Run `work` until it finishes or Ctrl-C arrives, then close the session
/// either way.
async fn with_session<T>(
    session: ToolSession,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    let result = tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Run cancelled")),
    };
    session.close().await;
    result
}

async fn run_sop(mut config: Config, options: RunOptions) -> Result<()> {
    apply_run_overrides(&mut config, &options);
    config.validate()?;

    let sop = resolve_sop(options.sop.as_deref(), &config)?;
    let provider = create_provider(&config.llm)?;
    let prompts = Arc::new(PromptTemplates::new()?);
    let session = ToolSession::open(&config, true).await;

    let acting = Arc::new(ActingRole::new(
        Arc::clone(&provider),
        session.registry(),
        Arc::clone(&prompts),
        ActingSettings::from_config(&config),
    ));
    let reviewing = Arc::new(ReviewingRole::new(
        provider,
        prompts,
        CriticSettings::from_config(&config),
    ));
    let control = ControlLoop::new(acting, reviewing)
        .with_policy(TerminationPolicy::from_config(&config.control))
        .with_sink(Arc::new(ConsoleSink::new(options.json)));

    let instruction = options
        .instruction
        .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string());

    println!("Starting generic multi-agent SOP automation...");
    let outcome = with_session(session, async {
        control
            .run(RunState::new(instruction, sop))
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;

    info!(
        run_id = %outcome.run_id,
        steps = outcome.steps,
        revisions = outcome.revisions,
        messages = outcome.transcript.len(),
        "Run finished"
    );
    println!("SOP automation complete.");
    Ok(())
}

/// One acting turn with the SOP itself as the instruction and no critic.
///
/// Every tool round and the closing summary go to `sink` as they happen.
pub async fn solo_turn(
    provider: Arc<dyn Provider>,
    capabilities: Arc<dyn CapabilityProvider>,
    settings: ActingSettings,
    sop: &SopDocument,
    sink: Arc<dyn UpdateSink>,
) -> Result<RoutingDecision> {
    let acting = ActingRole::new(
        provider,
        capabilities,
        Arc::new(PromptTemplates::new()?),
        settings,
    )
    .with_round_sink(sink);
    acting.run(Transcript::seeded(sop.text()), sop).await
}

async fn run_solo(config: &Config, sop: Option<&Path>) -> Result<()> {
    let sop = resolve_sop(sop, config)?;
    let provider = create_provider(&config.llm)?;
    let session = ToolSession::open(config, false).await;
    let registry = session.registry();

    println!("Starting agent with SOP document...");
    let decision = with_session(
        session,
        solo_turn(
            provider,
            registry,
            ActingSettings::from_config(config),
            &sop,
            Arc::new(ConsoleSink::new(false)),
        ),
    )
    .await?;

    info!(messages = decision.transcript.len(), "Solo turn finished");
    println!("Agent run complete.");
    Ok(())
}

async fn list_tools(config: &Config) -> Result<()> {
    let session = ToolSession::open(config, true).await;
    let specs = session.registry().list_capabilities();
    session.close().await;

    println!("{} tools available:", specs.len());
    for spec in specs {
        println!("  {:<32} {}", spec.name, spec.description);
    }
    Ok(())
}
