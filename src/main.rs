use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use react_step::{
    Config, GenaiModel, History, PromptTemplate, StepContext, StepRunner, StepRuntimeConfig,
    ToolCatalog, Variant,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// react-step - run one step of a ReAct agent loop
#[derive(Parser, Debug)]
#[command(name = "react-step")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/react-step/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Trace prompts, completions and model latency to the log
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the model for the next decision
    Step {
        /// The user's input for this exchange
        #[arg(short, long)]
        input: String,

        /// History file; the decision is recorded here when given
        #[arg(long)]
        history: Option<PathBuf>,

        /// Use the conversational pipeline instead of the configured one
        #[arg(long)]
        conversational: bool,

        /// Enabled tool ids, comma separated (overrides config)
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,

        /// Conversation id reported to the tool registry
        #[arg(long, env = "REACT_STEP_CONVERSATION", default_value = "default")]
        conversation: String,
    },
    /// Attach a tool observation to the pending action in a history file
    Observe {
        #[arg(long)]
        history: PathBuf,

        /// Tool output
        #[arg(short, long)]
        observation: String,
    },
}

fn init_logging(verbose: bool) -> Result<()> {
    let log_path = std::env::temp_dir().join("react-step.log");
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();
    Ok(())
}

async fn run_step(
    config: &Config,
    verbose: bool,
    input: String,
    history_path: Option<PathBuf>,
    conversational: bool,
    tools: Vec<String>,
    conversation: String,
) -> Result<()> {
    let variant = if conversational {
        Variant::Conversational
    } else {
        config.parser.variant
    };

    let catalog = match config.tools.catalog {
        Some(ref path) => ToolCatalog::load(path)?,
        None => ToolCatalog::empty(),
    };
    let enabled = if tools.is_empty() {
        config.tools.enabled.clone()
    } else {
        tools
    };

    let mut history = match history_path {
        Some(ref path) => History::load_or_default(path)?,
        None => History::new(),
    };

    let runtime = StepRuntimeConfig::from_config(config);
    let model = GenaiModel::new(&runtime);
    let mut runner = StepRunner::new(variant, runtime, Arc::new(model), Arc::new(catalog))
        .verbose(verbose)
        .with_credential(config.model.credential());
    if let Some(path) = config.prompts.template_path(variant) {
        runner = runner.with_template(PromptTemplate::load(path)?);
    }

    let context = StepContext::new(conversation, history.steps().len());
    let (outcome, decision) = runner
        .run_with_outcome(&context, history.steps(), &enabled, &input)
        .await?;

    if let Some(ref path) = history_path {
        history.record_decision(&decision);
        history.save(path)?;
        info!("Recorded decision in {}", path.display());
    }

    let output = json!({ "outcome": outcome, "decision": decision });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_observe(history_path: PathBuf, observation: String) -> Result<()> {
    let mut history = History::load(&history_path)?;
    let step = history.record_observation(observation)?.clone();
    history.save(&history_path)?;
    info!(
        "Recorded observation for {} ({} steps)",
        step.tool.name_for_model,
        history.steps().len()
    );
    println!("{}", serde_json::to_string_pretty(&step)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let verbose = args.verbose || config.general.verbose;
    init_logging(verbose)?;

    if let Some(ref working_dir) = config.general.working_dir {
        std::env::set_current_dir(working_dir)?;
    }

    match args.command {
        Command::Step {
            input,
            history,
            conversational,
            tools,
            conversation,
        } => {
            run_step(
                &config,
                verbose,
                input,
                history,
                conversational,
                tools,
                conversation,
            )
            .await
        },
        Command::Observe {
            history,
            observation,
        } => run_observe(history, observation),
    }
}
