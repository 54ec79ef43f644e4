//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use readmegen_core::pipeline::{
    GenerateConfig, GenerateResult, ProgressReporter, generate_readme,
};
use readmegen_shared::{AppConfig, init_config, load_config, load_config_from, validate_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// readmegen — generate a README for any repository.
#[derive(Parser)]
#[command(
    name = "readmegen",
    version,
    about = "Generate a README for a repository using an LLM backend.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a README for a repository.
    Generate {
        /// Local path or remote URL of the repository.
        repository: String,

        /// Output path for the generated README.
        #[arg(short, long, default_value = "README_GENERATED.md")]
        output: PathBuf,

        /// Config file to use instead of ~/.readmegen/readmegen.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Backend service override (llama, openai, vsegpt).
        #[arg(long)]
        api: Option<String>,

        /// Model identifier override for hosted backends.
        #[arg(long)]
        model: Option<String>,

        /// Context window override, in tokens.
        #[arg(long)]
        tokens: Option<usize>,

        /// Concurrent request limit override.
        #[arg(long)]
        rate_limit: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "readmegen=info",
        1 => "readmegen=debug",
        _ => "readmegen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            repository,
            output,
            config,
            api,
            model,
            tokens,
            rate_limit,
        } => {
            cmd_generate(
                &repository,
                output,
                config.as_deref(),
                api,
                model,
                tokens,
                rate_limit,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_generate(
    repository: &str,
    output: PathBuf,
    config_path: Option<&std::path::Path>,
    api: Option<String>,
    model: Option<String>,
    tokens: Option<usize>,
    rate_limit: Option<usize>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    apply_overrides(&mut config, api, model, tokens, rate_limit);
    validate_api_key(&config)?;

    let opts = GenerateConfig {
        repository: repository.to_string(),
        output_file: output,
    };

    info!(repository, backend = %config.llm.api, "generating README");

    let reporter = CliProgress::new();
    let result = generate_readme(&config, &opts, &reporter).await?;

    println!();
    println!("  README generated!");
    println!("  Files analyzed: {}", result.files_analyzed);
    println!("  Prompt jobs:    {}", result.jobs_dispatched);
    if result.jobs_failed > 0 {
        println!(
            "  Warning:        {} job(s) failed; their sections show a placeholder",
            result.jobs_failed
        );
    }
    println!("  Output:         {}", result.output_file.display());
    println!("  Time:           {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn apply_overrides(
    config: &mut AppConfig,
    api: Option<String>,
    model: Option<String>,
    tokens: Option<usize>,
    rate_limit: Option<usize>,
) {
    if let Some(api) = api {
        config.llm.api = api;
    }
    if let Some(model) = model {
        config.llm.model = model;
    }
    if let Some(tokens) = tokens {
        config.llm.tokens = tokens;
    }
    if let Some(rate_limit) = rate_limit {
        config.api.rate_limit = rate_limit;
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created default config at {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}
