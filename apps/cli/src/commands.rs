//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use mdpack_captioning::ChatClient;
use mdpack_core::encoder::ImageHandling;
use mdpack_core::pipeline::{PackConfig, PackResult, ProgressReporter};
use mdpack_core::prompt::PromptConfig;
use mdpack_shared::{AppConfig, ItemError, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mdpack — package Markdown and images into a portable JSON manifest.
#[derive(Parser)]
#[command(
    name = "mdpack",
    version,
    about = "Package a folder of Markdown and images into a single JSON manifest.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.mdpack/mdpack.toml.
    #[arg(long, global = true, env = "MDPACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// How images end up in the manifest.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ImageMode {
    /// Store image bytes as base64.
    Embed,
    /// Replace images with a generated description.
    Describe,
    /// Leave images out; package Markdown only.
    Skip,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Package a folder into a JSON manifest.
    Pack {
        /// Folder containing the files to package.
        #[arg(long, alias = "input")]
        input_folder: PathBuf,

        /// Path of the JSON manifest to write.
        #[arg(short, long)]
        output: PathBuf,

        /// Image handling for the whole run.
        #[arg(long, value_enum, default_value = "embed")]
        images: ImageMode,
    },

    /// Send a prompt file to the configured model and save the reply.
    Prompt {
        /// File holding the prompt.
        #[arg(long)]
        prompt: PathBuf,

        /// File appended to the prompt after a blank line.
        #[arg(long)]
        additional: Option<PathBuf>,

        /// Where to save the reply.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Count the gpt-4o and cl100k_base tokens in a text file.
    Tokens {
        /// UTF-8 text file to count.
        file: PathBuf,
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

/// Crates whose spans and events are shown by default.
const LOG_TARGETS: &[&str] = &[
    "mdpack_cli",
    "mdpack_core",
    "mdpack_discovery",
    "mdpack_captioning",
    "mdpack_shared",
];

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let directives: Vec<String> = std::iter::once("warn".to_string())
        .chain(LOG_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives.join(",")));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Pack {
            input_folder,
            output,
            images,
        } => cmd_pack(config_path, input_folder, output, images).await,
        Command::Prompt {
            prompt,
            additional,
            output,
        } => cmd_prompt(config_path, prompt, additional, output).await,
        Command::Tokens { file } => cmd_tokens(file).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_pack(
    config_path: Option<&Path>,
    input: PathBuf,
    output: PathBuf,
    images: ImageMode,
) -> Result<()> {
    let pack_config = PackConfig { input, output };

    info!(
        input = %pack_config.input.display(),
        output = %pack_config.output.display(),
        ?images,
        "packing folder"
    );

    // Captioning settings are checked before any file is touched.
    let client = match images {
        ImageMode::Describe => {
            let app_config = resolve_config(config_path)?;
            Some(ChatClient::from_config(&app_config.captioning)?)
        }
        ImageMode::Embed | ImageMode::Skip => None,
    };
    let handling = match (images, client.as_ref()) {
        (ImageMode::Skip, _) => ImageHandling::Skip,
        (_, Some(client)) => ImageHandling::Describe(client),
        (_, None) => ImageHandling::Embed,
    };

    let reporter = CliProgress::new();
    let result = mdpack_core::pipeline::pack(&pack_config, handling, &reporter).await;

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    println!();
    println!("  Processing complete. Output saved to {}", result.output.display());
    println!("  Records:  {}", result.records);
    println!("  Markdown: {}", result.markdown);
    println!("  Images:   {}", result.images);
    println!("  Ignored:  {}", result.ignored);
    println!("  Failed:   {}", result.failed);
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_prompt(
    config_path: Option<&Path>,
    prompt: PathBuf,
    additional: Option<PathBuf>,
    output: PathBuf,
) -> Result<()> {
    let app_config = resolve_config(config_path)?;
    let client = ChatClient::from_config(&app_config.captioning)?;

    info!(
        deployment = %app_config.captioning.deployment,
        max_completion_tokens = app_config.captioning.max_completion_tokens,
        reasoning_effort = %app_config.captioning.reasoning_effort,
        "sending prompt"
    );

    let prompt_config = PromptConfig {
        prompt,
        additional,
        output,
    };
    let result = mdpack_core::prompt::run_prompt(&client, &prompt_config).await?;

    println!();
    if let Some(usage) = result.usage {
        println!("  Prompt tokens:     {}", usage.prompt_tokens);
        println!("  Completion tokens: {}", usage.completion_tokens);
        println!("  Total tokens:      {}", usage.total_tokens);
    }
    println!("  Response saved to {}", result.output.display());
    println!("  Request completed in {:.2} seconds", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_tokens(file: PathBuf) -> Result<()> {
    let counts = mdpack_core::tokens::count_file_tokens(&file)?;

    println!("Token counts for file: {}", file.display());
    println!("{}", "-".repeat(40));
    println!("gpt-4o: {} tokens", counts.gpt4o);
    println!("cl100k_base: {} tokens", counts.cl100k);

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
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
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_packed(&self, path: &str, records_so_far: usize) {
        self.spinner
            .set_message(format!("Packed [{records_so_far}] {path}"));
    }

    fn file_failed(&self, error: &ItemError) {
        self.spinner.set_message(format!("Skipped {}", error.path));
    }

    fn done(&self, _result: &PackResult) {
        self.spinner.finish_and_clear();
    }
}
