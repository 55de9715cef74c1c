use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use mocktopus::commands::{
    self, Outcome, PersonaArgs, PlaceholderArgs, ProtoArgs, TestsArgs,
};
use mocktopus::error::AppError;
use mocktopus::interactive::TerminalPrompter;
use mocktopus::llm::GenerationClient;
use mocktopus::paths;
use mocktopus::progress::Console;
use mocktopus::settings::{self, LlmProviderConfig};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "mocktopus",
    about = "Generate mock data, tests and personas with an LLM",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overridden by MOCKTOPUS_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never prompt; fail when a required input is missing
    #[arg(long, global = true)]
    non_interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate mock data for a proto message
    Proto {
        /// Input .proto file
        source: Option<PathBuf>,
        /// Output file
        destination: Option<PathBuf>,
        /// Generate faker-js code instead of data
        #[arg(short, long)]
        code: bool,
        /// Message to generate for (skips the menu)
        #[arg(long)]
        definition: Option<String>,
        /// Number of records
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        count: Option<u32>,
    },
    /// Generate placeholder data from a description
    Placeholder {
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        count: Option<u32>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate tests for a code snippet
    Tests {
        /// Source file, optionally with a line range: path#start:end
        source: Option<String>,
        /// Output file
        destination: Option<PathBuf>,
    },
    /// Generate user personas for a product
    Persona {
        #[arg(long)]
        product: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the resolved model provider
    Config,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Proto { .. } => "proto",
            Commands::Placeholder { .. } => "placeholder",
            Commands::Tests { .. } => "tests",
            Commands::Persona { .. } => "persona",
            Commands::Config => "config",
        }
    }
}

// ── Entry point ──────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_string().red().bold());
            process::exit(e.exit_code());
        }
    };

    let command = cli.command.name();
    match run(cli.command, &config, cli.non_interactive).await {
        Ok(outcome) => report(outcome),
        Err(e) if e.is_benign() => {
            println!("{e}");
            process::exit(e.exit_code());
        }
        Err(e) => {
            eprintln!(
                "{}\n{e}",
                format!("⚠️ Error occurred while running {command} command:")
                    .red()
                    .bold()
            );
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MOCKTOPUS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "mocktopus=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn resolve_config(path: Option<&std::path::Path>) -> Result<LlmProviderConfig, AppError> {
    let path = path.map_or_else(|| paths::settings_path(&paths::config_dir()), PathBuf::from);
    let settings = settings::load_settings(&path)?;
    settings::resolve_from_env(&settings)
}

async fn run(
    command: Commands,
    config: &LlmProviderConfig,
    non_interactive: bool,
) -> Result<Outcome, AppError> {
    let console = Console::new();
    let prompter = TerminalPrompter::new(non_interactive);

    let client = GenerationClient::new(config)?;

    match command {
        Commands::Proto {
            source,
            destination,
            code,
            definition,
            count,
        } => {
            let (source, destination) = commands::require_paths(source, destination)?;
            let args = ProtoArgs {
                source,
                destination,
                code,
                definition,
                count,
            };
            commands::proto(&client, &prompter, console, args).await
        }
        Commands::Placeholder {
            description,
            count,
            output,
        } => {
            let args = PlaceholderArgs {
                description,
                count,
                output,
            };
            commands::placeholder(&client, &prompter, console, args).await
        }
        Commands::Tests {
            source,
            destination,
        } => {
            let (source, destination) = commands::require_paths(source, destination)?;
            commands::tests(&client, console, TestsArgs { source, destination }).await
        }
        Commands::Persona { product, output } => {
            commands::persona(&client, &prompter, console, PersonaArgs { product, output }).await
        }
        Commands::Config => commands::show_config(config),
    }
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Written { path, summary } => {
            println!("{}", summary.green().bold());
            println!("{}", path.display().to_string().dimmed());
        }
        Outcome::Printed { summary, body } => {
            println!("{}", summary.green().bold());
            println!("{body}");
        }
    }
}
