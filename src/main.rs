use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docsync::pipeline::{FileOutcome, Pipeline, PipelineOptions};
use docsync::summarize::{Summarizer, SummarizerOptions};
use docsync::{Backend, Config, ConfigLoader, DocInjector, GenerationGateway, Scanner, UnitExtractor};

#[derive(Parser)]
#[command(name = "docsync")]
#[command(
    version,
    about = "Keeps per-directory README files in sync with LLM summaries of the source"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize source files and update their directories' README files
    Sync {
        /// Specific files or directories to process; scans --root when empty
        paths: Vec<PathBuf>,

        /// Root directory of the codebase to scan
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Backend override (ollama, openai)
        #[arg(long)]
        backend: Option<Backend>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Skip the confirmation prompt (for hooks and CI)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show configuration file paths
    Path,
    /// Show the merged configuration
    Show,
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<bool> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Sync {
            paths,
            root,
            backend,
            model,
            non_interactive,
        } => {
            let mut config = ConfigLoader::load()?;
            if let Some(backend) = backend {
                config.llm.backend = backend;
            }
            if let Some(model) = model {
                config.llm.model = Some(model);
            }
            config.validate()?;

            run_sync(config, root, paths, non_interactive)
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Path => {
                    if let Some(global) = ConfigLoader::global_config_path() {
                        println!("global:  {}", global.display());
                    }
                    println!("project: {}", ConfigLoader::project_config_path().display());
                }
                ConfigAction::Show => {
                    let config = ConfigLoader::load()?;
                    println!("{}", toml::to_string_pretty(&config)?);
                }
            }
            Ok(true)
        }
    }
}

fn run_sync(
    config: Config,
    root: PathBuf,
    paths: Vec<PathBuf>,
    non_interactive: bool,
) -> anyhow::Result<bool> {
    let scanner = Scanner::new(&config.scan);
    let files = scanner.collect(&root, &paths);

    if files.is_empty() {
        println!("{}", style("no eligible files found").yellow());
        return Ok(true);
    }

    println!("{} files queued for summarization:", files.len());
    for (i, file) in files.iter().enumerate() {
        println!("  [{}/{}] {}", i + 1, files.len(), file.display());
    }

    if !non_interactive && !confirm("Proceed with summarization? [y/N] ")? {
        println!("aborted");
        return Ok(true);
    }

    let gateway = Arc::new(GenerationGateway::from_config(&config.llm)?);
    let summarizer = Arc::new(Summarizer::new(
        Arc::clone(&gateway),
        Arc::new(UnitExtractor::new()),
        SummarizerOptions::from_config(&config),
    ));
    let pipeline = Pipeline::new(
        summarizer,
        Arc::new(DocInjector::new()),
        gateway,
        PipelineOptions::from_config(&config),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(pipeline.run(files));

    print_report(&report);
    Ok(report.is_clean())
}

fn print_report(report: &docsync::BatchReport) {
    println!();
    for (path, outcome) in &report.outcomes {
        match outcome {
            FileOutcome::Summarized { degraded_units: 0 } => {
                println!("  {} {}", style("ok").green(), path.display());
            }
            FileOutcome::Summarized { degraded_units } => {
                println!(
                    "  {} {} ({} units degraded to placeholders)",
                    style("ok").yellow(),
                    path.display(),
                    degraded_units
                );
            }
            FileOutcome::Failed { reason } => {
                println!(
                    "  {} {}: {}",
                    style("failed").red(),
                    path.display(),
                    reason
                );
            }
            FileOutcome::Skipped => {
                println!("  {} {}", style("skipped").dim(), path.display());
            }
        }
    }
    println!(
        "\n{} succeeded, {} failed, {} total",
        report.succeeded(),
        report.failed(),
        report.outcomes.len()
    );
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
