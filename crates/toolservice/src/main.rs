//! toolservice CLI - Template packs and project generation over a scaffolding tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use toolservice_core::{
    FailureKind, ProcessExecutor, ServiceConfig, ServiceError, TemplateCatalog, TemplateService,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl+C
const INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "toolservice")]
#[command(about = "List, install and generate projects from template packs")]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Args {
    /// YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Template tool executable (overrides config and TOOLSERVICE_COMMAND)
    #[arg(long, global = true)]
    pub tool: Option<String>,

    /// Per-invocation deadline in seconds (0 waits forever)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log tool invocations to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List installed templates
    List(CatalogArgs),
    /// Install a template pack and show the templates it added
    Install(PackageArgs),
    /// Uninstall a template pack and show the templates it removed
    Uninstall(PackageArgs),
    /// Show a template's help text
    Help {
        /// Template short name
        template: String,
    },
    /// Generate a project and save it as an archive
    New(NewArgs),
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct PackageArgs {
    /// Template pack ID
    pub package: String,

    #[command(flatten)]
    pub output: CatalogArgs,
}

#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Template short name
    pub template: String,

    /// Template options (comma-separated: output=Name,framework=net6.0,no-restore)
    #[arg(short, long)]
    pub options: Option<String>,

    /// Archive format
    #[arg(short, long, default_value = "zip")]
    pub packaging: String,

    /// Directory to write the archive into
    #[arg(short, long, default_value = ".")]
    pub dest: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    tokio::select! {
        code = run(args) => match code {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {:#}", "error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            // Dropping `run` kills the tool and removes its scratch directory.
            eprintln!("{}", "Interrupted".yellow());
            ExitCode::from(INTERRUPTED)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = ServiceConfig::load(args.config.as_deref())?;
    config.override_command(args.tool);
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }

    debug!(command = %config.command, timeout = ?config.timeout(), "loaded configuration");

    let service = TemplateService::new(config, ProcessExecutor::new());

    let outcome = match args.command {
        Command::List(output) => service.list().await.map(|c| print_catalog(&c, output.json)),
        Command::Install(args) => service
            .install(&args.package)
            .await
            .map(|c| print_catalog(&c, args.output.json)),
        Command::Uninstall(args) => service
            .uninstall(&args.package)
            .await
            .map(|c| print_catalog(&c, args.output.json)),
        Command::Help { template } => service.help(&template).await.map(|text| {
            println!("{}", text);
            Ok(())
        }),
        Command::New(args) => service
            .generate_project(&args.template, args.options.as_deref(), &args.packaging)
            .await
            .map(|project| save_archive(&args.dest, &project.file_name, &project.bytes)),
    };

    match outcome {
        Ok(printed) => printed.map(|()| ExitCode::SUCCESS),
        Err(e) => {
            debug!(error = ?e, "operation failed");
            eprintln!("{} {}", "error:".red().bold(), e);
            Ok(exit_code(&e))
        }
    }
}

fn exit_code(err: &ServiceError) -> ExitCode {
    ExitCode::from(match err.kind() {
        FailureKind::NotFound => 3,
        FailureKind::InvalidRequest => 2,
        FailureKind::Unavailable => 4,
        FailureKind::Timeout => 5,
        FailureKind::Internal => 1,
    })
}

fn print_catalog(catalog: &TemplateCatalog, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog)?);
        return Ok(());
    }
    if catalog.is_empty() {
        println!("{}", "No templates.".dimmed());
        return Ok(());
    }

    let short_w = column_width(catalog.keys().map(String::as_str), "Short Name");
    let name_w = column_width(catalog.values().map(|i| i.name.as_str()), "Template Name");
    let lang_w = column_width(catalog.values().map(|i| i.languages.as_str()), "Language");

    println!(
        "{}",
        format!(
            "{:<short_w$}  {:<name_w$}  {:<lang_w$}  Tags",
            "Short Name", "Template Name", "Language"
        )
        .bold()
    );
    for (key, info) in catalog {
        println!(
            "{}  {:<name_w$}  {:<lang_w$}  {}",
            format!("{:<short_w$}", key).cyan(),
            info.name,
            info.languages,
            info.tags.dimmed()
        );
    }
    Ok(())
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, title: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain([title.len()])
        .max()
        .unwrap_or(0)
}

fn save_archive(dest: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    let path = dest.join(file_name);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "{} {} ({} bytes)",
        "✓".green(),
        path.display().to_string().cyan(),
        bytes.len()
    );
    Ok(())
}
