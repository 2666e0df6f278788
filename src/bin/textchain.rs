//! Command-line driver for textchain
//!
//! Usage:
//!   textchain [FLAGS] `<input>` `<output>` `<group:artifact:version>` [STAGES]
//!   textchain --list-components
//!
//! Stages come last:
//!   -charfilter NAME [key=value ...]   (any number, applied in order)
//!   -tokenizer NAME [key=value ...]    (exactly one)
//!   -tokenfilter NAME [key=value ...]  (any number, applied in order)
//!
//! `--pipeline <file.yaml>` replaces the stage arguments. An input or output
//! of `-` means stdin / stdout.

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{bail, Result, WrapErr};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use textchain::analysis::args::{parse_stage_args, split_stage_args};
use textchain::analysis::config::{Loader, Settings};
use textchain::analysis::fetch::{
    ArtifactCoordinate, ArtifactFetcher, FetchSession, Repository, RepositoryFetcher,
};
use textchain::analysis::library::load_libraries;
use textchain::analysis::output::{OutputFormat, TokenWriter};
use textchain::{AnalyzerFactory, ComponentRegistry, ComponentRole, ConfigurationError, PipelineSpec};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "textchain",
    version,
    about = "Run a text analysis chain over a file and write one token per line",
    after_help = "Stages follow the positional arguments:\n  \
                  -charfilter NAME [key=value ...]\n  \
                  -tokenizer NAME [key=value ...]\n  \
                  -tokenfilter NAME [key=value ...]"
)]
struct Cli {
    /// Text to analyze (UTF-8), or `-` for stdin
    #[arg(required_unless_present = "list_components")]
    input: Option<PathBuf>,

    /// Where to write tokens, or `-` for stdout
    #[arg(required_unless_present = "list_components")]
    output: Option<PathBuf>,

    /// Component library, group:artifact[:extension[:classifier]]:version
    #[arg(required_unless_present = "list_components")]
    artifact: Option<String>,

    /// Settings file layered over the defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read the chain from a YAML file instead of stage arguments
    #[arg(long, value_name = "FILE")]
    pipeline: Option<PathBuf>,

    /// Local repository for fetched libraries
    #[arg(long, value_name = "DIR")]
    local_repository: Option<PathBuf>,

    /// Extra repository to fetch from (repeatable)
    #[arg(long = "repository", value_name = "ID=URL")]
    repositories: Vec<String>,

    /// Output line format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the built-in component names and exit
    #[arg(long)]
    list_components: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let (head, stages) = split_stage_args(std::env::args().collect());
    let cli = Cli::parse_from(head);
    init_tracing(&cli);
    run(cli, &stages)
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "textchain=warn",
        1 => "textchain=info",
        2 => "textchain=debug",
        _ => "textchain=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

fn run(cli: Cli, stages: &[String]) -> Result<()> {
    if cli.list_components {
        if !stages.is_empty() {
            return Err(ConfigurationError::UnexpectedArgument(stages[0].clone()).into());
        }
        print_components(&ComponentRegistry::with_builtins())?;
        return Ok(());
    }

    let settings = load_settings(&cli)?;

    // The chain definition is checked before anything is fetched or read
    let spec = pipeline_spec(&cli, stages)?;
    info!(chain = %spec, "pipeline");

    let (Some(input), Some(output), Some(artifact)) = (&cli.input, &cli.output, &cli.artifact)
    else {
        bail!("<input>, <output> and <artifact> are required");
    };

    let coordinate: ArtifactCoordinate = artifact.parse()?;
    let mut repositories = settings.fetch.repositories.clone();
    for repository in &cli.repositories {
        repositories.push(Repository::parse(repository)?);
    }
    let session = FetchSession::new(settings.fetch.local_repository_path());
    let fetched = RepositoryFetcher.fetch(session, &[coordinate], &repositories)?;

    let mut registry = ComponentRegistry::with_builtins();
    load_libraries(&mut registry, &fetched.artifacts)?;
    let analyzer = AnalyzerFactory::new(registry).new_analyzer(&spec)?;

    let cursor = analyzer.token_stream(open_input(input)?);
    let mut writer = TokenWriter::new(open_output(output)?, settings.output.format);
    let written = writer
        .write_all(cursor)
        .wrap_err_with(|| format!("analysis of {} failed", input.display()))?;
    writer.finish()?;
    info!(tokens = written, "done");
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, ConfigurationError> {
    let mut loader = Loader::new().with_config(cli.config.as_deref());
    if let Some(local) = &cli.local_repository {
        loader = loader.local_repository(local)?;
    }
    if let Some(format) = cli.format {
        loader = loader.output_format(format)?;
    }
    loader.build()
}

fn pipeline_spec(cli: &Cli, stages: &[String]) -> Result<PipelineSpec, ConfigurationError> {
    match &cli.pipeline {
        Some(_) if !stages.is_empty() => Err(ConfigurationError::ConflictingPipelineSources),
        Some(path) => PipelineSpec::from_yaml_file(path),
        None => parse_stage_args(stages),
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path).wrap_err_with(|| format!("cannot open {}", path.display()))?;
    Ok(Box::new(file))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path).wrap_err_with(|| format!("cannot create {}", path.display()))?;
    Ok(Box::new(file))
}

fn print_components(registry: &ComponentRegistry) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for role in ComponentRole::ALL {
        writeln!(out, "{}s:", role)?;
        for name in registry.names(role) {
            writeln!(out, "  {}", name)?;
        }
    }
    Ok(())
}
