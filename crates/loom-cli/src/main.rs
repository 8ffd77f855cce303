mod source;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use loom_assets::AssetCache;
use loom_codegen::EmitOptions;
use loom_engine::config::load_config;
use loom_engine::{Engine, RunFailure};
use loom_validate::Report;
use source::FileSource;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loom")]
#[command(about = "Loom: translate design trees into React components and CSS modules")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the component, style sheet and asset manifest of a design
    Generate {
        #[command(flatten)]
        run: RunArgs,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        /// Persistent asset cache directory shared across runs
        #[arg(long)]
        cache: Option<PathBuf>,
    },

    /// Run every pass and the validation gate without writing anything
    Check {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Design tree JSON file
    design: PathBuf,

    /// Engine configuration (TOML, JSON or YAML)
    #[arg(short, long, default_value = "loom.toml")]
    config: PathBuf,

    /// Component name; defaults to the document name
    #[arg(long)]
    name: Option<String>,

    /// Print the validation report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate { run, out, cache } => cmd_generate(&run, &out, cache.as_deref()).await,
        Command::Check { run } => cmd_check(&run).await,
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,loom=info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn engine(run: &RunArgs, cache: Option<&Path>) -> Result<Engine> {
    let config = load_config(&run.config)?;
    let cache = match cache {
        Some(dir) => AssetCache::open(dir).with_context(|| format!("opening asset cache {}", dir.display()))?,
        None => AssetCache::in_memory(),
    };
    let engine = Engine::with_cache(&config, cache)?;
    Ok(engine.with_options(EmitOptions { component_name: run.name.clone() }))
}

fn design_reference(design: &Path) -> Result<&str> {
    design
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid design path {}", design.display()))
}

async fn cmd_generate(run: &RunArgs, out: &Path, cache: Option<&Path>) -> Result<()> {
    let engine = engine(run, cache)?;
    let source = FileSource::for_design(&run.design);
    let reference = design_reference(&run.design)?;

    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match engine.run_until(&source, reference, out, cancel).await {
        Ok((output, paths)) => {
            print_report(&output.report, run.json)?;
            for path in &paths {
                info!(path = %path.display(), "wrote");
            }
            eprintln!("Generated {} file(s) in {}", paths.len(), out.display());
            Ok(())
        }
        Err(failure) => fail(failure, run.json),
    }
}

async fn cmd_check(run: &RunArgs) -> Result<()> {
    let engine = engine(run, None)?;
    let source = FileSource::for_design(&run.design);
    let reference = design_reference(&run.design)?;

    match engine.generate(&source, reference).await {
        Ok(output) => {
            print_report(&output.report, run.json)?;
            eprintln!("OK: {}", run.design.display());
            Ok(())
        }
        Err(failure) => fail(failure, run.json),
    }
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for error in &report.errors {
        eprintln!("error: {error}");
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn fail(failure: RunFailure, json: bool) -> Result<()> {
    print_report(&failure.report, json)?;
    Err(failure.into())
}
