use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use camflow::{init_logging, Config, Document, Environment, FlowInterpreter};

#[derive(Parser, Debug)]
#[command(
    name = "camflow",
    version,
    about = "Generate and export toolpaths from a declarative specification"
)]
struct Cli {
    /// Specification document (.yaml, .json or .toml)
    spec: PathBuf,

    /// Configuration file (default: the platform configuration directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter directive, overrides the configuration (e.g. "debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print a JSON summary of the run on stdout
    #[arg(long)]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;
    info!("camflow {} (built {})", camflow::VERSION, camflow::BUILD_DATE);

    if !cli.spec.is_file() {
        bail!("Specification not found: {}", cli.spec.display());
    }
    let document = Document::load(&cli.spec)?;

    let environment = Environment::new(&config);
    let report = FlowInterpreter::for_environment(&environment).run(&document);

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
