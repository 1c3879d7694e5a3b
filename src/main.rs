use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clinote::{format_analysis, format_summary, Normalizer, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "clinote")]
#[command(author, version, about = "Clinical note extraction from doctor-patient transcripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract entities, summary, sentiment/intent and a SOAP note from a transcript
    Process {
        /// Input transcript file (plain text, one speaker-prefixed line per turn)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the JSON results (overrides the config file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Pipeline configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the summary without writing result files
        #[arg(long)]
        no_save: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Segment a transcript and report turn statistics, without calling any model
    Analyze {
        /// Input transcript file
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output_dir,
            config,
            no_save,
            verbose,
        } => {
            setup_logging(verbose);
            process_transcript(input, output_dir, config, no_save).await
        }
        Commands::Analyze {
            input,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, config)
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            PipelineConfig::from_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

async fn process_transcript(
    input: PathBuf,
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    no_save: bool,
) -> Result<()> {
    if dotenvy::dotenv().is_err() {
        warn!("No .env file found, using process environment only");
    }

    let config = load_config(config.as_deref())?;
    let mut pipeline = Pipeline::from_env(config).context("Failed to initialize pipeline")?;
    if let Some(dir) = output_dir {
        pipeline = pipeline.with_output_dir(dir);
    }

    let result = if no_save {
        pipeline.analyze(&input).await
    } else {
        pipeline.process(&input).await
    }
    .with_context(|| format!("Failed to process {:?}", input))?;

    println!();
    print!("{}", format_summary(&result));

    if no_save {
        println!();
        println!("Results not saved (--no-save)");
    } else {
        println!();
        println!("Results saved to {:?}", pipeline.output_dir());
    }

    Ok(())
}

fn analyze_transcript(input: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let normalizer = Normalizer::new(&config).context("Invalid speaker or filler configuration")?;

    let raw = clinote::read_transcript(&input).context("Failed to read input transcript")?;
    let utterances = normalizer.segment(&normalizer.clean(&raw));
    let failure = normalizer.validation_failure(&utterances);

    print!(
        "{}",
        format_analysis(
            &utterances,
            normalizer.doctor_label(),
            normalizer.patient_label(),
            failure.as_ref(),
        )
    );

    Ok(())
}
