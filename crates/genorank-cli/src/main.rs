//! genorank: rank network genes by relevance to an input gene set.
//! Entry point for the command line binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use genorank_cli::commands;
use genorank_cli::config::Config;
use genorank_cli::input::Separator;
use genorank_common::{FeatureType, GscName, NetworkType, Selection};
use genorank_ranker::RankingJob;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genorank", version, about = "Network-based gene prioritisation")]
struct Cli {
    /// Path to genorank.toml.
    #[arg(long, env = "GENORANK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the reference data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the output directory.
    #[arg(long, short, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GeneInput {
    /// Comma separated identifiers.
    #[arg(long, value_delimiter = ',')]
    genes: Vec<String>,

    /// File holding identifiers.
    #[arg(long, short)]
    input: Option<PathBuf>,

    #[arg(long, value_enum)]
    separator: Option<Separator>,

    /// Job name, used as the file prefix.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve identifiers and report network membership.
    Validate {
        #[command(flatten)]
        input: GeneInput,
    },
    /// Run the full ranking pipeline for one gene set.
    Run {
        #[command(flatten)]
        input: GeneInput,
        #[arg(long)]
        net_type: Option<NetworkType>,
        #[arg(long)]
        features: Option<FeatureType>,
        #[arg(long)]
        gsc: Option<GscName>,
    },
    /// Run every job of a TOML batch file.
    Batch {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    info!("genorank {}", env!("CARGO_PKG_VERSION"));
    let provider = commands::open_provider(&config)?;
    let output_dir = config.output_dir.clone();

    match cli.command {
        Command::Validate { input } => {
            let sep = input.separator.unwrap_or(config.separator);
            let genes = commands::collect_genes(&input.genes, input.input.as_deref(), sep)?;
            let job = input.name.unwrap_or_else(|| "validation".to_string());
            let (stage, files) = commands::validate(&config, &provider, &genes, &job, &output_dir)?;
            for s in &stage.validation.summaries {
                println!("{}\t{} network genes\t{} input genes", s.network, s.network_genes, s.positive_genes);
            }
            let unmapped = stage.resolution.unmapped().count();
            if unmapped > 0 {
                warn!(unmapped, "Some identifiers could not be mapped");
            }
            print_files(&files);
        }
        Command::Run { input, net_type, features, gsc } => {
            let sep = input.separator.unwrap_or(config.separator);
            let genes = commands::collect_genes(&input.genes, input.input.as_deref(), sep)?;
            let defaults = config.selection();
            let selection = Selection {
                net_type: net_type.unwrap_or(defaults.net_type),
                features: features.unwrap_or(defaults.features),
                gsc: gsc.unwrap_or(defaults.gsc),
            };
            let mut job = RankingJob::new(genes, selection);
            job.name = input.name;

            let (result, files) = commands::run(&config, &provider, &job, &output_dir)?;
            println!("Job {}: {} genes ranked", result.metadata.job_id, result.ranked.len());
            for row in result.ranked.iter().take(10) {
                println!("{:>4}  {:<12} {:.4}", row.rank, row.symbol, row.probability);
            }
            print_files(&files);
        }
        Command::Batch { file } => {
            let outcomes = commands::batch(&config, provider, &file, &output_dir).await?;
            let failed = outcomes.iter().filter(|o| o.outcome.is_err()).count();
            for o in &outcomes {
                match &o.outcome {
                    Ok(files) => println!("{}: {} files", o.job, files.len()),
                    Err(e) => println!("{}: FAILED: {e}", o.job),
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} batch jobs failed", outcomes.len());
            }
        }
    }

    Ok(())
}

fn print_files(files: &[PathBuf]) {
    for f in files {
        println!("  {}", f.display());
    }
}
