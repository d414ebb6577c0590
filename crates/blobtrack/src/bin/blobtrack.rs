//! blobtrack CLI: spot detection and morphology from a JSON run config.

use std::path::{Path, PathBuf};

use blobtrack::{feature_table, run_config, DetectConfig};
use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "blobtrack")]
#[command(about = "Detect bright spots in 2D/3D images and classify their shape")]
#[command(version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace. Defaults to the
    /// `BLOBTRACK_LOG` environment variable, then `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON log lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run detection and morphology as described by a config file.
    Detect(CliDetectArgs),

    /// Print the catalogue of spot features.
    Features {
        /// Leave out the morphology features.
        #[arg(long)]
        no_morphology: bool,
    },

    /// Write a config file with default settings.
    InitConfig {
        /// Destination of the config (JSON).
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the run config (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Report destination; overrides `output_path` from the config.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the expected spot radius (physical units).
    #[arg(long)]
    radius: Option<f64>,

    /// Override the detection threshold.
    #[arg(long)]
    threshold: Option<f64>,

    /// Override the number of blocks per axis.
    #[arg(long)]
    nsplit: Option<usize>,

    /// Override the worker thread count.
    #[arg(long)]
    threads: Option<usize>,

    /// Skip the ellipsoid fit.
    #[arg(long)]
    no_morphology: bool,
}

fn init_logging(level: Option<&str>, json: bool) -> CliResult<()> {
    let level: Option<LevelFilter> = level
        .map(|name| {
            blobtrack::core::parse_level(name).ok_or_else(|| format!("unknown log level '{name}'"))
        })
        .transpose()?;
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        blobtrack::core::init_tracing(json);
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            return Err("--log-json needs a build with the `tracing` feature".into());
        }
        match level {
            Some(level) => blobtrack::core::init_with_level(level)?,
            None => blobtrack::core::init_from_env(LevelFilter::Info)?,
        }
        Ok(())
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_json)?;

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Features { no_morphology } => run_features(!no_morphology),
        Commands::InitConfig { out } => run_init_config(&out),
    }
}

// ── detect ─────────────────────────────────────────────────────────────

fn apply_overrides(cfg: &mut DetectConfig, args: &CliDetectArgs) {
    if let Some(r) = args.radius {
        cfg.detector.log.radius = r;
    }
    if let Some(t) = args.threshold {
        cfg.detector.log.threshold = t;
    }
    if let Some(n) = args.nsplit {
        cfg.detector.nsplit = n;
    }
    if let Some(t) = args.threads {
        cfg.detector.num_threads = t;
    }
    if args.no_morphology {
        cfg.morphology = None;
    }
}

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    info!("Loading config: {}", args.config.display());
    let mut cfg = DetectConfig::load_json(&args.config)?;
    apply_overrides(&mut cfg, args);

    let report = run_config(&cfg, &args.config)?;
    let out = args.out.clone().unwrap_or_else(|| cfg.output_path());
    report.write_json(&out)?;
    info!("Report written to {}", out.display());

    match report.error {
        Some(err) => Err(err.into()),
        None => {
            println!("{} spots", report.num_spots);
            Ok(())
        }
    }
}

// ── features ───────────────────────────────────────────────────────────

fn run_features(with_morphology: bool) -> CliResult<()> {
    let table = feature_table(with_morphology);
    println!("{:<32} {:<10} {:<10} name", "key", "short", "dimension");
    for d in table.iter() {
        println!(
            "{:<32} {:<10} {:<10} {}",
            d.key,
            d.short_name,
            format!("{:?}", d.dimension),
            d.name
        );
    }
    Ok(())
}

// ── init-config ────────────────────────────────────────────────────────

fn run_init_config(out: &Path) -> CliResult<()> {
    DetectConfig::default().write_json(out)?;
    println!("wrote {}", out.display());
    Ok(())
}
