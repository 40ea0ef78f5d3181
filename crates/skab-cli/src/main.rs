//! # skab
//!
//! Train a PCA anomaly model on SKAB sensor files, save it, reload it and
//! print anomaly scores for the held-out split and a sample point.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use log::info;
use skab_core::{build, AnomalyModel, PcaTrainer, Reporter, RunConfig, ScoreSummary, Trainer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "skab", version)]
#[command(about = "Train and score a PCA anomaly model on SKAB sensor data", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Anomaly-free baseline CSV file
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Folder of CSV files to include (repeatable, replaces configured folders)
    #[arg(long = "folder")]
    folders: Vec<PathBuf>,

    /// Where to write the trained model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Share of records held out for scoring
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Seed for a reproducible train/test split
    #[arg(long)]
    seed: Option<u64>,

    /// Number of principal components
    #[arg(long)]
    rank: Option<usize>,

    /// Exit without waiting for Enter
    #[arg(long)]
    no_pause: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Flags win over file and environment settings.
    fn apply(&self, cfg: &mut RunConfig) {
        if let Some(path) = &self.baseline {
            cfg.baseline_path = path.clone();
        }
        if !self.folders.is_empty() {
            cfg.folder_paths = self.folders.clone();
        }
        if let Some(path) = &self.model {
            cfg.model_path = path.clone();
        }
        if let Some(f) = self.test_fraction {
            cfg.test_fraction = f;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(rank) = self.rank {
            cfg.rank = rank;
        }
        if self.no_pause {
            cfg.pause_on_exit = false;
        }
    }
}

fn init_logging(verbose: u8, format: LogFormat) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// File and environment first, then flags; validated once on the merged result.
fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let mut cfg = RunConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut cfg);
    cfg.validate().context("validating configuration")?;
    Ok(cfg)
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = resolve_config(cli)?;

    if cli.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    let split = build(&cfg.sources(), cfg.split_options()).context("building dataset")?;
    let model = PcaTrainer::new(cfg.rank)?
        .fit(&split.train)
        .context("training model")?;

    let saved = skab_store::save_model(&model, &cfg.model_path)
        .with_context(|| format!("saving model to {}", cfg.model_path.display()))?;
    println!("Model saved to {}", cfg.model_path.display());

    let (model, loaded) = skab_store::load_model(&cfg.model_path)
        .with_context(|| format!("loading model from {}", cfg.model_path.display()))?;
    println!("Model loaded from file");
    info!(
        "model {} saved {} checksum {}",
        loaded.id,
        saved.created_at.to_rfc3339(),
        hex::encode(&loaded.checksum[..8])
    );

    let scores = model.score_all(split.test.records());
    let mut reporter = Reporter::stdout();
    reporter.report(&scores).context("writing scores")?;
    reporter
        .report_one(model.score(&cfg.sample))
        .context("writing sample score")?;

    if let Some(summary) = ScoreSummary::from_scores(&scores, split.test.records()) {
        info!(
            "scored {} test records: min {:.4} mean {:.4} max {:.4}, labelled anomaly mean {:?}, labelled normal mean {:?}",
            summary.count,
            summary.min,
            summary.mean,
            summary.max,
            summary.mean_labelled_anomaly,
            summary.mean_labelled_normal
        );
    }

    if cfg.pause_on_exit {
        println!("Press Enter to exit...");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::NamedTempFile;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "skab",
            "--baseline",
            "free.csv",
            "--folder",
            "v1",
            "--folder",
            "v2",
            "--seed",
            "7",
            "--rank",
            "3",
            "--no-pause",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let mut cfg = RunConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.baseline_path, PathBuf::from("free.csv"));
        assert_eq!(cfg.folder_paths, vec![PathBuf::from("v1"), PathBuf::from("v2")]);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.rank, 3);
        assert!(!cfg.pause_on_exit);
        assert_eq!(cfg.model_path, PathBuf::from("model.json"));
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["skab"]).unwrap();
        let mut cfg = RunConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg, RunConfig::default());
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn flags_fix_an_invalid_file_value() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "rank = 0").unwrap();
        let path = f.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["skab", "--config", path]).unwrap();
        assert!(resolve_config(&cli).is_err());

        let cli = Cli::try_parse_from(["skab", "--config", path, "--rank", "2"]).unwrap();
        assert_eq!(resolve_config(&cli).unwrap().rank, 2);
    }
}
