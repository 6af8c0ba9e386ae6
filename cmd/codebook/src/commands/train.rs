//! `codebook train`: build a codebook from a vector file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;

use giztoy_codebook::{StopReason, TrainConfig, Trainer};

use super::{load_config, print_json, read_vectors};
use crate::Cli;

#[derive(Args)]
pub struct TrainCommand {
    /// Training vectors, one hex vector per line
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Where to write the codebook
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Training config file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vocabulary size (overrides config file)
    #[arg(short = 'k', long)]
    k: Option<usize>,

    /// Maximum iterations (overrides config file)
    #[arg(long)]
    max_iter: Option<usize>,

    /// Seed for the first centroid (overrides config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum distortion improvement per iteration (overrides config file)
    #[arg(long)]
    conv_threshold: Option<f64>,

    /// Vector width in bits (default: 8 per hex byte of the first vector)
    #[arg(long)]
    bits: Option<usize>,
}

#[derive(Serialize)]
struct TrainSummary<'a> {
    output: &'a str,
    points: usize,
    clusters: usize,
    bits: usize,
    iterations: usize,
    distortion: u64,
    stop: StopReason,
}

impl TrainCommand {
    fn resolve_config(&self) -> anyhow::Result<TrainConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => TrainConfig::default(),
        };
        if let Some(k) = self.k {
            cfg.k = k;
        }
        if let Some(n) = self.max_iter {
            cfg.max_iter = n;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(t) = self.conv_threshold {
            cfg.conv_threshold = t;
        }
        if cfg.k == 0 {
            anyhow::bail!("vocabulary size is required, use -k or set k in the config file");
        }
        Ok(cfg)
    }

    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = self.resolve_config()?;
        let points = read_vectors(&self.input, self.bits)?;
        tracing::debug!(points = points.len(), k = cfg.k, "loaded training vectors");

        let training = Trainer::new(cfg).train(&points).context("training failed")?;
        training
            .codebook
            .save(&self.output)
            .with_context(|| format!("failed to write {}", self.output.display()))?;

        let output = self.output.display().to_string();
        let summary = TrainSummary {
            output: &output,
            points: points.len(),
            clusters: training.codebook.len(),
            bits: training.codebook.width().unwrap_or(0),
            iterations: training.iterations,
            distortion: training.distortion,
            stop: training.stop,
        };

        if cli.json {
            return print_json(&summary);
        }
        println!(
            "wrote {} words x {} bits to {}",
            summary.clusters, summary.bits, summary.output
        );
        println!(
            "{} points, {} iterations, distortion {}, stopped: {:?}",
            summary.points, summary.iterations, summary.distortion, summary.stop
        );
        Ok(())
    }
}
