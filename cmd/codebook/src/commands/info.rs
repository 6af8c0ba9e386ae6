//! `codebook info`: statistics and duplicate centroids.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;

use giztoy_codebook::{Codebook, CodebookStats, DuplicatePair};

use super::print_json;
use crate::Cli;

#[derive(Args)]
pub struct InfoCommand {
    /// Codebook file
    codebook: PathBuf,
}

#[derive(Serialize)]
struct InfoReport {
    stats: CodebookStats,
    duplicates: Vec<DuplicatePair>,
}

impl InfoCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cb = Codebook::load(&self.codebook)
            .with_context(|| format!("failed to load {}", self.codebook.display()))?;
        let report = InfoReport {
            stats: cb.analyze(),
            duplicates: cb.find_duplicates(),
        };

        if cli.json {
            return print_json(&report);
        }
        println!("{}", report.stats);
        if report.duplicates.is_empty() {
            println!("duplicates:    none");
        } else {
            println!("duplicates:    {}", report.duplicates.len());
            for p in &report.duplicates {
                println!("  {} == {}", p.first, p.second);
            }
        }
        Ok(())
    }
}
