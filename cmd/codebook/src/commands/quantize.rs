//! `codebook quantize`: map vectors to word IDs.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;

use giztoy_codebook::{Codebook, QResults};

use super::{print_json, read_vectors};
use crate::Cli;

#[derive(Args)]
pub struct QuantizeCommand {
    /// Codebook file
    codebook: PathBuf,

    /// Vectors to quantize, one hex vector per line
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Vector width in bits (default: the codebook width)
    #[arg(long)]
    bits: Option<usize>,
}

#[derive(Serialize)]
struct Row {
    word: Option<u32>,
    dist: Option<u32>,
}

impl From<QResults> for Row {
    fn from(q: QResults) -> Self {
        Self {
            word: q.word,
            dist: q.dist,
        }
    }
}

fn format_row(q: &QResults) -> String {
    match (q.word, q.dist) {
        (Some(w), Some(d)) => format!("{w} {d}"),
        _ => "- -".to_string(),
    }
}

impl QuantizeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cb = Codebook::load(&self.codebook)
            .with_context(|| format!("failed to load {}", self.codebook.display()))?;
        let vectors = read_vectors(&self.input, self.bits.or(cb.width()))?;

        let mut results = Vec::with_capacity(vectors.len());
        for (i, r) in cb.quantize_batch(&vectors).into_iter().enumerate() {
            results.push(r.with_context(|| format!("vector {}", i + 1))?);
        }

        if cli.json {
            let rows: Vec<Row> = results.into_iter().map(Row::from).collect();
            return print_json(&rows);
        }
        for q in &results {
            println!("{}", format_row(q));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_use_dash_for_no_match() {
        assert_eq!(format_row(&QResults::NONE), "- -");
        let q = QResults {
            word: Some(3),
            dist: Some(7),
        };
        assert_eq!(format_row(&q), "3 7");

        let json = serde_json::to_string(&Row::from(QResults::NONE)).unwrap();
        assert_eq!(json, r#"{"word":null,"dist":null}"#);
    }
}
