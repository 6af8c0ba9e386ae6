//! Utility functions for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use giztoy_codebook::BinaryVector;
use serde::Serialize;

/// Loads a config from a YAML or JSON file, chosen by extension.
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON config {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML config {}", path.display()))?,
    };

    Ok(result)
}

/// Reads a vector file: one hex vector per line, blank lines and
/// `#` comments skipped.
///
/// Without `bits` the width is eight bits per byte of the first vector.
pub fn read_vectors(path: &Path, bits: Option<usize>) -> anyhow::Result<Vec<BinaryVector>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read vectors {}", path.display()))?;
    parse_vectors(&content, bits).with_context(|| format!("in {}", path.display()))
}

pub(crate) fn parse_vectors(content: &str, bits: Option<usize>) -> anyhow::Result<Vec<BinaryVector>> {
    let mut width = bits;
    let mut out = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let w = *width.get_or_insert(line.len() / 2 * 8);
        let v = BinaryVector::from_hex(w, line).with_context(|| format!("line {}", n + 1))?;
        out.push(v);
    }
    Ok(out)
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
