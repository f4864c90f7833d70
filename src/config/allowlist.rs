// src/config/allowlist.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::inbound::IpRange;

/// Accepted file shapes: `ranges = [...]` (TOML or JSON object) or a bare JSON array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RangesFile {
    Table { ranges: Vec<String> },
    List(Vec<String>),
}

impl RangesFile {
    fn into_entries(self) -> Vec<String> {
        match self {
            RangesFile::Table { ranges } | RangesFile::List(ranges) => ranges,
        }
    }
}

/// Load allow-listed ranges from a file. `.toml` files are read as TOML; anything
/// else is tried as JSON first, then TOML. Blank and repeated entries are skipped.
pub fn load_ranges_from(path: &Path) -> Result<Vec<IpRange>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading allowlist from {}", path.display()))?;
    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    let file: RangesFile = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("parsing TOML allowlist {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .or_else(|_| toml::from_str(&content))
            .map_err(|_| anyhow!("unsupported allowlist format in {}", path.display()))?
    };

    let mut seen: Vec<&str> = Vec::new();
    let entries = file.into_entries();
    for entry in entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        if !seen.contains(&entry) {
            seen.push(entry);
        }
    }
    parse_ranges(seen)
}

pub fn parse_ranges<I, S>(items: I) -> Result<Vec<IpRange>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().parse::<IpRange>().map_err(anyhow::Error::from))
        .collect()
}
