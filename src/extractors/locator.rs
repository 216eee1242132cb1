// src/extractors/locator.rs
//
// Cheap byte-level pre-filter over the flat download index, run before the
// expensive per-document tree walk.

use crate::utils::error::ExtractError;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One line of the flat index: a downloaded document plus its filing
/// metadata. Lines are written chronologically, and that order is kept.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub filing_type: String,
    pub filing_date: String,
    pub path: PathBuf,
    pub source_url: String,
}

/// Parses the tab-delimited index file
/// (`TYPE\tDATE\tLOCAL_PATH\tSOURCE_URL`). Short lines are skipped with a
/// warning; only failing to read the file itself is an error.
pub fn load_index(path: &Path) -> Result<Vec<IndexEntry>, ExtractError> {
    let raw = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            tracing::warn!("skipping malformed index line: {}", line);
            continue;
        }
        entries.push(IndexEntry {
            filing_type: fields[0].to_string(),
            filing_date: fields[1].to_string(),
            path: PathBuf::from(fields[2]),
            source_url: fields[3].trim_end().to_string(),
        });
    }
    Ok(entries)
}

/// Retains the entries whose file contents match the target-entity
/// pattern, preserving chronological order. A missing or unreadable file
/// is non-matching, never an error.
pub fn locate_candidates(
    entries: &[IndexEntry],
    entity: &regex::bytes::Regex,
) -> Vec<IndexEntry> {
    entries
        .iter()
        .filter(|entry| {
            let hit = file_contains(&entry.path, entity);
            if hit {
                tracing::debug!(
                    "{}: matched target in {} doc {}",
                    entry.filing_date,
                    entry.filing_type,
                    entry.path.display()
                );
            }
            hit
        })
        .cloned()
        .collect()
}

fn file_contains(path: &Path, pattern: &regex::bytes::Regex) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("cannot open {}: {}", path.display(), e);
            return false;
        }
    };
    // Safety: the map is read-only and the downloaded filings are not
    // mutated while a scan runs.
    let map = match unsafe { Mmap::map(&file) } {
        Ok(map) => map,
        Err(e) => {
            tracing::debug!("cannot map {}: {}", path.display(), e);
            return false;
        }
    };
    pattern.is_match(&map)
}
