//! CSV-backed news history. The whole log is the unit of persistence: each
//! run unions the fetched batch into the existing log, dedups, re-sorts, and
//! atomically rewrites the file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ingest::types::NewsRecord;

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full log. A missing file is an empty log, not an error.
    pub fn load(&self) -> Result<Vec<NewsRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("opening history file {}", self.path.display()))?;
        let mut log = Vec::new();
        for row in reader.deserialize() {
            let record: NewsRecord = row
                .with_context(|| format!("reading history row from {}", self.path.display()))?;
            log.push(record);
        }
        Ok(log)
    }

    /// Rewrite the whole log atomically: serialize to a temp file next to the
    /// target, then rename over it. A failure mid-write never truncates the
    /// previous snapshot.
    pub fn save(&self, log: &[NewsRecord]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating history dir {}", dir.display()))?;
            }
        }
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)
                .with_context(|| format!("creating history temp file {}", tmp.display()))?;
            for record in log {
                writer.serialize(record).context("writing history row")?;
            }
            writer.flush().context("flushing history file")?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing history file {}", self.path.display()))?;
        Ok(())
    }

    /// Read-modify-write: load + merge + save, returning the merged log.
    pub fn update(&self, fresh: Vec<NewsRecord>) -> Result<Vec<NewsRecord>> {
        let existing = self.load()?;
        let merged = merge(existing, fresh);
        self.save(&merged)?;
        Ok(merged)
    }
}

/// Union + dedup + sort. Pure.
///
/// An empty batch returns the existing log unchanged. Otherwise records are
/// deduplicated by full field-wise equality (first-seen instance kept, with
/// existing entries ahead of the new batch) and sorted by `published_at`
/// descending, undated records last, stable across runs.
pub fn merge(existing: Vec<NewsRecord>, fresh: Vec<NewsRecord>) -> Vec<NewsRecord> {
    if fresh.is_empty() {
        return existing;
    }

    let mut seen: HashSet<NewsRecord> = HashSet::with_capacity(existing.len() + fresh.len());
    let mut merged = Vec::with_capacity(existing.len() + fresh.len());
    for record in existing.into_iter().chain(fresh) {
        if seen.insert(record.clone()) {
            merged.push(record);
        }
    }

    // Option<DateTime> orders None first ascending, so reversed comparison
    // gives newest-first with undated records grouped at the end.
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged
}
