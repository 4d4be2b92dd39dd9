//! Small in-memory cache for expensive worksheet scans.
//!
//! Scans are keyed by stable identifiers (file path, sheet name, scan
//! parameters) rather than by worksheet objects, and only the most recent
//! result is kept. Owners invalidate explicitly when a workbook is reloaded
//! or removed.

use std::path::PathBuf;

/// Identity of a scan over one worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanKey {
    pub path: PathBuf,
    pub sheet: String,
    pub params: Vec<String>,
}

impl ScanKey {
    pub fn new(path: PathBuf, sheet: &str, params: &[&str]) -> Self {
        ScanKey {
            path,
            sheet: sheet.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug)]
pub struct SingleEntryCache<V> {
    entry: Option<(ScanKey, V)>,
    hits: u64,
    misses: u64,
}

impl<V> Default for SingleEntryCache<V> {
    fn default() -> Self {
        SingleEntryCache {
            entry: None,
            hits: 0,
            misses: 0,
        }
    }
}

impl<V: Clone> SingleEntryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or computes and stores it. Errors
    /// are returned as-is and never cached.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: ScanKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some((cached_key, value)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                return Ok(value.clone());
            }
        }
        self.misses += 1;
        let value = compute()?;
        self.entry = Some((key, value.clone()));
        Ok(value)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Drops the entry if it was computed from `path`.
    pub fn invalidate_path(&mut self, path: &std::path::Path) {
        if matches!(&self.entry, Some((key, _)) if key.path == path) {
            self.entry = None;
        }
    }

    /// (hits, misses, entries)
    pub fn stats(&self) -> (u64, u64, usize) {
        (self.hits, self.misses, usize::from(self.entry.is_some()))
    }
}
