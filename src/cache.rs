// Per-file cache of parsed tables.
// Entries are gated by the load-option fingerprint, not by age: a cached
// table is only reused when a later load carries an identical option set.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::options::LoadOptions;
use crate::table::Table;

#[derive(Debug, Clone)]
struct CacheEntry {
    table: Table,
    fingerprint: String,
}

/// Stored results keyed by resolved filename, each carrying the fingerprint
/// of the option set that produced it.
#[derive(Debug, Clone, Default)]
pub struct FrameCache {
    entries: HashMap<String, CacheEntry>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry exists for this key, regardless of its options.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether an entry exists for this key AND was produced with an
    /// option set fingerprint-equal to `options`.
    pub fn matches(&self, key: &str, options: &LoadOptions) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.fingerprint == options.fingerprint())
    }

    /// Store or replace the entry for this key. Entries are replaced, never
    /// merged: a load with different options overwrites the previous table.
    pub fn put(&mut self, key: &str, table: Table, options: &LoadOptions) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                table,
                fingerprint: options.fingerprint(),
            },
        );
    }

    /// Remove the entry for this key; no-op when absent.
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Defensive copy of the stored table, never the live object.
    pub fn get(&self, key: &str) -> Option<Table> {
        self.entries.get(key).map(|entry| entry.table.clone())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every cached table to `{dir}/{key}.csv`, creating intermediate
    /// directories for keys that carry a sub-path.
    pub fn export(&self, dir: &Path, delimiter: u8) -> Result<()> {
        for (key, entry) in &self.entries {
            let path = dir.join(format!("{}.csv", key));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = fs::File::create(&path)?;
            entry.table.write_csv(file, delimiter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::from_csv("a,b\n1,2\n", &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = FrameCache::new();
        let options = LoadOptions::default();
        assert!(!cache.has("cities"));

        cache.put("cities", sample_table(), &options);
        assert!(cache.has("cities"));
        assert_eq!(cache.get("cities").unwrap(), sample_table());
        assert!(cache.get("towns").is_none());
    }

    #[test]
    fn test_matches_requires_equal_fingerprint() {
        let mut cache = FrameCache::new();
        let options = LoadOptions::default();
        cache.put("cities", sample_table(), &options);

        assert!(cache.matches("cities", &options));
        assert!(!cache.matches("cities", &LoadOptions::new().trim(true)));
        assert!(!cache.matches("towns", &options));
    }

    #[test]
    fn test_put_replaces_entry() {
        let mut cache = FrameCache::new();
        cache.put("cities", sample_table(), &LoadOptions::default());

        let other = LoadOptions::new().has_headers(false);
        let raw = Table::from_csv("a,b\n1,2\n", &other).unwrap();
        cache.put("cities", raw.clone(), &other);

        assert_eq!(cache.len(), 1);
        assert!(!cache.matches("cities", &LoadOptions::default()));
        assert!(cache.matches("cities", &other));
        assert_eq!(cache.get("cities").unwrap(), raw);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cache = FrameCache::new();
        cache.put("cities", sample_table(), &LoadOptions::default());
        cache.remove("cities");
        assert!(!cache.has("cities"));
        cache.remove("cities");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_returns_defensive_copy() {
        let mut cache = FrameCache::new();
        cache.put("cities", sample_table(), &LoadOptions::default());

        // Mutating the returned copy must not affect the cached value.
        let copy = cache.get("cities").unwrap();
        drop(copy);
        assert_eq!(cache.get("cities").unwrap(), sample_table());
    }

    #[test]
    fn test_export_writes_nested_keys() {
        let mut cache = FrameCache::new();
        let options = LoadOptions::default();
        cache.put("cities", sample_table(), &options);
        cache.put("nested/towns", sample_table(), &options);

        let dir = tempfile::tempdir().unwrap();
        cache.export(dir.path(), b',').unwrap();

        assert!(dir.path().join("cities.csv").exists());
        assert!(dir.path().join("nested/towns.csv").exists());

        let text = fs::read_to_string(dir.path().join("cities.csv")).unwrap();
        assert_eq!(text, "a,b\n1,2\n");
    }
}
