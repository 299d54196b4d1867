// Dataset sources: the user-facing entry point for enumerating and loading
// the files of one GitHub-hosted dataset collection.

use std::fmt;
use std::fs;
use std::path::Path;

use url::Url;

use crate::cache::FrameCache;
use crate::error::{QuarryError, Result};
use crate::github::GitHubClient;
use crate::index::{DirectoryIndex, basename};
use crate::library::ManifestEntry;
use crate::options::LoadOptions;
use crate::reference::SourceRef;
use crate::table::Table;

/// One dataset collection: a validated source reference, a lazily fetched
/// directory index, and a per-file cache of parsed tables.
///
/// The display name is the lookup key when the source lives in a
/// [`Library`](crate::library::Library); it defaults to the repository name.
pub struct DatasetSource {
    name: Option<String>,
    reference: SourceRef,
    index: DirectoryIndex,
    cache: FrameCache,
    client: GitHubClient,
}

impl DatasetSource {
    /// Construct from an already validated reference, with no display name.
    pub fn from_ref(reference: SourceRef) -> Result<Self> {
        Ok(Self {
            name: None,
            reference,
            index: DirectoryIndex::new(),
            cache: FrameCache::new(),
            client: GitHubClient::from_env()?,
        })
    }

    /// Construct from explicit reference fields. The display name defaults
    /// to the repository name.
    pub fn from_fields(owner: &str, repo: &str, branch: &str, path: &str) -> Result<Self> {
        let mut source = Self::from_ref(SourceRef::new(owner, repo, branch, path)?)?;
        source.name = Some(source.reference.repo().to_string());
        Ok(source)
    }

    /// Construct from a manifest record, keyed by the record's name.
    pub fn from_manifest_entry(key: &str, entry: &ManifestEntry) -> Result<Self> {
        // Manifests in the wild write sub-paths with a trailing slash.
        let path = entry.p.trim_end_matches('/');
        let mut source = Self::from_ref(SourceRef::new(&entry.u, &entry.r, &entry.b, path)?)?;
        source.name = Some(key.to_string());
        Ok(source)
    }

    /// Construct from a GitHub tree-view URL.
    ///
    /// Accepts `https://github.com/<owner>/<repo>` (the default branch is
    /// resolved with one metadata request, sub-path empty) or
    /// `https://github.com/<owner>/<repo>/tree/<branch>/<sub/path>`.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|_| QuarryError::InvalidSourceUrl(url.to_string()))?;
        if parsed.scheme() != "https" || parsed.host_str() != Some("github.com") {
            return Err(QuarryError::InvalidSourceUrl(url.to_string()));
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let mut client = GitHubClient::from_env()?;
        let reference = match segments.as_slice() {
            [owner, repo] => {
                let meta = match client.get_repo(owner, repo) {
                    Ok(meta) => meta,
                    Err(QuarryError::NotFound(_)) => {
                        return Err(QuarryError::UnknownSource(format!("{}/{}", owner, repo)));
                    }
                    Err(e) => return Err(e),
                };
                SourceRef::new(owner, repo, &meta.default_branch, "")?
            }
            [owner, repo, "tree", branch, rest @ ..] => {
                SourceRef::new(owner, repo, branch, &rest.join("/"))?
            }
            _ => return Err(QuarryError::InvalidSourceUrl(url.to_string())),
        };

        Ok(Self {
            name: Some(reference.repo().to_string()),
            reference,
            index: DirectoryIndex::new(),
            cache: FrameCache::new(),
            client,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn reference(&self) -> &SourceRef {
        &self.reference
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Move the reference to a new sub-path. The directory index is
    /// invalidated so the next access refetches under the new path.
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        self.reference.set_path(path)?;
        self.index.invalidate();
        Ok(())
    }

    /// Display name used in listings: the name, else `owner/repo`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.reference.slug())
    }

    /// All file identifiers under the reference, fetching on first access.
    /// Empty means unknown when offline, not necessarily "no files".
    pub fn datasets(&mut self) -> Result<&[String]> {
        self.index.list(&mut self.client, &self.reference)
    }

    /// Distinct first-level sub-directories.
    pub fn subdirs(&mut self) -> Result<Vec<String>> {
        self.datasets()?;
        Ok(self.index.subdirs())
    }

    /// Final path segment of every identifier.
    pub fn basenames(&mut self) -> Result<Vec<String>> {
        self.datasets()?;
        Ok(self.index.basenames())
    }

    /// Identifiers under `dir`, with the directory prefix stripped.
    pub fn dir_contents(&mut self, dir: &str) -> Result<Vec<String>> {
        self.datasets()?;
        Ok(self.index.dir_contents(dir))
    }

    /// Whether the provider marked the directory listing as incomplete.
    pub fn truncated(&self) -> bool {
        self.index.truncated()
    }

    /// Load a file, serving from the cache when the option fingerprint
    /// matches.
    ///
    /// With `save = false` a fingerprint-matching cache entry is evicted
    /// and the file refetched; the result is not stored.
    pub fn load(&mut self, filename: &str, save: bool, options: &LoadOptions) -> Result<Table> {
        self.index.list(&mut self.client, &self.reference)?;
        if !self.index.is_fetched() {
            return Err(QuarryError::Unreachable);
        }

        let name = self.resolve(filename)?;

        if self.cache.matches(&name, options) {
            if save {
                if let Some(table) = self.cache.get(&name) {
                    log::debug!("cache hit for {}", name);
                    return Ok(table);
                }
            } else {
                log::debug!("evicting {} from cache", name);
                self.cache.remove(&name);
            }
        }

        let url = self.reference.file_url(&name);
        let text = self.client.download_text(&url)?;
        let table = Table::from_csv(&text, options)?;
        if save {
            self.cache.put(&name, table.clone(), options);
        }
        Ok(table)
    }

    /// Resolve a user-supplied filename to a unique index entry: exact
    /// identifier match, else unambiguous basename match, else a variant
    /// still carrying the source sub-path prefix.
    fn resolve(&self, filename: &str) -> Result<String> {
        let entries = self.index.entries();

        if entries.iter().any(|e| e == filename) {
            return Ok(filename.to_string());
        }

        let by_basename: Vec<&String> =
            entries.iter().filter(|e| basename(e) == filename).collect();
        if by_basename.len() == 1 {
            return Ok(by_basename[0].clone());
        }

        if !self.reference.path().is_empty()
            && let Some(stripped) = filename.strip_prefix(&format!("{}/", self.reference.path()))
            && entries.iter().any(|e| e == stripped)
        {
            return Ok(stripped.to_string());
        }

        Err(QuarryError::AmbiguousOrMissingFile {
            name: filename.to_string(),
            url: self.reference.file_url(filename),
        })
    }

    /// Print a formatted listing: base-directory files first, then each
    /// sub-directory with its files indented underneath. Stops once the
    /// running count exceeds `truncate` and reports the remainder. No-op
    /// when the index is empty.
    pub fn display(&mut self, header: bool, truncate: usize) -> Result<()> {
        self.datasets()?;
        if self.index.entries().is_empty() {
            return Ok(());
        }

        if header {
            match &self.name {
                Some(name) => println!("Datasets for '{}':", name),
                None => println!(
                    "Datasets in '{}/{}/{}':",
                    self.reference.owner(),
                    self.reference.repo(),
                    self.reference.path()
                ),
            }
            if !self.index.subdirs().is_empty() {
                println!("(refer to files inside folders using the full path. Ex: 'folder/file')");
            }
            println!("---------------------------");
        }

        for file in self.index.entries().iter().filter(|e| !e.contains('/')) {
            println!("  {}", file);
        }

        let total = self.index.entries().len();
        let mut count = 0;
        'subdirs: for dir in self.index.subdirs() {
            println!("  {}/", dir);
            count += 1;
            for file in self.index.dir_contents(&dir) {
                count += 1;
                if count > truncate {
                    break 'subdirs;
                }
                println!("    {}", file);
            }
        }

        if count > truncate {
            println!(
                "      ({} more files in {})",
                total.saturating_sub(count),
                self.display_name()
            );
        }
        Ok(())
    }

    /// Download every indexed file and write each to `{dir}/{entry}.csv`.
    /// Files already cached are served from the cache; the rest are fetched
    /// without being stored.
    pub fn save_all(&mut self, dir: &Path, options: &LoadOptions) -> Result<()> {
        let names: Vec<String> = self.datasets()?.to_vec();
        for name in names {
            let keep = self.cache.has(&name);
            let table = self.load(&name, keep, options)?;

            let path = dir.join(format!("{}.csv", name));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = fs::File::create(&path)?;
            table.write_csv(file, options.delimiter)?;
        }
        Ok(())
    }

    /// Write the cached tables to `{dir}/{key}.csv`.
    pub fn export_cached(&self, dir: &Path) -> Result<()> {
        self.cache.export(dir, b',')
    }

    #[cfg(test)]
    pub(crate) fn cache_mut(&mut self) -> &mut FrameCache {
        &mut self.cache
    }

    #[cfg(test)]
    pub(crate) fn set_index_entries(&mut self, entries: Vec<String>) {
        self.index = DirectoryIndex::from_entries(entries);
    }
}

impl PartialEq for DatasetSource {
    fn eq(&self, other: &Self) -> bool {
        self.display_name() == other.display_name()
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => {
                let pad = " ".repeat(10usize.saturating_sub(name.len()));
                write!(f, "{}:{} {}", name, pad, self.reference.browse_url())
            }
            None => {
                let slug = self.reference.slug();
                let pad = " ".repeat(20usize.saturating_sub(slug.len()));
                write!(f, "{}:{} {}", slug, pad, self.reference.browse_url())
            }
        }
    }
}

impl fmt::Debug for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetSource")
            .field("name", &self.name)
            .field("reference", &self.reference)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_source() -> DatasetSource {
        let mut source =
            DatasetSource::from_fields("quarry-fixture-owner", "widgets", "main", "data").unwrap();
        source.set_index_entries(vec![
            "cities".to_string(),
            "regions/north".to_string(),
            "regions/south".to_string(),
            "extra/cities".to_string(),
        ]);
        source
    }

    #[test]
    fn test_name_defaults_to_repo() {
        let source = DatasetSource::from_fields("acme", "widgets", "main", "").unwrap();
        assert_eq!(source.name(), Some("widgets"));
        assert_eq!(source.display_name(), "widgets");
    }

    #[test]
    fn test_from_ref_has_no_name() {
        let reference = SourceRef::new("acme", "widgets", "main", "").unwrap();
        let source = DatasetSource::from_ref(reference).unwrap();
        assert_eq!(source.name(), None);
        assert_eq!(source.display_name(), "acme/widgets");
    }

    #[test]
    fn test_resolve_exact_match() {
        let source = sample_source();
        assert_eq!(source.resolve("cities").unwrap(), "cities");
        assert_eq!(source.resolve("regions/north").unwrap(), "regions/north");
    }

    #[test]
    fn test_resolve_unique_basename() {
        let source = sample_source();
        assert_eq!(source.resolve("north").unwrap(), "regions/north");
    }

    #[test]
    fn test_resolve_ambiguous_basename_fails() {
        // "cities" exists in the base directory and under extra/; the exact
        // match wins, but a name matching only duplicated basenames fails.
        let mut source = sample_source();
        source.set_index_entries(vec![
            "one/cities".to_string(),
            "two/cities".to_string(),
        ]);
        let err = source.resolve("cities").unwrap_err();
        match err {
            QuarryError::AmbiguousOrMissingFile { name, url } => {
                assert_eq!(name, "cities");
                assert_eq!(
                    url,
                    "https://raw.githubusercontent.com/quarry-fixture-owner/widgets/main/data/cities.csv"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_missing_fails() {
        let source = sample_source();
        assert!(matches!(
            source.resolve("nope"),
            Err(QuarryError::AmbiguousOrMissingFile { .. })
        ));
    }

    #[test]
    fn test_resolve_prefixed_variant() {
        let source = sample_source();
        // Exact entry is "cities"; the sub-path-qualified spelling works too.
        assert_eq!(source.resolve("data/cities").unwrap(), "cities");
    }

    #[test]
    fn test_load_serves_cache_hit_without_fetch() {
        let mut source = sample_source();
        let options = LoadOptions::default();
        let table = Table::from_csv("a,b\n1,2\n", &options).unwrap();
        source.cache_mut().put("cities", table.clone(), &options);

        // The bogus repo guarantees any network fetch would fail, so a
        // returned table proves the cache served it.
        let loaded = source.load("cities", true, &options).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_load_with_save_false_evicts_matching_entry() {
        let mut source = sample_source();
        let options = LoadOptions::default();
        let table = Table::from_csv("a,b\n1,2\n", &options).unwrap();
        source.cache_mut().put("cities", table, &options);

        // Eviction happens before the (failing) refetch.
        assert!(source.load("cities", false, &options).is_err());
        assert!(!source.cache().has("cities"));
    }

    #[test]
    fn test_load_ignores_cache_with_different_fingerprint() {
        let mut source = sample_source();
        let cached_with = LoadOptions::new().trim(true);
        let table = Table::from_csv("a,b\n1,2\n", &cached_with).unwrap();
        source.cache_mut().put("cities", table, &cached_with);

        // Different options: the entry must not be served, so the load
        // falls through to the network and fails.
        assert!(source.load("cities", true, &LoadOptions::default()).is_err());
        // The mismatched entry is replaced only by a successful load.
        assert!(source.cache().has("cities"));
    }

    #[test]
    fn test_load_offline_is_unreachable() {
        let mut source =
            DatasetSource::from_fields("quarry-fixture-owner", "widgets", "main", "").unwrap();
        // Index never fetched (or the remote reports not-found): resolving a
        // concrete filename cannot proceed.
        let err = source.load("cities", true, &LoadOptions::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_set_path_invalidates_index() {
        let mut source = sample_source();
        assert!(!source.index.entries().is_empty());
        source.set_path("other").unwrap();
        assert!(!source.index.is_fetched());
        assert_eq!(source.reference().path(), "other");
    }

    #[test]
    fn test_equality_by_display_name() {
        let a = DatasetSource::from_fields("acme", "widgets", "main", "").unwrap();
        let b = DatasetSource::from_fields("other", "widgets", "dev", "data").unwrap();
        let c = DatasetSource::from_fields("acme", "gadgets", "main", "").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_url_tree_form() {
        let source =
            DatasetSource::from_url("https://github.com/acme/widgets/tree/dev/data/2024").unwrap();
        assert_eq!(source.reference().owner(), "acme");
        assert_eq!(source.reference().repo(), "widgets");
        assert_eq!(source.reference().branch(), "dev");
        assert_eq!(source.reference().path(), "data/2024");
        assert_eq!(source.name(), Some("widgets"));
    }

    #[test]
    fn test_from_url_tree_form_without_subpath() {
        let source =
            DatasetSource::from_url("https://github.com/acme/widgets/tree/main").unwrap();
        assert_eq!(source.reference().branch(), "main");
        assert_eq!(source.reference().path(), "");
    }

    #[test]
    fn test_from_url_rejects_other_shapes() {
        for url in [
            "http://github.com/acme/widgets",
            "https://gitlab.com/acme/widgets",
            "https://github.com/acme",
            "https://github.com/acme/widgets/blob/main/a.csv",
            "not a url",
        ] {
            assert!(matches!(
                DatasetSource::from_url(url),
                Err(QuarryError::InvalidSourceUrl(_) | QuarryError::UnknownSource(_))
            ));
        }
    }

    #[test]
    fn test_display_format() {
        let source = DatasetSource::from_fields("acme", "widgets", "main", "data").unwrap();
        assert_eq!(
            source.to_string(),
            "widgets:    https://github.com/acme/widgets/tree/main/data"
        );
    }
}
