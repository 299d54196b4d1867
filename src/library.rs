// Libraries: named collections of dataset sources built from a declarative
// JSON manifest, local or remote.

use std::collections::BTreeMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, Result};
use crate::github::GitHubClient;
use crate::index::basename;
use crate::options::LoadOptions;
use crate::source::DatasetSource;
use crate::table::Table;

/// Manifest backing [`Library::open_default`].
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/ryayoung/datasets/main/chart-tools-default-library.json";

/// One manifest record. Every record must carry exactly these four fields;
/// anything missing or extra fails the whole manifest load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Repository owner.
    pub u: String,
    /// Repository name.
    pub r: String,
    /// Branch.
    pub b: String,
    /// Sub-path; empty string for the repository root.
    pub p: String,
}

/// A named collection of dataset sources with interactive discovery helpers.
///
/// Built from a manifest: a JSON object mapping nicknames to
/// [`ManifestEntry`] records. Reloading via [`Library::set_source`] replaces
/// the whole sources mapping atomically; a failed reload leaves the previous
/// mapping untouched.
pub struct Library {
    location: String,
    sources: BTreeMap<String, DatasetSource>,
    help_shown: bool,
    help_all_shown: bool,
}

impl Library {
    /// Load a library from a manifest URL or local file path.
    pub fn open(location: &str) -> Result<Self> {
        let mut library = Self {
            location: location.to_string(),
            sources: BTreeMap::new(),
            help_shown: false,
            help_all_shown: false,
        };
        library.set_source(location)?;
        Ok(library)
    }

    /// Load the default manifest.
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_MANIFEST_URL)
    }

    /// Fetch and parse a manifest, then replace the sources mapping with
    /// freshly constructed sources. All-or-nothing: any invalid record
    /// fails the load and the existing mapping survives.
    pub fn set_source(&mut self, location: &str) -> Result<()> {
        let data = if location.starts_with("https") {
            let mut client = GitHubClient::from_env()?;
            client.download_text(location)?
        } else {
            fs::read_to_string(location)?
        };

        let manifest = parse_manifest(&data)?;

        let mut sources = BTreeMap::new();
        for (key, entry) in &manifest {
            sources.insert(key.clone(), DatasetSource::from_manifest_entry(key, entry)?);
        }

        log::info!("loaded {} sources from {}", sources.len(), location);
        self.location = location.to_string();
        self.sources = sources;
        Ok(())
    }

    /// Manifest URL or path this library was loaded from.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn get(&self, name: &str) -> Option<&DatasetSource> {
        self.sources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DatasetSource> {
        self.sources.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn sources(&self) -> impl Iterator<Item = &DatasetSource> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Print source names and their github links.
    pub fn display_sources(&self) {
        for source in self.sources.values() {
            println!(" {}", source);
        }
    }

    /// Print all files in all sources, truncated at 15 files per source.
    pub fn display_all(&mut self) -> Result<()> {
        for source in self.sources.values_mut() {
            if source.datasets()?.is_empty() {
                continue;
            }
            println!(
                "'{}'  -  {}",
                source.display_name(),
                source.reference().browse_url()
            );
            println!("---------------------------------");
            source.display(false, 15)?;
            println!();
        }
        Ok(())
    }

    /// Interactive lookup-or-load, the user-friendly entry point.
    ///
    /// - no arguments: print usage help (first call on this library only)
    ///   plus the source listing;
    /// - `("all", None)`: print a truncated file listing for every source;
    /// - `(name, None)`: display a known source's files; an unknown name is
    ///   tried as a filename in the `main` source before giving up;
    /// - `(name, file)`: load the file from the named source.
    pub fn find(
        &mut self,
        source: Option<&str>,
        file: Option<&str>,
        save: bool,
        options: &LoadOptions,
    ) -> Result<Option<Table>> {
        match (source, file) {
            (None, None) => {
                if !self.help_shown {
                    println!("Use find(source_name, filename) to load a table");
                    println!("Use find(source_name) to see all datasets in a source.");
                    println!("Use find(\"all\") to see all datasets.");
                    self.help_shown = true;
                }
                println!("---------\nSOURCES:");
                self.display_sources();
                Ok(None)
            }
            (Some("all"), None) => {
                if !self.help_all_shown {
                    println!("(Use find(source_name, filename) to load data)");
                    println!("(Use find(source_name) to see available datasets in a source)");
                    println!();
                    self.help_all_shown = true;
                }
                self.display_all()?;
                Ok(None)
            }
            (Some(name), None) => {
                if let Some(source) = self.sources.get_mut(name) {
                    source.display(true, 1000)?;
                    return Ok(None);
                }

                // Shorthand: a bare filename reaches into the 'main' source.
                if let Some(main) = self.sources.get_mut("main") {
                    let known = main.datasets()?.iter().any(|d| d == name);
                    if known {
                        return main.load(name, save, options).map(Some);
                    }
                }

                println!("Unknown source, '{}'", name);
                Ok(None)
            }
            (Some(name), Some(file)) => match self.sources.get_mut(name) {
                Some(source) => source.load(file, save, options).map(Some),
                None => {
                    println!("Unknown source, '{}'", name);
                    Ok(None)
                }
            },
            (None, Some(_)) => {
                println!("Provide a source name to load a file from.");
                Ok(None)
            }
        }
    }

    /// Look for a filename in the cache of every source, by exact key or
    /// basename, and return the first match's copy. Never forces a
    /// directory fetch.
    pub fn resolve_cached(&self, filename: &str) -> Result<Table> {
        let base = basename(filename);
        for source in self.sources.values() {
            if let Some(table) = source
                .cache()
                .get(filename)
                .or_else(|| source.cache().get(base))
            {
                return Ok(table);
            }
        }
        Err(QuarryError::NotCached(filename.to_string()))
    }
}

/// Parse and validate manifest JSON. Every record must deserialize into the
/// exact four-field shape.
fn parse_manifest(data: &str) -> Result<BTreeMap<String, ManifestEntry>> {
    serde_json::from_str(data).map_err(|e| QuarryError::InvalidManifest(e.to_string()))
}

/// Print the manifest format reference.
pub fn library_help() {
    println!(
        r#"Library: create a JSON file containing an object of objects,
where each sub-object is keyed with a string nickname for a dataset
source, and contains the keys 'u', 'r', 'b', 'p': a github owner,
repository, branch, and sub-path where the datasets are stored.
Path ('p') should be an empty string if not needed.
---------
{{
    "some_nickname": {{
        "u": "some-github-username",
        "r": "some-github-repo",
        "b": "some-branch",
        "p": "some-subdirectory"
    }},
    "other_nickname": {{
        . . .
    }}
}}
---------"#
    );
}
