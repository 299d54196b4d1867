//! Quarry: discover, fetch, and cache CSV datasets hosted in GitHub
//! repositories.
//!
//! A [`DatasetSource`] points at one repository location (owner, repo,
//! branch, sub-path), lazily indexes the CSV files underneath it with a
//! single tree request, and caches each parsed [`Table`] keyed by filename
//! and the exact [`LoadOptions`] used to parse it. A [`Library`] bundles
//! many sources behind nicknames declared in a JSON manifest.
//!
//! # Example
//!
//! ```no_run
//! use quarry::{DatasetSource, LoadOptions};
//!
//! let mut source = DatasetSource::from_fields("acme", "widgets", "main", "data")?;
//! source.display(true, 1000)?;
//! let cities = source.load("cities", true, &LoadOptions::default())?;
//! println!("{} rows", cities.num_rows());
//! # Ok::<(), quarry::QuarryError>(())
//! ```
//!
//! # Modules
//!
//! - [`reference`]: validated (owner, repo, branch, sub-path) tuples
//! - [`index`]: lazily fetched remote directory listings
//! - [`cache`]: fingerprint-gated per-file table cache
//! - [`source`]: the user-facing dataset source
//! - [`library`]: manifest-driven collections of sources
//! - [`github`]: blocking GitHub REST client

pub mod cache;
pub mod error;
pub mod github;
pub mod index;
pub mod library;
pub mod options;
pub mod reference;
pub mod source;
pub mod table;

pub use cache::FrameCache;
pub use error::{QuarryError, Result};
pub use index::DirectoryIndex;
pub use library::{DEFAULT_MANIFEST_URL, Library, ManifestEntry, library_help};
pub use options::LoadOptions;
pub use reference::SourceRef;
pub use source::DatasetSource;
pub use table::Table;
