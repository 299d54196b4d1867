// Error types for the quarry library.
// Covers reference validation, GitHub API failures, and cache lookups.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidReferenceField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error(
        "invalid source URL {0:?}: expected https://github.com/<owner>/<repo> \
         or https://github.com/<owner>/<repo>/tree/<branch>/<sub/path>"
    )]
    InvalidSourceUrl(String),

    #[error("no files found at {0}: likely an invalid data source")]
    UnknownSource(String),

    #[error(
        "no unique match for {name:?}: either the file doesn't exist, or its basename \
         is duplicated across sub-directories (use the full sub-path instead); \
         would have downloaded {url}"
    )]
    AmbiguousOrMissingFile { name: String, url: String },

    #[error("invalid manifest: {0} (records need exactly the keys 'u', 'r', 'b', 'p')")]
    InvalidManifest(String),

    #[error("{0:?} is not cached in any of the library's sources")]
    NotCached(String),

    #[error("network unreachable")]
    Unreachable,

    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuarryError>;
