// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses.

use serde::Deserialize;

/// One entry in a recursive git tree listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Recursive git tree listing for one branch.
///
/// GitHub sets `truncated` when the repository holds more entries than the
/// API will return in one response.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    pub sha: Option<String>,
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// GitHub repository metadata (the subset used for default-branch resolution).
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub default_branch: String,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}
