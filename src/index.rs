// Lazily fetched listing of the CSV files under a source reference.

use crate::error::{QuarryError, Result};
use crate::github::{GitHubClient, TreeResponse};
use crate::reference::SourceRef;

/// Tri-state listing cache. Invalidation transitions back to `Unfetched`
/// rather than clearing in place, so the next access refetches.
#[derive(Debug, Clone, Default)]
enum State {
    #[default]
    Unfetched,
    Fetched(Vec<String>),
}

/// Lazily populated index of the tabular files under one source reference.
///
/// Entries are relative identifiers: the `.csv` extension and the source
/// sub-path prefix are stripped. A file in the base directory carries no
/// separator; files in sub-directories keep the rest of their path.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    state: State,
    truncated: bool,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an already-populated index.
    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<String>) -> Self {
        Self {
            state: State::Fetched(entries),
            truncated: false,
        }
    }

    /// Drop any fetched listing; the next `list` call refetches.
    pub fn invalidate(&mut self) {
        self.state = State::Unfetched;
        self.truncated = false;
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self.state, State::Fetched(_))
    }

    /// Whether the provider marked the last listing as incomplete.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// List all entries, fetching the remote tree on first access.
    ///
    /// Offline, this returns an empty slice and stays unfetched so a later
    /// call retries; callers must treat empty as "unknown", not "no files".
    /// A remote not-found answer fails with `UnknownSource`.
    pub fn list(&mut self, client: &mut GitHubClient, reference: &SourceRef) -> Result<&[String]> {
        if let State::Unfetched = self.state {
            if !client.is_online() {
                return Ok(&[]);
            }

            let response =
                match client.get_tree(reference.owner(), reference.repo(), reference.branch()) {
                    Ok(response) => response,
                    Err(QuarryError::NotFound(_)) => {
                        return Err(QuarryError::UnknownSource(reference.browse_url()));
                    }
                    Err(e) => return Err(e),
                };

            let entries = identifiers(&response, reference.path());
            log::debug!(
                "indexed {} csv files under {}",
                entries.len(),
                reference.slug()
            );
            if response.truncated {
                log::warn!("tree listing for {} was truncated", reference.slug());
            }
            self.truncated = response.truncated;
            self.state = State::Fetched(entries);
        }

        Ok(self.entries())
    }

    /// Entries fetched so far; empty when unfetched. Never touches the network.
    pub fn entries(&self) -> &[String] {
        match &self.state {
            State::Fetched(entries) => entries,
            State::Unfetched => &[],
        }
    }

    /// Distinct first path segments of entries inside sub-directories,
    /// in first-appearance order.
    pub fn subdirs(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for entry in self.entries() {
            if let Some((first, _)) = entry.split_once('/')
                && !seen.iter().any(|s| s == first)
            {
                seen.push(first.to_string());
            }
        }
        seen
    }

    /// Final path segment of every entry.
    pub fn basenames(&self) -> Vec<String> {
        self.entries().iter().map(|e| basename(e).to_string()).collect()
    }

    /// Entries under `dir`, with the `dir/` prefix stripped.
    pub fn dir_contents(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir);
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }
}

/// Final path segment of an entry.
pub(crate) fn basename(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Reduce a tree response to relative identifiers: CSV files only, with the
/// extension and the source sub-path prefix stripped.
fn identifiers(response: &TreeResponse, path: &str) -> Vec<String> {
    let prefix = format!("{}/", path);
    response
        .tree
        .iter()
        .filter(|entry| entry.path.ends_with(".csv"))
        .map(|entry| {
            let name = entry.path.strip_suffix(".csv").unwrap_or(&entry.path);
            let name = if path.is_empty() {
                name
            } else {
                name.strip_prefix(&prefix).unwrap_or(name)
            };
            name.to_string()
        })
        .collect()
}
