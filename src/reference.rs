// Source references: validated (owner, repo, branch, sub-path) tuples
// identifying a dataset collection inside a GitHub repository.

use crate::error::{QuarryError, Result};

/// Location of a dataset collection in a GitHub repository.
///
/// All four fields are validated at construction and on every mutation, so
/// a held value can always be spliced into a URL without producing doubled
/// or dangling separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    owner: String,
    repo: String,
    branch: String,
    path: String,
}

impl SourceRef {
    pub fn new(owner: &str, repo: &str, branch: &str, path: &str) -> Result<Self> {
        Ok(Self {
            owner: validate_component("owner", owner)?,
            repo: validate_component("repo", repo)?,
            branch: validate_component("branch", branch)?,
            path: validate_path(path)?,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Sub-path under the repository root; empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_owner(&mut self, owner: &str) -> Result<()> {
        self.owner = validate_component("owner", owner)?;
        Ok(())
    }

    pub fn set_repo(&mut self, repo: &str) -> Result<()> {
        self.repo = validate_component("repo", repo)?;
        Ok(())
    }

    pub fn set_branch(&mut self, branch: &str) -> Result<()> {
        self.branch = validate_component("branch", branch)?;
        Ok(())
    }

    /// Change the sub-path. The caller owning a directory index for this
    /// reference must invalidate it afterwards.
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        self.path = validate_path(path)?;
        Ok(())
    }

    /// Human-navigable URL of the source on github.com.
    pub fn browse_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/tree/{}/{}",
            self.owner, self.repo, self.branch, self.path
        )
    }

    /// Machine URL listing every file under the branch.
    pub fn tree_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/git/trees/{}?recursive=1",
            self.owner, self.repo, self.branch
        )
    }

    /// URL of the raw, downloadable CSV file behind an index entry.
    pub fn file_url(&self, filename: &str) -> String {
        let path = if self.path.is_empty() {
            String::new()
        } else {
            format!("{}/", self.path)
        };
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}{}.csv",
            self.owner, self.repo, self.branch, path, filename
        )
    }

    /// Short `owner/repo` label for messages.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<String> {
    if value.contains('/') {
        return Err(QuarryError::InvalidReferenceField {
            field,
            value: value.to_string(),
            reason: "must not contain a '/'",
        });
    }
    Ok(value.to_string())
}

fn validate_path(value: &str) -> Result<String> {
    if value.ends_with('/') {
        return Err(QuarryError::InvalidReferenceField {
            field: "path",
            value: value.to_string(),
            reason: "must not end with a '/'",
        });
    }
    Ok(value.trim_start_matches('/').to_string())
}
