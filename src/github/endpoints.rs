// GitHub API endpoint functions.
// Provides typed methods for fetching data from the GitHub REST API.

use crate::error::Result;

use super::client::GitHubClient;
use super::types::{Repository, TreeResponse};

impl GitHubClient {
    /// Get a specific repository (used to resolve the default branch).
    pub fn get_repo(&mut self, owner: &str, repo: &str) -> Result<Repository> {
        let response = self.get(&format!("/repos/{}/{}", owner, repo))?;
        let repository: Repository = response.json()?;
        Ok(repository)
    }

    /// Get the full recursive file tree for a branch.
    pub fn get_tree(&mut self, owner: &str, repo: &str, branch: &str) -> Result<TreeResponse> {
        let params = [("recursive", "1")];
        let response = self.get_with_params(
            &format!("/repos/{}/{}/git/trees/{}", owner, repo, branch),
            &params,
        )?;
        let tree: TreeResponse = response.json()?;
        Ok(tree)
    }

    /// Download a file as raw text from an absolute URL.
    pub fn download_text(&mut self, url: &str) -> Result<String> {
        let response = self.get_url(url)?;
        let text = response.text()?;
        Ok(text)
    }
}
