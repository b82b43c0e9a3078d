#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use reqwest::{
    Client, Request, Url,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{CHECK_RUNS_PER_PAGE, GITHUB_API_VERSION},
    error::{ApiError, check_status},
    types::CheckRun,
};

/// Source of CI check runs for a commit reference.
#[allow(async_fn_in_trait)]
pub trait CheckRuns {
    /// Lists the check runs reported for `git_ref` in `owner/repo`.
    ///
    /// [`GitHubClient`] reads a single page of up to 100 runs.
    async fn check_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<CheckRun>, ApiError>;
}

/// Body of `GET /repos/{owner}/{repo}/commits/{ref}/check-runs`.
#[derive(Deserialize)]
struct CheckRunList {
    /// Check runs on this page.
    check_runs: Vec<CheckRun>,
}

/// GitHub REST client authenticating with a bearer token.
#[derive(Clone)]
pub struct GitHubClient {
    /// Shared HTTP client.
    http:  Client,
    /// API base, e.g. `https://api.github.com`.
    base:  String,
    /// Token sent as `Authorization: Bearer`.
    token: String,
}

impl GitHubClient {
    /// Creates a client for the API at `base`.
    pub fn new(http: Client, base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// URL of the check-runs listing for `owner/repo@git_ref`.
    fn check_runs_url(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base).map_err(|e| ApiError::invalid_url(self.base.as_str(), e))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::invalid_url(self.base.as_str(), "cannot be a base"))?
            .pop_if_empty()
            .extend(["repos", owner, repo, "commits", git_ref, "check-runs"]);
        url.query_pairs_mut()
            .append_pair("per_page", &CHECK_RUNS_PER_PAGE.to_string());
        Ok(url)
    }

    /// The authenticated `GET` for the check-runs listing.
    fn check_runs_request(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Request, ApiError> {
        let url = self.check_runs_url(owner, repo, git_ref)?;
        let shown = url.to_string();
        self.http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .build()
            .map_err(|e| ApiError::transport(&shown, e))
    }
}

impl CheckRuns for GitHubClient {
    async fn check_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<CheckRun>, ApiError> {
        let request = self.check_runs_request(owner, repo, git_ref)?;
        let shown = request.url().to_string();
        debug!("GET {shown}");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::transport(&shown, e))?;
        let response = check_status(&shown, response).await?;

        let list: CheckRunList = response
            .json()
            .await
            .map_err(|e| ApiError::decode(&shown, e))?;
        Ok(list.check_runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckConclusion;

    #[test]
    fn check_runs_url_escapes_each_segment() {
        let client = GitHubClient::new(Client::new(), "https://api.github.com/", "token");
        let url = client
            .check_runs_url("info340", "problem-a-octocat", "feature/x")
            .expect("url");

        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/info340/problem-a-octocat/commits/feature%2Fx/check-runs?per_page=100"
        );
    }

    #[test]
    fn check_runs_url_keeps_enterprise_prefix() {
        let client = GitHubClient::new(Client::new(), "https://ghe.example.edu/api/v3", "token");
        let url = client.check_runs_url("org", "repo", "main").expect("url");

        assert_eq!(
            url.path(),
            "/api/v3/repos/org/repo/commits/main/check-runs"
        );
    }

    #[test]
    fn check_run_list_decodes_github_payload() {
        let list: CheckRunList = serde_json::from_str(
            r#"{
                "total_count": 2,
                "check_runs": [
                    {"id": 1, "name": "test", "status": "completed", "conclusion": "success",
                     "started_at": "2024-01-01T00:00:00Z", "completed_at": "2024-01-01T00:01:00Z"},
                    {"id": 2, "name": "lint", "status": "completed", "conclusion": "failure",
                     "started_at": "2024-01-01T00:00:00Z", "completed_at": "2024-01-01T00:00:30Z"}
                ]
            }"#,
        )
        .expect("decode");

        assert_eq!(list.check_runs.len(), 2);
        assert_eq!(list.check_runs[0].conclusion, Some(CheckConclusion::Success));
        assert_eq!(list.check_runs[1].name, "lint");
    }

    #[test]
    fn check_runs_request_carries_github_headers() {
        let client = GitHubClient::new(Client::new(), "https://api.github.com", "ghp_secret");

        let request = client
            .check_runs_request("org", "repo-abc123", "main")
            .expect("request");

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://api.github.com/repos/org/repo-abc123/commits/main/check-runs?per_page=100"
        );
        let headers = request.headers();
        assert_eq!(headers[AUTHORIZATION], "Bearer ghp_secret");
        assert_eq!(headers[ACCEPT], "application/vnd.github+json");
        assert_eq!(headers["x-github-api-version"], GITHUB_API_VERSION);
    }
}
