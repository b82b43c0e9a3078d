#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::constants::{
    DEFAULT_BRANCH, DEFAULT_CANVAS_BASE, DEFAULT_CHECK_NAME, DEFAULT_GITHUB_BASE,
    DEFAULT_HTTP_TIMEOUT_SECS, USER_AGENT,
};

/// One gradable unit: a GitHub Classroom style repository prefix paired with
/// a Canvas assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct AssignmentConfig {
    /// Repository name prefix; student repos are `{repo_slug}-{handle}`.
    #[builder(setter(into))]
    repo_slug:  String,
    /// Canvas assignment id.
    canvas_id:  u64,
    /// Branch whose check runs count. Defaults to `main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    branch:     Option<String>,
    /// Check run treated as the test gate. Defaults to `test`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option, into))]
    check_name: Option<String>,
}

impl AssignmentConfig {
    /// Returns the repository name prefix.
    pub fn repo_slug(&self) -> &str {
        &self.repo_slug
    }

    /// Returns the Canvas assignment id.
    pub fn canvas_id(&self) -> u64 {
        self.canvas_id
    }

    /// Returns the configured branch, or `main`.
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Returns the configured check name, or `test`.
    pub fn check_name(&self) -> &str {
        self.check_name.as_deref().unwrap_or(DEFAULT_CHECK_NAME)
    }

    /// Name of the repository `handle` submitted this assignment from.
    pub fn repository_for(&self, handle: &str) -> String {
        format!("{}-{}", self.repo_slug, handle)
    }
}

/// Course-wide settings, read once from `course.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct CourseConfig {
    /// Canvas course id.
    canvas_id:   u64,
    /// GitHub organization owning the student repositories.
    #[builder(setter(into))]
    github_org:  String,
    /// Assignments in processing order.
    #[builder(default)]
    assignments: Vec<AssignmentConfig>,
}

impl CourseConfig {
    /// Reads and parses a course configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read course configuration {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Could not parse course configuration {}", path.display()))
    }

    /// Parses a course configuration from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let course: Self = serde_json::from_str(raw)?;
        ensure!(!course.github_org.trim().is_empty(), "`github_org` must not be empty");
        Ok(course)
    }

    /// Returns the Canvas course id.
    pub fn canvas_id(&self) -> u64 {
        self.canvas_id
    }

    /// Returns the GitHub organization.
    pub fn github_org(&self) -> &str {
        &self.github_org
    }

    /// Returns every configured assignment.
    pub fn assignments(&self) -> &[AssignmentConfig] {
        &self.assignments
    }

    /// Returns the assignments to process: all of them, or only the one whose
    /// `repo_slug` equals `only`.
    pub fn select(&self, only: Option<&str>) -> Vec<&AssignmentConfig> {
        self.assignments
            .iter()
            .filter(|a| only.is_none_or(|slug| a.repo_slug == slug))
            .collect()
    }
}

/// Opaque bearer credentials for both APIs.
#[derive(Clone)]
pub struct Credentials {
    /// GitHub token, sent as `Authorization: Bearer`.
    github_token: String,
    /// Canvas access key, sent as the `access_token` query parameter.
    canvas_key:   String,
}

impl Credentials {
    /// Wraps already-loaded credentials.
    pub fn new(github_token: impl Into<String>, canvas_key: impl Into<String>) -> Self {
        Self {
            github_token: github_token.into(),
            canvas_key:   canvas_key.into(),
        }
    }

    /// Reads both credential files.
    pub fn load(github_token: &Path, canvas_key: &Path) -> Result<Self> {
        Ok(Self::new(read_secret(github_token)?, read_secret(canvas_key)?))
    }

    /// Returns the GitHub token.
    pub fn github_token(&self) -> &str {
        &self.github_token
    }

    /// Returns the Canvas access key.
    pub fn canvas_key(&self) -> &str {
        &self.canvas_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("canvas_key", &"<redacted>")
            .finish()
    }
}

/// Reads a credential file, trimming the trailing newline editors leave
/// behind.
pub fn read_secret(path: &Path) -> Result<String> {
    let secret = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read credential file {}", path.display()))?
        .trim()
        .to_string();
    ensure!(!secret.is_empty(), "Credential file {} is empty", path.display());
    Ok(secret)
}

/// Endpoint and client settings sourced from the environment.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Canvas REST API base, without a trailing slash.
    canvas_base: String,
    /// GitHub REST API base, without a trailing slash.
    github_base: String,
    /// Per-request timeout.
    timeout:     Duration,
}

impl ApiSettings {
    /// Reads `GRADESYNC_CANVAS_BASE`, `GRADESYNC_GITHUB_BASE` and
    /// `GRADESYNC_HTTP_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::new(
            read_base_url("GRADESYNC_CANVAS_BASE", DEFAULT_CANVAS_BASE)?,
            read_base_url("GRADESYNC_GITHUB_BASE", DEFAULT_GITHUB_BASE)?,
            read_timeout_secs("GRADESYNC_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    /// Builds settings from explicit values.
    pub fn new(canvas_base: String, github_base: String, timeout: Duration) -> Result<Self> {
        for base in [&canvas_base, &github_base] {
            Url::parse(base).with_context(|| format!("Invalid API base URL `{base}`"))?;
        }

        Ok(Self {
            canvas_base: canvas_base.trim_end_matches('/').to_string(),
            github_base: github_base.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Returns the Canvas API base.
    pub fn canvas_base(&self) -> &str {
        &self.canvas_base
    }

    /// Returns the GitHub API base.
    pub fn github_base(&self) -> &str {
        &self.github_base
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the HTTP client shared by both API clients.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .context("Failed to construct shared HTTP client")
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            canvas_base: DEFAULT_CANVAS_BASE.to_string(),
            github_base: DEFAULT_GITHUB_BASE.to_string(),
            timeout:     Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Reads a base URL from `env`, falling back to `default` when unset or
/// blank.
fn read_base_url(env: &str, default: &str) -> Result<String> {
    match std::env::var(env) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        Ok(_) | Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
        Err(e) => Err(e).with_context(|| format!("Could not read {env}")),
    }
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    parse_timeout_secs(std::env::var(env).ok().as_deref(), default_secs)
}

/// A positive number of seconds, or `default_secs`. Zero would time out
/// every request, so it falls back too.
fn parse_timeout_secs(value: Option<&str>, default_secs: u64) -> Duration {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::*;

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gradesync-config-{}", Uuid::new_v4()));
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn assignment_defaults_apply_when_fields_are_absent() {
        let course = CourseConfig::from_json(
            r#"{
                "canvas_id": 1234,
                "github_org": "info340",
                "assignments": [
                    { "repo_slug": "problem-a", "canvas_id": 11 },
                    { "repo_slug": "problem-b", "canvas_id": 12, "branch": "gh-pages", "check_name": "jest" }
                ]
            }"#,
        )
        .expect("parse course");

        let [a, b] = course.assignments() else {
            panic!("expected two assignments");
        };
        assert_eq!(a.branch(), "main");
        assert_eq!(a.check_name(), "test");
        assert_eq!(b.branch(), "gh-pages");
        assert_eq!(b.check_name(), "jest");
        assert_eq!(a.repository_for("octocat"), "problem-a-octocat");
    }

    #[test]
    fn select_filters_by_exact_slug_without_touching_config() {
        let course = CourseConfig::builder()
            .canvas_id(1)
            .github_org("org")
            .assignments(vec![
                AssignmentConfig::builder().repo_slug("myrepo").canvas_id(1).build(),
                AssignmentConfig::builder().repo_slug("myrepo-2").canvas_id(2).build(),
                AssignmentConfig::builder().repo_slug("other").canvas_id(3).build(),
            ])
            .build();

        let selected = course.select(Some("myrepo"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].canvas_id(), 1);

        assert_eq!(course.select(None).len(), 3);
        assert!(course.select(Some("missing")).is_empty());
        assert_eq!(course.assignments().len(), 3);
    }

    #[test]
    fn empty_org_is_rejected() {
        let err = CourseConfig::from_json(r#"{"canvas_id": 1, "github_org": " ", "assignments": []}"#)
            .expect_err("blank org");
        assert!(err.to_string().contains("github_org"));
    }

    #[test]
    fn secrets_are_trimmed_and_must_not_be_blank() {
        let token = temp_file("ghp_abc123\n");
        assert_eq!(read_secret(&token).expect("read token"), "ghp_abc123");

        let blank = temp_file(" \n");
        assert!(read_secret(&blank).is_err());

        let missing = std::env::temp_dir().join(format!("gradesync-missing-{}", Uuid::new_v4()));
        let err = read_secret(&missing).expect_err("missing file");
        assert!(err.to_string().contains("Could not read credential file"));

        let _ = std::fs::remove_file(token);
        let _ = std::fs::remove_file(blank);
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let creds = Credentials::new("ghp_secret", "canvas_secret");
        let shown = format!("{creds:?}");
        assert!(!shown.contains("ghp_secret"));
        assert!(!shown.contains("canvas_secret"));
    }

    #[test]
    fn api_settings_trim_trailing_slashes_and_reject_garbage() {
        let settings = ApiSettings::new(
            "https://canvas.example.edu/api/v1/".into(),
            "https://api.github.com".into(),
            Duration::from_secs(5),
        )
        .expect("valid settings");
        assert_eq!(settings.canvas_base(), "https://canvas.example.edu/api/v1");
        assert_eq!(settings.timeout(), Duration::from_secs(5));

        assert!(
            ApiSettings::new("not a url".into(), "https://api.github.com".into(), Duration::ZERO)
                .is_err()
        );
    }

    #[test]
    fn timeout_falls_back_unless_positive() {
        assert_eq!(parse_timeout_secs(Some("5"), 30), Duration::from_secs(5));
        assert_eq!(parse_timeout_secs(Some(" 12 "), 30), Duration::from_secs(12));
        assert_eq!(parse_timeout_secs(Some("0"), 30), Duration::from_secs(30));
        assert_eq!(parse_timeout_secs(Some("soon"), 30), Duration::from_secs(30));
        assert_eq!(parse_timeout_secs(None, 30), Duration::from_secs(30));
    }
}
