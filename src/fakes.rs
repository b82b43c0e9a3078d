#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! In-memory stand-ins for the Canvas and GitHub clients (testing only)
//!
//! `MemoryGradebook` serves canned enrollment pages and records grade posts;
//! `MemoryChecks` serves canned check runs per repository and ref. Both
//! record every request so tests can assert on call counts and order.

use std::{collections::HashMap, sync::Mutex};

use reqwest::{StatusCode, Url};

use crate::{
    canvas::{EnrollmentPage, Gradebook, SubmissionTarget},
    error::ApiError,
    github::CheckRuns,
    types::{CheckConclusion, CheckRun, Enrollment, Score},
};

/// Base used for the fake pagination links.
const FAKE_CANVAS_BASE: &str = "https://canvas.invalid/api/v1";

/// Canned Canvas gradebook.
#[derive(Debug, Default)]
pub struct MemoryGradebook {
    /// Pages served in order; page `i + 1` is reached through page `i`'s
    /// `next` link.
    pages:          Vec<EnrollmentPage>,
    /// Users whose grade posts fail.
    rejected_users: Vec<u64>,
    /// Cursor passed to each `enrollment_page` call.
    cursors:        Mutex<Vec<Option<Url>>>,
    /// Every grade post attempted, failed ones included.
    posts:          Mutex<Vec<(SubmissionTarget, Score)>>,
}

impl MemoryGradebook {
    /// Serves `enrollments` as one page with no `next` link.
    pub fn single_page(enrollments: Vec<Enrollment>) -> Self {
        Self::paged(vec![enrollments])
    }

    /// Serves each entry of `pages` as a page, chained by `next` links.
    pub fn paged(pages: Vec<Vec<Enrollment>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, enrollments)| EnrollmentPage {
                enrollments,
                next: (i + 1 < count).then(|| fake_page_url(i + 2)),
            })
            .collect();

        Self {
            pages,
            ..Self::default()
        }
    }

    /// Makes grade posts for `user_id` fail with a server error.
    pub fn reject_posts_for(mut self, user_id: u64) -> Self {
        self.rejected_users.push(user_id);
        self
    }

    /// Cursors received so far, in call order.
    pub fn cursors(&self) -> Vec<Option<Url>> {
        self.cursors.lock().expect("fake gradebook poisoned").clone()
    }

    /// Grade posts received so far, in call order.
    pub fn posts(&self) -> Vec<(SubmissionTarget, Score)> {
        self.posts.lock().expect("fake gradebook poisoned").clone()
    }
}

/// Pagination link for page `n` of the fake course.
fn fake_page_url(n: usize) -> Url {
    Url::parse(&format!("{FAKE_CANVAS_BASE}/courses/1/enrollments?page={n}&per_page=100"))
        .expect("static fake url")
}

impl Gradebook for MemoryGradebook {
    async fn enrollment_page(
        &self,
        _course_id: u64,
        cursor: Option<&Url>,
    ) -> Result<EnrollmentPage, ApiError> {
        self.cursors
            .lock()
            .expect("fake gradebook poisoned")
            .push(cursor.cloned());

        let index = match cursor {
            None => Some(0),
            Some(url) => self
                .pages
                .iter()
                .position(|page| page.next.as_ref() == Some(url))
                .map(|i| i + 1),
        };

        index
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or_else(|| ApiError::Status {
                url:     cursor.map_or_else(|| FAKE_CANVAS_BASE.to_string(), Url::to_string),
                status:  StatusCode::NOT_FOUND,
                message: "The specified resource does not exist.".into(),
            })
    }

    async fn post_grade(&self, target: &SubmissionTarget, score: Score) -> Result<(), ApiError> {
        self.posts
            .lock()
            .expect("fake gradebook poisoned")
            .push((*target, score));

        if self.rejected_users.contains(&target.user_id) {
            return Err(ApiError::Status {
                url:     format!(
                    "{FAKE_CANVAS_BASE}/courses/{}/assignments/{}/submissions/{}",
                    target.course_id, target.assignment_id, target.user_id
                ),
                status:  StatusCode::INTERNAL_SERVER_ERROR,
                message: "Internal Server Error".into(),
            });
        }
        Ok(())
    }
}

/// Canned GitHub check runs keyed by `owner/repo@ref`.
#[derive(Debug, Default)]
pub struct MemoryChecks {
    /// Runs per `owner/repo@ref`; missing keys answer 404.
    runs:     HashMap<String, Vec<CheckRun>>,
    /// Every `owner/repo@ref` requested, in call order.
    requests: Mutex<Vec<String>>,
}

impl MemoryChecks {
    /// Creates a source with no repositories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the runs reported for `owner/repo@git_ref`.
    pub fn with_runs(mut self, owner: &str, repo: &str, git_ref: &str, runs: Vec<CheckRun>) -> Self {
        self.runs.insert(key(owner, repo, git_ref), runs);
        self
    }

    /// Requests received so far as `owner/repo@ref`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("fake checks poisoned").clone()
    }
}

/// Lookup key for a repository and ref.
fn key(owner: &str, repo: &str, git_ref: &str) -> String {
    format!("{owner}/{repo}@{git_ref}")
}

impl CheckRuns for MemoryChecks {
    async fn check_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<CheckRun>, ApiError> {
        let key = key(owner, repo, git_ref);
        self.requests
            .lock()
            .expect("fake checks poisoned")
            .push(key.clone());

        self.runs.get(&key).cloned().ok_or_else(|| ApiError::Status {
            url:     format!("https://api.github.invalid/repos/{owner}/{repo}/commits/{git_ref}/check-runs"),
            status:  StatusCode::NOT_FOUND,
            message: "Not Found".into(),
        })
    }
}

/// Builds a completed check run. `completed_at` must be RFC 3339.
pub fn check_run(name: &str, completed_at: &str, conclusion: CheckConclusion) -> CheckRun {
    CheckRun {
        name:         name.into(),
        completed_at: Some(completed_at.parse().expect("RFC 3339 timestamp")),
        conclusion:   Some(conclusion),
    }
}
