#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use tracing::warn;

use crate::{
    config::AssignmentConfig,
    github::CheckRuns,
    types::{CheckConclusion, CheckRun},
};

/// Why a submission did not count as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompleteReason {
    /// No check run carried the assignment's check name.
    NoMatchingRun,
    /// The latest matching run did not conclude with `success`; `None` when
    /// it has not concluded at all.
    Concluded(Option<CheckConclusion>),
}

/// Result of scoring one student's submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The latest matching check run succeeded.
    Complete,
    /// Check runs were read but do not show a pass.
    Incomplete(IncompleteReason),
    /// Check runs could not be read; counts as incomplete.
    Error(String),
}

impl Outcome {
    /// Whether this outcome earns the score.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => f.write_str("complete"),
            Self::Incomplete(IncompleteReason::NoMatchingRun) => {
                f.write_str("incomplete: no matching check run")
            }
            Self::Incomplete(IncompleteReason::Concluded(Some(conclusion))) => {
                write!(f, "incomplete: latest run concluded {conclusion}")
            }
            Self::Incomplete(IncompleteReason::Concluded(None)) => {
                f.write_str("incomplete: latest run has not concluded")
            }
            Self::Error(reason) => write!(f, "incomplete: {reason}"),
        }
    }
}

/// Picks the run named `check_name` with the latest completion time. Runs
/// still in progress sort before every completed run; among equal times the
/// later entry wins.
pub fn latest_check_run<'a>(runs: &'a [CheckRun], check_name: &str) -> Option<&'a CheckRun> {
    runs.iter()
        .filter(|run| run.name == check_name)
        .max_by_key(|run| run.completed_at)
}

/// Decides pass/fail from a set of check runs.
pub fn decide(runs: &[CheckRun], check_name: &str) -> Outcome {
    match latest_check_run(runs, check_name) {
        None => Outcome::Incomplete(IncompleteReason::NoMatchingRun),
        Some(run) if run.conclusion == Some(CheckConclusion::Success) => Outcome::Complete,
        Some(run) => Outcome::Incomplete(IncompleteReason::Concluded(run.conclusion)),
    }
}

/// Scores `handle`'s repository for `assignment` in `org`. Fetch failures are
/// logged and reported as [`Outcome::Error`].
pub async fn score_submission<C: CheckRuns>(
    checks: &C,
    org: &str,
    assignment: &AssignmentConfig,
    handle: &str,
) -> Outcome {
    let repo = assignment.repository_for(handle);
    match checks.check_runs(org, &repo, assignment.branch()).await {
        Ok(runs) => decide(&runs, assignment.check_name()),
        Err(e) => {
            warn!("Error accessing GitHub for {org}/{repo}: {e}");
            Outcome::Error(e.to_string())
        }
    }
}
