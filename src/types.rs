#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_SCORE;

/// A student enrollment as reported by Canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Canvas user id; also the submission id for grade posting.
    pub canvas_id:     u64,
    /// Single-sign-on login, the join key against the CSV roster.
    pub login_id:      String,
    /// `Last, First` style name Canvas uses for sorting.
    pub sortable_name: String,
}

/// An enrolled student, linked to a GitHub handle when the roster has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Canvas user id.
    pub canvas_id:    u64,
    /// Single-sign-on login.
    pub login_id:     String,
    /// Display name (Canvas sortable name).
    pub display_name: String,
    /// GitHub handle, if the roster maps this student to one.
    pub github:       Option<String>,
}

impl Student {
    /// Builds an unlinked student from a Canvas enrollment.
    pub fn from_enrollment(enrollment: Enrollment) -> Self {
        Self {
            canvas_id:    enrollment.canvas_id,
            login_id:     enrollment.login_id,
            display_name: enrollment.sortable_name,
            github:       None,
        }
    }

    /// Returns the GitHub handle, if linked.
    pub fn github(&self) -> Option<&str> {
        self.github.as_deref()
    }
}

impl Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, canvas id {})", self.display_name, self.login_id, self.canvas_id)
    }
}

/// Final state reported by a GitHub check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// The check passed.
    Success,
    /// The check failed.
    Failure,
    /// The check finished without a verdict.
    Neutral,
    /// The check was cancelled.
    Cancelled,
    /// The check was skipped.
    Skipped,
    /// The check exceeded its time limit.
    TimedOut,
    /// The check requires manual action.
    ActionRequired,
    /// The check went stale.
    Stale,
    /// Anything GitHub adds later.
    #[serde(other)]
    Unknown,
}

impl Display for CheckConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
            Self::Cancelled => "cancelled",
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
            Self::ActionRequired => "action_required",
            Self::Stale => "stale",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One GitHub check run, reduced to the fields grading looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    /// Check name, e.g. the workflow job name.
    pub name:         String,
    /// Completion time; absent while the run is queued or in progress.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Conclusion; absent while the run is queued or in progress.
    #[serde(default)]
    pub conclusion:   Option<CheckConclusion>,
}

/// Raised when a score falls outside `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("score must be a percentage between 0 and 100, got {0}")]
pub struct ScoreError(pub u32);

/// Percentage posted to every passing submission in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(u8);

impl Score {
    /// Validates `percent` and wraps it.
    pub fn new(percent: u32) -> Result<Self, ScoreError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or(ScoreError(percent))
    }

    /// Returns the percentage.
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// Renders the value Canvas expects for `posted_grade`, e.g. `100%`.
    pub fn posted_grade(&self) -> String {
        format!("{}%", self.0)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self(DEFAULT_SCORE)
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent = s
            .trim()
            .trim_end_matches('%')
            .parse::<u32>()
            .map_err(|e| format!("invalid score `{s}`: {e}"))?;
        Self::new(percent).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_renders_as_percentage() {
        assert_eq!(Score::default().posted_grade(), "100%");
        assert_eq!(Score::new(85).expect("in range").posted_grade(), "85%");
    }

    #[test]
    fn score_rejects_values_over_100() {
        assert_eq!(Score::new(101), Err(ScoreError(101)));
        assert_eq!(Score::new(300), Err(ScoreError(300)));
        assert!(Score::new(0).is_ok());
    }

    #[test]
    fn score_parses_with_or_without_percent_sign() {
        assert_eq!("75".parse::<Score>().map(|s| s.percent()), Ok(75));
        assert_eq!("75%".parse::<Score>().map(|s| s.percent()), Ok(75));
        assert!("abc".parse::<Score>().is_err());
    }

    #[test]
    fn check_run_tolerates_in_progress_and_unknown_values() {
        let runs: Vec<CheckRun> = serde_json::from_str(
            r#"[
                {"name": "test", "completed_at": null, "conclusion": null, "status": "in_progress"},
                {"name": "test", "completed_at": "2024-01-01T00:00:00Z", "conclusion": "startup_failure"}
            ]"#,
        )
        .expect("decode check runs");

        assert_eq!(runs[0].completed_at, None);
        assert_eq!(runs[0].conclusion, None);
        assert_eq!(runs[1].conclusion, Some(CheckConclusion::Unknown));
        assert!(runs[1].completed_at.is_some());
    }
}
