#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

use crate::scorer::Outcome;

/// What happened when grading tried to write back to Canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradePost {
    /// Nothing to post; the submission was incomplete.
    NotAttempted,
    /// Complete, but the run was a dry run.
    DryRun,
    /// Canvas accepted the grade.
    Posted,
    /// Canvas rejected the grade or could not be reached.
    Failed(String),
}

impl Display for GradePost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAttempted => f.write_str("-"),
            Self::DryRun => f.write_str("dry run"),
            Self::Posted => f.write_str("posted"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// One row of an assignment report.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct StudentResult {
    #[tabled(rename = "Student")]
    /// Display name.
    pub student:    String,
    #[tabled(rename = "Repository")]
    /// `org/repo` that was inspected.
    pub repository: String,
    #[tabled(rename = "Outcome")]
    /// Scoring outcome.
    pub outcome:    Outcome,
    #[tabled(rename = "Grade")]
    /// Grade write-back status.
    pub grade_post: GradePost,
}

/// Everything that happened while scoring one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Assignment repository prefix.
    pub repo_slug: String,
    /// Per-student rows in roster order.
    pub results:   Vec<StudentResult>,
}

impl AssignmentReport {
    /// Creates an empty report for `repo_slug`.
    pub fn new(repo_slug: impl Into<String>) -> Self {
        Self {
            repo_slug: repo_slug.into(),
            results:   Vec::new(),
        }
    }

    /// Number of complete submissions.
    pub fn complete(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_complete()).count()
    }

    /// Number of submissions scored.
    pub fn scored(&self) -> usize {
        self.results.len()
    }

    /// Rows whose grade could not be written.
    pub fn failed_posts(&self) -> impl Iterator<Item = &StudentResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.grade_post, GradePost::Failed(_)))
    }

    /// `Complete submissions: X/Y`.
    pub fn summary(&self) -> String {
        format!("Complete submissions: {}/{}", self.complete(), self.scored())
    }

    /// Renders the rows as a table headed by the assignment slug.
    pub fn table(&self) -> String {
        Table::new(&self.results)
            .with(Panel::header(format!("{} ({})", self.repo_slug, self.summary())))
            .with(Style::modern())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::IncompleteReason;

    fn row(student: &str, outcome: Outcome, grade_post: GradePost) -> StudentResult {
        StudentResult {
            student: student.into(),
            repository: format!("org/repo-{student}"),
            outcome,
            grade_post,
        }
    }

    #[test]
    fn summary_counts_only_complete_rows() {
        let mut report = AssignmentReport::new("repo");
        report.results = vec![
            row("a", Outcome::Complete, GradePost::Posted),
            row("b", Outcome::Incomplete(IncompleteReason::NoMatchingRun), GradePost::NotAttempted),
            row("c", Outcome::Complete, GradePost::Failed("500".into())),
            row("d", Outcome::Error("404 Not Found".into()), GradePost::NotAttempted),
        ];

        assert_eq!(report.summary(), "Complete submissions: 2/4");
        assert_eq!(report.failed_posts().count(), 1);
    }

    #[test]
    fn table_mentions_slug_and_students() {
        let mut report = AssignmentReport::new("problem-a");
        report.results = vec![row("ada", Outcome::Complete, GradePost::DryRun)];

        let table = report.table();
        assert!(table.contains("problem-a"));
        assert!(table.contains("ada"));
        assert!(table.contains("dry run"));
    }
}
