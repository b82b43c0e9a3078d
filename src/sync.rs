#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use colored::Colorize;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::{
    canvas::{Gradebook, SubmissionTarget},
    config::{AssignmentConfig, CourseConfig},
    error::ApiError,
    github::CheckRuns,
    report::{AssignmentReport, GradePost, StudentResult},
    roster::{Roster, RosterEntry, build_roster},
    scorer::score_submission,
    types::Score,
};

/// Knobs for a sync run, taken from the command line.
#[derive(Debug, Clone, Default, TypedBuilder)]
#[builder(doc)]
pub struct SyncOptions {
    /// Only process the assignment with this `repo_slug`.
    #[builder(default, setter(into))]
    pub only:    Option<String>,
    /// Percentage posted for complete submissions.
    #[builder(default)]
    pub score:   Score,
    /// Score everything but post nothing.
    #[builder(default)]
    pub dry_run: bool,
}

/// Scores every linked student on `assignment`, posting `options.score` for
/// each complete submission. Per-student failures are recorded in the report
/// and never stop the loop.
pub async fn score_assignment<G: Gradebook, C: CheckRuns>(
    gradebook: &G,
    checks: &C,
    course: &CourseConfig,
    assignment: &AssignmentConfig,
    roster: &Roster,
    options: &SyncOptions,
) -> AssignmentReport {
    let mut report = AssignmentReport::new(assignment.repo_slug());

    for student in roster.linked() {
        let Some(handle) = student.github() else {
            continue;
        };
        info!("Scoring {} for {}", assignment.repo_slug(), student.display_name);

        let outcome = score_submission(checks, course.github_org(), assignment, handle).await;
        let grade_post = if outcome.is_complete() {
            info!("{}", "...complete!".green());
            let target = SubmissionTarget {
                course_id:     course.canvas_id(),
                assignment_id: assignment.canvas_id(),
                user_id:       student.canvas_id,
            };
            post(gradebook, &target, options).await
        } else {
            info!("{} ({outcome})", "...INCOMPLETE".red());
            GradePost::NotAttempted
        };

        report.results.push(StudentResult {
            student: student.display_name.clone(),
            repository: format!("{}/{}", course.github_org(), assignment.repository_for(handle)),
            outcome,
            grade_post,
        });
    }

    info!("{}", report.summary());
    report
}

/// Writes the grade unless this is a dry run.
async fn post<G: Gradebook>(
    gradebook: &G,
    target: &SubmissionTarget,
    options: &SyncOptions,
) -> GradePost {
    if options.dry_run {
        return GradePost::DryRun;
    }

    match gradebook.post_grade(target, options.score).await {
        Ok(()) => GradePost::Posted,
        Err(e) => {
            warn!("Error marking submission: {e}");
            GradePost::Failed(e.to_string())
        }
    }
}

/// Builds the roster, then scores each selected assignment in configuration
/// order. Only the enrollment fetch can fail the run.
pub async fn sync_course<G: Gradebook, C: CheckRuns>(
    gradebook: &G,
    checks: &C,
    course: &CourseConfig,
    entries: &[RosterEntry],
    options: &SyncOptions,
) -> Result<Vec<AssignmentReport>, ApiError> {
    let roster = build_roster(gradebook, course.canvas_id(), entries).await?;
    roster.report_unlinked();

    let selected = course.select(options.only.as_deref());
    if selected.is_empty() {
        match options.only.as_deref() {
            Some(slug) => warn!("No assignment with repo_slug `{slug}` in the course configuration"),
            None => warn!("The course configuration lists no assignments"),
        }
    }

    let mut reports = Vec::with_capacity(selected.len());
    for assignment in selected {
        reports
            .push(score_assignment(gradebook, checks, course, assignment, &roster, options).await);
    }

    Ok(reports)
}
