#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # gradesync
//! ## Introduction
//!
//! Marks Canvas submissions complete when the student's GitHub repository for
//! the assignment has a passing `test` check run.
//!
//! ## Usage
//!
//! Run it from a directory holding `course.json`, `students.csv`,
//! `github.token` and `canvas.key`:
//!
//! ```text
//! gradesync                 # every assignment, 100%
//! gradesync -p problem-a    # only the `problem-a` assignment
//! gradesync -s 50 --dry-run # score at 50%, but only report
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use gradesync::{
    ApiSettings, CanvasClient, CourseConfig, Credentials, GitHubClient, Score, SyncOptions,
    constants::{
        DEFAULT_CANVAS_KEY_FILE, DEFAULT_COURSE_FILE, DEFAULT_GITHUB_TOKEN_FILE,
        DEFAULT_STUDENTS_FILE,
    },
    roster::load_roster,
    sync_course,
};
use tracing::{Level, metadata::LevelFilter, warn};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Parsed command line.
#[derive(Debug, Clone)]
struct Cli {
    /// Only this assignment's `repo_slug`.
    project:      Option<String>,
    /// Percentage to post.
    score:        Score,
    /// Path to the course configuration.
    course:       PathBuf,
    /// Path to the student roster CSV.
    students:     PathBuf,
    /// Path to the GitHub token file.
    github_token: PathBuf,
    /// Path to the Canvas key file.
    canvas_key:   PathBuf,
    /// Report without posting grades.
    dry_run:      bool,
}

/// Parse the command line arguments and return a `Cli` struct
fn options() -> Cli {
    /// parses a path option with a default file name
    fn path(name: &'static str, help: &'static str, default: &'static str) -> impl Parser<PathBuf> {
        long(name)
            .help(help)
            .argument::<PathBuf>("PATH")
            .fallback(PathBuf::from(default))
            .debug_fallback()
    }

    let project = short('p')
        .long("project")
        .help("Only grade the assignment with this repo slug")
        .argument::<String>("SLUG")
        .optional();

    let score = short('s')
        .long("score")
        .help("Percentage (0 to 100) to post for passing submissions")
        .argument::<Score>("SCORE")
        .fallback(Score::default())
        .display_fallback();

    let course = path("course", "Course configuration (JSON)", DEFAULT_COURSE_FILE);
    let students = path("students", "Student roster (CSV with uwnetid,github)", DEFAULT_STUDENTS_FILE);
    let github_token = path("github-token", "File holding a GitHub token", DEFAULT_GITHUB_TOKEN_FILE);
    let canvas_key = path("canvas-key", "File holding a Canvas access key", DEFAULT_CANVAS_KEY_FILE);

    let dry_run = long("dry-run")
        .help("Report outcomes without posting grades to Canvas")
        .switch();

    construct!(Cli {
        project,
        score,
        course,
        students,
        github_token,
        canvas_key,
        dry_run,
    })
    .to_options()
    .descr("Post Canvas grades for passing GitHub check runs")
    .run()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cli = options();

    let course = CourseConfig::load(&cli.course)?;
    let credentials = Credentials::load(&cli.github_token, &cli.canvas_key)?;
    let entries = load_roster(&cli.students)?;
    let settings = ApiSettings::from_env()?;

    let http = settings.http_client()?;
    let canvas = CanvasClient::new(http.clone(), settings.canvas_base(), credentials.canvas_key());
    let github = GitHubClient::new(http, settings.github_base(), credentials.github_token());

    let sync_options = SyncOptions::builder()
        .only(cli.project)
        .score(cli.score)
        .dry_run(cli.dry_run)
        .build();

    let reports = sync_course(&canvas, &github, &course, &entries, &sync_options)
        .await
        .with_context(|| format!("Could not fetch enrollments for course {}", course.canvas_id()))?;

    for report in &reports {
        println!("{}", report.table());
        for failed in report.failed_posts() {
            warn!("Grade for {} was not posted: {}", failed.student, failed.grade_post);
        }
    }

    Ok(())
}
