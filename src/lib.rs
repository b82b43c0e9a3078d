//! # gradesync
//!
//! Posts Canvas grades for students whose latest GitHub check run on an
//! assignment repository passed.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Canvas enrollments and grade posting
pub mod canvas;
/// Course configuration, credentials, and API settings
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Errors raised by the API clients
pub mod error;
/// In-memory API fakes for tests
pub mod fakes;
/// GitHub check runs
pub mod github;
/// Per-assignment reports
pub mod report;
/// Joining the CSV roster with Canvas enrollments
pub mod roster;
/// Pass/fail decisions from check runs
pub mod scorer;
/// Drives a full course sync
pub mod sync;
/// Shared value types
pub mod types;

pub use canvas::{CanvasClient, Gradebook};
pub use config::{ApiSettings, AssignmentConfig, CourseConfig, Credentials};
pub use error::ApiError;
pub use github::{CheckRuns, GitHubClient};
pub use report::{AssignmentReport, GradePost};
pub use scorer::Outcome;
pub use sync::{SyncOptions, sync_course};
pub use types::{CheckConclusion, CheckRun, Score, Student};
