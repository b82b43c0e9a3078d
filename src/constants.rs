#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Branch whose check runs are inspected when an assignment names none.
pub const DEFAULT_BRANCH: &str = "main";

/// Name of the check run treated as the test gate when an assignment names
/// none.
pub const DEFAULT_CHECK_NAME: &str = "test";

/// Percentage posted for a passing submission when no score is given.
pub const DEFAULT_SCORE: u8 = 100;

/// Canvas REST API base used unless `GRADESYNC_CANVAS_BASE` is set.
pub const DEFAULT_CANVAS_BASE: &str = "https://canvas.uw.edu/api/v1";

/// GitHub REST API base used unless `GRADESYNC_GITHUB_BASE` is set.
pub const DEFAULT_GITHUB_BASE: &str = "https://api.github.com";

/// Per-request timeout used unless `GRADESYNC_HTTP_TIMEOUT_SECS` is set.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Page size requested from the Canvas enrollments endpoint.
pub const ENROLLMENTS_PER_PAGE: u32 = 100;

/// Upper bound on enrollment pages followed through `Link: rel="next"`.
pub const MAX_ENROLLMENT_PAGES: usize = 50;

/// Page size requested from the GitHub check-runs endpoint.
pub const CHECK_RUNS_PER_PAGE: u32 = 100;

/// GitHub REST API version pinned through `X-GitHub-Api-Version`.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// `User-Agent` sent with every request (GitHub rejects requests without one).
pub const USER_AGENT: &str = concat!("gradesync/", env!("CARGO_PKG_VERSION"));

/// Default location of the course configuration file.
pub const DEFAULT_COURSE_FILE: &str = "course.json";

/// Default location of the student roster CSV.
pub const DEFAULT_STUDENTS_FILE: &str = "students.csv";

/// Default location of the GitHub token file.
pub const DEFAULT_GITHUB_TOKEN_FILE: &str = "github.token";

/// Default location of the Canvas access key file.
pub const DEFAULT_CANVAS_KEY_FILE: &str = "canvas.key";
