#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Deserialize;
use tracing::warn;

use crate::{
    canvas::{Gradebook, fetch_enrollments},
    constants::MAX_ENROLLMENT_PAGES,
    error::ApiError,
    types::{Enrollment, Student},
};

/// One row of `students.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    /// Single-sign-on login; matched against the Canvas `login_id`.
    #[serde(rename = "uwnetid")]
    pub login_id: String,
    /// GitHub handle; blank cells count as missing.
    #[serde(default)]
    pub github:   Option<String>,
}

impl RosterEntry {
    /// Returns the GitHub handle if the cell held anything.
    pub fn github(&self) -> Option<&str> {
        self.github.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }
}

/// Parses roster rows from CSV with a header row. Columns other than
/// `uwnetid` and `github` are ignored.
pub fn read_roster<R: Read>(reader: R) -> Result<Vec<RosterEntry>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Malformed roster row {}", i + 2)))
        .collect()
}

/// Reads the roster CSV at `path`.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Could not open student roster {}", path.display()))?;
    read_roster(file).with_context(|| format!("Could not parse student roster {}", path.display()))
}

/// Enrolled students sorted by display name, each linked to a GitHub handle
/// where the CSV roster provides one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// Students in display-name order.
    students: Vec<Student>,
}

impl Roster {
    /// Joins enrollments with roster rows on the SSO login. The first
    /// matching row wins; enrollments without a match stay unlinked, as do
    /// enrollments whose login Canvas did not reveal.
    pub fn merge(enrollments: Vec<Enrollment>, entries: &[RosterEntry]) -> Self {
        let students = enrollments
            .into_iter()
            .map(|enrollment| {
                let login_id = enrollment.login_id.trim();
                let github = entries
                    .iter()
                    .find(|entry| !login_id.is_empty() && entry.login_id == login_id)
                    .and_then(RosterEntry::github)
                    .map(str::to_owned);
                Student {
                    github,
                    ..Student::from_enrollment(enrollment)
                }
            })
            .sorted_by(|a, b| a.display_name.cmp(&b.display_name))
            .collect();

        Self { students }
    }

    /// Returns every enrolled student.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Students with a GitHub handle; the only ones that get scored.
    pub fn linked(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|s| s.github.is_some())
    }

    /// Students the roster could not match to a GitHub handle.
    pub fn unlinked(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|s| s.github.is_none())
    }

    /// Logs the unlinked students, if any.
    pub fn report_unlinked(&self) {
        let unlinked: Vec<&Student> = self.unlinked().collect();
        if unlinked.is_empty() {
            return;
        }

        warn!("Enrolled students without a GitHub account:");
        for student in unlinked {
            warn!("\t{student}");
        }
    }

    /// Number of enrolled students.
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// Whether nobody is enrolled.
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Fetches the course's enrollments and merges them with `entries`.
pub async fn build_roster<G: Gradebook>(
    gradebook: &G,
    course_id: u64,
    entries: &[RosterEntry],
) -> Result<Roster, ApiError> {
    let enrollments = fetch_enrollments(gradebook, course_id, MAX_ENROLLMENT_PAGES).await?;
    Ok(Roster::merge(enrollments, entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(canvas_id: u64, login_id: &str, name: &str) -> Enrollment {
        Enrollment {
            canvas_id,
            login_id: login_id.into(),
            sortable_name: name.into(),
        }
    }

    #[test]
    fn roster_csv_ignores_extra_columns_and_blank_handles() {
        let csv = "name,uwnetid,github\nAda,ada,  ada-l \nBob,bob,\nCy,cy,cyg\n";
        let entries = read_roster(csv.as_bytes()).expect("parse roster");

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].github(), Some("ada-l"));
        assert_eq!(entries[1].github(), None);
        assert_eq!(entries[2].login_id, "cy");
    }

    #[test]
    fn roster_csv_without_join_column_is_rejected() {
        let err = read_roster("netid,github\nada,ada-l\n".as_bytes()).expect_err("missing column");
        assert!(format!("{err:#}").contains("row 2"));
    }

    #[test]
    fn merge_links_handles_and_sorts_by_display_name() {
        let enrollments = vec![
            enrollment(3, "zed", "Zulu, Zed"),
            enrollment(1, "abc", "A, B"),
            enrollment(2, "mia", "Mike, Mia"),
        ];
        let entries = read_roster("uwnetid,github\nabc,abc123\nzed,zz\n".as_bytes()).expect("parse");

        let roster = Roster::merge(enrollments, &entries);
        let names: Vec<&str> = roster.students().iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, ["A, B", "Mike, Mia", "Zulu, Zed"]);

        assert_eq!(roster.students()[0].github(), Some("abc123"));
        assert_eq!(roster.students()[2].github(), Some("zz"));

        let unlinked: Vec<u64> = roster.unlinked().map(|s| s.canvas_id).collect();
        assert_eq!(unlinked, [2]);
        assert_eq!(roster.linked().count(), 2);
    }

    #[test]
    fn first_matching_row_wins() {
        let entries =
            read_roster("uwnetid,github\nabc,first\nabc,second\n".as_bytes()).expect("parse");
        let roster = Roster::merge(vec![enrollment(1, "abc", "A, B")], &entries);

        assert_eq!(roster.students()[0].github(), Some("first"));
    }

    #[test]
    fn csv_rows_without_enrollment_are_dropped() {
        let entries = read_roster("uwnetid,github\nghost,boo\n".as_bytes()).expect("parse");
        let roster = Roster::merge(vec![enrollment(1, "abc", "A, B")], &entries);

        assert_eq!(roster.len(), 1);
        assert_eq!(roster.linked().count(), 0);
    }

    #[test]
    fn hidden_logins_never_match_blank_roster_rows() {
        let entries =
            read_roster("uwnetid,github\nabc,abc123\n,stray-handle\n".as_bytes()).expect("parse roster");
        let roster = Roster::merge(
            vec![enrollment(1, "abc", "A, B"), enrollment(2, "", "Hidden, Login")],
            &entries,
        );

        let hidden = roster
            .students()
            .iter()
            .find(|s| s.canvas_id == 2)
            .expect("hidden student kept");
        assert_eq!(hidden.github, None);
        assert_eq!(roster.linked().count(), 1);
        assert_eq!(roster.unlinked().map(|s| s.canvas_id).collect::<Vec<_>>(), [2]);
    }
}
