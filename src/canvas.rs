#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use reqwest::{Client, Request, Url, header::LINK};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    constants::ENROLLMENTS_PER_PAGE,
    error::{ApiError, check_status, redact},
    types::{Enrollment, Score},
};

/// One page of student enrollments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentPage {
    /// Enrollments on this page, in server order.
    pub enrollments: Vec<Enrollment>,
    /// `rel="next"` link from the `Link` header, if there is another page.
    pub next:        Option<Url>,
}

/// Identifies a single Canvas submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTarget {
    /// Canvas course id.
    pub course_id:     u64,
    /// Canvas assignment id.
    pub assignment_id: u64,
    /// Canvas user id of the student.
    pub user_id:       u64,
}

/// The gradebook operations the sync needs.
#[allow(async_fn_in_trait)]
pub trait Gradebook {
    /// Fetches one page of student enrollments for `course_id`. `cursor` is
    /// the `next` link of the previous page, or `None` for the first page.
    async fn enrollment_page(
        &self,
        course_id: u64,
        cursor: Option<&Url>,
    ) -> Result<EnrollmentPage, ApiError>;

    /// Sets the posted grade of `target` to `score`.
    async fn post_grade(&self, target: &SubmissionTarget, score: Score) -> Result<(), ApiError>;
}

/// Collects every student enrollment, following `next` links until none
/// remain or `max_pages` pages have been read.
pub async fn fetch_enrollments<G: Gradebook>(
    gradebook: &G,
    course_id: u64,
    max_pages: usize,
) -> Result<Vec<Enrollment>, ApiError> {
    let mut page = gradebook.enrollment_page(course_id, None).await?;
    let mut enrollments = std::mem::take(&mut page.enrollments);
    let mut pages_read = 1;

    while let Some(next) = page.next.take() {
        if pages_read >= max_pages {
            warn!(
                "Stopped after {pages_read} enrollment pages; the roster for course {course_id} \
                 may be incomplete"
            );
            break;
        }
        page = gradebook.enrollment_page(course_id, Some(&next)).await?;
        enrollments.append(&mut page.enrollments);
        pages_read += 1;
    }

    debug!("Fetched {} enrollments in {pages_read} page(s)", enrollments.len());
    Ok(enrollments)
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
pub fn next_link(header: &str) -> Option<&str> {
    header
        .split(',')
        .find(|link| {
            link.split(';')
                .skip(1)
                .any(|param| matches!(param.trim(), r#"rel="next""# | "rel=next"))
        })
        .and_then(|link| link.trim().strip_prefix('<')?.split_once('>'))
        .map(|(url, _)| url)
}

/// Enrollment as returned by `GET /courses/:id/enrollments`.
#[derive(Deserialize)]
struct RawEnrollment {
    /// Embedded user record.
    user: RawUser,
}

/// The subset of the embedded user record we keep.
#[derive(Deserialize)]
struct RawUser {
    /// Canvas user id.
    id:            u64,
    /// SSO login; hidden from callers without permission to see it.
    #[serde(default)]
    login_id:      String,
    /// `Last, First` name.
    sortable_name: String,
}

impl RawEnrollment {
    /// Drops everything but the identity fields.
    fn into_enrollment(self) -> Enrollment {
        Enrollment {
            canvas_id:     self.user.id,
            login_id:      self.user.login_id,
            sortable_name: self.user.sortable_name,
        }
    }
}

/// Canvas REST client authenticating with an `access_token` query parameter.
#[derive(Clone)]
pub struct CanvasClient {
    /// Shared HTTP client.
    http:         Client,
    /// API base, e.g. `https://canvas.uw.edu/api/v1`.
    base:         String,
    /// Access key appended to every request.
    access_token: String,
}

impl CanvasClient {
    /// Creates a client for the API at `base`.
    pub fn new(http: Client, base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Builds an endpoint URL under the API base.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}{path}", self.base);
        Url::parse_with_params(&raw, params).map_err(|e| ApiError::invalid_url(raw, e))
    }

    /// Appends the access token unless the URL already carries one, as
    /// pagination links sometimes do.
    fn authorize(&self, mut url: Url) -> Url {
        if !url.query_pairs().any(|(key, _)| key == "access_token") {
            url.query_pairs_mut()
                .append_pair("access_token", &self.access_token);
        }
        url
    }

    /// The `GET` for one enrollment page; `cursor` is followed verbatim apart
    /// from the access token.
    fn enrollment_request(&self, course_id: u64, cursor: Option<&Url>) -> Result<Request, ApiError> {
        let url = match cursor {
            Some(next) => next.clone(),
            None => self.endpoint(
                &format!("/courses/{course_id}/enrollments"),
                &[
                    ("per_page", ENROLLMENTS_PER_PAGE.to_string()),
                    ("type", "StudentEnrollment".to_string()),
                ],
            )?,
        };
        let shown = redact(&url);
        self.http
            .get(self.authorize(url))
            .build()
            .map_err(|e| ApiError::transport(&shown, e))
    }

    /// The `PUT` that sets `submission[posted_grade]` on `target`.
    fn grade_request(&self, target: &SubmissionTarget, score: Score) -> Result<Request, ApiError> {
        let url = self.endpoint(
            &format!(
                "/courses/{}/assignments/{}/submissions/{}",
                target.course_id, target.assignment_id, target.user_id
            ),
            &[],
        )?;
        let shown = redact(&url);
        self.http
            .put(self.authorize(url))
            .form(&[("submission[posted_grade]", score.posted_grade())])
            .build()
            .map_err(|e| ApiError::transport(&shown, e))
    }
}

impl Gradebook for CanvasClient {
    async fn enrollment_page(
        &self,
        course_id: u64,
        cursor: Option<&Url>,
    ) -> Result<EnrollmentPage, ApiError> {
        let request = self.enrollment_request(course_id, cursor)?;
        let shown = redact(request.url());
        debug!("GET {shown}");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::transport(&shown, e))?;
        let response = check_status(&shown, response).await?;

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link)
            .map(|link| Url::parse(link).map_err(|e| ApiError::invalid_url(link, e)))
            .transpose()?;

        let raw: Vec<RawEnrollment> = response
            .json()
            .await
            .map_err(|e| ApiError::decode(&shown, e))?;

        Ok(EnrollmentPage {
            enrollments: raw.into_iter().map(RawEnrollment::into_enrollment).collect(),
            next,
        })
    }

    async fn post_grade(&self, target: &SubmissionTarget, score: Score) -> Result<(), ApiError> {
        let request = self.grade_request(target, score)?;
        let shown = redact(request.url());
        debug!("PUT {shown} posted_grade={}", score.posted_grade());

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::transport(&shown, e))?;
        check_status(&shown, response).await?;
        Ok(())
    }
}
