#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use reqwest::{Response, StatusCode, Url};
use thiserror::Error;

/// Errors raised while talking to the Canvas or GitHub APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Request URL with credentials removed.
        url:    String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{url} returned {status}: {message}")]
    Status {
        /// Request URL with credentials removed.
        url:     String,
        /// HTTP status returned.
        status:  StatusCode,
        /// Server-provided message, or the raw body when it has none.
        message: String,
    },
    /// The response body did not match the expected shape.
    #[error("Could not decode response from {url}: {source}")]
    Decode {
        /// Request URL with credentials removed.
        url:    String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// A URL could not be built or parsed.
    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl {
        /// The offending input.
        url:    String,
        /// Why parsing failed.
        reason: String,
    },
}

impl ApiError {
    /// Wraps a transport failure, dropping the URL reqwest attaches since it
    /// may carry an access token.
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url:    url.to_string(),
            source: source.without_url(),
        }
    }

    /// Wraps a body decode failure.
    pub(crate) fn decode(url: &str, source: reqwest::Error) -> Self {
        Self::Decode {
            url:    url.to_string(),
            source: source.without_url(),
        }
    }

    /// Wraps a URL parse failure.
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url:    url.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the HTTP status for [`ApiError::Status`] errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Renders `url` for logs and errors with any `access_token` query value
/// masked.
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return url.to_string();
    }

    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "access_token" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// Passes successful responses through and turns everything else into
/// [`ApiError::Status`], preferring the `message` field both APIs put in
/// their JSON error bodies.
pub(crate) async fn check_status(url: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or(body);

    Err(ApiError::Status {
        url: url.to_string(),
        status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_masks_access_token_only() {
        let url = Url::parse("https://canvas.example.edu/api/v1/courses/7?per_page=100&access_token=s3cret")
            .expect("valid url");
        let shown = redact(&url);

        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("access_token=REDACTED"));
        assert!(shown.contains("per_page=100"));
    }

    #[test]
    fn redact_leaves_plain_urls_alone() {
        let url = Url::parse("https://api.github.com/repos/org/repo/commits/main/check-runs")
            .expect("valid url");
        assert_eq!(redact(&url), url.to_string());
    }
}
