use std::time::Duration;

use reqwest::blocking::Response;
use url::Url;

use crate::error::InferenceError;

/// Builds a blocking HTTP client.
///
/// The blocking client applies `timeout` to connecting and to every single
/// read, so a silent event stream is cut off without limiting how long a
/// healthy one may run.
pub(crate) fn build_http_client(
    timeout: Option<Duration>,
) -> Result<reqwest::blocking::Client, InferenceError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("lungscope/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| InferenceError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Parses a base URL, making sure relative joins append to its path.
pub(crate) fn parse_base_url(raw: &str, setting: &str) -> Result<Url, InferenceError> {
    let mut normalized = raw.trim_end_matches('/').to_string();
    normalized.push('/');
    Url::parse(&normalized).map_err(|e| {
        InferenceError::Configuration(format!("{setting} is not a valid URL (`{raw}`): {e}"))
    })
}

/// Joins `path` onto `base`. `path` never starts with `/`.
pub(crate) fn join(base: &Url, path: &str) -> Result<Url, InferenceError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| InferenceError::Configuration(format!("Cannot build URL for `{path}`: {e}")))
}

/// Outcome of a request whose status has not been checked yet.
pub(crate) trait ResponseExt {
    /// Returns the response on success, otherwise the status and body text.
    fn error_for_status_with_body(self) -> Result<Response, (reqwest::StatusCode, String)>;
}

impl ResponseExt for Response {
    fn error_for_status_with_body(self) -> Result<Response, (reqwest::StatusCode, String)> {
        if self.status().is_success() {
            Ok(self)
        } else {
            let status = self.status();
            let body = self
                .text()
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            Err((status, body))
        }
    }
}

/// Whether an I/O error raised while reading a body is a read timeout.
pub(crate) fn is_timeout(error: &std::io::Error) -> bool {
    if error.kind() == std::io::ErrorKind::TimedOut {
        return true;
    }
    error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(reqwest::Error::is_timeout)
}
