//! Shared HTTP client construction, credentials, and CLI error types.

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;
use xapi_runner_core::XapiError;

pub(crate) const HEADER_TRACKING_ID: &str = "trackingid";
pub(crate) const EXIT_SUCCESS: i32 = 0;
pub(crate) const EXIT_FAILURE: i32 = 1;

/// CLI-level error type separating the run taxonomy from plumbing failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Runner(XapiError),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Every fatal condition maps to the same exit status.
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Runner(_) | Self::Failure(_) => EXIT_FAILURE,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Runner(error) => {
                let mut message = error.to_string();
                let mut source = error.source();
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                message
            }
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<XapiError> for CliError {
    fn from(error: XapiError) -> Self {
        Self::Runner(error)
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl Error for CliError {}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) token: AccessToken,
}

/// Webex access token taken from `--token` or `WEBEX_ACCESS_TOKEN`.
#[derive(Clone)]
pub(crate) struct AccessToken {
    secret: String,
}

impl AccessToken {
    /// Accept a non-blank token; anything else is an authentication error.
    pub(crate) fn resolve(input: Option<String>) -> CliResult<Self> {
        let secret = input
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CliError::Runner(XapiError::Authentication {
                    detail: "no access token provided; pass --token or set WEBEX_ACCESS_TOKEN"
                        .to_string(),
                })
            })?;
        Ok(Self {
            secret: secret.to_string(),
        })
    }

    #[must_use]
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.secret)
    }
}

impl Debug for AccessToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("AccessToken(***)")
    }
}

/// Build the HTTP client shared by every request in a run.
pub(crate) fn build_http_client(timeout: Duration, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let tracking_id = HeaderValue::from_str(trace_id)
        .map_err(|_| CliError::failure(anyhow!("trace identifier contains invalid characters")))?;
    default_headers.insert(HEADER_TRACKING_ID, tracking_id);

    Client::builder()
        .timeout(timeout)
        .default_headers(default_headers)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// the version segment.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    let mut url = input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))?;
    if url.cannot_be_a_base() {
        return Err(format!("invalid URL '{input}': cannot be used as a base"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Deserialize)]
struct WebexErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<WebexErrorItem>,
}

#[derive(Deserialize)]
struct WebexErrorItem {
    description: Option<String>,
}

/// Extract a human-readable message from a non-success response.
pub(crate) async fn error_message(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&bytes).trim().to_string();
    let parsed = serde_json::from_slice::<WebexErrorBody>(&bytes).ok();

    let message = parsed
        .and_then(|body| {
            body.message.or_else(|| {
                body.errors
                    .into_iter()
                    .find_map(|item| item.description)
            })
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            if body_text.is_empty() {
                format!("request failed with status {status}")
            } else {
                body_text
            }
        });

    (status, message)
}
