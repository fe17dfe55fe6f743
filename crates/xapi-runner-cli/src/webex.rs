//! Webex REST implementation of the device directory and command transport.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, LINK};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use xapi_runner_core::{
    CommandRequest, CommandTransport, Device, DeviceDirectory, ExecutionError, XapiError,
    XapiResult,
};

use crate::client::{AccessToken, AppContext, error_message};

const UNKNOWN_DEVICE_NAME: &str = "Unknown";

/// Bearer-authenticated client for the Webex devices and xAPI endpoints.
pub(crate) struct WebexClient {
    client: Client,
    base_url: Url,
    token: AccessToken,
    call_timeout: Duration,
}

#[derive(Deserialize)]
struct DeviceListResponse {
    #[serde(default)]
    items: Vec<DeviceRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRecord {
    id: String,
    display_name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<DeviceRecord> for Device {
    fn from(record: DeviceRecord) -> Self {
        let name = record
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string());
        Self::new(record.id, name, record.tags)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandPayload<'a> {
    device_id: &'a str,
    #[serde(skip_serializing_if = "Map::is_empty")]
    arguments: Map<String, Value>,
}

impl WebexClient {
    pub(crate) fn new(ctx: &AppContext, call_timeout: Duration) -> Self {
        Self {
            client: ctx.client.clone(),
            base_url: ctx.base_url.clone(),
            token: ctx.token.clone(),
            call_timeout,
        }
    }

    fn devices_url(&self, tag: &str) -> XapiResult<Url> {
        let mut url = self
            .base_url
            .join("devices")
            .map_err(|err| XapiError::directory(format!("invalid base URL: {err}")))?;
        url.query_pairs_mut().append_pair("tag", tag);
        Ok(url)
    }

    /// Whether a pagination link stays on the API origin. Listing requests
    /// carry the bearer token.
    fn is_same_origin(&self, candidate: &Url) -> bool {
        let same = candidate.origin() == self.base_url.origin();
        if !same {
            tracing::warn!(url = %candidate, "ignoring device listing link to another origin");
        }
        same
    }

    fn classify_transport(&self, err: &reqwest::Error) -> ExecutionError {
        if err.is_timeout() {
            ExecutionError::Timeout {
                after: self.call_timeout,
            }
        } else {
            ExecutionError::Transport {
                detail: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl DeviceDirectory for WebexClient {
    async fn devices_with_tag(&self, tag: &str) -> XapiResult<Vec<Device>> {
        let mut devices = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.devices_url(tag)?);

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!(
                    url = %url,
                    "device listing links back to a visited page; stopping"
                );
                break;
            }
            tracing::debug!(url = %url, "listing devices");
            let response = self
                .client
                .get(url.clone())
                .header(AUTHORIZATION, self.token.bearer())
                .send()
                .await
                .map_err(XapiError::directory)?;

            let status = response.status();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                let (_, message) = error_message(response).await;
                return Err(XapiError::Authentication {
                    detail: format!("{message} (status {status})"),
                });
            }
            if !status.is_success() {
                let (_, message) = error_message(response).await;
                return Err(XapiError::directory(format!(
                    "{message} (status {status})"
                )));
            }

            next = next_link(response.headers())
                .filter(|candidate| self.is_same_origin(candidate));
            let page = response
                .json::<DeviceListResponse>()
                .await
                .map_err(XapiError::directory)?;
            devices.extend(page.items.into_iter().map(Device::from));
        }

        Ok(devices)
    }
}

#[async_trait]
impl CommandTransport for WebexClient {
    async fn execute(
        &self,
        device: &Device,
        request: &CommandRequest,
    ) -> Result<Value, ExecutionError> {
        let url = self
            .base_url
            .join(&format!("xapi/command/{}", request.path()))
            .map_err(|err| ExecutionError::Transport {
                detail: format!("invalid command URL: {err}"),
            })?;

        let payload = CommandPayload {
            device_id: &device.id,
            arguments: request
                .arguments()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.token.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.classify_transport(&err))?;

        let status = response.status();
        if !status.is_success() {
            let (_, message) = error_message(response).await;
            return Err(ExecutionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.classify_transport(&err))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|err| ExecutionError::InvalidResponse {
            detail: err.to_string(),
        })
    }
}

/// Find the `rel="next"` target in RFC 8288 `Link` headers.
fn next_link(headers: &HeaderMap) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|entry| {
            let (target, params) = entry.split_once(';')?;
            let is_next = params.split(';').any(|param| {
                let param = param.trim();
                param == r#"rel="next""# || param == "rel=next"
            });
            if !is_next {
                return None;
            }
            target
                .trim()
                .strip_prefix('<')?
                .strip_suffix('>')?
                .parse()
                .ok()
        })
}
