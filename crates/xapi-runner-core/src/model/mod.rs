//! Device, command, and outcome types shared across the workspace.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::ExecutionError;

/// Device registered with the Webex cloud, as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Opaque device identifier.
    pub id: String,
    /// Human-readable name shown in reports.
    pub display_name: String,
    /// Free-text labels attached to the device.
    pub tags: BTreeSet<String>,
}

impl Device {
    /// Construct a device from its identifier, name, and tags.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, display_name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the device carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Parsed xAPI command: a dot-delimited path plus named arguments.
///
/// Built by [`crate::command::parse_command`] and never mutated afterwards.
/// Arguments supplied as `Key:Value` tokens are always JSON strings; the JSON
/// object form keeps whatever types the caller wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub(crate) path: String,
    pub(crate) arguments: BTreeMap<String, Value>,
}

impl CommandRequest {
    /// Dot-delimited command path, e.g. `Audio.Volume.Set`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Named arguments forwarded with the command.
    #[must_use]
    pub const fn arguments(&self) -> &BTreeMap<String, Value> {
        &self.arguments
    }

    /// Look up a single argument value.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }
}

impl Display for CommandRequest {
    /// Canonical `Path Key:Value ...` rendering with keys in sorted order.
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.path)?;
        for (key, value) in &self.arguments {
            match value {
                Value::String(text) => write!(formatter, " {key}:{text}")?,
                other => write!(formatter, " {key}:{other}")?,
            }
        }
        Ok(())
    }
}

/// Final status of one device execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The API accepted and executed the command.
    Succeeded,
    /// The call failed, timed out, or was rejected.
    Failed,
}

impl OutcomeStatus {
    /// Lowercase label used in text output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Result of attempting the command on one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    /// Identifier of the device the command was sent to.
    pub device_id: String,
    /// Display name of that device.
    pub device_name: String,
    /// Whether the command succeeded.
    pub status: OutcomeStatus,
    /// Response payload returned by the API on success.
    pub response: Option<Value>,
    /// Error description on failure.
    pub error: Option<String>,
    /// When the outcome was recorded.
    pub completed_at: DateTime<Utc>,
}

impl ExecutionOutcome {
    /// Record a successful execution.
    #[must_use]
    pub fn succeeded(device: &Device, response: Value) -> Self {
        Self {
            device_id: device.id.clone(),
            device_name: device.display_name.clone(),
            status: OutcomeStatus::Succeeded,
            response: Some(response),
            error: None,
            completed_at: Utc::now(),
        }
    }

    /// Record a failed execution.
    #[must_use]
    pub fn failed(device: &Device, error: &ExecutionError) -> Self {
        Self {
            device_id: device.id.clone(),
            device_name: device.display_name.clone(),
            status: OutcomeStatus::Failed,
            response: None,
            error: Some(error.to_string()),
            completed_at: Utc::now(),
        }
    }

    /// Whether this outcome counts as a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}
