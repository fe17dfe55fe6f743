//! Scripted fakes for the device directory and command transport.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use xapi_runner_core::{
    CommandRequest, CommandTransport, Device, DeviceDirectory, ExecutionError, XapiError,
    XapiResult,
};

/// Directory that answers every query with a fixed response.
pub enum ScriptedDirectory {
    /// Return these devices regardless of the tag.
    Devices(Vec<Device>),
    /// Reject the query as unauthorized.
    Unauthorized,
}

#[async_trait]
impl DeviceDirectory for ScriptedDirectory {
    async fn devices_with_tag(&self, _tag: &str) -> XapiResult<Vec<Device>> {
        match self {
            Self::Devices(devices) => Ok(devices.clone()),
            Self::Unauthorized => Err(XapiError::Authentication {
                detail: "the access token is invalid or expired".to_string(),
            }),
        }
    }
}

/// Behaviour of the transport for one device.
#[derive(Debug, Clone)]
pub enum DeviceScript {
    /// Respond with this payload.
    Respond(Value),
    /// Fail with this error.
    Fail(ExecutionError),
    /// Never answer within any reasonable timeout.
    Hang,
}

/// Transport that plays back per-device scripts and records call order.
///
/// Devices without a script succeed with `{"status": "OK"}`.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: HashMap<String, DeviceScript>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Transport where every device succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behaviour for `device_id`.
    #[must_use]
    pub fn with(mut self, device_id: &str, script: DeviceScript) -> Self {
        self.scripts.insert(device_id.to_string(), script);
        self
    }

    /// Device identifiers in the order they were contacted.
    ///
    /// # Panics
    ///
    /// Panics if a previous caller panicked while holding the call log.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

#[async_trait]
impl CommandTransport for ScriptedTransport {
    async fn execute(
        &self,
        device: &Device,
        _request: &CommandRequest,
    ) -> Result<Value, ExecutionError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(device.id.clone());
        match self.scripts.get(&device.id) {
            None => Ok(json!({"status": "OK"})),
            Some(DeviceScript::Respond(payload)) => Ok(payload.clone()),
            Some(DeviceScript::Fail(error)) => Err(error.clone()),
            Some(DeviceScript::Hang) => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Err(ExecutionError::Transport {
                    detail: "scripted hang finished".to_string(),
                })
            }
        }
    }
}
