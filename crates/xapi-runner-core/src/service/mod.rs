//! Remote collaborators the runner depends on.
//!
//! The runner only needs two operations from the Webex API: listing devices by
//! tag and executing a command on one device. Transport, framing, and
//! authentication live in the implementations.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ExecutionError, XapiResult};
use crate::model::{CommandRequest, Device};

/// Device directory queried by tag.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Return every device whose tag set contains `tag`.
    ///
    /// Implementations report rejected credentials as
    /// [`crate::XapiError::Authentication`].
    async fn devices_with_tag(&self, tag: &str) -> XapiResult<Vec<Device>>;
}

/// Command endpoint for a single device.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Execute `request` on `device`, returning the API response payload.
    async fn execute(
        &self,
        device: &Device,
        request: &CommandRequest,
    ) -> Result<Value, ExecutionError>;
}

#[async_trait]
impl<T: DeviceDirectory + ?Sized> DeviceDirectory for std::sync::Arc<T> {
    async fn devices_with_tag(&self, tag: &str) -> XapiResult<Vec<Device>> {
        (**self).devices_with_tag(tag).await
    }
}

#[async_trait]
impl<T: CommandTransport + ?Sized> CommandTransport for std::sync::Arc<T> {
    async fn execute(
        &self,
        device: &Device,
        request: &CommandRequest,
    ) -> Result<Value, ExecutionError> {
        (**self).execute(device, request).await
    }
}
