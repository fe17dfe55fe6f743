//! Tag-based device resolution.

use tracing::{info, warn};

use crate::config::EmptyMatchPolicy;
use crate::error::{XapiError, XapiResult};
use crate::model::Device;
use crate::service::DeviceDirectory;

/// Resolves a tag to the devices a command should run on.
pub struct DeviceResolver<D> {
    directory: D,
    policy: EmptyMatchPolicy,
}

impl<D: DeviceDirectory> DeviceResolver<D> {
    /// Wrap a directory with the given empty-match policy.
    pub const fn new(directory: D, policy: EmptyMatchPolicy) -> Self {
        Self { directory, policy }
    }

    /// Query the directory once and keep the devices that carry `tag`.
    ///
    /// The directory result is filtered again locally so a directory that
    /// ignores the tag filter cannot widen the selection. Order is preserved.
    ///
    /// # Errors
    ///
    /// Propagates directory failures and returns
    /// [`XapiError::NoDevicesFound`] for an empty match under
    /// [`EmptyMatchPolicy::Fail`].
    pub async fn resolve(&self, tag: &str) -> XapiResult<Vec<Device>> {
        info!(tag, "fetching devices");
        let listed = self.directory.devices_with_tag(tag).await?;
        let listed_count = listed.len();
        let devices: Vec<Device> = listed
            .into_iter()
            .filter(|device| device.has_tag(tag))
            .collect();

        if devices.len() < listed_count {
            warn!(
                tag,
                dropped = listed_count - devices.len(),
                "directory returned devices without the requested tag"
            );
        }

        if devices.is_empty() {
            return match self.policy {
                EmptyMatchPolicy::Fail => Err(XapiError::NoDevicesFound {
                    tag: tag.to_string(),
                }),
                EmptyMatchPolicy::Allow => {
                    warn!(tag, "no devices matched; continuing with an empty run");
                    Ok(devices)
                }
            };
        }

        info!(tag, count = devices.len(), "resolved devices");
        Ok(devices)
    }
}
