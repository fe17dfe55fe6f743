//! Sample devices mirroring what the Webex directory returns.

use xapi_runner_core::Device;

/// Tag shared by the two conference-room fixtures.
pub const CONFERENCE_ROOM_TAG: &str = "conference-room";

/// Build a device carrying the given tags.
#[must_use]
pub fn device(id: &str, name: &str, tags: &[&str]) -> Device {
    Device::new(id, name, tags.iter().copied())
}

/// `dev-1` and `dev-2`, both tagged [`CONFERENCE_ROOM_TAG`].
#[must_use]
pub fn conference_room_devices() -> Vec<Device> {
    vec![
        device("dev-1", "Board Room", &[CONFERENCE_ROOM_TAG]),
        device("dev-2", "Huddle Space", &[CONFERENCE_ROOM_TAG, "floor-2"]),
    ]
}
