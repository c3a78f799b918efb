//! A crate with utilities useful for testing
//!
//! The mocks here stand in for real sensors by delivering attribute reports
//! through the hub's [RuntimeHandle], shaped exactly like the reports the
//! mesh runtime would deliver for the matching hardware.

use log::debug;
use zigbee::RuntimeHandle;
use zigbee::report::{
    ATTR_ON_OFF, ATTR_SCENE_COUNT, AttributeReport, AttributeValue, GEN_ON_OFF,
};

/// A mock Xiaomi wireless switch
pub struct MockWirelessSwitch {
    name: String,
    handle: RuntimeHandle,
}

impl MockWirelessSwitch {
    /// Create a mock switch which reports under the given device name
    pub fn new(handle: &RuntimeHandle, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: handle.clone(),
        }
    }

    /// Report a raw code on the press-count attribute
    pub async fn report(&self, code: u8) {
        debug!("mock switch {} reports {code}", self.name);
        self.handle
            .deliver(AttributeReport {
                device: self.name.clone(),
                endpoint: 0,
                cluster: GEN_ON_OFF,
                attribute: ATTR_SCENE_COUNT,
                value: AttributeValue::Unsigned(u64::from(code)),
            })
            .await
            .expect("failed to deliver report");
    }

    /// Report the key being pressed the given number of times
    pub async fn press_times(&self, count: u8) {
        self.report(count).await;
    }

    /// Report the press edge that starts a hold cycle, a deasserted on/off
    /// attribute
    pub async fn key_down(&self) {
        debug!("mock switch {} reports key down", self.name);
        self.on_off(false).await;
    }

    /// Report the release edge the hardware sends after a held key, it shows
    /// up as a literal code 1
    pub async fn key_up(&self) {
        debug!("mock switch {} reports key up", self.name);
        self.on_off(true).await;
    }

    async fn on_off(&self, released: bool) {
        self.handle
            .deliver(AttributeReport {
                device: self.name.clone(),
                endpoint: 0,
                cluster: GEN_ON_OFF,
                attribute: ATTR_ON_OFF,
                value: AttributeValue::Bool(released),
            })
            .await
            .expect("failed to deliver report");
    }
}

/// A mock Aqara door/window sensor
pub struct MockDoorSensor {
    name: String,
    handle: RuntimeHandle,
}

impl MockDoorSensor {
    /// Create a mock sensor which reports under the given device name
    pub fn new(handle: &RuntimeHandle, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: handle.clone(),
        }
    }

    /// Report the contact opening or closing
    pub async fn set_contact(&self, open: bool) {
        debug!("mock door sensor {} reports open={open}", self.name);
        self.handle
            .deliver(AttributeReport {
                device: self.name.clone(),
                endpoint: 0,
                cluster: GEN_ON_OFF,
                attribute: ATTR_ON_OFF,
                value: AttributeValue::Bool(open),
            })
            .await
            .expect("failed to deliver report");
    }

    /// Report the door opening
    pub async fn open(&self) {
        self.set_contact(true).await;
    }

    /// Report the door closing
    pub async fn close(&self) {
        self.set_contact(false).await;
    }
}
