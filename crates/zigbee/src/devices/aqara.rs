use crate::attribute::SubscribeAttr;
use crate::node::{Endpoint, NodeDescriptor};
use crate::report::{
    ATTR_ON_OFF, AttributeValue, GEN_BASIC, GEN_GROUPS, GEN_IDENTIFY, GEN_ON_OFF, MANU_SPECIFIC,
    ReportBinding, ReportConfig,
};
use bon::bon;
use control::device::Device;
use control::{ContactState, Sensor};
use futures::Stream;
use futures::StreamExt;
use std::fmt;
use tracing::debug;

// https://github.com/bspranger/Xiaomi/blob/master/devicetypes/a4refillpad/xiaomi-aqara-door-window-sensor.src/xiaomi-aqara-door-window-sensor.groovy
// inClusters: "0000, 0003", outClusters: "0000, 0004",
// manufacturer: "LUMI", model: "lumi.sensor_magnet.aq2"
const NODE: NodeDescriptor = NodeDescriptor {
    model: "lumi.sensor_magnet.aq2",
    battery: true,
    endpoints: &[Endpoint {
        id: 0,
        clusters: &[GEN_BASIC, GEN_IDENTIFY, GEN_GROUPS, GEN_ON_OFF, MANU_SPECIFIC],
    }],
};

/// Aqara door/window sensor (`lumi.sensor_magnet.aq2`)
///
/// Reports the contact state on the standard on/off attribute, an asserted
/// value means the magnet moved away and the door or window is open
#[derive(Clone)]
pub struct DoorWindowSensor {
    name: String,
    contact: SubscribeAttr<ContactState>,
}

/// A contact change together with the device that reported it
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEvent {
    /// Name of the owning device
    pub device: String,
    /// The reported contact state
    pub state: ContactState,
}

impl fmt::Display for ContactEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.device, self.state)
    }
}

#[bon]
impl DoorWindowSensor {
    #[builder]
    #[allow(missing_docs, reason = "This item is hidden since it's only intended for use in device sets")]
    #[doc(hidden)]
    pub async fn create(name: String, manager: &mut crate::Manager) -> anyhow::Result<Self> {
        <Self as Device>::new(manager, name).await
    }
}

impl Device for DoorWindowSensor {
    type Args = String;
    type Manager = crate::Manager;

    async fn new(manager: &mut crate::Manager, name: String) -> anyhow::Result<Self> {
        NODE.log(&name);
        let contact = SubscribeAttr::new(
            manager.subscribe(
                ReportBinding {
                    device: name.clone(),
                    endpoint: 0,
                    cluster: GEN_ON_OFF,
                    attribute: ATTR_ON_OFF,
                },
                ReportConfig::sensor_default(),
            ),
            contact_state,
        );
        debug!(device = %name, "door/window sensor ready");
        Ok(Self { name, contact })
    }
}

impl DoorWindowSensor {
    /// contact state reports from the sensor
    pub fn contact<'a>(&'a self) -> &'a (impl Sensor<Item = ContactState> + Send + Sync + Clone + use<>) {
        &self.contact
    }

    /// Contact changes tagged with this device's name, the returned stream
    /// stays alive for as long as the report routing does
    pub fn events(&self) -> impl Stream<Item = ContactEvent> + Unpin + Send + use<> {
        let device = self.name.clone();
        self.contact.stream().map(move |state| ContactEvent {
            device: device.clone(),
            state,
        })
    }
}

fn contact_state(value: AttributeValue) -> Option<ContactState> {
    match value {
        AttributeValue::Bool(true) | AttributeValue::Unsigned(1) => Some(ContactState::Open),
        AttributeValue::Bool(false) | AttributeValue::Unsigned(0) => Some(ContactState::Closed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_state_decodes_reported_shapes() {
        assert_eq!(contact_state(AttributeValue::Bool(true)), Some(ContactState::Open));
        assert_eq!(contact_state(AttributeValue::Bool(false)), Some(ContactState::Closed));
        assert_eq!(contact_state(AttributeValue::Unsigned(1)), Some(ContactState::Open));
        assert_eq!(contact_state(AttributeValue::Unsigned(0)), Some(ContactState::Closed));
        assert_eq!(contact_state(AttributeValue::Unsigned(2)), None);
        assert_eq!(contact_state(AttributeValue::Signed(-1)), None);
    }
}
