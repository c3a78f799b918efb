use crate::attribute::SubscribeAttr;
use crate::node::{Endpoint, NodeDescriptor};
use crate::report::{
    ATTR_ON_OFF, ATTR_SCENE_COUNT, AttributeValue, GEN_BASIC, GEN_GROUPS, GEN_IDENTIFY,
    GEN_LEVEL_CTRL, GEN_ON_OFF, GEN_OTA, GEN_SCENES, MANU_SPECIFIC, ReportBinding, ReportConfig,
};
use bon::bon;
use control::device::Device;
use control::gesture::{DEFAULT_HOLD_THRESHOLD, GestureConfig, GestureEvent};
use control::{Sensor, StreamCustomExt};
use futures::Stream;
use futures::StreamExt;
use futures::stream::select;
use std::time::Duration;
use tracing::debug;

const NODE: NodeDescriptor = NodeDescriptor {
    model: "lumi.sensor_switch",
    battery: true,
    endpoints: &[Endpoint {
        id: 0,
        clusters: &[
            GEN_BASIC,
            GEN_IDENTIFY,
            GEN_GROUPS,
            GEN_SCENES,
            GEN_ON_OFF,
            GEN_LEVEL_CTRL,
            GEN_OTA,
            MANU_SPECIFIC,
        ],
    }],
};

/// Xiaomi wireless mini switch (`lumi.sensor_switch`)
///
/// A single-key battery switch. The key reports press counts of one to four
/// on the manufacturer specific `0x8000` attribute and press/release edges
/// on the standard on/off attribute; [`WirelessSwitch::gestures`] classifies
/// both into scene gestures
///
/// See [zigbee2mqtt.io](https://www.zigbee2mqtt.io/devices/WXKG01LM.html)
/// for more information
#[derive(Clone)]
pub struct WirelessSwitch {
    name: String,
    hold_threshold: Duration,
    scene: SubscribeAttr<u8>,
    on_off: SubscribeAttr<u8>,
}

/// Creation arguments for a [WirelessSwitch]
#[derive(Debug, Clone)]
pub struct WirelessSwitchArgs {
    /// friendly name of the node
    pub name: String,
    /// how long the key must stay down before "Key Held Down" is emitted,
    /// [None] keeps the 1000 ms default
    pub hold_threshold: Option<Duration>,
}

#[bon]
impl WirelessSwitch {
    #[builder]
    #[allow(missing_docs, reason = "This item is hidden since it's only intended for use in device sets")]
    #[doc(hidden)]
    pub async fn create(
        name: String,
        hold_threshold: Option<Duration>,
        manager: &mut crate::Manager,
    ) -> anyhow::Result<Self> {
        <Self as Device>::new(manager, WirelessSwitchArgs { name, hold_threshold }).await
    }
}

impl Device for WirelessSwitch {
    type Args = WirelessSwitchArgs;
    type Manager = crate::Manager;

    async fn new(manager: &mut crate::Manager, args: WirelessSwitchArgs) -> anyhow::Result<Self> {
        let WirelessSwitchArgs { name, hold_threshold } = args;
        NODE.log(&name);
        let scene = SubscribeAttr::new(
            manager.subscribe(
                ReportBinding {
                    device: name.clone(),
                    endpoint: 0,
                    cluster: GEN_ON_OFF,
                    attribute: ATTR_SCENE_COUNT,
                },
                ReportConfig::sensor_default(),
            ),
            scene_code,
        );
        let on_off = SubscribeAttr::new(
            manager.subscribe(
                ReportBinding {
                    device: name.clone(),
                    endpoint: 0,
                    cluster: GEN_ON_OFF,
                    attribute: ATTR_ON_OFF,
                },
                ReportConfig::sensor_default(),
            ),
            scene_code,
        );
        debug!(device = %name, "wireless switch ready");
        Ok(Self {
            name,
            hold_threshold: hold_threshold.unwrap_or(DEFAULT_HOLD_THRESHOLD),
            scene,
            on_off,
        })
    }
}

impl WirelessSwitch {
    /// raw press-count codes from the `0x8000` attribute
    pub fn scene_codes<'a>(&'a self) -> &'a (impl Sensor<Item = u8> + Send + Sync + Clone + use<>) {
        &self.scene
    }

    /// raw press/release codes from the on/off attribute
    pub fn on_off<'a>(&'a self) -> &'a (impl Sensor<Item = u8> + Send + Sync + Clone + use<>) {
        &self.on_off
    }

    /// The configured hold threshold
    pub fn hold_threshold(&self) -> Duration {
        self.hold_threshold
    }

    /// Classified gestures from the switch key, tagged with this device's
    /// name
    ///
    /// Both attribute registrations feed one classifier, every call creates
    /// an independent classifier instance and the returned stream stays
    /// alive for as long as the report routing does
    pub fn gestures(&self) -> impl Stream<Item = GestureEvent> + Unpin + Send + use<> {
        let device = self.name.clone();
        let config = GestureConfig {
            hold_threshold: self.hold_threshold,
            ..Default::default()
        };
        select(self.scene.stream(), self.on_off.stream())
            .classify_gestures(config)
            .map(move |gesture| GestureEvent {
                device: device.clone(),
                gesture,
            })
    }
}

/// Both gesture attributes carry small integers, the on/off attribute shows
/// up as a boolean on some firmware revisions
fn scene_code(value: AttributeValue) -> Option<u8> {
    match value {
        AttributeValue::Bool(released) => Some(u8::from(released)),
        AttributeValue::Unsigned(code) => u8::try_from(code).ok(),
        AttributeValue::Signed(code) => u8::try_from(code).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_codes_decode_reported_shapes() {
        assert_eq!(scene_code(AttributeValue::Unsigned(2)), Some(2));
        assert_eq!(scene_code(AttributeValue::Unsigned(17)), Some(17));
        assert_eq!(scene_code(AttributeValue::Bool(false)), Some(0));
        assert_eq!(scene_code(AttributeValue::Bool(true)), Some(1));
        assert_eq!(scene_code(AttributeValue::Unsigned(1000)), None);
        assert_eq!(scene_code(AttributeValue::Signed(-1)), None);
    }
}
