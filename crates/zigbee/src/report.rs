//! The attribute report data model delivered by the host mesh runtime

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A zigbee cluster identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub u16);

/// Basic device information cluster
pub const GEN_BASIC: ClusterId = ClusterId(0x0000);
/// Identify cluster
pub const GEN_IDENTIFY: ClusterId = ClusterId(0x0003);
/// Groups cluster
pub const GEN_GROUPS: ClusterId = ClusterId(0x0004);
/// Scenes cluster
pub const GEN_SCENES: ClusterId = ClusterId(0x0005);
/// On/off cluster, the one both supported sensors report on
pub const GEN_ON_OFF: ClusterId = ClusterId(0x0006);
/// Level control cluster
pub const GEN_LEVEL_CTRL: ClusterId = ClusterId(0x0008);
/// Over-the-air upgrade cluster
pub const GEN_OTA: ClusterId = ClusterId(0x0019);
/// Manufacturer specific cluster
pub const MANU_SPECIFIC: ClusterId = ClusterId(0xFF00);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GEN_BASIC => f.write_str("genBasic"),
            GEN_IDENTIFY => f.write_str("genIdentify"),
            GEN_GROUPS => f.write_str("genGroups"),
            GEN_SCENES => f.write_str("genScenes"),
            GEN_ON_OFF => f.write_str("genOnOff"),
            GEN_LEVEL_CTRL => f.write_str("genLevelCtrl"),
            GEN_OTA => f.write_str("genOta"),
            MANU_SPECIFIC => f.write_str("manuSpecificCluster"),
            ClusterId(other) => write!(f, "0x{other:04x}"),
        }
    }
}

/// A zigbee attribute identifier within a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeId(pub u16);

/// The standard on/off attribute of [GEN_ON_OFF]
pub const ATTR_ON_OFF: AttributeId = AttributeId(0x0000);
/// The manufacturer specific press-count attribute the wireless switch
/// reports scenes on
pub const ATTR_SCENE_COUNT: AttributeId = AttributeId(0x8000);

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ATTR_ON_OFF => f.write_str("onOff"),
            AttributeId(other) => write!(f, "0x{other:04x}"),
        }
    }
}

/// A single reported attribute value
///
/// The runtime delivers values already decoded from the wire, this enum only
/// distinguishes the shapes the supported sensors produce
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// a boolean attribute, eg: the on/off contact state
    Bool(bool),
    /// an unsigned attribute, eg: a press count
    Unsigned(u64),
    /// a signed attribute
    Signed(i64),
}

/// The error returned when a JSON payload does not hold a reportable value
#[derive(Debug, Error)]
#[error("unsupported attribute payload: {0}")]
pub struct UnsupportedValue(pub serde_json::Value);

impl TryFrom<serde_json::Value> for AttributeValue {
    type Error = UnsupportedValue;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match &value {
            serde_json::Value::Bool(flag) => Ok(Self::Bool(*flag)),
            serde_json::Value::Number(number) => number
                .as_u64()
                .map(Self::Unsigned)
                .or_else(|| number.as_i64().map(Self::Signed))
                .ok_or(UnsupportedValue(value)),
            _ => Err(UnsupportedValue(value)),
        }
    }
}

/// An unsolicited or periodic notification from a sensor that one of its
/// monitored attributes changed or refreshed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReport {
    /// friendly name of the reporting node
    pub device: String,
    /// endpoint the report originates from
    pub endpoint: u8,
    /// cluster the attribute belongs to
    pub cluster: ClusterId,
    /// the reported attribute
    pub attribute: AttributeId,
    /// the reported value
    pub value: AttributeValue,
}

/// The (device, endpoint, cluster, attribute) key a report listener is
/// registered for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportBinding {
    /// friendly name of the node
    pub device: String,
    /// endpoint to listen on
    pub endpoint: u8,
    /// cluster to listen on
    pub cluster: ClusterId,
    /// attribute to listen for
    pub attribute: AttributeId,
}

impl ReportBinding {
    pub(crate) fn matches(&self, report: &AttributeReport) -> bool {
        self.device == report.device
            && self.endpoint == report.endpoint
            && self.cluster == report.cluster
            && self.attribute == report.attribute
    }
}

/// Reporting parameters configured on the sensor when a listener registers
///
/// These shape how often reports arrive (at most once per change beyond
/// `min_change`, at least once per `max_interval`), they are recorded for
/// diagnostics and are a precondition of classification rather than
/// something this crate enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    /// minimum time between two reports
    pub min_interval: Duration,
    /// maximum time without a report before a periodic refresh
    pub max_interval: Duration,
    /// minimum change of the attribute value to trigger a report
    pub min_change: u64,
}

impl ReportConfig {
    /// The reporting parameters both sensor drivers register with
    pub const fn sensor_default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(3600),
            min_change: 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Panics are forgivable while testing")]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_convert() {
        assert_eq!(AttributeValue::try_from(json!(true)).unwrap(), AttributeValue::Bool(true));
        assert_eq!(AttributeValue::try_from(json!(17)).unwrap(), AttributeValue::Unsigned(17));
        assert_eq!(AttributeValue::try_from(json!(-4)).unwrap(), AttributeValue::Signed(-4));
        assert!(AttributeValue::try_from(json!("single")).is_err());
        assert!(AttributeValue::try_from(json!(1.5)).is_err());
    }

    #[test]
    fn bindings_match_on_all_fields() {
        let binding = ReportBinding {
            device: "bedroom_switch".to_string(),
            endpoint: 0,
            cluster: GEN_ON_OFF,
            attribute: ATTR_SCENE_COUNT,
        };
        let report = AttributeReport {
            device: "bedroom_switch".to_string(),
            endpoint: 0,
            cluster: GEN_ON_OFF,
            attribute: ATTR_SCENE_COUNT,
            value: AttributeValue::Unsigned(2),
        };
        assert!(binding.matches(&report));
        assert!(!binding.matches(&AttributeReport {
            device: "hallway_switch".to_string(),
            ..report.clone()
        }));
        assert!(!binding.matches(&AttributeReport {
            attribute: ATTR_ON_OFF,
            ..report
        }));
    }

    #[test]
    fn cluster_names_follow_the_node_tree() {
        assert_eq!(GEN_ON_OFF.to_string(), "genOnOff");
        assert_eq!(MANU_SPECIFIC.to_string(), "manuSpecificCluster");
        assert_eq!(ClusterId(0x0b05).to_string(), "0x0b05");
        assert_eq!(ATTR_SCENE_COUNT.to_string(), "0x8000");
        assert_eq!(ATTR_ON_OFF.to_string(), "onOff");
    }
}
