//! Replays a short interaction against a wireless switch and prints the
//! classified scene gestures. The replay task plays the role of the host
//! mesh runtime by delivering raw attribute reports.

use log::Level;
use sensor_hub::automation::Automation;
use sensor_hub::manager::Manager;
use sensor_hub::zigbee::devices::xiaomi::{WirelessSwitch, WirelessSwitchArgs};
use sensor_hub::zigbee::report::{
    ATTR_ON_OFF, ATTR_SCENE_COUNT, AttributeReport, AttributeValue, GEN_ON_OFF,
};
use simple_log::LogConfigBuilder;
use std::time::Duration;
use tokio::time::sleep;

const DEVICE: &str = "demo_switch";

#[tokio::main]
async fn main() {
    simple_log::new(
        LogConfigBuilder::builder()
            .level(Level::Warn)
            .unwrap()
            .output_console()
            .build(),
    )
    .expect("failed to start logger");

    let mut manager = Manager::builder()
        .add_device_manager(sensor_hub::zigbee::Manager::default())
        .build();
    let handle = manager
        .device_manager::<sensor_hub::zigbee::Manager>()
        .expect("zigbee manager missing")
        .handle();
    let switch: WirelessSwitch = manager
        .add_device(WirelessSwitchArgs {
            name: DEVICE.to_string(),
            hold_threshold: Some(Duration::from_millis(400)),
        })
        .await
        .expect("failed to create switch");

    let scenes = Automation::new("print scenes", switch.gestures(), async |event| {
        println!("{event}");
        Ok::<(), String>(())
    });
    drop(switch);

    let replay = tokio::spawn(async move {
        // double press, then a held key
        scene_count(&handle, 2).await;
        sleep(Duration::from_millis(200)).await;
        on_off(&handle, false).await;
        sleep(Duration::from_millis(700)).await;
        on_off(&handle, true).await;
        sleep(Duration::from_millis(200)).await;
        // dropping the handle shuts the hub down
    });

    manager.start([scenes]).await;
    replay.await.expect("replay task failed");
}

async fn scene_count(handle: &sensor_hub::zigbee::RuntimeHandle, count: u8) {
    handle
        .deliver(AttributeReport {
            device: DEVICE.to_string(),
            endpoint: 0,
            cluster: GEN_ON_OFF,
            attribute: ATTR_SCENE_COUNT,
            value: AttributeValue::Unsigned(u64::from(count)),
        })
        .await
        .expect("failed to deliver report");
}

async fn on_off(handle: &sensor_hub::zigbee::RuntimeHandle, released: bool) {
    handle
        .deliver(AttributeReport {
            device: DEVICE.to_string(),
            endpoint: 0,
            cluster: GEN_ON_OFF,
            attribute: ATTR_ON_OFF,
            value: AttributeValue::Bool(released),
        })
        .await
        .expect("failed to deliver report");
}
