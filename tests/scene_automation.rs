#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic, reason = "Panics are forgivable while testing")]
//! Working end-to-end tests which mock the sensors behind the report runtime
//!
//! These drive the full path: mock reports -> routing -> driver streams ->
//! automations, including the per-device classifier state regression.

use control::device::{CreateDeviceError, DeviceSet};
use log::Level;
use sensor_hub::automation::Automation;
use sensor_hub::manager::Manager;
use sensor_hub::zigbee::devices::aqara::DoorWindowSensor;
use sensor_hub::zigbee::devices::xiaomi::{WirelessSwitch, WirelessSwitchArgs};
use simple_log::LogConfigBuilder;
use std::sync::Mutex;
use std::time::Duration;
use testing::{MockDoorSensor, MockWirelessSwitch};
use tokio::time::{sleep, timeout};

fn init_logging() {
    let _ = simple_log::new(
        LogConfigBuilder::builder()
            .level(Level::Debug)
            .unwrap()
            .output_console()
            .build(),
    );
}

fn hub_manager() -> Manager {
    Manager::builder()
        .add_device_manager(sensor_hub::zigbee::Manager::default())
        .build()
}

#[tokio::test]
async fn switch_scenes_trigger_automations() {
    init_logging();
    let mut manager = hub_manager();
    let handle = manager
        .device_manager::<sensor_hub::zigbee::Manager>()
        .unwrap()
        .handle();
    let switch: WirelessSwitch = manager
        .add_device(WirelessSwitchArgs {
            name: "bedroom_switch".to_string(),
            hold_threshold: Some(Duration::from_millis(100)),
        })
        .await
        .unwrap();

    let seen = Mutex::new(Vec::new());
    let automation = Automation::new("record scenes", switch.gestures(), async |event| {
        seen.lock().unwrap().push(event);
        Ok::<(), String>(())
    });
    drop(switch);

    let mock = MockWirelessSwitch::new(&handle, "bedroom_switch");
    drop(handle);

    let run = manager.start([automation]);
    let drive = async {
        mock.press_times(2).await;
        sleep(Duration::from_millis(50)).await;
        mock.press_times(3).await;
        sleep(Duration::from_millis(50)).await;
        mock.key_down().await;
        // let the hold confirmation fire
        sleep(Duration::from_millis(300)).await;
        mock.key_up().await;
        sleep(Duration::from_millis(50)).await;
        mock.press_times(4).await;
        drop(mock);
    };
    timeout(Duration::from_secs(10), futures::future::join(run, drive))
        .await
        .expect("hub did not shut down");

    let seen = seen.into_inner().unwrap();
    assert!(seen.iter().all(|event| event.device == "bedroom_switch"));
    let labels: Vec<_> = seen.iter().map(|event| event.gesture.scene_label()).collect();
    assert_eq!(
        labels,
        [
            "Key Pressed 2 times",
            "Key Pressed 3 times",
            "Key Held Down",
            "Key Released",
            "Key Pressed 4 times",
        ],
    );
}

/// Two switches must never observe each other's classifier state: the probe
/// press on the second switch resolves as a single press even though the
/// first switch is mid-hold, and it is not deduplicated against the first
/// switch's earlier identical code
#[tokio::test]
async fn switches_keep_independent_state() {
    init_logging();
    let mut manager = hub_manager();
    let handle = manager
        .device_manager::<sensor_hub::zigbee::Manager>()
        .unwrap()
        .handle();
    let left: WirelessSwitch = manager
        .add_device(WirelessSwitchArgs {
            name: "left_switch".to_string(),
            hold_threshold: Some(Duration::from_millis(100)),
        })
        .await
        .unwrap();
    let right: WirelessSwitch = manager
        .add_device(WirelessSwitchArgs {
            name: "right_switch".to_string(),
            hold_threshold: Some(Duration::from_millis(100)),
        })
        .await
        .unwrap();

    let seen_left = Mutex::new(Vec::new());
    let seen_right = Mutex::new(Vec::new());
    let automations = [
        Automation::new("record left", left.gestures(), async |event: control::gesture::GestureEvent| {
            seen_left.lock().unwrap().push(event.gesture.scene_label());
            Ok::<(), String>(())
        }),
        Automation::new("record right", right.gestures(), async |event: control::gesture::GestureEvent| {
            seen_right.lock().unwrap().push(event.gesture.scene_label());
            Ok::<(), String>(())
        }),
    ];
    drop(left);
    drop(right);

    let left_mock = MockWirelessSwitch::new(&handle, "left_switch");
    let right_mock = MockWirelessSwitch::new(&handle, "right_switch");
    drop(handle);

    let run = manager.start(automations);
    let drive = async {
        left_mock.press_times(1).await;
        left_mock.key_down().await;
        sleep(Duration::from_millis(300)).await;
        // the left switch is held right now, a plain "1" on the right switch
        // is still a single press
        right_mock.press_times(1).await;
        left_mock.key_up().await;
        sleep(Duration::from_millis(100)).await;
        drop(left_mock);
        drop(right_mock);
    };
    timeout(Duration::from_secs(10), futures::future::join(run, drive))
        .await
        .expect("hub did not shut down");

    assert_eq!(
        seen_left.into_inner().unwrap(),
        ["Key Pressed 1 time", "Key Held Down", "Key Released"],
    );
    assert_eq!(seen_right.into_inner().unwrap(), ["Key Pressed 1 time"]);
}

struct Devices {
    front_door: DoorWindowSensor,
}

impl DeviceSet for Devices {
    async fn new(manager: &mut Manager) -> Result<Self, CreateDeviceError> {
        Ok(Self {
            front_door: manager.add_device("front_door".to_string()).await?,
        })
    }
}

#[tokio::test]
async fn door_sensor_reports_contact_changes() {
    init_logging();
    let mut manager = hub_manager();
    let handle = manager
        .device_manager::<sensor_hub::zigbee::Manager>()
        .unwrap()
        .handle();
    let devices: Devices = manager.create().await.unwrap();

    let seen = Mutex::new(Vec::new());
    let automation = Automation::new("record contact", devices.front_door.events(), async |event| {
        seen.lock().unwrap().push(event);
        Ok::<(), String>(())
    });
    drop(devices);

    let mock = MockDoorSensor::new(&handle, "front_door");
    drop(handle);

    let run = manager.start([automation]);
    let drive = async {
        mock.open().await;
        sleep(Duration::from_millis(50)).await;
        mock.close().await;
        sleep(Duration::from_millis(50)).await;
        mock.open().await;
        drop(mock);
    };
    timeout(Duration::from_secs(10), futures::future::join(run, drive))
        .await
        .expect("hub did not shut down");

    let seen = seen.into_inner().unwrap();
    assert!(seen.iter().all(|event| event.device == "front_door"));
    let states: Vec<_> = seen.iter().map(|event| event.state.to_string()).collect();
    assert_eq!(states, ["open", "closed", "open"]);
}
