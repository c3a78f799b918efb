//! Watches a mocked door sensor and reacts to the door opening.

use futures::StreamExt;
use log::Level;
use sensor_hub::automation::Automation;
use sensor_hub::manager::Manager;
use sensor_hub::zigbee::devices::aqara::DoorWindowSensor;
use sensor_hub::{ContactState, StreamCustomExt};
use simple_log::LogConfigBuilder;
use std::time::Duration;
use testing::MockDoorSensor;
use tokio::time::sleep;

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
    let zigbee = manager
        .device_manager::<sensor_hub::zigbee::Manager>()
        .expect("zigbee manager missing");
    let handle = zigbee.handle();
    let door = DoorWindowSensor::create()
        .name("front_door".to_string())
        .manager(zigbee)
        .call()
        .await
        .expect("failed to create sensor");

    let openings = door.events().map(|event| event.state).filter_eq(ContactState::Open);
    let automation = Automation::new("door opened", openings, async |_| {
        println!("the front door just opened");
        Ok::<(), String>(())
    });
    drop(door);

    let mock = MockDoorSensor::new(&handle, "front_door");
    drop(handle);
    let replay = tokio::spawn(async move {
        mock.open().await;
        sleep(Duration::from_millis(100)).await;
        mock.close().await;
        sleep(Duration::from_millis(100)).await;
        mock.open().await;
    });

    manager.start([automation]).await;
    replay.await.expect("replay task failed");
}
