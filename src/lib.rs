//! A home-automation hub for battery-powered zigbee sensors
//!
//! The hub pairs sensor drivers (a wireless switch and a door/window
//! contact sensor) with automations: the drivers translate raw attribute
//! reports into application events and the [manager](manager::Manager)
//! feeds those events into [automations](automation::Automation).
//!
//! ```no_run
//! use sensor_hub::automation::Automation;
//! use sensor_hub::manager::Manager;
//! use sensor_hub::zigbee::devices::xiaomi::{WirelessSwitch, WirelessSwitchArgs};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = Manager::builder()
//!     .add_device_manager(sensor_hub::zigbee::Manager::default())
//!     .build();
//! let switch: WirelessSwitch = manager
//!     .add_device(WirelessSwitchArgs {
//!         name: "bedroom_switch".to_string(),
//!         hold_threshold: None,
//!     })
//!     .await?;
//! let scenes = Automation::new("scenes", switch.gestures(), async |event| {
//!     println!("{event}");
//!     Ok::<(), String>(())
//! });
//! manager.start([scenes]).await;
//! # Ok(())
//! # }
//! ```

pub use control::*;

#[cfg(feature = "zigbee")]
/// Zigbee sensor support
pub mod zigbee {
    pub use ::zigbee::*;
}
