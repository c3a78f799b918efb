//! Devices and related types

use crate::manager::{DeviceManager, DeviceManagerNotFound, Manager};
use thiserror::Error;

/// This is a set of devices which can be created together using
/// [`Manager::create`]
///
/// Implementors hold one field per device and create them in order from the
/// manager, failing fast on the first device that cannot be created
pub trait DeviceSet: Sized {
    /// Create a new device set from the manager
    async fn new(manager: &mut Manager) -> Result<Self, CreateDeviceError>;
}

/// A Device which can be used in the sensor_hub system
pub trait Device: Sized {
    /// Creation args needed to create this device
    type Args;
    /// The manager type that this device needs
    type Manager: DeviceManager;

    /// creates the device
    async fn new(manager: &mut Self::Manager, args: Self::Args) -> anyhow::Result<Self>;
}

/// This error occurs when a device creation failed
#[derive(Debug, Error)]
pub enum CreateDeviceError {
    /// The appropriate device manager was not found
    #[error(transparent)]
    ManagerNotFound(#[from] DeviceManagerNotFound),
    /// The Device creation failed with a device-specific error
    #[error(transparent)]
    Device(#[from] anyhow::Error),
}
