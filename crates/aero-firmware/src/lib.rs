//! ESP32-S3 firmware-specific modules for aero-rs
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: peripheral bring-up, the I2C sensor and touch drivers, Wi-Fi and
//! NTP bootstrap, and the embassy tasks that drive the core pipeline.

#![no_std]

extern crate alloc;

pub mod display;
pub mod i2c;
pub mod net;
pub mod sensors;
pub mod tasks;
pub mod touch;

use aero_core::config::{Config, InternetConfig};

/// Site-specific settings. Edit the credentials and telemetry keys before
/// flashing; everything else carries the device defaults.
pub fn device_config() -> Config<'static> {
    Config {
        internet: InternetConfig {
            ssid: "yourssid",
            password: "password",
        },
        ..Default::default()
    }
}
