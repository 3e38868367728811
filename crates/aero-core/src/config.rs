//! Compile-time appliance configuration.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub time: TimeConfig<'a>,
    pub telemetry: TelemetryConfig<'a>,
    pub sensing: SensingConfig,
    pub display: DisplayConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TimeConfig<'a> {
    pub ntp_server: &'a str,
    /// Local offset from UTC in seconds.
    pub utc_offset_secs: i32,
}

impl Default for TimeConfig<'_> {
    fn default() -> Self {
        Self {
            ntp_server: "ntp.nict.jp",
            utc_offset_secs: 9 * 3600,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TelemetryConfig<'a> {
    pub channel_id: u32,
    pub write_key: &'a str,
    pub upload_period_secs: u32,
}

impl Default for TelemetryConfig<'_> {
    fn default() -> Self {
        Self {
            channel_id: 0,
            write_key: "",
            upload_period_secs: 300,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct SensingConfig {
    pub sample_period_secs: u32,
    /// Sea-level reference pressure for the altitude derivation, hPa.
    pub sea_level_hpa: f32,
    /// Additive correction for enclosure self-heating, °C.
    pub temperature_offset_c: f32,
    /// Additive humidity correction, %.
    pub humidity_offset_pct: f32,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            sample_period_secs: 10,
            sea_level_hpa: crate::sample::SEA_LEVEL_PRESSURE_HPA,
            temperature_offset_c: 0.0,
            humidity_offset_pct: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct DisplayConfig {
    pub dim_timeout_secs: u32,
    pub active_brightness: u8,
    pub dimmed_brightness: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            dim_timeout_secs: crate::power::DIM_TIMEOUT_SECS as u32,
            active_brightness: crate::power::BRIGHTNESS_ACTIVE,
            dimmed_brightness: crate::power::BRIGHTNESS_DIMMED,
        }
    }
}
