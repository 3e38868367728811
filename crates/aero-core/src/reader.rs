//! Sensor traits and the combined environment reader.
//!
//! The two driver-facing traits are the seam between this crate and the
//! hardware: firmware implements them over the real I2C drivers, the
//! simulator over a synthetic generator. [`EnvironmentReader`] runs one
//! measurement cycle across both, applies the enclosure offsets, derives
//! altitude, and emits the per-cycle diagnostic log line.

use log::{info, warn};
use thiserror_no_std::Error;

use crate::config::SensingConfig;
use crate::sample::{EnvironmentSample, altitude_from_pressure};

/// Error from a sensor driver, with enough context to identify the failing
/// device and operation in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} {operation} failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} timed out waiting for {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// Raw readings from the climate sensor, before any offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReadings {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_hpa: f32,
    /// Gas sensor resistance in Ω.
    pub gas_ohm: f32,
}

/// Readings from the air quality sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirQualityReadings {
    pub eco2_ppm: u16,
    pub tvoc_ppb: u16,
}

/// Temperature/humidity/pressure/gas sensor (BME680 class).
pub trait ClimateSensor {
    async fn read(&mut self) -> Result<ClimateReadings, SensorError>;
}

/// eCO₂/TVOC sensor (CCS811 class).
///
/// The ambient temperature and humidity from the climate sensor are passed in
/// so the driver can apply environmental compensation.
pub trait AirQualitySensor {
    async fn read(
        &mut self,
        temperature_c: f32,
        humidity_pct: f32,
    ) -> Result<AirQualityReadings, SensorError>;
}

/// Runs one measurement cycle across both sensors.
///
/// A failed driver read is logged and the previous cycle's values are carried
/// forward unchanged; the caller always gets a complete sample. The renderer
/// therefore shows stale numbers rather than a gap when a sensor misbehaves.
pub struct EnvironmentReader<C, A> {
    climate: C,
    air_quality: A,
    temperature_offset_c: f32,
    humidity_offset_pct: f32,
    sea_level_hpa: f32,
    last: EnvironmentSample,
}

impl<C: ClimateSensor, A: AirQualitySensor> EnvironmentReader<C, A> {
    pub fn new(climate: C, air_quality: A, sensing: &SensingConfig) -> Self {
        Self {
            climate,
            air_quality,
            temperature_offset_c: sensing.temperature_offset_c,
            humidity_offset_pct: sensing.humidity_offset_pct,
            sea_level_hpa: sensing.sea_level_hpa,
            last: EnvironmentSample::ZERO,
        }
    }

    /// Read both sensors and return the new sample.
    ///
    /// `timestamp` is the capture time in unix seconds (zero before time
    /// sync); it is stamped on the sample even when a read fails.
    pub async fn sample(&mut self, timestamp: u32) -> EnvironmentSample {
        match self.climate.read().await {
            Ok(r) => {
                self.last.temperature_c = r.temperature_c + self.temperature_offset_c;
                self.last.humidity_pct = r.humidity_pct + self.humidity_offset_pct;
                self.last.pressure_hpa = r.pressure_hpa;
                self.last.gas_kohm = r.gas_ohm / 1000.0;
                self.last.altitude_m = altitude_from_pressure(r.pressure_hpa, self.sea_level_hpa);
            }
            Err(e) => warn!("climate sensor read failed, keeping previous values: {}", e),
        }

        // Compensation uses the raw (offset-free) ambient values.
        let raw_temperature = self.last.temperature_c - self.temperature_offset_c;
        let raw_humidity = self.last.humidity_pct - self.humidity_offset_pct;
        match self.air_quality.read(raw_temperature, raw_humidity).await {
            Ok(r) => {
                self.last.eco2_ppm = r.eco2_ppm;
                self.last.tvoc_ppb = r.tvoc_ppb;
            }
            Err(e) => warn!("air quality sensor read failed, keeping previous values: {}", e),
        }

        self.last.timestamp = timestamp;

        info!(
            "T:{:5.2}*C H:{:5.2}% P:{:7.2}hPa A:{:7.2}m G:{:6.1}KOhms TVOC:{:6}ppb CO2:{:6}ppm",
            self.last.temperature_c,
            self.last.humidity_pct,
            self.last.pressure_hpa,
            self.last.altitude_m,
            self.last.gas_kohm,
            self.last.tvoc_ppb,
            self.last.eco2_ppm,
        );

        self.last
    }

    /// Last complete sample, without touching the hardware.
    pub fn last(&self) -> EnvironmentSample {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    struct ScriptedClimate {
        reading: ClimateReadings,
        fail: bool,
    }

    impl ClimateSensor for ScriptedClimate {
        async fn read(&mut self) -> Result<ClimateReadings, SensorError> {
            if self.fail {
                Err(SensorError::ReadFailed {
                    sensor: "BME680",
                    operation: "forced measurement",
                    details: "scripted failure",
                })
            } else {
                Ok(self.reading)
            }
        }
    }

    struct ScriptedAirQuality {
        reading: AirQualityReadings,
        fail: bool,
        seen_temperature: Option<f32>,
    }

    impl AirQualitySensor for ScriptedAirQuality {
        async fn read(
            &mut self,
            temperature_c: f32,
            _humidity_pct: f32,
        ) -> Result<AirQualityReadings, SensorError> {
            self.seen_temperature = Some(temperature_c);
            if self.fail {
                Err(SensorError::ReadFailed {
                    sensor: "CCS811",
                    operation: "data read",
                    details: "scripted failure",
                })
            } else {
                Ok(self.reading)
            }
        }
    }

    fn reader(
        climate_fail: bool,
        air_fail: bool,
    ) -> EnvironmentReader<ScriptedClimate, ScriptedAirQuality> {
        let climate = ScriptedClimate {
            reading: ClimateReadings {
                temperature_c: 21.5,
                humidity_pct: 48.0,
                pressure_hpa: 1005.0,
                gas_ohm: 52_300.0,
            },
            fail: climate_fail,
        };
        let air = ScriptedAirQuality {
            reading: AirQualityReadings {
                eco2_ppm: 650,
                tvoc_ppb: 12,
            },
            fail: air_fail,
            seen_temperature: None,
        };
        EnvironmentReader::new(climate, air, &SensingConfig::default())
    }

    #[test]
    fn successful_cycle_fills_every_field() {
        let mut r = reader(false, false);
        let sample = block_on(r.sample(1_000));

        assert_eq!(sample.temperature_c, 21.5);
        assert_eq!(sample.humidity_pct, 48.0);
        assert_eq!(sample.pressure_hpa, 1005.0);
        assert!((sample.gas_kohm - 52.3).abs() < 1e-3);
        assert!(sample.altitude_m > 0.0);
        assert_eq!(sample.eco2_ppm, 650);
        assert_eq!(sample.tvoc_ppb, 12);
        assert_eq!(sample.timestamp, 1_000);
    }

    #[test]
    fn offsets_are_applied_to_the_sample_but_not_to_compensation() {
        let mut sensing = SensingConfig::default();
        sensing.temperature_offset_c = -1.5;
        sensing.humidity_offset_pct = 2.0;

        let climate = ScriptedClimate {
            reading: ClimateReadings {
                temperature_c: 20.0,
                humidity_pct: 50.0,
                pressure_hpa: 1013.25,
                gas_ohm: 10_000.0,
            },
            fail: false,
        };
        let air = ScriptedAirQuality {
            reading: AirQualityReadings {
                eco2_ppm: 400,
                tvoc_ppb: 0,
            },
            fail: false,
            seen_temperature: None,
        };
        let mut r = EnvironmentReader::new(climate, air, &sensing);
        let sample = block_on(r.sample(0));

        assert_eq!(sample.temperature_c, 18.5);
        assert_eq!(sample.humidity_pct, 52.0);
        // The air quality driver must see the uncorrected ambient value.
        assert_eq!(r.air_quality.seen_temperature, Some(20.0));
    }

    #[test]
    fn failed_climate_read_carries_previous_values_forward() {
        let mut r = reader(false, false);
        let first = block_on(r.sample(10));

        r.climate.fail = true;
        r.climate.reading.temperature_c = 99.0;
        let second = block_on(r.sample(20));

        assert_eq!(second.temperature_c, first.temperature_c);
        assert_eq!(second.pressure_hpa, first.pressure_hpa);
        assert_eq!(second.timestamp, 20);
    }

    #[test]
    fn failed_air_quality_read_keeps_climate_fresh() {
        let mut r = reader(false, false);
        block_on(r.sample(10));

        r.air_quality.fail = true;
        r.climate.reading.temperature_c = 25.0;
        let second = block_on(r.sample(20));

        assert_eq!(second.temperature_c, 25.0);
        assert_eq!(second.eco2_ppm, 650);
    }

    #[test]
    fn sample_before_any_success_is_zeroed_but_stamped() {
        let mut r = reader(true, true);
        let sample = block_on(r.sample(42));
        assert_eq!(sample.temperature_c, 0.0);
        assert_eq!(sample.eco2_ppm, 0);
        assert_eq!(sample.timestamp, 42);
    }
}
