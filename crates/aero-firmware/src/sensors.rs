//! Driver wrappers for the two environment sensors.
//!
//! Both wrappers adapt a blocking driver crate onto the core sensor traits
//! and fold driver-specific errors into [`SensorError`] with enough detail to
//! diagnose a flaky bus from the log. Construction doubles as the startup
//! probe: a sensor that does not answer here is fatal.

use aero_core::reader::{
    AirQualityReadings, AirQualitySensor, ClimateReadings, ClimateSensor, SensorError,
};
use bme680::{
    Bme680, I2CAddress, IIRFilterSize, OversamplingSetting, PowerMode, SettingsBuilder,
};
use core::fmt::Debug;
use core::time::Duration;
use embassy_time::Timer;
use embedded_ccs811::{Ccs811Awake, MeasurementMode, SlaveAddr, mode, prelude::*};
use embedded_hal::i2c::I2c;
use log::{error, info};

/// Heater profile from the device: 320 °C for 150 ms.
const GAS_HEATER_TEMP_C: u16 = 320;
const GAS_HEATER_DURATION_MS: u64 = 150;

/// BME680 behind the [`ClimateSensor`] trait.
///
/// Runs in forced mode: each read triggers one measurement and waits out the
/// sensor's own profile duration before collecting the data.
pub struct Bme680Climate<I2C> {
    bme: Bme680<I2C, embassy_time::Delay>,
    profile: Duration,
}

impl<I2C, E> Bme680Climate<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    /// Probe the sensor at its secondary address (0x77) and apply the
    /// oversampling, filter, and gas heater profile.
    pub fn new(i2c: I2C) -> Result<Self, SensorError> {
        let mut delay = embassy_time::Delay;
        let mut bme = Bme680::init(i2c, &mut delay, I2CAddress::Secondary).map_err(|e| {
            error!("BME680 probe failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: "BME680",
                details: "device not responding on the sensor bus",
            }
        })?;

        let settings = SettingsBuilder::new()
            .with_temperature_oversampling(OversamplingSetting::OS8x)
            .with_humidity_oversampling(OversamplingSetting::OS2x)
            .with_pressure_oversampling(OversamplingSetting::OS4x)
            .with_temperature_filter(IIRFilterSize::Size3)
            .with_gas_measurement(
                Duration::from_millis(GAS_HEATER_DURATION_MS),
                GAS_HEATER_TEMP_C,
                25,
            )
            .with_run_gas(true)
            .build();

        let profile = bme.get_profile_dur(&settings.0).map_err(|e| {
            error!("BME680 profile duration calculation failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: "BME680",
                details: "could not compute measurement profile",
            }
        })?;

        bme.set_sensor_settings(&mut delay, settings).map_err(|e| {
            error!("BME680 settings write failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: "BME680",
                details: "could not apply measurement settings",
            }
        })?;

        info!("BME680 ready, profile {} ms", profile.as_millis());
        Ok(Self { bme, profile })
    }
}

impl<I2C, E> ClimateSensor for Bme680Climate<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    async fn read(&mut self) -> Result<ClimateReadings, SensorError> {
        let mut delay = embassy_time::Delay;

        self.bme
            .set_sensor_mode(&mut delay, PowerMode::ForcedMode)
            .map_err(|e| {
                error!("BME680 forced measurement trigger failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "BME680",
                    operation: "trigger forced measurement",
                    details: "I2C communication error",
                }
            })?;

        // Let the measurement profile (including the gas heater) finish.
        Timer::after_millis(self.profile.as_millis() as u64 + 10).await;

        let (data, _condition) = self.bme.get_sensor_data(&mut delay).map_err(|e| {
            error!("BME680 data read failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: "BME680",
                operation: "read measurement data",
                details: "I2C communication error",
            }
        })?;

        Ok(ClimateReadings {
            temperature_c: data.temperature_celsius(),
            humidity_pct: data.humidity_percent(),
            pressure_hpa: data.pressure_hpa(),
            gas_ohm: data.gas_resistance_ohm() as f32,
        })
    }
}

/// CCS811 behind the [`AirQualitySensor`] trait.
///
/// Started once into application mode with a 1 s constant-power measurement
/// cadence; reads then just collect the latest algorithm result.
pub struct Ccs811AirQuality<I2C> {
    ccs: Ccs811Awake<I2C, mode::App>,
}

impl<I2C, E> Ccs811AirQuality<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    /// Reset the sensor, start the application firmware, and begin periodic
    /// measurement.
    pub async fn new(i2c: I2C) -> Result<Self, SensorError> {
        let mut ccs = Ccs811Awake::new(i2c, SlaveAddr::default());

        if let Err(e) = ccs.software_reset() {
            error!("CCS811 software reset failed: {:?}", e);
            return Err(SensorError::InitializationFailed {
                sensor: "CCS811",
                details: "device not responding on the sensor bus",
            });
        }
        Timer::after_millis(20).await;

        let mut app = match ccs.start_application() {
            Ok(app) => app,
            Err(e) => {
                error!("CCS811 application start failed: {:?}", e.error);
                return Err(SensorError::InitializationFailed {
                    sensor: "CCS811",
                    details: "could not start application firmware",
                });
            }
        };

        app.set_mode(MeasurementMode::ConstantPower1s).map_err(|e| {
            error!("CCS811 mode set failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: "CCS811",
                details: "could not set measurement mode",
            }
        })?;

        info!("CCS811 ready");
        Ok(Self { ccs: app })
    }
}

impl<I2C, E> AirQualitySensor for Ccs811AirQuality<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    async fn read(
        &mut self,
        temperature_c: f32,
        humidity_pct: f32,
    ) -> Result<AirQualityReadings, SensorError> {
        self.ccs
            .set_environment(humidity_pct, temperature_c)
            .map_err(|e| {
                error!("CCS811 environment compensation write failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "CCS811",
                    operation: "write environment compensation",
                    details: "I2C communication error",
                }
            })?;

        match self.ccs.data() {
            Ok(data) => Ok(AirQualityReadings {
                eco2_ppm: data.eco2,
                tvoc_ppb: data.etvoc,
            }),
            Err(nb::Error::WouldBlock) => Err(SensorError::ReadFailed {
                sensor: "CCS811",
                operation: "read algorithm result",
                details: "no new data ready",
            }),
            Err(nb::Error::Other(e)) => {
                error!("CCS811 data read failed: {:?}", e);
                Err(SensorError::ReadFailed {
                    sensor: "CCS811",
                    operation: "read algorithm result",
                    details: "I2C communication error",
                })
            }
        }
    }
}
