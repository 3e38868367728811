//! The long-running tasks and the state they share.
//!
//! Three tasks run against one [`SharedEnvironmentState`]: sampling writes,
//! rendering and telemetry read. Each runs on its own cadence; they only meet
//! at the snapshot.

use aero_core::clock::{CivilDateTime, civil_from_unix};
use aero_core::compositor::Compositor;
use aero_core::config::{DisplayConfig, SensingConfig, TelemetryConfig};
use aero_core::graph::{ClimateSeries, GasSeries};
use aero_core::power::{DisplayPower, PowerController};
use aero_core::reader::EnvironmentReader;
use aero_core::shared::SharedEnvironmentState;
use aero_core::telemetry::TelemetryRecord;
use core::cell::Cell;
use embassy_net::Stack;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal_bus::i2c::CriticalSectionDevice;
use esp_hal::i2c::master::I2c;
use esp_hal::tsens::TemperatureSensor;
use esp_hal::{Async, Blocking};
use log::{info, warn};

use crate::display::{Backlight, PanelDisplay};
use crate::i2c::I2cBusDevice;
use crate::net;
use crate::sensors::{Bme680Climate, Ccs811AirQuality};
use crate::touch::TouchPanel;

/// One peripheral's handle on the blocking sensor bus.
pub type SensorBusDevice = CriticalSectionDevice<'static, I2c<'static, Blocking>>;
/// One peripheral's handle on the async internal bus.
pub type InternalBusDevice = I2cBusDevice<'static, I2c<'static, Async>>;

pub type Climate = Bme680Climate<SensorBusDevice>;
pub type AirQuality = Ccs811AirQuality<SensorBusDevice>;

/// Latest measurement cycle, shared across the tasks.
pub static ENVIRONMENT: SharedEnvironmentState = SharedEnvironmentState::new();

/// NTP-anchored wall clock.
pub static WALL_CLOCK: WallClock = WallClock::new();

/// Unix time anchored to the monotonic clock at sync.
pub struct WallClock {
    base: Mutex<CriticalSectionRawMutex, Cell<Option<(u32, Instant)>>>,
}

impl WallClock {
    pub const fn new() -> Self {
        Self {
            base: Mutex::new(Cell::new(None)),
        }
    }

    /// Anchor the clock to `unix` seconds, as of now.
    pub fn sync(&self, unix: u32) {
        self.base.lock(|base| base.set(Some((unix, Instant::now()))));
    }

    /// Current unix seconds, or `None` before the first sync.
    pub fn unix_now(&self) -> Option<u32> {
        self.base.lock(|base| {
            base.get()
                .map(|(unix, at)| unix.wrapping_add(at.elapsed().as_secs() as u32))
        })
    }

    /// Current local civil time, or `None` before the first sync.
    pub fn civil_now(&self, utc_offset_secs: i32) -> Option<CivilDateTime> {
        self.unix_now()
            .map(|unix| civil_from_unix(unix as i64, utc_offset_secs))
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Read both sensors on the sampling cadence and publish each cycle.
#[embassy_executor::task]
pub async fn sample_task(mut reader: EnvironmentReader<Climate, AirQuality>, config: SensingConfig) {
    let period = Duration::from_secs(config.sample_period_secs as u64);
    loop {
        Timer::after(period).await;
        let sample = reader.sample(WALL_CLOCK.unix_now().unwrap_or(0)).await;
        ENVIRONMENT.publish(sample);
    }
}

/// Redraw the frame each cycle and run the touch-driven dimming.
#[embassy_executor::task]
pub async fn render_task(
    mut display: PanelDisplay,
    mut touch: TouchPanel<InternalBusDevice>,
    mut backlight: Backlight,
    tsens: TemperatureSensor<'static>,
    config: DisplayConfig,
    utc_offset_secs: i32,
) {
    let mut compositor = Compositor::new();
    let mut gas = GasSeries::new();
    let mut climate = ClimateSeries::new();
    let mut power = PowerController::with_timeout(
        Instant::now().as_secs(),
        config.dim_timeout_secs as u64,
    );
    let mut last_toggle = None;

    backlight.set_level(config.active_brightness).await;

    loop {
        let snapshot = ENVIRONMENT.snapshot();

        // One graph column per completed sampling cycle, regardless of how
        // render and sample cadences drift against each other.
        if last_toggle != Some(snapshot.cycle_toggle) {
            last_toggle = Some(snapshot.cycle_toggle);
            gas.append(snapshot.current.eco2_ppm);
            climate.append(
                snapshot.current.temperature_c,
                snapshot.current.humidity_pct,
                snapshot.prev_temperature_c,
                snapshot.prev_humidity_pct,
            );
        }

        let device_temp_c = tsens.get_temperature().to_celsius();
        let wall = WALL_CLOCK.civil_now(utc_offset_secs);
        if let Err(e) = compositor.render(
            &mut display,
            &snapshot,
            device_temp_c,
            wall,
            &gas,
            &climate,
        ) {
            warn!("frame blit failed: {:?}", e);
        }

        // Ten short touch polls fill the rest of the cycle, keeping the
        // dimming responsive without a dedicated touch task.
        for _ in 0..10 {
            let touched = touch.is_pressed().await.unwrap_or(false);
            if let Some(state) = power.tick(Instant::now().as_secs(), touched) {
                let level = match state {
                    DisplayPower::Bright => config.active_brightness,
                    DisplayPower::Dimmed => config.dimmed_brightness,
                };
                info!("backlight -> {:?}", state);
                backlight.set_level(level).await;
            }
            Timer::after_millis(100).await;
        }
    }
}

/// Upload the latest snapshot to the telemetry channel on its own period.
#[embassy_executor::task]
pub async fn telemetry_task(stack: Stack<'static>, config: TelemetryConfig<'static>) {
    if config.write_key.is_empty() {
        info!("no telemetry write key configured, uploads disabled");
        return;
    }

    let period = Duration::from_secs(config.upload_period_secs as u64);
    loop {
        Timer::after(period).await;

        let snapshot = ENVIRONMENT.snapshot();
        let record = TelemetryRecord::from_snapshot(config.write_key, &snapshot);
        match net::upload_telemetry(stack, config.channel_id, &record).await {
            Ok(status) if (200..300).contains(&status) => {
                info!("telemetry upload ok ({status})");
            }
            Ok(status) => warn!("telemetry upload rejected with status {status}"),
            Err(e) => warn!("telemetry upload failed: {}", e),
        }
    }
}
