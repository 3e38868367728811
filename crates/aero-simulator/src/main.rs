//! Desktop simulator for the aero-rs environmental monitor UI.
//!
//! Renders the aero-core frame pipeline in an SDL2 window via
//! `embedded-graphics-simulator`, fed by synthetic sensor data so the readout,
//! graphs, clock, and dimming can be exercised without hardware.
//!
//! Mouse button held down counts as a touch on the panel. Q or Escape quits.
//!
//! Timing is accelerated: one sampling cycle per second instead of ten, and
//! the display dims after ten idle seconds instead of five minutes, so the
//! graphs and the dimming are observable in a short session.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::info;

use aero_core::clock::civil_from_unix;
use aero_core::compositor::Compositor;
use aero_core::config::{SensingConfig, TimeConfig};
use aero_core::graph::{ClimateSeries, GasSeries};
use aero_core::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use aero_core::power::{DisplayPower, PowerController};
use aero_core::reader::{
    AirQualityReadings, AirQualitySensor, ClimateReadings, ClimateSensor, EnvironmentReader,
    SensorError,
};
use aero_core::shared::SharedEnvironmentState;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Interval between synthetic sampling cycles.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Accelerated inactivity timeout before the simulated backlight dims.
const DIM_TIMEOUT_SECS: u64 = 10;

/// Simulated backlight levels on the 0-255 scale.
const LEVEL_BRIGHT: u8 = 255;
const LEVEL_DIMMED: u8 = 48;

/// Synthetic climate readings that drift over slow sinusoids.
struct MockClimate {
    elapsed_secs: f64,
}

impl ClimateSensor for MockClimate {
    async fn read(&mut self) -> Result<ClimateReadings, SensorError> {
        self.elapsed_secs += SAMPLE_INTERVAL.as_secs_f64();
        let t = self.elapsed_secs;

        Ok(ClimateReadings {
            temperature_c: (23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos()) as f32,
            humidity_pct: (50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos()) as f32,
            pressure_hpa: (1013.0 + 5.0 * (t / 600.0).sin()) as f32,
            gas_ohm: (50_000.0 + 20_000.0 * (t / 90.0).sin()) as f32,
        })
    }
}

/// Synthetic eCO₂/TVOC sweeping through all the gas graph bands.
struct MockAirQuality {
    elapsed_secs: f64,
}

impl AirQualitySensor for MockAirQuality {
    async fn read(
        &mut self,
        _temperature_c: f32,
        _humidity_pct: f32,
    ) -> Result<AirQualityReadings, SensorError> {
        self.elapsed_secs += SAMPLE_INTERVAL.as_secs_f64();
        let t = self.elapsed_secs;

        let eco2 = 1100.0 + 900.0 * (t / 150.0).sin() + 120.0 * (t / 17.0).cos();
        Ok(AirQualityReadings {
            eco2_ppm: eco2.max(400.0) as u16,
            tvoc_ppb: (eco2 / 8.0) as u16,
        })
    }
}

/// Scales every drawn color by the simulated backlight level.
struct DimmedTarget<'a, D> {
    target: &'a mut D,
    level: u8,
}

fn scale_color(color: Rgb565, level: u8) -> Rgb565 {
    let scale = |channel: u8| ((channel as u16 * level as u16) / 255) as u8;
    Rgb565::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

impl<D: Dimensions> Dimensions for DimmedTarget<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        self.target.bounding_box()
    }
}

impl<D: DrawTarget<Color = Rgb565>> DrawTarget for DimmedTarget<'_, D> {
    type Color = Rgb565;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let level = self.level;
        self.target.draw_iter(
            pixels
                .into_iter()
                .map(|Pixel(point, color)| Pixel(point, scale_color(color, level))),
        )
    }
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32
}

fn main() {
    env_logger::init();
    info!("Starting aero-rs simulator");
    info!(
        "Display: {}x{} (scale {}x), hold the mouse button to touch, Q to quit",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );

    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        DISPLAY_WIDTH_PX as u32,
        DISPLAY_HEIGHT_PX as u32,
    ));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Aero Simulator", &output_settings);

    let sensing = SensingConfig::default();
    let time = TimeConfig::default();
    let mut reader = EnvironmentReader::new(
        MockClimate { elapsed_secs: 0.0 },
        MockAirQuality { elapsed_secs: 0.0 },
        &sensing,
    );

    let state = SharedEnvironmentState::new();
    let mut compositor = Compositor::new();
    let mut gas = GasSeries::new();
    let mut climate = ClimateSeries::new();

    let started = Instant::now();
    let mut power = PowerController::with_timeout(0, DIM_TIMEOUT_SECS);
    let mut level = LEVEL_BRIGHT;
    let mut touched = false;

    // Seed the snapshot so the first frame shows real readings.
    let first = embassy_futures::block_on(reader.sample(unix_now()));
    state.prime(first);

    let mut last_sample = Instant::now();
    let mut last_toggle = None;

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    window.update(&display);

    'running: loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => {
                    if keycode == Keycode::Q || keycode == Keycode::Escape {
                        break 'running;
                    }
                }
                SimulatorEvent::MouseButtonDown { .. } => touched = true,
                SimulatorEvent::MouseButtonUp { .. } => touched = false,
                _ => {}
            }
        }

        if last_sample.elapsed() >= SAMPLE_INTERVAL {
            let sample = embassy_futures::block_on(reader.sample(unix_now()));
            state.publish(sample);
            last_sample = Instant::now();
        }

        let snapshot = state.snapshot();

        // One graph column per completed sampling cycle.
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

        if let Some(transition) = power.tick(started.elapsed().as_secs(), touched) {
            level = match transition {
                DisplayPower::Bright => LEVEL_BRIGHT,
                DisplayPower::Dimmed => LEVEL_DIMMED,
            };
            info!("backlight -> {:?}", transition);
        }

        let wall = Some(civil_from_unix(unix_now() as i64, time.utc_offset_secs));
        let mut dimmed = DimmedTarget {
            target: &mut display,
            level,
        };
        if let Err(e) = compositor.render(&mut dimmed, &snapshot, 42.0, wall, &gas, &climate) {
            log::error!("Draw error: {:?}", e);
        }

        window.update(&display);

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
