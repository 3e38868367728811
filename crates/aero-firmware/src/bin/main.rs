#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

extern crate alloc;

use core::cell::RefCell;

use aero_core::reader::EnvironmentReader;
use aero_firmware::display::{Backlight, init_display};
use aero_firmware::i2c::I2cBusDevice;
use aero_firmware::net;
use aero_firmware::sensors::{Bme680Climate, Ccs811AirQuality};
use aero_firmware::tasks::{self, ENVIRONMENT, WALL_CLOCK};
use aero_firmware::touch::TouchPanel;
use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_time::{Duration, Timer};
use embedded_hal_bus::i2c::CriticalSectionDevice;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rng::Rng;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::tsens::TemperatureSensor;
use log::info;
use static_cell::StaticCell;

/// How long boot waits for an address before continuing offline.
const NETWORK_WAIT: Duration = Duration::from_secs(60);

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // The off-screen panels allocate a couple hundred KiB; that lives in PSRAM.
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized");

    let device_config = aero_firmware::device_config();

    // Internal async I2C bus: power management and touch.
    let i2c0 = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO12)
    .with_scl(peripherals.GPIO11)
    .into_async();
    static I2C0_BUS: StaticCell<
        AsyncMutex<CriticalSectionRawMutex, I2c<'static, esp_hal::Async>>,
    > = StaticCell::new();
    let i2c0_bus = I2C0_BUS.init(AsyncMutex::new(i2c0));

    let mut backlight = Backlight::new(I2cBusDevice::new(i2c0_bus)).await;
    backlight
        .set_level(device_config.display.active_brightness)
        .await;

    let spi_bus = Spi::new(peripherals.SPI2, SpiConfig::default())
        .unwrap()
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());
    static SPI_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();
    let display = init_display(spi_bus, cs, dc, SPI_BUFFER.init([0u8; 512]));
    info!("Display initialized");

    let touch = TouchPanel::new(I2cBusDevice::new(i2c0_bus))
        .await
        .expect("Touch controller not responding");

    // External blocking I2C bus: both environment sensors on the grove port.
    let i2c1 = I2c::new(
        peripherals.I2C1,
        I2cConfig::default().with_frequency(Rate::from_khz(100)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO2)
    .with_scl(peripherals.GPIO1);
    static SENSOR_BUS: StaticCell<
        critical_section::Mutex<RefCell<I2c<'static, esp_hal::Blocking>>>,
    > = StaticCell::new();
    let sensor_bus = SENSOR_BUS.init(critical_section::Mutex::new(RefCell::new(i2c1)));

    // Both sensors must answer at boot; a monitor without its sensors is not
    // worth running.
    let climate =
        Bme680Climate::new(CriticalSectionDevice::new(sensor_bus)).expect("BME680 not responding");
    let air_quality = Ccs811AirQuality::new(CriticalSectionDevice::new(sensor_bus))
        .await
        .expect("CCS811 not responding");
    let mut reader = EnvironmentReader::new(climate, air_quality, &device_config.sensing);

    let tsens = TemperatureSensor::new(peripherals.TSENS, esp_hal::tsens::Config::default())
        .expect("Failed to initialize the internal temperature sensor");

    let radio_init = esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller");
    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(&radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let mut rng = Rng::new();
    let seed = ((rng.random() as u64) << 32) | rng.random() as u64;
    // DHCP + DNS + the NTP UDP socket + the telemetry TCP socket, with room.
    static RESOURCES: StaticCell<StackResources<6>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner.spawn(net::net_task(runner)).unwrap();
    spawner
        .spawn(net::wifi_task(
            wifi_controller,
            device_config.internet.ssid,
            device_config.internet.password,
        ))
        .unwrap();

    if net::wait_for_network(stack, NETWORK_WAIT).await {
        match net::sntp_unix_time(stack, device_config.time.ntp_server).await {
            Some(unix) => {
                WALL_CLOCK.sync(unix);
                info!("clock synced from {}", device_config.time.ntp_server);
            }
            None => info!("clock not synced, clock strip shows a placeholder"),
        }
    }

    // Seed the shared snapshot so the first frame shows real readings instead
    // of zeros.
    let first = reader.sample(WALL_CLOCK.unix_now().unwrap_or(0)).await;
    ENVIRONMENT.prime(first);

    spawner
        .spawn(tasks::sample_task(reader, device_config.sensing))
        .unwrap();
    spawner
        .spawn(tasks::render_task(
            display,
            touch,
            backlight,
            tsens,
            device_config.display,
            device_config.time.utc_offset_secs,
        ))
        .unwrap();
    spawner
        .spawn(tasks::telemetry_task(stack, device_config.telemetry))
        .unwrap();

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
