//! ILI9342C panel bring-up and AXP2101 backlight control.

use aero_core::layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use axp2101_embedded::AsyncAxp2101;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::Blocking;
use esp_hal::gpio::Output;
use esp_hal::spi::master::Spi;
use log::{info, warn};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9342CRgb565;
use mipidsi::{Builder, Display, NoResetPin};

use crate::i2c::I2cBusDevice;

pub type PanelSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>;
pub type PanelDisplay =
    Display<SpiInterface<'static, PanelSpi, Output<'static>>, ILI9342CRgb565, NoResetPin>;

/// PMU handle on the shared internal I2C bus.
pub type PmuDevice = I2cBusDevice<'static, esp_hal::i2c::master::I2c<'static, esp_hal::Async>>;

/// Configure the SPI display.
///
/// `buffer` batches SPI writes; bigger is faster at the cost of RAM.
pub fn init_display(
    spi_bus: Spi<'static, Blocking>,
    cs: Output<'static>,
    dc: Output<'static>,
    buffer: &'static mut [u8],
) -> PanelDisplay {
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).unwrap();
    let di = SpiInterface::new(spi_device, dc, buffer);

    Builder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display")
}

/// Backlight control over the AXP2101 power management chip.
///
/// The panel backlight hangs off DLDO1; brightness maps onto the rail
/// voltage within its usable range.
pub struct Backlight {
    pmu: AsyncAxp2101<PmuDevice>,
}

impl Backlight {
    /// Initialize the PMU and enable the rails the display needs.
    pub async fn new(i2c: PmuDevice) -> Self {
        let mut pmu = AsyncAxp2101::new(i2c);

        match pmu.init().await {
            Ok(_) => info!("Power management ready"),
            Err(e) => warn!("Power management init failed: {:?}", e),
        }

        // Panel logic supply at 3.3 V, backlight rail on.
        if let Err(e) = pmu.set_aldo4_voltage(3300).await {
            warn!("Panel supply voltage set failed: {:?}", e);
        }
        if let Err(e) = pmu.enable_aldo4().await {
            warn!("Panel supply enable failed: {:?}", e);
        }
        if let Err(e) = pmu.enable_dldo1().await {
            warn!("Backlight rail enable failed: {:?}", e);
        }

        Self { pmu }
    }

    /// Set the backlight level on the 0-255 scale.
    pub async fn set_level(&mut self, level: u8) {
        // DLDO1 usable range is roughly 2.5-3.3 V.
        let mv = 2500 + (level as u32 * 800) / 255;
        if let Err(e) = self.pmu.set_dldo1_voltage(mv as u16).await {
            warn!("Backlight level change failed: {:?}", e);
        }
    }
}
