//! FT6336U capacitive touch controller.
//!
//! The dimming logic only needs "is anyone touching the panel", so this
//! driver reads just the touch-count register instead of the full gesture
//! and coordinate report.

use embedded_hal_async::i2c::I2c;
use log::info;

/// FT6336U I2C address.
const I2C_ADDR: u8 = 0x38;

/// Touch status register: low nibble holds the active touch count (0-2).
const REG_TD_STATUS: u8 = 0x02;

/// Chip ID register, for the startup probe.
const REG_CHIP_ID: u8 = 0xA3;

pub struct TouchPanel<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> TouchPanel<I2C> {
    /// Probe the controller and return the driver.
    pub async fn new(mut i2c: I2C) -> Result<Self, I2C::Error> {
        let mut id = [0u8; 1];
        i2c.write_read(I2C_ADDR, &[REG_CHIP_ID], &mut id).await?;
        info!("FT6336U chip id {:#04x}", id[0]);
        Ok(Self { i2c })
    }

    /// Number of fingers currently on the panel (0-2).
    pub async fn touch_count(&mut self) -> Result<u8, I2C::Error> {
        let mut status = [0u8; 1];
        self.i2c
            .write_read(I2C_ADDR, &[REG_TD_STATUS], &mut status)
            .await?;
        Ok(status[0] & 0x0F)
    }

    /// Whether the panel is being touched right now.
    pub async fn is_pressed(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.touch_count().await? > 0)
    }
}
