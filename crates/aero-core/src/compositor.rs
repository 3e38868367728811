//! Display compositor.
//!
//! Owns the off-screen readout and clock panels and assembles the full frame:
//! numeric readout on top, the two history graphs overlaid in the middle, and
//! the clock strip at the bottom. All drawing happens in RAM; the physical
//! display only ever receives whole-panel blits.
//!
//! Text placement uses measured centering from the font metrics, so value
//! widths (9.5 vs -10.5 vs 1013.2) never need per-case position tables.

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_9X15, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, Primitive, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use crate::clock::CivilDateTime;
use crate::graph::{ClimateSeries, GasSeries};
use crate::layout::{
    CLOCK_DIVIDER_Y, CLOCK_STRIP_HEIGHT_PX, DISPLAY_WIDTH_PX, GRAPH_ORIGIN_Y, READOUT_HEIGHT_PX,
};
use crate::panel::PanelBuffer;
use crate::sample::EnvironmentSample;
use crate::shared::Snapshot;

/// Divider and accent color.
const DIVIDER_COLOR: Rgb565 = Rgb565::CSS_LIGHT_GRAY;

/// Vertical layout of the readout panel: two climate rows, a divider, then
/// the eCO₂ band.
const ROW1_TOP_Y: i32 = 8;
const ROW2_TOP_Y: i32 = 36;
const ROW_DIVIDER_Y: i32 = 61;
const ECO2_TOP_Y: i32 = 76;
const READOUT_DIVIDER_Y: i32 = 127;

/// X coordinate that horizontally centers `text` between `left` and `right`
/// for the given mono font.
pub fn centered_x(text: &str, font: &MonoFont<'_>, left: i32, right: i32) -> i32 {
    let glyphs = text.chars().count() as i32;
    let width = glyphs * font.character_size.width as i32
        + glyphs.saturating_sub(1) * font.character_spacing as i32;
    left + (right - left - width) / 2
}

fn fmt_value(value: f32, unit: &str) -> String<24> {
    let mut s = String::new();
    let _ = core::fmt::write(&mut s, format_args!("{:.1} {}", value, unit));
    s
}

/// Assembles complete frames from the latest snapshot and the graph panels.
pub struct Compositor {
    readout: PanelBuffer,
    clock: PanelBuffer,
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            readout: PanelBuffer::new(DISPLAY_WIDTH_PX, READOUT_HEIGHT_PX),
            clock: PanelBuffer::new(DISPLAY_WIDTH_PX, CLOCK_STRIP_HEIGHT_PX),
        }
    }

    /// Draw one full frame.
    ///
    /// `device_temp_c` is the SoC-internal temperature diagnostic; `wall` is
    /// `None` until the clock has been synced.
    pub fn render<D>(
        &mut self,
        display: &mut D,
        snapshot: &Snapshot,
        device_temp_c: f32,
        wall: Option<CivilDateTime>,
        gas: &GasSeries,
        climate: &ClimateSeries,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.draw_readout(&snapshot.current, device_temp_c);
        self.draw_clock(wall);

        self.readout.blit(display, Point::zero())?;
        gas.panel().blit(display, Point::new(0, GRAPH_ORIGIN_Y))?;
        climate
            .panel()
            .blit_over(display, Point::new(0, GRAPH_ORIGIN_Y))?;
        self.clock.blit(display, Point::new(0, CLOCK_DIVIDER_Y))?;
        Ok(())
    }

    fn draw_readout(&mut self, sample: &EnvironmentSample, device_temp_c: f32) {
        let panel = &mut self.readout;
        let _ = panel.clear(Rgb565::BLACK);

        let value_style = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);
        let small_style = MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE);
        let half = DISPLAY_WIDTH_PX as i32 / 2;
        let full = DISPLAY_WIDTH_PX as i32;

        // Climate quadrants: temperature / humidity, pressure / altitude.
        for (text, left, right, top) in [
            (fmt_value(sample.temperature_c, "C"), 0, half, ROW1_TOP_Y),
            (fmt_value(sample.humidity_pct, "%"), half, full, ROW1_TOP_Y),
            (fmt_value(sample.pressure_hpa, "hPa"), 0, half, ROW2_TOP_Y),
            (fmt_value(sample.altitude_m, "m"), half, full, ROW2_TOP_Y),
        ] {
            let x = centered_x(&text, &FONT_10X20, left, right);
            let _ = Text::with_baseline(&text, Point::new(x, top), value_style, Baseline::Top)
                .draw(panel);
        }

        // eCO₂ headline value.
        let mut eco2 = String::<24>::new();
        let _ = core::fmt::write(&mut eco2, format_args!("{} ppm", sample.eco2_ppm));
        let x = centered_x(&eco2, &FONT_10X20, 0, full);
        let _ = Text::with_baseline(&eco2, Point::new(x, ECO2_TOP_Y), value_style, Baseline::Top)
            .draw(panel);

        // SoC temperature diagnostic, tucked into the left of the eCO₂ band.
        let _ = Text::with_baseline("CPU", Point::new(16, 72), small_style, Baseline::Top)
            .draw(panel);
        let cpu = fmt_value(device_temp_c, "C");
        let _ =
            Text::with_baseline(&cpu, Point::new(16, 88), small_style, Baseline::Top).draw(panel);

        for y in [ROW_DIVIDER_Y, READOUT_DIVIDER_Y] {
            let _ = Line::new(Point::new(0, y), Point::new(full - 1, y))
                .into_styled(PrimitiveStyle::with_stroke(DIVIDER_COLOR, 1))
                .draw(panel);
        }
    }

    fn draw_clock(&mut self, wall: Option<CivilDateTime>) {
        let panel = &mut self.clock;
        let _ = panel.clear(Rgb565::BLACK);

        let full = DISPLAY_WIDTH_PX as i32;
        let _ = Line::new(Point::new(0, 0), Point::new(full - 1, 0))
            .into_styled(PrimitiveStyle::with_stroke(DIVIDER_COLOR, 1))
            .draw(panel);

        let text: String<19> = match wall {
            Some(dt) => dt.format(),
            None => {
                let mut s = String::new();
                let _ = s.push_str("time not synced");
                s
            }
        };
        let style = MonoTextStyle::new(&FONT_9X15, Rgb565::WHITE);
        let x = centered_x(&text, &FONT_9X15, 0, full);
        let _ = Text::with_baseline(&text, Point::new(x, 4), style, Baseline::Top).draw(panel);
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}
