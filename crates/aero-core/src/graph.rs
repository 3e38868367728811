//! Scrolling history graphs.
//!
//! Both graphs cover the full display width at one sampling cycle per pixel
//! column: the gas graph draws a color-banded eCO₂ bar, the climate graph
//! draws connected temperature and humidity traces. Each append scrolls the
//! panel one column left and draws into the freed rightmost column, so the
//! window always holds the most recent `width` cycles.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, Primitive, PrimitiveStyle};

use crate::layout::{DISPLAY_WIDTH_PX, GRAPH_HEIGHT_PX};
use crate::panel::PanelBuffer;

/// eCO₂ value that reaches the top of the gas graph.
pub const ECO2_FULL_SCALE_PPM: u16 = 3000;

/// Clamp range for the temperature trace, °C.
pub const TEMP_RANGE_C: (f32, f32) = (-10.0, 40.0);

/// Clamp range for the humidity trace, %.
pub const HUMID_RANGE_PCT: (f32, f32) = (0.0, 100.0);

/// eCO₂ concentration band. Every possible reading falls in exactly one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasBand {
    /// ≤ 600 ppm
    Fresh,
    /// 601–800 ppm
    Good,
    /// 801–1000 ppm
    Fair,
    /// 1001–1400 ppm
    Elevated,
    /// 1401–1900 ppm
    High,
    /// > 1900 ppm
    Severe,
}

impl GasBand {
    pub const fn classify(eco2_ppm: u16) -> Self {
        match eco2_ppm {
            0..=600 => Self::Fresh,
            601..=800 => Self::Good,
            801..=1000 => Self::Fair,
            1001..=1400 => Self::Elevated,
            1401..=1900 => Self::High,
            _ => Self::Severe,
        }
    }

    /// Bar color for this band.
    pub fn color(self) -> Rgb565 {
        match self {
            Self::Fresh => Rgb565::CYAN,
            Self::Good => Rgb565::GREEN,
            Self::Fair => Rgb565::YELLOW,
            Self::Elevated => Rgb565::CSS_ORANGE,
            Self::High => Rgb565::MAGENTA,
            Self::Severe => Rgb565::RED,
        }
    }
}

/// Map a clamped value onto a panel row, bottom of range at the bottom row.
///
/// The mapping is linear over `height - 1` steps so both range endpoints land
/// on real rows: `min` on row `height - 1`, `max` on row 0.
pub fn value_to_row(value: f32, min: f32, max: f32, height: u32) -> i32 {
    let v = value.clamp(min, max);
    let norm = (v - min) / (max - min);
    let span = (height - 1) as f32;
    (span - norm * span + 0.5) as i32
}

/// eCO₂ bar graph.
pub struct GasSeries {
    panel: PanelBuffer,
}

impl GasSeries {
    pub fn new() -> Self {
        Self {
            panel: PanelBuffer::new(DISPLAY_WIDTH_PX, GRAPH_HEIGHT_PX),
        }
    }

    /// Scroll one column and draw the new cycle's bar at the right edge.
    pub fn append(&mut self, eco2_ppm: u16) {
        self.panel.scroll_left();

        let height = self.panel.height();
        let bar = (eco2_ppm as usize * height / ECO2_FULL_SCALE_PPM as usize).min(height);
        if bar == 0 {
            return;
        }

        let x = self.panel.width() - 1;
        self.panel
            .fill_column(x, height - bar, bar, GasBand::classify(eco2_ppm).color());
    }

    pub fn panel(&self) -> &PanelBuffer {
        &self.panel
    }
}

impl Default for GasSeries {
    fn default() -> Self {
        Self::new()
    }
}

/// Temperature and humidity line traces.
pub struct ClimateSeries {
    panel: PanelBuffer,
}

impl ClimateSeries {
    pub fn new() -> Self {
        Self {
            panel: PanelBuffer::new(DISPLAY_WIDTH_PX, GRAPH_HEIGHT_PX),
        }
    }

    /// Scroll one column and connect the previous cycle's points to the new
    /// ones with one segment per trace.
    pub fn append(&mut self, temp_c: f32, humid_pct: f32, prev_temp_c: f32, prev_humid_pct: f32) {
        self.panel.scroll_left();

        let height = self.panel.height() as u32;
        let x1 = (self.panel.width() - 1) as i32;
        let x0 = x1 - 1;

        let ty = value_to_row(temp_c, TEMP_RANGE_C.0, TEMP_RANGE_C.1, height);
        let prev_ty = value_to_row(prev_temp_c, TEMP_RANGE_C.0, TEMP_RANGE_C.1, height);
        let hy = value_to_row(humid_pct, HUMID_RANGE_PCT.0, HUMID_RANGE_PCT.1, height);
        let prev_hy = value_to_row(prev_humid_pct, HUMID_RANGE_PCT.0, HUMID_RANGE_PCT.1, height);

        // Drawing into the panel cannot fail.
        let _ = Line::new(Point::new(x0, prev_ty), Point::new(x1, ty))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::YELLOW, 1))
            .draw(&mut self.panel);
        let _ = Line::new(Point::new(x0, prev_hy), Point::new(x1, hy))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::CYAN, 1))
            .draw(&mut self.panel);
    }

    pub fn panel(&self) -> &PanelBuffer {
        &self.panel
    }
}

impl Default for ClimateSeries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_reading_falls_in_exactly_one_band() {
        for value in [0u16, 1, 599, 601, 999, 1399, 1899, 2500, u16::MAX] {
            // classify is total by construction; exercise it across the range.
            let _ = GasBand::classify(value);
        }
    }

    #[test]
    fn band_boundaries_are_inclusive_on_the_low_side() {
        assert_eq!(GasBand::classify(600), GasBand::Fresh);
        assert_eq!(GasBand::classify(601), GasBand::Good);
        assert_eq!(GasBand::classify(800), GasBand::Good);
        assert_eq!(GasBand::classify(801), GasBand::Fair);
        assert_eq!(GasBand::classify(1000), GasBand::Fair);
        assert_eq!(GasBand::classify(1001), GasBand::Elevated);
        assert_eq!(GasBand::classify(1400), GasBand::Elevated);
        assert_eq!(GasBand::classify(1401), GasBand::High);
        assert_eq!(GasBand::classify(1900), GasBand::High);
        assert_eq!(GasBand::classify(1901), GasBand::Severe);
    }

    #[test]
    fn rising_co2_walks_through_the_band_colors() {
        let mut series = GasSeries::new();
        for value in [550u16, 750, 1450, 2100] {
            series.append(value);
        }

        let panel = series.panel();
        let bottom = panel.height() - 1;
        let w = panel.width();
        assert_eq!(panel.pixel(w - 4, bottom), Rgb565::CYAN);
        assert_eq!(panel.pixel(w - 3, bottom), Rgb565::GREEN);
        assert_eq!(panel.pixel(w - 2, bottom), Rgb565::MAGENTA);
        assert_eq!(panel.pixel(w - 1, bottom), Rgb565::RED);
    }

    #[test]
    fn bar_height_is_proportional_and_clamped() {
        let mut series = GasSeries::new();
        series.append(ECO2_FULL_SCALE_PPM);
        let panel = series.panel();
        let x = panel.width() - 1;
        // Full scale reaches the top row.
        assert_ne!(panel.pixel(x, 0), Rgb565::BLACK);

        let mut series = GasSeries::new();
        series.append(ECO2_FULL_SCALE_PPM / 2);
        let panel = series.panel();
        let x = panel.width() - 1;
        let half = panel.height() / 2;
        assert_eq!(panel.pixel(x, half - 1), Rgb565::BLACK);
        assert_ne!(panel.pixel(x, half), Rgb565::BLACK);

        // Beyond full scale clamps instead of wrapping.
        let mut series = GasSeries::new();
        series.append(u16::MAX);
        let panel = series.panel();
        let x = panel.width() - 1;
        assert_eq!(panel.pixel(x, 0), Rgb565::RED);
    }

    #[test]
    fn zero_reading_leaves_an_empty_column() {
        let mut series = GasSeries::new();
        series.append(0);
        let panel = series.panel();
        let x = panel.width() - 1;
        for y in 0..panel.height() {
            assert_eq!(panel.pixel(x, y), Rgb565::BLACK);
        }
    }

    #[test]
    fn window_keeps_only_the_most_recent_width_appends() {
        let width = DISPLAY_WIDTH_PX as usize;
        let values: std::vec::Vec<u16> =
            (0..width as u16 + 10).map(|i| 100 + (i % 7) * 300).collect();

        let mut full = GasSeries::new();
        for &v in &values {
            full.append(v);
        }

        let mut tail = GasSeries::new();
        for &v in &values[values.len() - width..] {
            tail.append(v);
        }

        let bottom = full.panel().height() - 1;
        for x in 0..width {
            assert_eq!(
                full.panel().pixel(x, bottom),
                tail.panel().pixel(x, bottom),
                "column {x} differs"
            );
        }
    }

    #[test]
    fn value_to_row_pins_range_endpoints() {
        let h = GRAPH_HEIGHT_PX as u32;
        assert_eq!(value_to_row(-10.0, -10.0, 40.0, h), (h - 1) as i32);
        assert_eq!(value_to_row(40.0, -10.0, 40.0, h), 0);
        assert_eq!(value_to_row(0.0, 0.0, 100.0, h), (h - 1) as i32);
        assert_eq!(value_to_row(100.0, 0.0, 100.0, h), 0);
    }

    #[test]
    fn value_to_row_saturates_out_of_range_input() {
        let h = GRAPH_HEIGHT_PX as u32;
        assert_eq!(value_to_row(-40.0, -10.0, 40.0, h), (h - 1) as i32);
        assert_eq!(value_to_row(120.0, -10.0, 40.0, h), 0);
    }

    #[test]
    fn value_to_row_is_invertible_within_the_range() {
        let h = GRAPH_HEIGHT_PX as u32;
        let (min, max) = TEMP_RANGE_C;
        let step = (max - min) / (h - 1) as f32;

        for i in 0..50 {
            let value = min + i as f32;
            let row = value_to_row(value, min, max, h);
            let recovered = max - row as f32 * step;
            assert!(
                (recovered - value).abs() <= step / 2.0 + 1e-4,
                "value {value} -> row {row} -> {recovered}"
            );
        }
    }

    #[test]
    fn climate_append_draws_both_trace_endpoints() {
        let mut series = ClimateSeries::new();
        series.append(40.0, 0.0, 40.0, 0.0);

        let panel = series.panel();
        let x = panel.width() - 1;
        assert_eq!(panel.pixel(x, 0), Rgb565::YELLOW);
        assert_eq!(panel.pixel(x, panel.height() - 1), Rgb565::CYAN);
    }

    #[test]
    fn climate_traces_connect_across_appends() {
        let mut series = ClimateSeries::new();
        // Previous cycle at mid-range, current at the top: the segment spans
        // the two rightmost columns.
        series.append(40.0, 90.0, 15.0, 90.0);

        let panel = series.panel();
        let h = panel.height() as u32;
        let prev_row = value_to_row(15.0, TEMP_RANGE_C.0, TEMP_RANGE_C.1, h) as usize;
        assert_eq!(panel.pixel(panel.width() - 2, prev_row), Rgb565::YELLOW);
        assert_eq!(panel.pixel(panel.width() - 1, 0), Rgb565::YELLOW);
    }
}
