//! Heap-backed off-screen pixel panel.
//!
//! All compositor and graph drawing targets one of these RAM buffers instead
//! of the SPI display; completed panels are blitted to the hardware in a
//! single `fill_contiguous` transaction. The graph panels additionally
//! support a one-column left scroll, which is the only mutation the history
//! buffers ever need.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Fixed-size Rgb565 panel implementing `DrawTarget`.
///
/// Allocated once at startup; scrolling and redrawing never reallocate.
pub struct PanelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb565>,
}

impl PanelBuffer {
    /// Allocate a new panel filled with black pixels.
    pub fn new(width: u16, height: u16) -> Self {
        let width = width as usize;
        let height = height as usize;
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`. Out-of-bounds reads return black.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb565 {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Rgb565::BLACK
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        self.pixels[y * self.width + x] = color;
    }

    /// Shift the whole panel one column to the left and blank the rightmost
    /// column.
    pub fn scroll_left(&mut self) {
        for row in self.pixels.chunks_exact_mut(self.width) {
            row.copy_within(1.., 0);
            row[self.width - 1] = Rgb565::BLACK;
        }
    }

    /// Draw a vertical run of `len` pixels starting at `(x, y)`.
    pub fn fill_column(&mut self, x: usize, y: usize, len: usize, color: Rgb565) {
        if x >= self.width {
            return;
        }
        let end = (y + len).min(self.height);
        for row in y.min(self.height)..end {
            self.set_pixel(x, row, color);
        }
    }

    /// Copy the whole panel onto `display` with its top-left at `origin`.
    pub fn blit<D>(&self, display: &mut D, origin: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let area = Rectangle::new(origin, Size::new(self.width as u32, self.height as u32));
        display.fill_contiguous(&area, self.pixels.iter().copied())
    }

    /// Copy the panel onto `display`, treating black pixels as transparent.
    ///
    /// Used to overlay the climate traces on the gas bars, the way the
    /// original device composited its two graph sprites.
    pub fn blit_over<D>(&self, display: &mut D, origin: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let width = self.width;
        let pixels = self
            .pixels
            .iter()
            .enumerate()
            .filter(|(_, color)| **color != Rgb565::BLACK)
            .map(move |(idx, color)| {
                let x = (idx % width) as i32;
                let y = (idx / width) as i32;
                Pixel(origin + Point::new(x, y), *color)
            });
        display.draw_iter(pixels)
    }
}

impl OriginDimensions for PanelBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for PanelBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let area_x = area.top_left.x.max(0) as usize;
        let area_y = area.top_left.y.max(0) as usize;
        let area_w = area.size.width as usize;
        let area_h = area.size.height as usize;

        let mut colors = colors.into_iter();
        for row in 0..area_h {
            let y = area_y + row;
            for col in 0..area_w {
                let x = area_x + col;
                if let Some(color) = colors.next()
                    && x < self.width
                    && y < self.height
                {
                    self.set_pixel(x, y, color);
                }
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let x_start = (area.top_left.x.max(0) as usize).min(self.width);
        let y_start = (area.top_left.y.max(0) as usize).min(self.height);
        let x_end = ((area.top_left.x.max(0) as usize).saturating_add(area.size.width as usize))
            .min(self.width);
        let y_end = ((area.top_left.y.max(0) as usize).saturating_add(area.size.height as usize))
            .min(self.height);

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_left_shifts_columns_and_blanks_the_last() {
        let mut panel = PanelBuffer::new(4, 2);
        panel.fill_column(3, 0, 2, Rgb565::RED);
        panel.fill_column(1, 0, 1, Rgb565::GREEN);

        panel.scroll_left();

        assert_eq!(panel.pixel(2, 0), Rgb565::RED);
        assert_eq!(panel.pixel(2, 1), Rgb565::RED);
        assert_eq!(panel.pixel(0, 0), Rgb565::GREEN);
        assert_eq!(panel.pixel(3, 0), Rgb565::BLACK);
        assert_eq!(panel.pixel(3, 1), Rgb565::BLACK);
    }

    #[test]
    fn fill_column_clips_to_panel_bounds() {
        let mut panel = PanelBuffer::new(4, 4);
        panel.fill_column(2, 2, 10, Rgb565::BLUE);
        assert_eq!(panel.pixel(2, 2), Rgb565::BLUE);
        assert_eq!(panel.pixel(2, 3), Rgb565::BLUE);
        // Writes past the bottom edge are dropped, not wrapped.
        assert_eq!(panel.pixel(3, 0), Rgb565::BLACK);

        // A column past the right edge is a no-op.
        panel.fill_column(9, 0, 4, Rgb565::BLUE);
        for y in 0..4 {
            assert_eq!(panel.pixel(3, y), Rgb565::BLACK);
        }
    }

    #[test]
    fn blit_copies_every_pixel_including_black() {
        let mut src = PanelBuffer::new(2, 2);
        src.fill_column(0, 0, 2, Rgb565::YELLOW);

        let mut dst = PanelBuffer::new(4, 4);
        let _ = dst.clear(Rgb565::WHITE);
        src.blit(&mut dst, Point::new(1, 1)).unwrap();

        assert_eq!(dst.pixel(1, 1), Rgb565::YELLOW);
        assert_eq!(dst.pixel(1, 2), Rgb565::YELLOW);
        // Source black overwrites the destination.
        assert_eq!(dst.pixel(2, 1), Rgb565::BLACK);
        // Outside the blit area is untouched.
        assert_eq!(dst.pixel(0, 0), Rgb565::WHITE);
    }

    #[test]
    fn blit_over_skips_black_pixels() {
        let mut src = PanelBuffer::new(2, 2);
        src.fill_column(0, 0, 2, Rgb565::YELLOW);

        let mut dst = PanelBuffer::new(4, 4);
        let _ = dst.clear(Rgb565::WHITE);
        src.blit_over(&mut dst, Point::new(1, 1)).unwrap();

        assert_eq!(dst.pixel(1, 1), Rgb565::YELLOW);
        // Source black leaves the destination alone.
        assert_eq!(dst.pixel(2, 1), Rgb565::WHITE);
    }

    #[test]
    fn draw_iter_clips_out_of_bounds_pixels() {
        let mut panel = PanelBuffer::new(2, 2);
        let pixels = [
            Pixel(Point::new(-1, 0), Rgb565::RED),
            Pixel(Point::new(0, 0), Rgb565::RED),
            Pixel(Point::new(2, 2), Rgb565::RED),
        ];
        panel.draw_iter(pixels.into_iter()).unwrap();
        assert_eq!(panel.pixel(0, 0), Rgb565::RED);
        assert_eq!(panel.pixel(1, 1), Rgb565::BLACK);
    }
}
