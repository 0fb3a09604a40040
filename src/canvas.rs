//! Off-screen RGB frame buffer.
//!
//! Each display module owns one [`FrameCanvas`] and draws into it with the
//! primitives below (or any `embedded-graphics` drawable). The scheduler hands
//! a finished canvas to a [`crate::panel::Panel`] to present it.

use core::convert::Infallible;
use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Baseline, Text},
};
use thiserror::Error;

/// A drawing primitive could not complete. Fatal to the current frame only.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("image data has {actual} pixels, expected {width}x{height}")]
    ImageSize {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// Frame buffer for one module, row-major RGB888.
#[derive(Clone, Debug)]
pub struct FrameCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl FrameCanvas {
    /// Creates a canvas filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Sets a single pixel; coordinates outside the canvas are clipped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Number of pixels that are not black.
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != Rgb888::BLACK).count()
    }

    /// Fills the whole canvas with one color.
    pub fn fill(&mut self, r: u8, g: u8, b: u8) {
        let color = Rgb888::new(r, g, b);
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    /// Sets every pixel of a rectangle to black.
    pub fn erase_rect(&mut self, x: i32, y: i32, width: u32, height: u32) {
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                self.set_pixel(x + dx, y + dy, Rgb888::BLACK);
            }
        }
    }

    /// Draws a 1px line between two points, inclusive.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb888) {
        Line::new(Point::new(x0, y0), Point::new(x1, y1))
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(self)
            .ok();
    }

    /// Draws text with its top-left corner at `(x, y)`.
    ///
    /// `letter_spacing` is added on top of the font's own spacing. Returns the
    /// x coordinate just past the last glyph.
    pub fn draw_text(
        &mut self,
        font: &MonoFont<'_>,
        x: i32,
        y: i32,
        color: Rgb888,
        text: &str,
        letter_spacing: i32,
    ) -> i32 {
        let style = MonoTextStyle::new(font, color);
        let advance = glyph_advance(font, letter_spacing);
        let mut cursor = x;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            Text::with_baseline(ch.encode_utf8(&mut buf), Point::new(cursor, y), style, Baseline::Top)
                .draw(self)
                .ok();
            cursor += advance;
        }
        cursor
    }

    /// Copies `width * height` row-major pixels with the top-left at `(x, y)`.
    pub fn blit_image(
        &mut self,
        x: i32,
        y: i32,
        pixels: &[Rgb888],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if pixels.len() != (width * height) as usize {
            return Err(RenderError::ImageSize {
                width,
                height,
                actual: pixels.len(),
            });
        }
        for (i, &color) in pixels.iter().enumerate() {
            let dx = (i as u32 % width) as i32;
            let dy = (i as u32 / width) as i32;
            self.set_pixel(x + dx, y + dy, color);
        }
        Ok(())
    }

    /// Row-major pixel access for panels.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb888]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }
}

fn glyph_advance(font: &MonoFont<'_>, letter_spacing: i32) -> i32 {
    font.character_size.width as i32 + font.character_spacing as i32 + letter_spacing
}

/// Width in pixels that [`FrameCanvas::draw_text`] will cover.
pub fn text_width(font: &MonoFont<'_>, text: &str, letter_spacing: i32) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        return 0;
    }
    count * glyph_advance(font, letter_spacing) - font.character_spacing as i32 - letter_spacing
}

impl DrawTarget for FrameCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}

impl OriginDimensions for FrameCanvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
