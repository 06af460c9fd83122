use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    prelude::*,
    primitives::Rectangle,
    Pixel,
};

use crate::layout::TriColor;

/// Two 1-bit ink planes, row-major, MSB first. A set bit means ink:
/// black in `black`, red in `red`. Red wins where both are set.
pub struct TriColorBuffer {
    black: Vec<u8>,
    red: Vec<u8>,
    width: u32,
    height: u32,
}

impl TriColorBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = buffer_len(width, height);
        Self {
            black: vec![0; len],
            red: vec![0; len],
            width,
            height,
        }
    }

    pub fn black_plane(&self) -> &[u8] {
        &self.black
    }

    pub fn red_plane(&self) -> &[u8] {
        &self.red
    }

    pub fn clear_color(&mut self, color: TriColor) {
        let (k, r) = match color {
            TriColor::White => (0x00, 0x00),
            TriColor::Black => (0xFF, 0x00),
            TriColor::Red => (0x00, 0xFF),
        };
        self.black.fill(k);
        self.red.fill(r);
    }

    /// Colour at a pixel, or `None` outside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Option<TriColor> {
        let (idx, bit) = self.position(x, y)?;
        Some(if self.red[idx] & bit != 0 {
            TriColor::Red
        } else if self.black[idx] & bit != 0 {
            TriColor::Black
        } else {
            TriColor::White
        })
    }

    /// Count pixels of one colour inside `area`.
    pub fn count_in(&self, area: &Rectangle, color: TriColor) -> usize {
        area.intersection(&self.bounding_box())
            .points()
            .filter(|p| self.pixel(p.x, p.y) == Some(color))
            .count()
    }

    fn position(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let row_bytes = self.width.div_ceil(8);
        let idx = (y as u32 * row_bytes + x as u32 / 8) as usize;
        Some((idx, 0x80 >> (x as u32 % 8)))
    }

    fn set(&mut self, x: i32, y: i32, color: TriColor) {
        let Some((idx, bit)) = self.position(x, y) else {
            return;
        };
        match color {
            TriColor::White => {
                self.black[idx] &= !bit;
                self.red[idx] &= !bit;
            }
            TriColor::Black => {
                self.black[idx] |= bit;
                self.red[idx] &= !bit;
            }
            TriColor::Red => {
                self.black[idx] &= !bit;
                self.red[idx] |= bit;
            }
        }
    }
}

const fn buffer_len(width: u32, height: u32) -> usize {
    (width.div_ceil(8) * height) as usize
}

impl OriginDimensions for TriColorBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for TriColorBuffer {
    type Color = TriColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        for p in area.points() {
            self.set(p.x, p.y, color);
        }
        Ok(())
    }
}
