use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    PrimitiveStyleBuilder, Rectangle, RoundedRectangle, StrokeAlignment,
};

/// Ink colours of the tri-colour panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriColor {
    #[default]
    White,
    Black,
    Red,
}

impl PixelColor for TriColor {
    type Raw = ();
}

impl From<Rgb888> for TriColor {
    /// Quantise a bitmap pixel to the nearest ink.
    fn from(c: Rgb888) -> Self {
        let (r, g, b) = (c.r() as u16, c.g() as u16, c.b() as u16);
        if r > 160 && g < 96 && b < 96 {
            TriColor::Red
        } else if (r * 3 + g * 6 + b) / 10 < 128 {
            TriColor::Black
        } else {
            TriColor::White
        }
    }
}

// ── Panel geometry (IL0398, 4.2" 400x300, landscape) ────────────────

pub const PANEL_WIDTH: u32 = 400;
pub const PANEL_HEIGHT: u32 = 300;

pub fn panel_area() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(PANEL_WIDTH, PANEL_HEIGHT))
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Fill a rectangle with a solid ink.
pub fn fill_rect<D>(target: &mut D, area: Rectangle, color: TriColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = TriColor>,
{
    let style = PrimitiveStyleBuilder::new().fill_color(color).build();
    area.into_styled(style).draw(target)
}

/// Stroke a rounded rectangle outline, stroke drawn inside the bounds.
pub fn stroke_round_rect<D>(
    target: &mut D,
    area: Rectangle,
    radius: u32,
    stroke: u32,
    color: TriColor,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = TriColor>,
{
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(color)
        .stroke_width(stroke)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    RoundedRectangle::with_equal_corners(area, Size::new(radius, radius))
        .into_styled(style)
        .draw(target)
}
