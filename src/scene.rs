//! Dashboard scene graph: an ordered list of drawable nodes built from the
//! battery sample and the fetched data, then painted in order.

use chrono::Datelike;
use embedded_graphics::{
    mono_font::MonoTextStyle,
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
};
use log::info;
use profont::PROFONT_10_POINT;

use crate::battery::{gauge_level, BatteryReading, GaugeLevel};
use crate::catalog::Category;
use crate::config::{DashboardConfig, DateMatch};
use crate::fetch::Acquisition;
use crate::layout::{fill_rect, panel_area, stroke_round_rect, TriColor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Background {
        area: Rectangle,
        color: TriColor,
    },
    AlertBar {
        area: Rectangle,
        color: TriColor,
    },
    GaugeOutline {
        area: Rectangle,
        radius: u32,
        stroke: u32,
        color: TriColor,
    },
    GaugeNub {
        area: Rectangle,
        color: TriColor,
    },
    GaugeSegment {
        area: Rectangle,
        color: TriColor,
    },
    /// Text rotated a quarter turn counter-clockwise, reading bottom to top.
    DateLabel {
        text: String,
        origin: Point,
        scale: u32,
        color: TriColor,
    },
    Icon {
        category: Category,
        origin: Point,
    },
}

/// Immutable once built; nodes paint in order, later nodes on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    nodes: Vec<Node>,
}

/// True when the next collection falls on today under `rule`. Degraded dates
/// never match.
pub fn alert_active(rule: DateMatch, acquisition: &Acquisition) -> bool {
    let (Some(next), Some(today)) = (acquisition.schedule.fresh(), acquisition.today.fresh())
    else {
        return false;
    };
    match rule {
        DateMatch::DayOfMonth => next.date.day() == today.day(),
        DateMatch::CalendarDate => next.date == *today,
    }
}

pub fn build(cfg: &DashboardConfig, battery: &BatteryReading, acquisition: &Acquisition) -> Scene {
    let palette = &cfg.palette;
    let mut nodes = Vec::with_capacity(16);

    // 1. Background
    nodes.push(Node::Background {
        area: panel_area(),
        color: palette.background,
    });

    // 2. Sidebar, red on collection day
    let alert = alert_active(cfg.date_match, acquisition);
    info!(
        "Alert bar {} ({} rule)",
        if alert { "on" } else { "off" },
        cfg.date_match.as_str()
    );
    nodes.push(Node::AlertBar {
        area: cfg.alert_bar,
        color: if alert {
            palette.bar_alert
        } else {
            palette.bar_normal
        },
    });

    // 3. Battery gauge
    let gauge = &cfg.gauge;
    nodes.push(Node::GaugeOutline {
        area: gauge.outline,
        radius: gauge.corner_radius,
        stroke: gauge.stroke,
        color: palette.foreground,
    });
    nodes.push(Node::GaugeNub {
        area: gauge.nub,
        color: palette.foreground,
    });
    match gauge_level(battery.volts, &cfg.thresholds) {
        GaugeLevel::Low => nodes.push(Node::GaugeSegment {
            area: gauge.low_segment,
            color: palette.low_battery,
        }),
        GaugeLevel::Segments(n) => {
            for area in gauge.segments.iter().take(n as usize) {
                nodes.push(Node::GaugeSegment {
                    area: *area,
                    color: palette.foreground,
                });
            }
        }
    }

    // 4. Day-of-month of the next collection
    nodes.push(Node::DateLabel {
        text: acquisition.next_date().day().to_string(),
        origin: cfg.date_label.origin,
        scale: cfg.date_label.scale,
        color: palette.date_text,
    });

    // 5. One icon per category
    for &category in acquisition.categories() {
        nodes.push(Node::Icon {
            category,
            origin: cfg.icon_slots.slot(category),
        });
    }

    Scene { nodes }
}

impl Scene {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Scene { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = TriColor>,
    {
        for node in &self.nodes {
            match node {
                Node::Background { area, color }
                | Node::AlertBar { area, color }
                | Node::GaugeNub { area, color }
                | Node::GaugeSegment { area, color } => fill_rect(target, *area, *color)?,
                Node::GaugeOutline {
                    area,
                    radius,
                    stroke,
                    color,
                } => stroke_round_rect(target, *area, *radius, *stroke, *color)?,
                Node::DateLabel {
                    text,
                    origin,
                    scale,
                    color,
                } => {
                    let style = MonoTextStyle::new(&PROFONT_10_POINT, *color);
                    let mut rotated = Upright {
                        inner: &mut *target,
                        origin: *origin,
                        scale: (*scale).max(1) as i32,
                    };
                    Text::with_baseline(text, Point::zero(), style, Baseline::Middle)
                        .draw(&mut rotated)?;
                }
                Node::Icon { category, origin } => category.draw(target, *origin)?,
            }
        }
        Ok(())
    }
}

/// Scales each pixel to a `scale`-sized block and turns the text a quarter
/// turn counter-clockwise about `origin`: text x runs up the panel, text y
/// runs right.
struct Upright<'a, D> {
    inner: &'a mut D,
    origin: Point,
    scale: i32,
}

impl<D> Upright<'_, D> {
    fn block(&self, p: Point) -> Rectangle {
        let s = self.scale;
        let top_left = Point::new(self.origin.x + p.y * s, self.origin.y - (p.x + 1) * s + 1);
        Rectangle::new(top_left, Size::new(s as u32, s as u32))
    }
}

impl<D: DrawTarget<Color = TriColor>> Dimensions for Upright<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        let outer = self.inner.bounding_box();
        let s = self.scale;
        Rectangle::new(
            Point::new(0, -self.origin.x / s),
            Size::new(outer.size.height / s as u32, outer.size.width / s as u32),
        )
    }
}

impl<D: DrawTarget<Color = TriColor>> DrawTarget for Upright<'_, D> {
    type Color = TriColor;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            let block = self.block(p);
            self.inner.fill_solid(&block, color)?;
        }
        Ok(())
    }
}
