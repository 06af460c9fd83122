use embedded_graphics::{image::Image, pixelcolor::Rgb888, prelude::*};
use log::warn;
use tinybmp::Bmp;

use crate::layout::TriColor;

/// Collection streams the dashboard knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    Waste = 0,
    Plastic = 1,
    Cardboard = 2,
    Food = 3,
    Glass = 4,
}

/// Schedule API service identifiers. Two identifiers denote general waste.
pub const WIRE_IDS: [(&str, Category); 6] = [
    ("6xrmSxaifN5h3LXb", Category::Waste),
    ("xjVCX1y84wps6gTw", Category::Waste),
    ("FBWme5sNe7evoDY5", Category::Plastic),
    ("a7TGSliXHW6r4hml", Category::Cardboard),
    ("kGWWDB87GxV4bj6C", Category::Food),
    ("fGPdmGlQV2dflSsG", Category::Glass),
];

// ── 80x80 icons ─────────────────────────────────────────────────────

static ICON_WASTE: &[u8] = include_bytes!("../img/waste.bmp");
static ICON_PLASTIC: &[u8] = include_bytes!("../img/blue.bmp");
static ICON_CARDBOARD: &[u8] = include_bytes!("../img/clear.bmp");
static ICON_FOOD: &[u8] = include_bytes!("../img/food.bmp");
static ICON_GLASS: &[u8] = include_bytes!("../img/glass.bmp");

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Waste,
        Category::Plastic,
        Category::Cardboard,
        Category::Food,
        Category::Glass,
    ];

    pub fn from_wire_id(id: &str) -> Option<Category> {
        WIRE_IDS
            .iter()
            .find(|(wire, _)| *wire == id)
            .map(|&(_, category)| category)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Waste => "Waste",
            Self::Plastic => "Plastic",
            Self::Cardboard => "Cardboard",
            Self::Food => "Food",
            Self::Glass => "Glass",
        }
    }

    /// Asset path the icon is stored under on the device image.
    pub fn icon_path(self) -> &'static str {
        match self {
            Self::Waste => "/img/waste.bmp",
            Self::Plastic => "/img/blue.bmp",
            Self::Cardboard => "/img/clear.bmp",
            Self::Food => "/img/food.bmp",
            Self::Glass => "/img/glass.bmp",
        }
    }

    fn bmp_data(self) -> &'static [u8] {
        match self {
            Self::Waste => ICON_WASTE,
            Self::Plastic => ICON_PLASTIC,
            Self::Cardboard => ICON_CARDBOARD,
            Self::Food => ICON_FOOD,
            Self::Glass => ICON_GLASS,
        }
    }

    /// Draw the icon with its top-left corner at `origin`.
    pub fn draw<D>(self, target: &mut D, origin: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = TriColor>,
    {
        match Bmp::<Rgb888>::from_slice(self.bmp_data()) {
            Ok(bmp) => Image::new(&bmp, origin).draw(&mut target.color_converted()),
            Err(e) => {
                warn!("icon {} unreadable: {:?}", self.icon_path(), e);
                Ok(())
            }
        }
    }
}
