use std::time::Duration;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::info;

use crate::battery::Thresholds;
use crate::catalog::Category;
use crate::layout::{TriColor, PANEL_HEIGHT};

const SCHEDULE_URL_TEMPLATE: &str = "https://guernsey.isl-fusion.com/api/address/{address}";
const TIME_URL: &str = "http://worldtimeapi.org/api/timezone/Europe/London";

const SLEEP_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// How the collection date is compared with today's date to decide the
/// alert bar colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateMatch {
    /// Only the day-of-month is compared; month and year are ignored.
    #[default]
    DayOfMonth,
    /// Year, month and day must all match.
    CalendarDate,
}

impl DateMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            DateMatch::DayOfMonth => "day-of-month",
            DateMatch::CalendarDate => "calendar-date",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: TriColor,
    pub bar_normal: TriColor,
    pub bar_alert: TriColor,
    pub foreground: TriColor,
    pub low_battery: TriColor,
    pub date_text: TriColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeGeometry {
    pub outline: Rectangle,
    pub corner_radius: u32,
    pub stroke: u32,
    pub nub: Rectangle,
    /// Narrow single segment shown when the battery is low.
    pub low_segment: Rectangle,
    /// Base segment followed by the three threshold segments, left to right.
    pub segments: [Rectangle; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateLabelGeometry {
    /// Start of the rotated label's centre line; text reads upward from here.
    pub origin: Point,
    pub scale: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconSlots {
    pub waste: Point,
    pub plastic: Point,
    pub cardboard: Point,
    pub food: Point,
    pub glass: Point,
}

impl IconSlots {
    pub fn slot(&self, category: Category) -> Point {
        match category {
            Category::Waste => self.waste,
            Category::Plastic => self.plastic,
            Category::Cardboard => self.cardboard,
            Category::Food => self.food,
            Category::Glass => self.glass,
        }
    }
}

/// Everything the fetch and render phases need that is not a secret.
/// `Default` yields the values the device ships with.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// `{address}` is replaced by the address identifier.
    pub schedule_url_template: String,
    pub time_url: String,
    pub http_timeout: Duration,
    pub sleep_interval: Duration,
    pub date_match: DateMatch,
    pub palette: Palette,
    pub alert_bar: Rectangle,
    pub gauge: GaugeGeometry,
    pub thresholds: Thresholds,
    pub date_label: DateLabelGeometry,
    pub icon_slots: IconSlots,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let seg = |x: i32| Rectangle::new(Point::new(x, 10), Size::new(10, 15));
        let icon_row = 114;
        DashboardConfig {
            schedule_url_template: SCHEDULE_URL_TEMPLATE.to_string(),
            time_url: TIME_URL.to_string(),
            http_timeout: HTTP_TIMEOUT,
            sleep_interval: SLEEP_INTERVAL,
            date_match: DateMatch::DayOfMonth,
            palette: Palette {
                background: TriColor::White,
                bar_normal: TriColor::Black,
                bar_alert: TriColor::Red,
                foreground: TriColor::Black,
                low_battery: TriColor::Red,
                date_text: TriColor::White,
            },
            alert_bar: Rectangle::new(Point::zero(), Size::new(50, PANEL_HEIGHT)),
            gauge: GaugeGeometry {
                outline: Rectangle::new(Point::new(336, 4), Size::new(56, 27)),
                corner_radius: 1,
                stroke: 5,
                nub: Rectangle::new(Point::new(390, 13), Size::new(6, 9)),
                low_segment: Rectangle::new(Point::new(342, 10), Size::new(5, 15)),
                segments: [seg(342), seg(353), seg(364), seg(375)],
            },
            thresholds: Thresholds::default(),
            date_label: DateLabelGeometry {
                origin: Point::new(24, 290),
                scale: 4,
            },
            icon_slots: IconSlots {
                waste: Point::new(53, icon_row),
                plastic: Point::new(139, icon_row),
                cardboard: Point::new(139, icon_row),
                food: Point::new(225, icon_row),
                glass: Point::new(311, icon_row),
            },
        }
    }
}

impl DashboardConfig {
    pub fn schedule_url(&self, address_id: &str) -> String {
        self.schedule_url_template.replace("{address}", address_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretsError {
    #[error("WiFi SSID missing; add WIFI_SSID to secrets.local.rs")]
    MissingSsid,
    #[error("address ID missing; add ADDRESS_ID to secrets.local.rs")]
    MissingAddress,
}

/// Credentials baked in at build time from `secrets.local.rs`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub address_id: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_pass", &format_args!("<{} chars>", self.wifi_pass.len()))
            .field("address_id", &format_args!("<{} chars>", self.address_id.len()))
            .finish()
    }
}

impl Secrets {
    /// Load the values `build.rs` exported from `secrets.local.rs`.
    pub fn from_build_env() -> Result<Secrets, SecretsError> {
        Self::from_parts(
            option_env!("LOCAL_WIFI_SSID"),
            option_env!("LOCAL_WIFI_PASS"),
            option_env!("LOCAL_ADDRESS_ID"),
        )
    }

    /// An empty passphrase means an open network; SSID and address are required.
    pub fn from_parts(
        ssid: Option<&str>,
        pass: Option<&str>,
        address: Option<&str>,
    ) -> Result<Secrets, SecretsError> {
        // Spaces are legal at either end of an SSID, so only the emptiness
        // check trims.
        let wifi_ssid = ssid
            .filter(|s| !s.trim().is_empty())
            .ok_or(SecretsError::MissingSsid)?
            .to_string();
        let address_id = address
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SecretsError::MissingAddress)?
            .to_string();
        let wifi_pass = pass.unwrap_or_default().to_string();

        info!("secrets wifi_ssid = {:?}", wifi_ssid);
        info!("secrets wifi_pass = <{} chars>", wifi_pass.len());
        info!("secrets address_id = <{} chars>", address_id.len());

        Ok(Secrets {
            wifi_ssid,
            wifi_pass,
            address_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_url_embeds_address() {
        let cfg = DashboardConfig::default();
        assert_eq!(
            cfg.schedule_url("abc123"),
            "https://guernsey.isl-fusion.com/api/address/abc123"
        );
    }

    #[test]
    fn ships_with_twelve_hour_sleep_and_day_of_month_matching() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.sleep_interval, Duration::from_secs(43_200));
        assert_eq!(cfg.date_match, DateMatch::DayOfMonth);
    }

    #[test]
    fn plastic_and_cardboard_share_a_column() {
        let slots = DashboardConfig::default().icon_slots;
        assert_eq!(slots.slot(Category::Plastic), slots.slot(Category::Cardboard));
        assert_ne!(slots.slot(Category::Waste), slots.slot(Category::Food));
    }

    #[test]
    fn secrets_require_ssid_and_address() {
        assert_eq!(
            Secrets::from_parts(None, Some("pw"), Some("addr")),
            Err(SecretsError::MissingSsid)
        );
        assert_eq!(
            Secrets::from_parts(Some("net"), Some("pw"), Some("  ")),
            Err(SecretsError::MissingAddress)
        );
    }

    #[test]
    fn ssid_keeps_surrounding_spaces() {
        let s = Secrets::from_parts(Some(" Home Net "), Some("pw"), Some("addr")).unwrap();
        assert_eq!(s.wifi_ssid, " Home Net ");
        assert_eq!(
            Secrets::from_parts(Some("   "), Some("pw"), Some("addr")),
            Err(SecretsError::MissingSsid)
        );
    }

    #[test]
    fn missing_passphrase_means_open_network() {
        let s = Secrets::from_parts(Some("net"), None, Some("addr")).unwrap();
        assert_eq!(s.wifi_pass, "");
        assert_eq!(s.address_id, "addr");
    }

    #[test]
    fn debug_output_hides_credentials() {
        let s = Secrets::from_parts(Some("net"), Some("hunter2"), Some("secret-id")).unwrap();
        let shown = format!("{:?}", s);
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("secret-id"));
    }
}
