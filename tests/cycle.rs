use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use anyhow::anyhow;
use bin_day_epd::battery::BatteryReading;
use bin_day_epd::catalog::Category;
use bin_day_epd::config::DashboardConfig;
use bin_day_epd::epd::{Cmd, Il0398};
use bin_day_epd::fetch::{self, Completeness, Response, Transport};
use bin_day_epd::layout::TriColor;
use bin_day_epd::lifecycle::{Lifecycle, Phase};
use bin_day_epd::render;
use bin_day_epd::scene::{self, Node};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, Operation, SpiDevice};

const ADDRESS: &str = "test-address";

const SCHEDULE: &str = r#"{
    "address": "1 Example Road, St Peter Port",
    "servicedates": {
        "2024-05-21": {"date": "2024-05-21", "services": {"0": {"kGWWDB87GxV4bj6C": {}}}},
        "2024-05-14": {
            "date": "2024-05-14",
            "services": {
                "0": {"6xrmSxaifN5h3LXb": {"name": "General waste"}},
                "1": {"xjVCX1y84wps6gTw": {"name": "General waste"}},
                "2": {"fGPdmGlQV2dflSsG": {"name": "Glass"}}
            }
        }
    }
}"#;

const TIME: &str = r#"{
    "abbreviation": "BST",
    "datetime": "2024-05-14T06:02:11.437015+01:00",
    "timezone": "Europe/London"
}"#;

#[derive(Default)]
struct MockTransport {
    responses: HashMap<String, (u16, String)>,
}

impl MockTransport {
    fn serving(cfg: &DashboardConfig) -> Self {
        let mut responses = HashMap::new();
        responses.insert(cfg.schedule_url(ADDRESS), (200, SCHEDULE.to_string()));
        responses.insert(cfg.time_url.clone(), (200, TIME.to_string()));
        MockTransport { responses }
    }
}

impl Transport for MockTransport {
    fn get(&mut self, url: &str) -> anyhow::Result<Response> {
        let (status, body) = self
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no route to {}", url))?;
        Ok(Response { status, body })
    }
}

fn battery() -> BatteryReading {
    // 3.8 V
    BatteryReading::from_raw(19_000)
}

fn icons(scene: &scene::Scene) -> Vec<Category> {
    scene
        .nodes()
        .iter()
        .filter_map(|n| match n {
            Node::Icon { category, .. } => Some(*category),
            _ => None,
        })
        .collect()
}

#[test]
fn full_cycle_renders_alert_and_icons() {
    let cfg = DashboardConfig::default();
    let mut transport = MockTransport::serving(&cfg);
    let mut lifecycle = Lifecycle::new();

    lifecycle.advance(Phase::NetworkUp).unwrap();
    let acquisition = fetch::acquire(&mut transport, &cfg, ADDRESS);
    assert_eq!(acquisition.completeness(), Completeness::Full);
    lifecycle
        .advance(Phase::DataFetched(acquisition.completeness()))
        .unwrap();

    let scene = scene::build(&cfg, &battery(), &acquisition);
    assert_eq!(icons(&scene), vec![Category::Waste, Category::Glass]);

    let frame = render::rasterize(&scene);
    lifecycle.advance(Phase::Rendered).unwrap();
    lifecycle.advance(Phase::Sleeping).unwrap();

    // Collection is today: the sidebar is red around the numeral.
    assert!(frame.count_in(&cfg.alert_bar, TriColor::Red) > 40 * 300);
    assert_eq!(frame.count_in(&cfg.alert_bar, TriColor::Black), 0);

    // Two black gauge segments at 3.8 V.
    assert_eq!(frame.count_in(&cfg.gauge.segments[1], TriColor::Black), 150);
    assert_eq!(frame.count_in(&cfg.gauge.segments[2], TriColor::Black), 0);

    // Waste and glass slots carry ink; the food slot stays blank.
    let slot = |p: Point| Rectangle::new(p, Size::new(80, 80));
    let inked = |p: Point| 80 * 80 - frame.count_in(&slot(p), TriColor::White);
    assert!(inked(cfg.icon_slots.waste) > 0);
    assert!(inked(cfg.icon_slots.glass) > 0);
    assert_eq!(inked(cfg.icon_slots.food), 0);
}

#[test]
fn identical_inputs_render_identical_frames() {
    let cfg = DashboardConfig::default();
    let run = || {
        let acquisition = fetch::acquire(&mut MockTransport::serving(&cfg), &cfg, ADDRESS);
        let scene = scene::build(&cfg, &battery(), &acquisition);
        let frame = render::rasterize(&scene);
        (scene, frame.black_plane().to_vec(), frame.red_plane().to_vec())
    };
    assert_eq!(run(), run());
}

#[test]
fn offline_cycle_still_renders_a_frame() {
    let cfg = DashboardConfig::default();
    let mut transport = MockTransport::default();
    let acquisition = fetch::acquire(&mut transport, &cfg, ADDRESS);
    assert_eq!(acquisition.completeness(), Completeness::Partial);

    let scene = scene::build(&cfg, &BatteryReading::from_raw(18_000), &acquisition);
    assert!(icons(&scene).is_empty());
    assert!(scene.nodes().iter().any(|n| matches!(
        n,
        Node::DateLabel { text, .. } if text == "1"
    )));

    let frame = render::rasterize(&scene);
    assert_eq!(frame.count_in(&cfg.alert_bar, TriColor::Red), 0);
    // 3.6 V shows the single red low-battery segment.
    assert_eq!(frame.count_in(&cfg.gauge.low_segment, TriColor::Red), 75);
}

// ── Panel bus ───────────────────────────────────────────────────────

#[derive(Default)]
struct Wire {
    data_mode: bool,
    commands: Vec<u8>,
    payloads: Vec<(u8, usize)>,
}

struct RecordingSpi(Rc<RefCell<Wire>>);

impl SpiErrorType for RecordingSpi {
    type Error = Infallible;
}

impl SpiDevice for RecordingSpi {
    fn transaction(&mut self, ops: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let mut wire = self.0.borrow_mut();
        for op in ops.iter() {
            if let Operation::Write(bytes) = op {
                if wire.data_mode {
                    let last = wire.commands.last().copied().unwrap_or(0);
                    wire.payloads.push((last, bytes.len()));
                } else {
                    wire.commands.push(bytes[0]);
                }
            }
        }
        Ok(())
    }
}

struct Dc(Rc<RefCell<Wire>>);

impl PinErrorType for Dc {
    type Error = Infallible;
}

impl OutputPin for Dc {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().data_mode = false;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().data_mode = true;
        Ok(())
    }
}

struct Idle;

impl PinErrorType for Idle {
    type Error = Infallible;
}

impl InputPin for Idle {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }
    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(false)
    }
}

impl OutputPin for Idle {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[test]
fn present_refreshes_once_and_puts_the_panel_to_sleep() {
    let cfg = DashboardConfig::default();
    let acquisition = fetch::acquire(&mut MockTransport::serving(&cfg), &cfg, ADDRESS);
    let frame = render::rasterize(&scene::build(&cfg, &battery(), &acquisition));

    let wire = Rc::new(RefCell::new(Wire::default()));
    let mut epd = Il0398::new(
        RecordingSpi(wire.clone()),
        Idle,
        Dc(wire.clone()),
        Idle,
        400,
        300,
    );
    render::present(&mut epd, &frame, &mut NoDelay).unwrap();

    let wire = wire.borrow();
    let pos = |c: u8| wire.commands.iter().position(|&x| x == c).unwrap();
    assert!(pos(Cmd::POWER_ON) < pos(Cmd::DATA_START_TRANSMISSION_1));
    assert!(pos(Cmd::DATA_START_TRANSMISSION_1) < pos(Cmd::DATA_START_TRANSMISSION_2));
    assert!(pos(Cmd::DATA_START_TRANSMISSION_2) < pos(Cmd::DISPLAY_REFRESH));
    assert!(pos(Cmd::DISPLAY_REFRESH) < pos(Cmd::POWER_OFF));
    assert_eq!(wire.commands.last(), Some(&Cmd::DEEP_SLEEP));
    assert_eq!(
        wire.commands.iter().filter(|&&c| c == Cmd::DISPLAY_REFRESH).count(),
        1
    );
    assert!(wire.payloads.contains(&(Cmd::DATA_START_TRANSMISSION_1, 15_000)));
    assert!(wire.payloads.contains(&(Cmd::DATA_START_TRANSMISSION_2, 15_000)));
}
