#[cfg(target_os = "espidf")]
mod board;
#[cfg(target_os = "espidf")]
mod http_client;
#[cfg(target_os = "espidf")]
mod power;
#[cfg(target_os = "espidf")]
mod wifi;

#[cfg(target_os = "espidf")]
use anyhow::Result;
#[cfg(target_os = "espidf")]
use bin_day_epd::{
    config::{DashboardConfig, Secrets},
    fetch, render, scene,
    lifecycle::{Lifecycle, Phase, WakeAlarm},
};
#[cfg(target_os = "espidf")]
use esp_idf_hal::delay::Delay;
#[cfg(target_os = "espidf")]
use esp_idf_hal::peripherals::Peripherals;
#[cfg(target_os = "espidf")]
use esp_idf_svc::eventloop::EspSystemEventLoop;
#[cfg(target_os = "espidf")]
use log::{error, info};

// ── One wake cycle ──────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn run(cfg: &DashboardConfig, lifecycle: &mut Lifecycle) -> Result<()> {
    let secrets = Secrets::from_build_env()?;

    // ── 1. Power rail + battery sample ──
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let (mut board, battery) =
        board::Board::init(peripherals.spi2, peripherals.pins, peripherals.adc1)?;

    // ── 2. Network ──
    let wifi = wifi::connect_wifi(
        peripherals.modem,
        sysloop,
        &secrets.wifi_ssid,
        &secrets.wifi_pass,
    )?;
    let mut http = http_client::HttpSession::new(cfg.http_timeout);
    lifecycle.advance(Phase::NetworkUp)?;

    // ── 3. Schedule + current date ──
    let acquisition = fetch::acquire(&mut http, cfg, &secrets.address_id);
    lifecycle.advance(Phase::DataFetched(acquisition.completeness()))?;

    // ── 4. Scene → panel ──
    let scene = scene::build(cfg, &battery, &acquisition);
    info!("Scene has {} nodes", scene.nodes().len());
    let frame = render::rasterize(&scene);
    let mut delay = Delay::new_default();
    render::present(&mut board.panel, &frame, &mut delay)?;
    lifecycle.advance(Phase::Rendered)?;

    // ── 5. Release resources ──
    http.close();
    wifi.shutdown();
    board.power_off()?;
    Ok(())
}

// ── Entry point ─────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("BOOT bin-day dashboard v{}", env!("CARGO_PKG_VERSION"));

    let cfg = DashboardConfig::default();
    let mut lifecycle = Lifecycle::new();

    if let Err(e) = run(&cfg, &mut lifecycle) {
        error!("Cycle aborted during {}: {:#}", lifecycle.phase(), e);
    }

    if let Err(e) = lifecycle.advance(Phase::Sleeping) {
        error!("{}", e);
    }
    let alarm = WakeAlarm::arm(power::now_us(), cfg.sleep_interval);
    power::deep_sleep(alarm)
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "bin-day-epd v{} is ESP-IDF firmware; build it for the TinyS2 target (xtensa-esp32s2-espidf).",
        env!("CARGO_PKG_VERSION")
    );
}
