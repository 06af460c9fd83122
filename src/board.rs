//! UM TinyS2 wiring: display power rail, VBAT sense and the panel's SPI bus.

use anyhow::{Context, Result};
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::{Gpio3, Gpio33, Gpio38, Gpio8, Gpio9, Input, Output, PinDriver, Pins};
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI2};
use esp_idf_hal::units::Hertz;
use log::info;

use bin_day_epd::battery::BatteryReading;
use bin_day_epd::epd::Il0398;
use bin_day_epd::layout::{PANEL_HEIGHT, PANEL_WIDTH};

const SPI_BAUD_HZ: u32 = 1_000_000;

/// Largest oneshot code at the chip's default bit width.
#[cfg(esp32s2)]
const ADC_FULL_SCALE: u16 = 8191;
#[cfg(not(esp32s2))]
const ADC_FULL_SCALE: u16 = 4095;

pub type Panel = Il0398<
    SpiDeviceDriver<'static, SpiDriver<'static>>,
    PinDriver<'static, Gpio38, Input>,
    PinDriver<'static, Gpio9, Output>,
    PinDriver<'static, Gpio8, Output>,
>;

pub struct Board {
    power: PinDriver<'static, Gpio33, Output>,
    pub panel: Panel,
}

impl Board {
    /// Energise the display rail, sample the battery once and bring up the
    /// panel bus. Any failure here is fatal for the cycle.
    pub fn init(spi2: SPI2, pins: Pins, adc1: ADC1) -> Result<(Board, BatteryReading)> {
        let mut power = PinDriver::output(pins.gpio33).context("power enable pin")?;
        power.set_high()?;
        info!("Display power rail on");

        let battery = sample_battery(adc1, pins.gpio3)?;

        let spi = SpiDeviceDriver::new_single(
            spi2,
            pins.gpio37,
            pins.gpio35,
            Some(pins.gpio36),
            Some(pins.gpio14),
            &SpiDriverConfig::default(),
            &SpiConfig::new()
                .baudrate(Hertz(SPI_BAUD_HZ))
                .data_mode(embedded_hal::spi::MODE_0),
        )
        .context("panel SPI bus")?;
        let dc = PinDriver::output(pins.gpio9).context("panel DC pin")?;
        let rst = PinDriver::output(pins.gpio8).context("panel RST pin")?;
        let busy = PinDriver::input(pins.gpio38).context("panel BUSY pin")?;

        let panel = Il0398::new(spi, busy, dc, rst, PANEL_WIDTH as u16, PANEL_HEIGHT as u16);
        info!("Panel bus ready");

        Ok((Board { power, panel }, battery))
    }

    /// Cut the display power rail.
    pub fn power_off(&mut self) -> Result<()> {
        info!("power off");
        self.power.set_low()?;
        Ok(())
    }
}

fn sample_battery(adc1: ADC1, vbat: Gpio3) -> Result<BatteryReading> {
    let adc = AdcDriver::new(adc1).context("ADC1")?;
    let adc_config = AdcChannelConfig {
        attenuation: DB_11,
        ..Default::default()
    };
    let mut channel = AdcChannelDriver::new(&adc, vbat, &adc_config).context("VBAT channel")?;
    let code = adc.read_raw(&mut channel).context("VBAT sample")?;
    let reading = BatteryReading::from_adc(code, ADC_FULL_SCALE);
    info!("Battery: {:.2} V (code {}, raw {})", reading.volts, code, reading.raw);
    Ok(reading)
}
