//! IL0398 driver for the 4.2" 400x300 black/white/red panel.
//!
//! The driver only moves bytes: drawing happens in
//! [`TriColorBuffer`](crate::framebuffer::TriColorBuffer), whose planes are
//! handed to [`Il0398::show`]. The panel may be refreshed at most once every
//! 180 seconds; the firmware refreshes once per wake cycle.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::framebuffer::TriColorBuffer;

/// Controller command set used by this driver.
pub struct Cmd;
impl Cmd {
    pub const PANEL_SETTING: u8 = 0x00;
    pub const POWER_SETTING: u8 = 0x01;
    pub const POWER_OFF: u8 = 0x02;
    pub const POWER_ON: u8 = 0x04;
    pub const BOOSTER_SOFT_START: u8 = 0x06;
    pub const DEEP_SLEEP: u8 = 0x07;
    pub const DATA_START_TRANSMISSION_1: u8 = 0x10;
    pub const DISPLAY_REFRESH: u8 = 0x12;
    pub const DATA_START_TRANSMISSION_2: u8 = 0x13;
    pub const VCOM_DATA_INTERVAL: u8 = 0x50;
    pub const RESOLUTION_SETTING: u8 = 0x61;
}

const DEEP_SLEEP_CHECK: u8 = 0xA5;
const BUSY_POLL_MS: u32 = 10;

/// Steps of a power-up or power-down sequence.
#[derive(Clone, Copy, Debug)]
pub enum InitStep {
    /// Toggle the RST pin
    HardReset,
    DelayMs(u16),
    /// Poll BUSY until the controller is idle
    WaitUntilIdle,
    Cmd(u8),
    CmdData(u8, &'static [u8]),
    /// Send RESOLUTION_SETTING with the configured width and height
    Resolution,
}

/// Power-up sequence: power settings, booster, power on, KWR panel mode
/// with the OTP LUT, resolution.
pub const INIT_SEQUENCE: &[InitStep] = &[
    InitStep::HardReset,
    InitStep::CmdData(Cmd::POWER_SETTING, &[0x03, 0x00, 0x2B, 0x2B, 0x09]),
    InitStep::CmdData(Cmd::BOOSTER_SOFT_START, &[0x17, 0x17, 0x17]),
    InitStep::Cmd(Cmd::POWER_ON),
    InitStep::DelayMs(200),
    InitStep::WaitUntilIdle,
    InitStep::CmdData(Cmd::PANEL_SETTING, &[0x0F]),
    InitStep::Resolution,
];

/// Border floating, power off, then deep sleep.
pub const STOP_SEQUENCE: &[InitStep] = &[
    InitStep::CmdData(Cmd::VCOM_DATA_INTERVAL, &[0xF7]),
    InitStep::Cmd(Cmd::POWER_OFF),
    InitStep::WaitUntilIdle,
    InitStep::CmdData(Cmd::DEEP_SLEEP, &[DEEP_SLEEP_CHECK]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EpdError {
    #[error("SPI error: {0:?}")]
    Spi(embedded_hal::spi::ErrorKind),
    #[error("GPIO error: {0:?}")]
    Pin(embedded_hal::digital::ErrorKind),
    #[error("panel busy for more than {0} ms")]
    BusyTimeout(u32),
    #[error("frame is {got} bytes per plane, panel needs {expected}")]
    FrameSize { expected: usize, got: usize },
}

fn spi_err<E: embedded_hal::spi::Error>(e: E) -> EpdError {
    EpdError::Spi(e.kind())
}

fn pin_err<E: embedded_hal::digital::Error>(e: E) -> EpdError {
    EpdError::Pin(e.kind())
}

pub struct Il0398<SPI, BSY, DC, RST> {
    spi: SPI,
    busy: BSY,
    dc: DC,
    rst: RST,
    width: u16,
    height: u16,
    busy_timeout_ms: u32,
}

impl<SPI, BSY, DC, RST> Il0398<SPI, BSY, DC, RST>
where
    SPI: SpiDevice,
    BSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    pub fn new(spi: SPI, busy: BSY, dc: DC, rst: RST, width: u16, height: u16) -> Self {
        debug!("creating Il0398 {}x{}", width, height);
        Il0398 {
            spi,
            busy,
            dc,
            rst,
            width,
            height,
            busy_timeout_ms: 40_000,
        }
    }

    pub fn with_busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    fn plane_len(&self) -> usize {
        (self.width as usize).div_ceil(8) * self.height as usize
    }

    fn cmd(&mut self, cmd: u8) -> Result<(), EpdError> {
        self.dc.set_low().map_err(pin_err)?;
        self.spi.write(&[cmd]).map_err(spi_err)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), EpdError> {
        self.dc.set_high().map_err(pin_err)?;
        self.spi.write(data).map_err(spi_err)
    }

    fn cmd_with_data(&mut self, cmd: u8, data: &[u8]) -> Result<(), EpdError> {
        self.cmd(cmd)?;
        self.data(data)
    }

    fn hard_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), EpdError> {
        self.rst.set_high().map_err(pin_err)?;
        delay.delay_ms(10);
        self.rst.set_low().map_err(pin_err)?;
        delay.delay_ms(10);
        self.rst.set_high().map_err(pin_err)?;
        delay.delay_ms(10);
        Ok(())
    }

    /// BUSY is active low on this controller.
    fn wait_until_idle(&mut self, delay: &mut impl DelayNs) -> Result<(), EpdError> {
        let mut waited = 0u32;
        while self.busy.is_low().map_err(pin_err)? {
            if waited >= self.busy_timeout_ms {
                return Err(EpdError::BusyTimeout(waited));
            }
            delay.delay_ms(BUSY_POLL_MS);
            waited += BUSY_POLL_MS;
        }
        if waited > 0 {
            debug!("panel idle after {}ms", waited);
        }
        Ok(())
    }

    fn run(&mut self, steps: &[InitStep], delay: &mut impl DelayNs) -> Result<(), EpdError> {
        for step in steps {
            debug!("epd step: {:?}", step);
            match *step {
                InitStep::HardReset => self.hard_reset(delay)?,
                InitStep::DelayMs(ms) => delay.delay_ms(u32::from(ms)),
                InitStep::WaitUntilIdle => self.wait_until_idle(delay)?,
                InitStep::Cmd(c) => self.cmd(c)?,
                InitStep::CmdData(c, d) => self.cmd_with_data(c, d)?,
                InitStep::Resolution => {
                    let [wh, wl] = self.width.to_be_bytes();
                    let [hh, hl] = self.height.to_be_bytes();
                    self.cmd_with_data(Cmd::RESOLUTION_SETTING, &[wh, wl, hh, hl])?;
                }
            }
        }
        Ok(())
    }

    /// Power the controller up from reset.
    pub fn begin(&mut self, delay: &mut impl DelayNs) -> Result<(), EpdError> {
        debug!("powering up il0398");
        self.run(INIT_SEQUENCE, delay)
    }

    /// Write both planes and refresh the panel, blocking until the refresh
    /// completes.
    pub fn show(&mut self, frame: &TriColorBuffer, delay: &mut impl DelayNs) -> Result<(), EpdError> {
        let expected = self.plane_len();
        let got = frame.black_plane().len();
        if got != expected {
            return Err(EpdError::FrameSize { expected, got });
        }

        // Panel RAM polarity is inverted relative to the ink planes: a set
        // bit is white in DTM1 and "no red" in DTM2.
        let black: Vec<u8> = frame.black_plane().iter().map(|b| !b).collect();
        let red: Vec<u8> = frame.red_plane().iter().map(|b| !b).collect();

        debug!("writing black plane ({} bytes)", black.len());
        self.cmd_with_data(Cmd::DATA_START_TRANSMISSION_1, &black)?;
        debug!("writing red plane ({} bytes)", red.len());
        self.cmd_with_data(Cmd::DATA_START_TRANSMISSION_2, &red)?;

        self.refresh(delay)
    }

    pub fn refresh(&mut self, delay: &mut impl DelayNs) -> Result<(), EpdError> {
        debug!("refreshing il0398");
        self.cmd(Cmd::DISPLAY_REFRESH)?;
        delay.delay_ms(100);
        self.wait_until_idle(delay)
    }

    /// Power the panel down and put the controller into deep sleep. Only a
    /// hardware reset wakes it.
    pub fn sleep(&mut self, delay: &mut impl DelayNs) -> Result<(), EpdError> {
        debug!("powering down il0398");
        self.run(STOP_SEQUENCE, delay)
    }
}
