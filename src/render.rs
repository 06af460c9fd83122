use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::info;

use crate::epd::{EpdError, Il0398};
use crate::framebuffer::TriColorBuffer;
use crate::layout::{PANEL_HEIGHT, PANEL_WIDTH};
use crate::scene::Scene;

/// Paint a scene into a fresh panel-sized frame.
pub fn rasterize(scene: &Scene) -> TriColorBuffer {
    let mut frame = TriColorBuffer::new(PANEL_WIDTH, PANEL_HEIGHT);
    if let Err(never) = scene.draw(&mut frame) {
        match never {}
    }
    frame
}

/// Power the panel up, show the frame with a single refresh, and power the
/// controller down again.
pub fn present<SPI, BSY, DC, RST>(
    epd: &mut Il0398<SPI, BSY, DC, RST>,
    frame: &TriColorBuffer,
    delay: &mut impl DelayNs,
) -> Result<(), EpdError>
where
    SPI: SpiDevice,
    BSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    epd.begin(delay)?;
    info!("Refreshing panel");
    epd.show(frame, delay)?;
    epd.sleep(delay)?;
    info!("Panel refreshed and asleep");
    Ok(())
}
