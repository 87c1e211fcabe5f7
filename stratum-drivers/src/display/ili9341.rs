//! ILI9341 TFT controller (4-wire SPI)
//!
//! Commands are sent with D/C low, parameters and pixel data with D/C high.
//! Chip select is handled by the `SpiDevice`.
//!
//! # Pixel formats
//!
//! - 24-bit builds stream 18-bit pixels (COLMOD 0x66), three bytes per pixel
//!   in R, G, B order. Line buffers hold `0x00BBGGRR`, so they are swapped
//!   into wire order by [`DisplayDevice::prepare_data`] first.
//! - Other builds stream RGB565 (COLMOD 0x55), two bytes per pixel, big
//!   endian. 3-bit colors are widened to 565 on the fly.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;
use stratum_core::color::{Color, PixelFormat, Rgb565};
use stratum_core::error::{Error, Result};
use stratum_core::traits::{DisplayDevice, Rotation};

/// ILI9341 command set (subset)
pub mod cmd {
    pub const NOP: u8 = 0x00;
    /// Software reset
    pub const SWRESET: u8 = 0x01;
    /// Sleep out
    pub const SLPOUT: u8 = 0x11;
    /// Display inversion off
    pub const INVOFF: u8 = 0x20;
    /// Display inversion on
    pub const INVON: u8 = 0x21;
    /// Display on
    pub const DISPON: u8 = 0x29;
    /// Column address set
    pub const CASET: u8 = 0x2A;
    /// Page address set
    pub const PASET: u8 = 0x2B;
    /// Memory write
    pub const RAMWR: u8 = 0x2C;
    /// Memory access control
    pub const MADCTL: u8 = 0x36;
    /// Pixel format set
    pub const COLMOD: u8 = 0x3A;
}

/// MADCTL bits
mod madctl {
    pub const MY: u8 = 0x80;
    pub const MX: u8 = 0x40;
    pub const MV: u8 = 0x20;
    pub const BGR: u8 = 0x08;
}

/// Native (unrotated) panel width
pub const NATIVE_WIDTH: i32 = 240;
/// Native (unrotated) panel height
pub const NATIVE_HEIGHT: i32 = 320;

/// Pixels converted per SPI write
const CHUNK_PIXELS: usize = 64;

/// ILI9341 communication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ili9341Error {
    /// SPI transfer failed
    Spi,
    /// D/C pin could not be driven
    Pin,
}

impl From<Ili9341Error> for Error {
    fn from(_: Ili9341Error) -> Self {
        Error::Bus
    }
}

/// MADCTL value for a rotation
pub const fn madctl_for(rotation: Rotation) -> u8 {
    match rotation {
        Rotation::Top => madctl::MX | madctl::BGR,
        Rotation::Left => madctl::MV | madctl::BGR,
        Rotation::Bottom => madctl::MY | madctl::BGR,
        Rotation::Right => madctl::MY | madctl::MX | madctl::MV | madctl::BGR,
    }
}

/// COLMOD value for the compiled pixel format
pub const fn colmod() -> u8 {
    if Color::BITS == 24 {
        0x66
    } else {
        0x55
    }
}

/// ILI9341 panel on an async SPI bus
pub struct Ili9341<SPI, DC, DELAY> {
    spi: SPI,
    dc: DC,
    delay: DELAY,
    rotation: Rotation,
    inverted: bool,
    streamed: usize,
}

impl<SPI, DC, DELAY> Ili9341<SPI, DC, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    DELAY: DelayNs,
{
    pub fn new(spi: SPI, dc: DC, delay: DELAY) -> Self {
        Self {
            spi,
            dc,
            delay,
            rotation: Rotation::Top,
            inverted: false,
            streamed: 0,
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    async fn command(&mut self, command: u8, params: &[u8]) -> core::result::Result<(), Ili9341Error> {
        self.dc.set_low().map_err(|_| Ili9341Error::Pin)?;
        self.spi.write(&[command]).await.map_err(|_| Ili9341Error::Spi)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(|_| Ili9341Error::Pin)?;
            self.spi.write(params).await.map_err(|_| Ili9341Error::Spi)?;
        }
        Ok(())
    }
}

/// Serialize one pixel in wire order, returning the byte count
fn encode(color: Color, out: &mut [u8]) -> usize {
    if Color::BITS == 24 {
        let raw = color.into_raw();
        out[0] = (raw >> 16) as u8;
        out[1] = (raw >> 8) as u8;
        out[2] = raw as u8;
        3
    } else {
        let (r, g, b) = color.to_rgb();
        out[..2].copy_from_slice(&Rgb565::rgb(r, g, b).0.to_be_bytes());
        2
    }
}

impl<SPI, DC, DELAY> DisplayDevice for Ili9341<SPI, DC, DELAY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    DELAY: DelayNs,
{
    async fn init(&mut self) -> Result<()> {
        self.command(cmd::SWRESET, &[]).await?;
        self.delay.delay_ms(150).await;
        self.command(cmd::SLPOUT, &[]).await?;
        self.delay.delay_ms(120).await;
        self.command(cmd::COLMOD, &[colmod()]).await?;
        self.command(cmd::MADCTL, &[madctl_for(self.rotation)]).await?;
        let inversion = if self.inverted { cmd::INVON } else { cmd::INVOFF };
        self.command(inversion, &[]).await?;
        self.command(cmd::DISPON, &[]).await?;
        self.delay.delay_ms(20).await;
        Ok(())
    }

    async fn set_addr_window(&mut self, x_start: i32, y_start: i32, x_end: i32, y_end: i32) -> Result<()> {
        if x_start < 0 || y_start < 0 || x_end >= self.width() || y_end >= self.height() {
            return Err(Error::BadParameter);
        }
        if x_start > x_end || y_start > y_end {
            return Err(Error::BadParameter);
        }
        let span = |from: i32, to: i32| {
            let (from, to) = (from as u16, to as u16);
            let [fh, fl] = from.to_be_bytes();
            let [th, tl] = to.to_be_bytes();
            [fh, fl, th, tl]
        };
        self.command(cmd::CASET, &span(x_start, x_end)).await?;
        self.command(cmd::PASET, &span(y_start, y_end)).await?;
        self.command(cmd::RAMWR, &[]).await?;
        self.dc.set_high().map_err(|_| Ili9341Error::Pin)?;
        self.streamed = 0;
        Ok(())
    }

    async fn write_stream(&mut self, data: &[Color]) -> Result<()> {
        let mut bytes = [0u8; CHUNK_PIXELS * 3];
        for chunk in data.chunks(CHUNK_PIXELS) {
            let mut len = 0;
            for &color in chunk {
                len += encode(color, &mut bytes[len..]);
            }
            self.spi
                .write(&bytes[..len])
                .await
                .map_err(|_| Ili9341Error::Spi)?;
        }
        self.streamed += data.len();
        Ok(())
    }

    async fn stop_transfer(&mut self) -> Result<()> {
        // Any command ends a memory write
        self.command(cmd::NOP, &[]).await?;
        Ok(())
    }

    async fn set_rotation(&mut self, rotation: Rotation) -> Result<()> {
        self.command(cmd::MADCTL, &[madctl_for(rotation)]).await?;
        self.rotation = rotation;
        Ok(())
    }

    async fn invert_display(&mut self, invert: bool) -> Result<()> {
        let command = if invert { cmd::INVON } else { cmd::INVOFF };
        self.command(command, &[]).await?;
        self.inverted = invert;
        Ok(())
    }

    fn is_data_need_preparation(&self) -> bool {
        Color::BITS == 24
    }

    fn prepare_data(&self, data: &mut [Color]) {
        if Color::BITS != 24 {
            return;
        }
        for color in data {
            let (r, g, b) = color.to_rgb();
            *color = Color::from_rgb(b, g, r);
        }
    }

    fn pixel_data_count(&self) -> usize {
        self.streamed
    }

    fn width(&self) -> i32 {
        if self.rotation.is_transposed() {
            NATIVE_HEIGHT
        } else {
            NATIVE_WIDTH
        }
    }

    fn height(&self) -> i32 {
        if self.rotation.is_transposed() {
            NATIVE_WIDTH
        } else {
            NATIVE_HEIGHT
        }
    }
}
